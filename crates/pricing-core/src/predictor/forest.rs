//! Tree ensemble regressor serialized as JSON
//!
//! The training pipeline exports its random forest as nested split nodes that
//! reference encoded columns by name. Names are resolved against the
//! [`FeatureLayout`] once at load time.

use super::features::FeatureLayout;
use super::PriceRegressor;
use crate::models::VehicleRecord;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ForestDocument {
    model_type: String,
    trees: Vec<NodeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeDocument {
    Split {
        feature: String,
        threshold: f64,
        left: Box<NodeDocument>,
        right: Box<NodeDocument>,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug)]
enum Node {
    Split {
        column: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf(f64),
}

impl Node {
    fn resolve(doc: NodeDocument, layout: &FeatureLayout) -> Result<Self> {
        match doc {
            NodeDocument::Leaf { value } => Ok(Node::Leaf(value)),
            NodeDocument::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let column = layout
                    .index_of(&feature)
                    .with_context(|| format!("Unknown feature column '{}'", feature))?;
                Ok(Node::Split {
                    column,
                    threshold,
                    left: Box::new(Node::resolve(*left, layout)?),
                    right: Box::new(Node::resolve(*right, layout)?),
                })
            }
        }
    }

    fn evaluate(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    column,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*column] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }
}

/// Random-forest style regressor: the mean of its trees' outputs
#[derive(Debug)]
pub struct ForestRegressor {
    model_type: String,
    trees: Vec<Node>,
    layout: FeatureLayout,
}

impl ForestRegressor {
    /// Parse a serialized forest
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let doc: ForestDocument =
            serde_json::from_slice(bytes).context("Failed to parse forest JSON")?;
        if doc.trees.is_empty() {
            bail!("Forest contains no trees");
        }

        let layout = FeatureLayout::standard();
        let trees = doc
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| {
                Node::resolve(tree, &layout).with_context(|| format!("Invalid tree {}", i))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            model_type: doc.model_type,
            trees,
            layout,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl PriceRegressor for ForestRegressor {
    fn predict(&self, record: &VehicleRecord) -> Result<f64> {
        let row = self.layout.encode(record);
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(&row)).sum();
        let price = sum / self.trees.len() as f64;
        if !price.is_finite() {
            bail!("Forest produced a non-finite prediction");
        }
        Ok(price)
    }

    fn kind(&self) -> &str {
        &self.model_type
    }

    fn is_reentrant(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use serde_json::json;

    fn record(year: i64, brand: &str) -> VehicleRecord {
        let raw = json!({
            "Brand": brand,
            "Model": "Hatchback",
            "Year": year,
            "KM_Driven": 40000,
            "Fuel": "Petrol",
            "Seller_Type": "Individual",
            "Transmission": "Manual",
            "Owner": "Second Owner"
        });
        validate(raw.as_object().unwrap()).unwrap()
    }

    fn forest() -> ForestRegressor {
        let doc = json!({
            "model_type": "RandomForestRegressor",
            "trees": [
                {
                    "feature": "Year",
                    "threshold": 2015.5,
                    "left": { "value": 4000.0 },
                    "right": { "value": 9000.0 }
                },
                {
                    "feature": "Brand_BMW",
                    "threshold": 0.5,
                    "left": { "value": 6000.0 },
                    "right": { "value": 14000.0 }
                }
            ]
        });
        ForestRegressor::from_slice(doc.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_prediction_is_mean_of_trees() {
        let forest = forest();
        assert_eq!(forest.tree_count(), 2);
        assert_eq!(forest.kind(), "RandomForestRegressor");
        assert_eq!(forest.predict(&record(2012, "Honda")).unwrap(), 5000.0);
        assert_eq!(forest.predict(&record(2019, "Honda")).unwrap(), 7500.0);
        assert_eq!(forest.predict(&record(2019, "BMW")).unwrap(), 11500.0);
    }

    #[test]
    fn test_threshold_goes_left_when_equal() {
        let doc = json!({
            "model_type": "RandomForestRegressor",
            "trees": [{
                "feature": "Year",
                "threshold": 2012.0,
                "left": { "value": 1.0 },
                "right": { "value": 2.0 }
            }]
        });
        let forest = ForestRegressor::from_slice(doc.to_string().as_bytes()).unwrap();
        assert_eq!(forest.predict(&record(2012, "Ford")).unwrap(), 1.0);
        assert_eq!(forest.predict(&record(2013, "Ford")).unwrap(), 2.0);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let doc = json!({
            "model_type": "RandomForestRegressor",
            "trees": [{
                "feature": "Brand_Tesla",
                "threshold": 0.5,
                "left": { "value": 1.0 },
                "right": { "value": 2.0 }
            }]
        });
        let err = ForestRegressor::from_slice(doc.to_string().as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("Brand_Tesla"));
    }

    #[test]
    fn test_empty_forest_rejected() {
        let doc = json!({ "model_type": "RandomForestRegressor", "trees": [] });
        assert!(ForestRegressor::from_slice(doc.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_corrupt_json_rejected() {
        assert!(ForestRegressor::from_slice(b"{\"model_type\": \"Random").is_err());
    }
}
