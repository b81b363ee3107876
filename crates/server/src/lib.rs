//! HTTP service for used-car price prediction
//!
//! Wraps the `pricing-core` orchestrator in an axum router and supervises
//! loading of the regression artifact.

pub mod api;
pub mod config;
pub mod startup;
