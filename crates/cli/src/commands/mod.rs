//! CLI command implementations

pub mod evaluate;
pub mod predict;
pub mod service;
