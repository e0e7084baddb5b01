//! Core domain types and logic.

pub mod observation;
pub mod panel;
pub mod horizon;
pub mod barrier;
pub mod scanner;
pub mod columns;
pub mod compensated;
pub mod fenwick;
pub mod engine;
pub mod breach;
pub mod volatility;
pub mod edge_weight;
pub mod analysis;
pub mod config_validation;
pub mod error;
