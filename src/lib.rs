//! fwdscan: forward-looking barrier breach, volatility and edge-weight
//! annotations for multi-ticker price panels.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line dispatch in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
