//! Port traits at the edges of the analysis core.

pub mod config_port;
pub mod panel_port;
