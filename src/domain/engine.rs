//! Common engine interface.
//!
//! An engine declares its output columns up front and fills ticker-local
//! buffers from one ticker's date-ordered prices. Engines never see more than
//! one ticker at a time, so no state can leak across ticker boundaries.

use crate::domain::columns::{ColumnSet, TickerColumns};
use crate::domain::error::FwdScanError;
use crate::domain::panel::PanelFrame;
use tracing::debug;

/// How windowed statistics are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// Re-scan every forward window.
    #[default]
    Rescan,
    /// One right-to-left pass per ticker with incremental state.
    Sweep,
}

impl ScanStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rescan" => Some(ScanStrategy::Rescan),
            "sweep" => Some(ScanStrategy::Sweep),
            _ => None,
        }
    }
}

pub trait ForwardEngine: Sync {
    fn name(&self) -> &'static str;

    /// Output column names, in buffer order.
    fn column_names(&self) -> Vec<String>;

    /// Compute this engine's columns for one ticker. `prices` is date-ordered
    /// and non-empty; the result has `column_names().len()` columns of
    /// `prices.len()` rows.
    fn scan_ticker(&self, prices: &[f64]) -> TickerColumns;

    /// Run this engine alone over a whole panel.
    fn annotate(&self, panel: &PanelFrame) -> Result<ColumnSet, FwdScanError> {
        let partition = panel.partition()?;
        let mut out = ColumnSet::with_rows(self.column_names(), panel.len());
        for group in partition.groups(panel) {
            let local = self.scan_ticker(&group.prices);
            out.scatter(group.rows, &local);
        }
        debug!(
            engine = self.name(),
            tickers = partition.ticker_count(),
            rows = panel.len(),
            "engine annotated panel"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parse() {
        assert_eq!(ScanStrategy::parse("Rescan"), Some(ScanStrategy::Rescan));
        assert_eq!(ScanStrategy::parse(" sweep "), Some(ScanStrategy::Sweep));
        assert_eq!(ScanStrategy::parse("fast"), None);
        assert_eq!(ScanStrategy::default(), ScanStrategy::Rescan);
    }
}
