//! Edge-effect weights.
//!
//! weight = days_available / w, where days_available = min(n - i, w) is the
//! number of rows from `i` to the last row the window can reach. The weight
//! is in (0, 1] and drops below 1 exactly when the forward window is
//! truncated by the end of the ticker's history. It annotates rows only;
//! the other engines never consult it.

use crate::domain::columns::{TickerColumns, edge_weight_column};
use crate::domain::engine::ForwardEngine;
use crate::domain::horizon::HorizonSet;
use crate::domain::scanner::available_len;

/// `i < n` and `window >= 1`.
pub fn edge_weight(n: usize, i: usize, window: usize) -> f64 {
    available_len(n, i, window) as f64 / window as f64
}

#[derive(Debug, Clone)]
pub struct EdgeWeightEngine {
    horizons: HorizonSet,
}

impl EdgeWeightEngine {
    pub fn new(horizons: HorizonSet) -> Self {
        Self { horizons }
    }
}

impl ForwardEngine for EdgeWeightEngine {
    fn name(&self) -> &'static str {
        "edge_weight"
    }

    fn column_names(&self) -> Vec<String> {
        self.horizons
            .iter()
            .map(|h| edge_weight_column(&h.label))
            .collect()
    }

    fn scan_ticker(&self, prices: &[f64]) -> TickerColumns {
        let n = prices.len();
        let mut out = TickerColumns::new(self.horizons.len(), n);
        for (h, window) in self.horizons.windows().iter().enumerate() {
            for i in 0..n {
                out.set(h, i, Some(edge_weight(n, i, window.get())));
            }
        }
        out
    }
}
