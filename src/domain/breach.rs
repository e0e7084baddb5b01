//! Barrier breach statistics over forward windows.
//!
//! For window `P[i .. i+L)` and barrier level `b`:
//! - pct_above = #{j : P[j] >= P[i]} / L, measured against the window's
//!   opening price rather than the barrier price
//! - pct_below = #{j : P[j] < P[i] * b} / L
//! - mean_breach_price = mean of the breaching prices, `None` if there are none
//!
//! Columns are laid out horizon-major, then barrier, then
//! (pct_above, pct_below, mean_breach_price).

use crate::domain::barrier::BarrierSet;
use crate::domain::columns::{
    TickerColumns, mean_breach_price_column, pct_above_breach_column, pct_below_breach_column,
};
use crate::domain::compensated::CompensatedSum;
use crate::domain::engine::{ForwardEngine, ScanStrategy};
use crate::domain::fenwick::RankedFenwick;
use crate::domain::horizon::HorizonSet;
use crate::domain::scanner::{ForwardWindowScanner, available_len};

const STATS_PER_BARRIER: usize = 3;

/// Raw tallies for one window and one barrier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreachTally {
    pub window_len: usize,
    pub above: usize,
    pub below: usize,
    pub below_sum: f64,
}

impl BreachTally {
    pub fn pct_above(&self) -> f64 {
        self.above as f64 / self.window_len as f64
    }

    pub fn pct_below(&self) -> f64 {
        self.below as f64 / self.window_len as f64
    }

    pub fn mean_breach_price(&self) -> Option<f64> {
        (self.below > 0).then(|| self.below_sum / self.below as f64)
    }
}

#[derive(Debug, Clone)]
pub struct BarrierBreachEngine {
    horizons: HorizonSet,
    barriers: BarrierSet,
    strategy: ScanStrategy,
}

impl BarrierBreachEngine {
    pub fn new(horizons: HorizonSet, barriers: BarrierSet, strategy: ScanStrategy) -> Self {
        Self {
            horizons,
            barriers,
            strategy,
        }
    }

    fn column_base(&self, horizon: usize, barrier: usize) -> usize {
        (horizon * self.barriers.len() + barrier) * STATS_PER_BARRIER
    }

    fn write(
        &self,
        out: &mut TickerColumns,
        horizon: usize,
        barrier: usize,
        i: usize,
        t: &BreachTally,
    ) {
        let base = self.column_base(horizon, barrier);
        out.set(base, i, Some(t.pct_above()));
        out.set(base + 1, i, Some(t.pct_below()));
        out.set(base + 2, i, t.mean_breach_price());
    }

    fn scan_rescan(&self, prices: &[f64], out: &mut TickerColumns) {
        let levels = self.barriers.levels();
        let mut thresholds = vec![0.0; levels.len()];
        let mut tallies = vec![
            BreachTally {
                window_len: 0,
                above: 0,
                below: 0,
                below_sum: 0.0,
            };
            levels.len()
        ];

        for (h, &w) in self.horizons.windows().iter().enumerate() {
            for window in ForwardWindowScanner::new(prices, w).iter() {
                let open = window.opening_price();
                for (thr, &b) in thresholds.iter_mut().zip(levels) {
                    *thr = open * b;
                }
                for t in tallies.iter_mut() {
                    *t = BreachTally {
                        window_len: window.len(),
                        above: 0,
                        below: 0,
                        below_sum: 0.0,
                    };
                }

                let mut above = 0;
                for &p in window.prices {
                    if p >= open {
                        above += 1;
                    }
                    for (t, &thr) in tallies.iter_mut().zip(&thresholds) {
                        if p < thr {
                            t.below += 1;
                            t.below_sum += p;
                        }
                    }
                }

                for (k, t) in tallies.iter_mut().enumerate() {
                    t.above = above;
                    self.write(out, h, k, window.start, t);
                }
            }
        }
    }

    /// Each window count is `suffix(i) - suffix(i + w)`, where `suffix(s)`
    /// queries a Fenwick tree holding `P[s..n)`. Walking `s` from `n - 1`
    /// down to 0 inserts one price per step; the subtraction for window `i`
    /// is taken when the walk passes `i + w`, before the addition at `i`.
    /// Breach sums stay compensated until both halves are in, since the two
    /// suffixes can be far larger than the window they bracket.
    fn scan_sweep(&self, prices: &[f64], out: &mut TickerColumns) {
        let n = prices.len();
        let levels = self.barriers.levels();
        let nb = levels.len();
        let nh = self.horizons.len();
        let windows: Vec<usize> = self.horizons.windows().iter().map(|w| w.get()).collect();

        // [h][i] count of P[j] < P[i]; [h * nb + k][i] breach count and sum.
        let mut below_open = vec![vec![0i64; n]; nh];
        let mut below = vec![vec![0i64; n]; nh * nb];
        let mut below_sum = vec![vec![CompensatedSum::new(); n]; nh * nb];

        let mut tree = RankedFenwick::new(prices);
        for s in (0..n).rev() {
            tree.insert(prices[s]);
            for (h, &w) in windows.iter().enumerate() {
                if s >= w {
                    let i = s - w;
                    let open = prices[i];
                    below_open[h][i] -= i64::from(tree.below(open).0);
                    for (k, &b) in levels.iter().enumerate() {
                        let (c, sum) = tree.below(open * b);
                        below[h * nb + k][i] -= i64::from(c);
                        below_sum[h * nb + k][i] -= sum;
                    }
                }
                let open = prices[s];
                below_open[h][s] += i64::from(tree.below(open).0);
                for (k, &b) in levels.iter().enumerate() {
                    let (c, sum) = tree.below(open * b);
                    below[h * nb + k][s] += i64::from(c);
                    below_sum[h * nb + k][s] += sum;
                }
            }
        }

        for (h, &w) in windows.iter().enumerate() {
            for i in 0..n {
                let len = available_len(n, i, w);
                let above = len - below_open[h][i] as usize;
                for k in 0..nb {
                    let tally = BreachTally {
                        window_len: len,
                        above,
                        below: below[h * nb + k][i] as usize,
                        below_sum: below_sum[h * nb + k][i].value(),
                    };
                    self.write(out, h, k, i, &tally);
                }
            }
        }
    }
}

impl ForwardEngine for BarrierBreachEngine {
    fn name(&self) -> &'static str {
        "barrier_breach"
    }

    fn column_names(&self) -> Vec<String> {
        let mut names =
            Vec::with_capacity(self.horizons.len() * self.barriers.len() * STATS_PER_BARRIER);
        for horizon in &self.horizons {
            for (k, _) in self.barriers.indexed() {
                names.push(pct_above_breach_column(&horizon.label, k));
                names.push(pct_below_breach_column(&horizon.label, k));
                names.push(mean_breach_price_column(&horizon.label, k));
            }
        }
        names
    }

    fn scan_ticker(&self, prices: &[f64]) -> TickerColumns {
        let mut out = TickerColumns::new(
            self.horizons.len() * self.barriers.len() * STATS_PER_BARRIER,
            prices.len(),
        );
        match self.strategy {
            ScanStrategy::Rescan => self.scan_rescan(prices, &mut out),
            ScanStrategy::Sweep => self.scan_sweep(prices, &mut out),
        }
        out
    }
}
