//! Forward realized volatility: the sample standard deviation (divisor
//! `L - 1`) of the prices in each forward window. Windows with `L <= 2`
//! carry no value.

use crate::domain::columns::{TickerColumns, forward_std_column};
use crate::domain::compensated::CompensatedSum;
use crate::domain::engine::{ForwardEngine, ScanStrategy};
use crate::domain::horizon::HorizonSet;
use crate::domain::scanner::{ForwardWindowScanner, available_len};

/// Fewest points a window needs before a deviation is reported.
pub const MIN_VOLATILITY_POINTS: usize = 3;

/// Two-pass sample standard deviation; `None` below
/// [`MIN_VOLATILITY_POINTS`].
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < MIN_VOLATILITY_POINTS {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// `Σd` and `Σd²` over a sliding window, with `d = P[j] - anchor` and the
/// anchor a price inside the window.
///
/// Keeping the anchor inside the window bounds every `|d|` by the window's
/// range, so the deviations themselves carry no more than `eps * range` of
/// error however high the price level is. The sums are compensated, so the
/// `l * Σd² - (Σd)²` difference does not cancel away small dispersions.
#[derive(Debug, Clone)]
struct ShiftedMoments {
    anchor_at: usize,
    anchor: f64,
    sum: CompensatedSum,
    sum_sq: CompensatedSum,
}

impl ShiftedMoments {
    /// Sums over `prices[start..start + len]`, anchored on `prices[start]`.
    fn over(prices: &[f64], start: usize, len: usize) -> Self {
        let mut moments = Self {
            anchor_at: start,
            anchor: prices[start],
            sum: CompensatedSum::new(),
            sum_sq: CompensatedSum::new(),
        };
        for &p in &prices[start..start + len] {
            moments.push(p);
        }
        moments
    }

    fn push(&mut self, price: f64) {
        let d = price - self.anchor;
        self.sum.add(d);
        self.sum_sq.add_product(d, d);
    }

    fn pop(&mut self, price: f64) {
        let d = price - self.anchor;
        self.sum.sub(d);
        self.sum_sq.sub_product(d, d);
    }

    /// Whether the anchor still lies in the window `[start, start + len)`.
    fn anchored_in(&self, start: usize, len: usize) -> bool {
        self.anchor_at < start + len
    }

    fn sample_std(&self, len: usize) -> f64 {
        let l = len as f64;
        let mut m2 = self.sum_sq.scaled(l);
        m2 -= self.sum.squared();
        (m2.value() / (l * (l - 1.0))).max(0.0).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct ForwardVolatilityEngine {
    horizons: HorizonSet,
    strategy: ScanStrategy,
}

impl ForwardVolatilityEngine {
    pub fn new(horizons: HorizonSet, strategy: ScanStrategy) -> Self {
        Self { horizons, strategy }
    }

    fn scan_rescan(&self, prices: &[f64], out: &mut TickerColumns) {
        for (h, &w) in self.horizons.windows().iter().enumerate() {
            for window in ForwardWindowScanner::new(prices, w).iter() {
                out.set(h, window.start, sample_std(window.prices));
            }
        }
    }

    /// Slides the window right to left: `P[i]` enters at the front and
    /// `P[i + w]` leaves at the back. Once the anchor leaves the window the
    /// sums are rebuilt over the current window, which happens at most once
    /// every `w` steps.
    fn scan_sweep(&self, prices: &[f64], out: &mut TickerColumns) {
        let n = prices.len();
        if n == 0 {
            return;
        }
        for (h, window) in self.horizons.windows().iter().enumerate() {
            let w = window.get();
            let mut moments = ShiftedMoments::over(prices, n - 1, 1);
            for i in (0..n).rev() {
                let len = available_len(n, i, w);
                if i + 1 < n {
                    if moments.anchored_in(i, len) {
                        moments.push(prices[i]);
                        if w < n - i {
                            moments.pop(prices[i + w]);
                        }
                    } else {
                        moments = ShiftedMoments::over(prices, i, len);
                    }
                }

                if len >= MIN_VOLATILITY_POINTS {
                    out.set(h, i, Some(moments.sample_std(len)));
                }
            }
        }
    }
}

impl ForwardEngine for ForwardVolatilityEngine {
    fn name(&self) -> &'static str {
        "forward_volatility"
    }

    fn column_names(&self) -> Vec<String> {
        self.horizons
            .iter()
            .map(|h| forward_std_column(&h.label))
            .collect()
    }

    fn scan_ticker(&self, prices: &[f64]) -> TickerColumns {
        let mut out = TickerColumns::new(self.horizons.len(), prices.len());
        match self.strategy {
            ScanStrategy::Rescan => self.scan_rescan(prices, &mut out),
            ScanStrategy::Sweep => self.scan_sweep(prices, &mut out),
        }
        out
    }
}
