//! Binary indexed tree over price ranks, tracking count and sum of the prices
//! inserted so far. Used by the sweep strategy to answer "how many of the
//! prices in `P[s..n)` are below `t`, and what do they sum to" in `O(log n)`.
//! Sums are compensated so that two suffix queries can be subtracted without
//! losing the small window total to cancellation.

use crate::domain::compensated::CompensatedSum;

#[derive(Debug, Clone)]
pub struct RankedFenwick {
    /// Distinct prices, ascending.
    sorted: Vec<f64>,
    counts: Vec<u32>,
    sums: Vec<CompensatedSum>,
}

impl RankedFenwick {
    pub fn new(prices: &[f64]) -> Self {
        let mut sorted = prices.to_vec();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();
        let size = sorted.len();
        Self {
            sorted,
            counts: vec![0; size + 1],
            sums: vec![CompensatedSum::new(); size + 1],
        }
    }

    /// Number of distinct prices strictly below `threshold`.
    fn rank_below(&self, threshold: f64) -> usize {
        self.sorted.partition_point(|&v| v < threshold)
    }

    /// `price` must be one of the prices the tree was built from.
    pub fn insert(&mut self, price: f64) {
        let mut idx = self.rank_below(price) + 1;
        while idx < self.counts.len() {
            self.counts[idx] += 1;
            self.sums[idx].add(price);
            idx += idx & idx.wrapping_neg();
        }
    }

    /// Count and sum of inserted prices strictly below `threshold`.
    pub fn below(&self, threshold: f64) -> (u32, CompensatedSum) {
        let mut idx = self.rank_below(threshold);
        let mut count = 0;
        let mut sum = CompensatedSum::new();
        while idx > 0 {
            count += self.counts[idx];
            sum += self.sums[idx];
            idx &= idx - 1;
        }
        (count, sum)
    }
}
