//! Forward window scanner.
//!
//! For ticker-local index `i` of a series of length `n` and nominal window
//! `w`, the forward window is `P[i .. i + L)` with `L = min(n - i, w)`. The
//! window always contains `P[i]`; near the end of the series it is shorter
//! than `w`, and its length says so.

use std::num::NonZeroUsize;

/// Available forward length at `i`. `i` must be `< n`; any `window` is safe,
/// including `usize::MAX`.
#[inline]
pub fn available_len(n: usize, i: usize, window: usize) -> usize {
    (n - i).min(window)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardWindow<'a> {
    pub start: usize,
    pub prices: &'a [f64],
}

impl ForwardWindow<'_> {
    /// Available length `L`, never zero.
    pub(crate) fn len(&self) -> usize {
        self.prices.len()
    }

    /// `P[i]`, the window's own starting price.
    pub fn opening_price(&self) -> f64 {
        self.prices[0]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForwardWindowScanner<'a> {
    prices: &'a [f64],
    window: NonZeroUsize,
}

impl<'a> ForwardWindowScanner<'a> {
    pub fn new(prices: &'a [f64], window: NonZeroUsize) -> Self {
        Self { prices, window }
    }

    pub fn series_len(&self) -> usize {
        self.prices.len()
    }

    pub fn window_at(&self, i: usize) -> Option<ForwardWindow<'a>> {
        let n = self.prices.len();
        if i >= n {
            return None;
        }
        let len = available_len(n, i, self.window.get());
        Some(ForwardWindow {
            start: i,
            prices: &self.prices[i..i + len],
        })
    }

    pub fn iter(&self) -> ForwardWindows<'a> {
        ForwardWindows {
            scanner: *self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for ForwardWindowScanner<'a> {
    type Item = ForwardWindow<'a>;
    type IntoIter = ForwardWindows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ForwardWindows<'a> {
    scanner: ForwardWindowScanner<'a>,
    next: usize,
}

impl<'a> Iterator for ForwardWindows<'a> {
    type Item = ForwardWindow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.scanner.window_at(self.next)?;
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.scanner.series_len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ForwardWindows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: [f64; 5] = [100.0, 95.0, 90.0, 110.0, 105.0];

    fn scanner(prices: &[f64], window: usize) -> ForwardWindowScanner<'_> {
        ForwardWindowScanner::new(prices, NonZeroUsize::new(window).unwrap())
    }

    #[test]
    fn windows_clamp_at_series_end() {
        let scanner = scanner(&PRICES, 3);
        let lens: Vec<usize> = scanner.iter().map(|w| w.len()).collect();
        assert_eq!(lens, vec![3, 3, 3, 2, 1]);

        let w0 = scanner.window_at(0).unwrap();
        assert_eq!(w0.prices, &[100.0, 95.0, 90.0]);

        let w3 = scanner.window_at(3).unwrap();
        assert_eq!(w3.start, 3);
        assert_eq!(w3.prices, &[110.0, 105.0]);
        assert!((w3.opening_price() - 110.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_observation_has_length_one() {
        for w in 1..8 {
            assert_eq!(scanner(&PRICES, w).window_at(4).unwrap().len(), 1);
        }
    }

    #[test]
    fn window_longer_than_series() {
        let w = scanner(&PRICES, 50).window_at(0).unwrap();
        assert_eq!(w.len(), 5);
    }

    #[test]
    fn window_of_usize_max_does_not_overflow() {
        let scanner = scanner(&PRICES, usize::MAX);
        let lens: Vec<usize> = scanner.iter().map(|w| w.len()).collect();
        assert_eq!(lens, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn empty_series_yields_nothing() {
        let scanner = scanner(&[], 3);
        assert_eq!(scanner.iter().count(), 0);
        assert!(scanner.window_at(0).is_none());
    }

    #[test]
    fn iterator_is_exact_size() {
        let mut it = scanner(&PRICES, 2).iter();
        assert_eq!(it.len(), 5);
        it.next();
        assert_eq!(it.len(), 4);
    }

    #[test]
    fn available_len_matches_definition() {
        assert_eq!(available_len(5, 0, 3), 3);
        assert_eq!(available_len(5, 3, 3), 2);
        assert_eq!(available_len(5, 4, 3), 1);
        assert_eq!(available_len(1, 0, 63), 1);
        assert_eq!(available_len(5, 1, usize::MAX), 4);
    }
}
