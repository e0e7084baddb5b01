//! Error-compensated floating-point accumulation.
//!
//! A total is held as the unevaluated pair `hi + lo`: every update folds its
//! rounding error (recovered exactly with TwoSum or a fused multiply-add)
//! into `lo`. Differences of two large totals then keep an absolute error
//! near `eps * |difference|` rather than `eps * |total|`, which is what the
//! sliding-window sweeps rely on when they subtract one suffix from another.

use std::ops::{AddAssign, SubAssign};

/// `a + b` and its exact rounding error.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    (s, (a - (s - bb)) + (b - bb))
}

/// `a * b` and its exact rounding error.
#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    hi: f64,
    lo: f64,
}

impl CompensatedSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64) {
        let (s, e) = two_sum(self.hi, x);
        self.hi = s;
        self.lo += e;
    }

    pub fn sub(&mut self, x: f64) {
        self.add(-x);
    }

    /// Accumulate `a * b` without rounding the product first.
    pub fn add_product(&mut self, a: f64, b: f64) {
        let (p, e) = two_prod(a, b);
        self.add(p);
        self.lo += e;
    }

    pub fn sub_product(&mut self, a: f64, b: f64) {
        self.add_product(-a, b);
    }

    /// `k * self`, still compensated.
    pub fn scaled(&self, k: f64) -> Self {
        let (p, e) = two_prod(self.hi, k);
        Self {
            hi: p,
            lo: e + self.lo * k,
        }
    }

    /// `self * self`, dropping the `lo * lo` term.
    pub fn squared(&self) -> Self {
        let (p, e) = two_prod(self.hi, self.hi);
        Self {
            hi: p,
            lo: e + 2.0 * self.hi * self.lo,
        }
    }

    pub fn value(&self) -> f64 {
        self.hi + self.lo
    }
}

impl AddAssign for CompensatedSum {
    fn add_assign(&mut self, rhs: Self) {
        self.add(rhs.hi);
        self.lo += rhs.lo;
    }
}

impl SubAssign for CompensatedSum {
    fn sub_assign(&mut self, rhs: Self) {
        self.add(-rhs.hi);
        self.lo -= rhs.lo;
    }
}

impl From<f64> for CompensatedSum {
    fn from(value: f64) -> Self {
        Self { hi: value, lo: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_digits_lost_by_naive_addition() {
        let mut naive = 1e16;
        let mut sum = CompensatedSum::from(1e16);
        for _ in 0..10 {
            naive += 1.0;
            sum.add(1.0);
        }
        sum.sub(1e16);
        assert_eq!(naive - 1e16, 0.0);
        assert_eq!(sum.value(), 10.0);
    }

    #[test]
    fn difference_of_large_totals_is_exact() {
        let mut a = CompensatedSum::new();
        let mut b = CompensatedSum::new();
        for k in 0..1000 {
            let p = 1e6 + 0.01 * f64::from(k % 7);
            a.add(p);
            if k >= 10 {
                b.add(p);
            }
        }
        a -= b;
        let expected: f64 = (0..10).map(|k| 1e6 + 0.01 * f64::from(k % 7)).sum();
        assert!((a.value() - expected).abs() <= expected * 1e-13);
    }

    #[test]
    fn products_keep_their_rounding_error() {
        let x = 1.0 + f64::EPSILON;
        let mut sum = CompensatedSum::new();
        sum.add_product(x, x);
        sum.sub(1.0);
        sum.sub(2.0 * f64::EPSILON);
        // (1 + e)^2 - 1 - 2e = e^2, lost entirely by a rounded product
        assert_eq!(sum.value(), f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn scaled_and_squared() {
        let mut s = CompensatedSum::from(3.0);
        s.add(0.5);
        assert_eq!(s.scaled(4.0).value(), 14.0);
        assert_eq!(s.squared().value(), 12.25);

        s.sub_product(0.5, 1.0);
        assert_eq!(s.value(), 3.0);
    }
}
