//! Barrier levels as fractions of the window's opening price.
//!
//! Levels keep the order in which they were supplied; the 1-based position is
//! the barrier's identity in output column names.

use crate::domain::error::FwdScanError;

pub const DEFAULT_BARRIER_LEVELS: &[f64] = &[0.85, 0.80, 0.75, 0.70];

#[derive(Debug, Clone, PartialEq)]
pub struct BarrierSet {
    levels: Vec<f64>,
}

impl BarrierSet {
    pub fn new(levels: Vec<f64>) -> Result<Self, FwdScanError> {
        if levels.is_empty() {
            return Err(FwdScanError::configuration(
                "at least one barrier level must be provided",
            ));
        }
        for (i, &level) in levels.iter().enumerate() {
            if !level.is_finite() || level <= 0.0 {
                return Err(FwdScanError::configuration(format!(
                    "barrier {} has level {level}; levels must be positive",
                    i + 1
                )));
            }
        }
        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// `(index, level)` pairs with 1-based indices.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.levels.iter().enumerate().map(|(i, &b)| (i + 1, b))
    }
}
