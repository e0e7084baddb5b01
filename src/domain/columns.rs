//! Derived column naming and dense per-row output buffers.
//!
//! Names depend only on horizon labels and 1-based barrier indices, so the
//! output schema is known before any data is scanned. Every buffer holds one
//! slot per panel row, `None` meaning "no value".

use crate::domain::error::FwdScanError;
use std::collections::HashSet;

pub fn pct_above_breach_column(label: &str, barrier: usize) -> String {
    format!("pct_above_breach_{label}_b{barrier}")
}

pub fn pct_below_breach_column(label: &str, barrier: usize) -> String {
    format!("pct_below_breach_{label}_b{barrier}")
}

pub fn mean_breach_price_column(label: &str, barrier: usize) -> String {
    format!("mean_breach_price_{label}_b{barrier}")
}

pub fn forward_std_column(label: &str) -> String {
    format!("fwd_std_{label}")
}

pub fn edge_weight_column(label: &str) -> String {
    format!("edge_weight_{label}")
}

/// Fail with `ColumnCollision` on the first name that repeats, either within
/// `derived` or against `existing`.
pub fn check_collisions<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    derived: impl IntoIterator<Item = &'a str>,
) -> Result<(), FwdScanError> {
    let mut seen: HashSet<&str> = existing.into_iter().collect();
    for name in derived {
        if !seen.insert(name) {
            return Err(FwdScanError::ColumnCollision {
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Ticker-local output: `values[col][i]` for ticker-local index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerColumns {
    values: Vec<Vec<Option<f64>>>,
}

impl TickerColumns {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            values: vec![vec![None; rows]; columns],
        }
    }

    #[inline]
    pub fn set(&mut self, col: usize, i: usize, value: Option<f64>) {
        self.values[col][i] = value;
    }

    pub fn column(&self, col: usize) -> &[Option<f64>] {
        &self.values[col]
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn height(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    /// Append `other`'s columns after this one's.
    pub fn extend(&mut self, other: TickerColumns) {
        self.values.extend(other.values);
    }
}

/// Named, row-indexed columns covering the whole panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    names: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
    rows: usize,
}

impl ColumnSet {
    /// All slots start as `None`.
    pub fn with_rows(names: Vec<String>, rows: usize) -> Self {
        let values = vec![vec![None; rows]; names.len()];
        Self {
            names,
            values,
            rows,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(&self.values[idx])
    }

    pub fn column_at(&self, idx: usize) -> &[Option<f64>] {
        &self.values[idx]
    }

    /// Write a ticker's local buffers to their original row positions.
    /// `rows[i]` is the panel row of ticker-local index `i`.
    pub fn scatter(&mut self, rows: &[usize], local: &TickerColumns) {
        debug_assert_eq!(local.width(), self.width());
        for (col, buffer) in self.values.iter_mut().enumerate() {
            for (i, &row) in rows.iter().enumerate() {
                buffer[row] = local.values[col][i];
            }
        }
    }

    /// Join `other` by row identity.
    pub fn append(&mut self, other: ColumnSet) -> Result<(), FwdScanError> {
        if other.rows != self.rows {
            return Err(FwdScanError::DataSource {
                reason: format!(
                    "cannot join column sets of {} and {} rows",
                    self.rows, other.rows
                ),
            });
        }
        check_collisions(
            self.names.iter().map(String::as_str),
            other.names.iter().map(String::as_str),
        )?;
        self.names.extend(other.names);
        self.values.extend(other.values);
        Ok(())
    }
}
