//! Single panel observation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub ticker: String,
    pub date: NaiveDate,
    /// Adjusted close.
    pub price: f64,
}

impl Observation {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            price,
        }
    }
}
