//! Panel data model: a text table of observations with typed ticker/date/price
//! columns and a ticker partition over row indices.
//!
//! Rows are never reordered. Grouping by ticker is a stable sort of row
//! indices by (ticker, date); every derived value is written back to the
//! original row position, so the caller-visible order is the input order.

use crate::domain::error::FwdScanError;
use crate::domain::observation::Observation;
use chrono::{NaiveDate, NaiveDateTime};
use std::ops::Range;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Untyped table as handed over by a panel source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Names of the three required panel columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSchema {
    pub ticker_column: String,
    pub date_column: String,
    pub price_column: String,
}

impl Default for PanelSchema {
    fn default() -> Self {
        Self {
            ticker_column: "ticker".to_string(),
            date_column: "date".to_string(),
            price_column: "adj_close".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelFrame {
    table: TextTable,
    schema: PanelSchema,
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PanelFrame {
    /// Validate `table` against `schema` and extract the typed columns.
    ///
    /// Fails with `MissingColumn` when a required column is absent and with
    /// `InvalidValue` on an empty ticker, an unparseable date or a missing or
    /// non-finite price.
    pub fn from_table(table: TextTable, schema: PanelSchema) -> Result<Self, FwdScanError> {
        let ticker_col = require_column(&table, &schema.ticker_column)?;
        let date_col = require_column(&table, &schema.date_column)?;
        let price_col = require_column(&table, &schema.price_column)?;

        let height = table.height();
        let mut tickers = Vec::with_capacity(height);
        let mut dates = Vec::with_capacity(height);
        let mut prices = Vec::with_capacity(height);

        for row in 0..height {
            let ticker = table.cell(row, ticker_col).unwrap_or("").trim();
            if ticker.is_empty() {
                return Err(FwdScanError::InvalidValue {
                    row,
                    column: schema.ticker_column.clone(),
                    reason: "empty ticker".to_string(),
                });
            }

            let raw_date = table.cell(row, date_col).unwrap_or("").trim();
            let date = parse_date(raw_date).ok_or_else(|| FwdScanError::InvalidValue {
                row,
                column: schema.date_column.clone(),
                reason: format!("unrecognised date '{raw_date}'"),
            })?;

            let raw_price = table.cell(row, price_col).unwrap_or("").trim();
            let price = raw_price
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| FwdScanError::InvalidValue {
                    row,
                    column: schema.price_column.clone(),
                    reason: format!("expected a finite number, got '{raw_price}'"),
                })?;

            tickers.push(ticker.to_string());
            dates.push(date);
            prices.push(price);
        }

        Ok(Self {
            table,
            schema,
            tickers,
            dates,
            prices,
        })
    }

    /// Build a three-column panel (default schema) from observations.
    pub fn from_observations(observations: &[Observation]) -> Result<Self, FwdScanError> {
        let schema = PanelSchema::default();
        let headers = vec![
            schema.ticker_column.clone(),
            schema.date_column.clone(),
            schema.price_column.clone(),
        ];
        let rows = observations
            .iter()
            .map(|obs| {
                vec![
                    obs.ticker.clone(),
                    obs.date.format("%Y-%m-%d").to_string(),
                    obs.price.to_string(),
                ]
            })
            .collect();
        Self::from_table(TextTable::new(headers, rows), schema)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn table(&self) -> &TextTable {
        &self.table
    }

    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn observation(&self, row: usize) -> Option<Observation> {
        Some(Observation::new(
            self.tickers.get(row)?.clone(),
            *self.dates.get(row)?,
            *self.prices.get(row)?,
        ))
    }

    /// Group row indices by ticker, each group ordered by date.
    ///
    /// Groups come out in ascending ticker order. A repeated date within a
    /// ticker is a `DuplicateDate` error.
    pub fn partition(&self) -> Result<TickerPartition, FwdScanError> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.tickers[a]
                .cmp(&self.tickers[b])
                .then(self.dates[a].cmp(&self.dates[b]))
        });

        let mut ranges = Vec::new();
        let mut start = 0;
        for pos in 1..=order.len() {
            let boundary =
                pos == order.len() || self.tickers[order[pos]] != self.tickers[order[start]];
            if !boundary {
                let (prev, cur) = (order[pos - 1], order[pos]);
                if self.dates[prev] == self.dates[cur] {
                    return Err(FwdScanError::DuplicateDate {
                        ticker: self.tickers[cur].clone(),
                        date: self.dates[cur],
                    });
                }
                continue;
            }
            if pos > start {
                ranges.push(start..pos);
            }
            start = pos;
        }

        Ok(TickerPartition { order, ranges })
    }
}

fn require_column(table: &TextTable, name: &str) -> Result<usize, FwdScanError> {
    table
        .column_index(name)
        .ok_or_else(|| FwdScanError::MissingColumn {
            column: name.to_string(),
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Row indices sorted by (ticker, date) plus the contiguous range of each
/// ticker inside that order.
#[derive(Debug, Clone)]
pub struct TickerPartition {
    order: Vec<usize>,
    ranges: Vec<Range<usize>>,
}

impl TickerPartition {
    pub fn ticker_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn groups<'a>(&'a self, panel: &'a PanelFrame) -> Vec<TickerGroup<'a>> {
        self.ranges
            .iter()
            .map(|range| {
                let rows = &self.order[range.clone()];
                TickerGroup {
                    ticker: &panel.tickers[rows[0]],
                    rows,
                    prices: rows.iter().map(|&r| panel.prices[r]).collect(),
                }
            })
            .collect()
    }
}

/// One ticker's rows, in date order, with their prices gathered contiguously.
#[derive(Debug, Clone)]
pub struct TickerGroup<'a> {
    pub ticker: &'a str,
    /// Original row positions; `rows[i]` is the row of ticker-local index `i`.
    pub rows: &'a [usize],
    pub prices: Vec<f64>,
}

impl TickerGroup<'_> {
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
