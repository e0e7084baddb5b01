#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use fwdscan::domain::analysis::{AnalysisConfig, AnnotatedPanel};
use fwdscan::domain::engine::ScanStrategy;
use fwdscan::domain::error::FwdScanError;
use fwdscan::domain::horizon::HorizonSpec;
use fwdscan::domain::panel::TextTable;
use fwdscan::ports::panel_port::{PanelSink, PanelSource};
use std::cell::RefCell;
use std::io::Write;

pub const HEADERS: [&str; 3] = ["ticker", "date", "adj_close"];

pub fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
}

/// Build a panel table from `(ticker, day offset, price)` triples.
pub fn make_table(rows: &[(&str, u64, f64)]) -> TextTable {
    TextTable::new(
        HEADERS.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|(t, d, p)| vec![t.to_string(), day(*d).to_string(), p.to_string()])
            .collect(),
    )
}

/// Deterministic wavy price path for one ticker.
pub fn price_path(seed: u64, len: usize) -> Vec<f64> {
    let phase = seed as f64 * 0.7;
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 8.0 * (t * 0.31 + phase).sin() + 3.0 * (t * 0.07 + phase).cos()
        })
        .collect()
}

/// Multi-ticker table with rows interleaved by date, so every ticker's rows
/// are scattered through the table.
pub fn interleaved_table(tickers: &[&str], len: usize) -> TextTable {
    let paths: Vec<Vec<f64>> = (0..tickers.len())
        .map(|k| price_path(k as u64, len))
        .collect();
    let mut rows = Vec::new();
    for d in 0..len {
        for (k, t) in tickers.iter().enumerate() {
            rows.push((*t, d as u64, paths[k][d]));
        }
    }
    make_table(&rows)
}

pub fn day_horizons(windows: &[usize]) -> Vec<HorizonSpec> {
    windows
        .iter()
        .map(|&w| HorizonSpec::Days {
            label: format!("{w}d"),
            window_days: w,
        })
        .collect()
}

pub fn small_config(windows: &[usize], barriers: &[f64], strategy: ScanStrategy) -> AnalysisConfig {
    AnalysisConfig {
        horizons: day_horizons(windows),
        barrier_levels: barriers.to_vec(),
        strategy,
        parallel: false,
        ..AnalysisConfig::default()
    }
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    write_temp_file(content, ".ini")
}

pub fn table_to_csv(table: &TextTable) -> String {
    let mut out = table.headers.join(",");
    out.push('\n');
    for row in &table.rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub struct MockPanelSource {
    pub table: TextTable,
    pub error: Option<String>,
}

impl MockPanelSource {
    pub fn new(table: TextTable) -> Self {
        Self { table, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: TextTable::default(),
            error: Some(reason.to_string()),
        }
    }
}

impl PanelSource for MockPanelSource {
    fn load_table(&self) -> Result<TextTable, FwdScanError> {
        match &self.error {
            Some(reason) => Err(FwdScanError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(self.table.clone()),
        }
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub written: RefCell<Option<AnnotatedPanel>>,
}

impl PanelSink for MemorySink {
    fn write(&self, panel: &AnnotatedPanel) -> Result<(), FwdScanError> {
        *self.written.borrow_mut() = Some(panel.clone());
        Ok(())
    }
}
