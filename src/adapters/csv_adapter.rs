//! CSV panel adapter: reads a panel file and writes the annotated panel.
//!
//! Missing derived values are written as empty cells; present values use the
//! shortest representation that round-trips through `f64` parsing.

use crate::domain::analysis::AnnotatedPanel;
use crate::domain::error::FwdScanError;
use crate::domain::panel::TextTable;
use crate::ports::panel_port::{PanelSink, PanelSource};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvPanelAdapter {
    path: PathBuf,
}

impl CsvPanelAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Parse CSV text whose first record is the header row.
pub fn parse_table(content: &str) -> Result<TextTable, FwdScanError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| FwdScanError::DataSource {
            reason: format!("CSV header error: {}", e),
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| FwdScanError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(TextTable::new(headers, rows))
}

/// Write `panel` as CSV: input cells verbatim, derived values after.
pub fn write_table<W: io::Write>(writer: W, panel: &AnnotatedPanel) -> Result<(), FwdScanError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(panel.headers()).map_err(io::Error::from)?;

    let table = panel.panel().table();
    let derived = panel.derived();
    for (row, cells) in table.rows.iter().enumerate() {
        let mut record: Vec<String> = cells.clone();
        record.extend((0..derived.width()).map(|c| format_value(derived.column_at(c)[row])));
        wtr.write_record(&record).map_err(io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

impl PanelSource for CsvPanelAdapter {
    fn load_table(&self) -> Result<TextTable, FwdScanError> {
        let content = fs::read_to_string(&self.path).map_err(|e| FwdScanError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let table = parse_table(&content)?;
        debug!(
            path = %self.path.display(),
            rows = table.height(),
            columns = table.headers.len(),
            "panel loaded"
        );
        Ok(table)
    }
}

impl PanelSink for CsvPanelAdapter {
    fn write(&self, panel: &AnnotatedPanel) -> Result<(), FwdScanError> {
        let file = fs::File::create(&self.path)?;
        write_table(io::BufWriter::new(file), panel)?;
        debug!(path = %self.path.display(), rows = panel.len(), "panel written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{AnalysisConfig, analyze};
    use crate::domain::horizon::HorizonSpec;
    use tempfile::TempDir;

    const PANEL: &str = "ticker,date,adj_close,volume\n\
        X,2024-01-01,100,10\n\
        X,2024-01-02,95,11\n\
        X,2024-01-03,90,12\n\
        X,2024-01-04,110,13\n\
        X,2024-01-05,105,14\n";

    fn three_day_config() -> AnalysisConfig {
        AnalysisConfig {
            horizons: vec![HorizonSpec::Days {
                label: "3d".into(),
                window_days: 3,
            }],
            barrier_levels: vec![0.95],
            parallel: false,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn parse_table_reads_headers_and_rows() {
        let table = parse_table(PANEL).unwrap();
        assert_eq!(table.headers, vec!["ticker", "date", "adj_close", "volume"]);
        assert_eq!(table.height(), 5);
        assert_eq!(table.cell(3, 2), Some("110"));
    }

    #[test]
    fn parse_table_strips_byte_order_mark() {
        let table = parse_table("\u{feff}ticker,date,adj_close\nA,2024-01-01,1\n").unwrap();
        assert_eq!(table.headers[0], "ticker");
    }

    #[test]
    fn ragged_rows_are_a_data_source_error() {
        let err = parse_table("ticker,date,adj_close\nA,2024-01-01\n").unwrap_err();
        assert!(matches!(err, FwdScanError::DataSource { .. }));
    }

    #[test]
    fn load_table_reports_missing_file() {
        let adapter = CsvPanelAdapter::new(PathBuf::from("/nonexistent/panel.csv"));
        let err = adapter.load_table().unwrap_err();
        assert!(matches!(err, FwdScanError::DataSource { reason } if reason.contains("panel.csv")));
    }

    #[test]
    fn format_value_leaves_missing_cells_empty() {
        assert_eq!(format_value(None), "");
        assert_eq!(format_value(Some(0.5)), "0.5");
        assert_eq!(format_value(Some(100.0)), "100");
    }

    #[test]
    fn round_trip_through_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("panel.csv");
        let output = dir.path().join("annotated.csv");
        fs::write(&input, PANEL).unwrap();

        let table = CsvPanelAdapter::new(input).load_table().unwrap();
        let annotated = analyze(table, &three_day_config()).unwrap();
        CsvPanelAdapter::new(output.clone()).write(&annotated).unwrap();

        let written = parse_table(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            written.headers,
            vec![
                "ticker",
                "date",
                "adj_close",
                "volume",
                "pct_above_breach_3d_b1",
                "pct_below_breach_3d_b1",
                "mean_breach_price_3d_b1",
                "fwd_std_3d",
                "edge_weight_3d",
            ]
        );
        assert_eq!(written.height(), 5);
        // input cells pass through untouched
        assert_eq!(written.rows[4][..4], ["X", "2024-01-05", "105", "14"]);

        // row 0: window [100, 95, 90] opening at 100, barrier price 95
        let row0 = &written.rows[0];
        assert_eq!(row0[4].parse::<f64>().unwrap(), 1.0 / 3.0);
        assert_eq!(row0[5].parse::<f64>().unwrap(), 1.0 / 3.0);
        assert_eq!(row0[6], "90");
        assert_eq!(row0[7], "5");
        assert_eq!(row0[8], "1");

        // last row: single-point window, no breach, no volatility
        let last = &written.rows[4];
        assert_eq!(last[4], "1");
        assert_eq!(last[5], "0");
        assert_eq!(last[6], "");
        assert_eq!(last[7], "");
        assert_eq!(last[8].parse::<f64>().unwrap(), 1.0 / 3.0);
    }
}
