//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for fwdscan.
#[derive(Debug, thiserror::Error)]
pub enum FwdScanError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("panel is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("derived column '{column}' collides with an existing column")]
    ColumnCollision { column: String },

    #[error("invalid value in row {row}, column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("duplicate date {date} for ticker {ticker}")]
    DuplicateDate { ticker: String, date: NaiveDate },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("analysis cancelled after {completed} of {total} tickers")]
    Cancelled { completed: usize, total: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FwdScanError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        FwdScanError::Configuration {
            reason: reason.into(),
        }
    }

    /// True for errors that reflect a malformed input panel.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            FwdScanError::MissingColumn { .. }
                | FwdScanError::ColumnCollision { .. }
                | FwdScanError::InvalidValue { .. }
                | FwdScanError::DuplicateDate { .. }
        )
    }

    /// True for errors that reflect bad run configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            FwdScanError::ConfigParse { .. }
                | FwdScanError::ConfigMissing { .. }
                | FwdScanError::ConfigInvalid { .. }
                | FwdScanError::Configuration { .. }
        )
    }
}

impl From<&FwdScanError> for std::process::ExitCode {
    fn from(err: &FwdScanError) -> Self {
        let code: u8 = match err {
            FwdScanError::Io(_) => 1,
            FwdScanError::ConfigParse { .. }
            | FwdScanError::ConfigMissing { .. }
            | FwdScanError::ConfigInvalid { .. }
            | FwdScanError::Configuration { .. } => 2,
            FwdScanError::DataSource { .. } => 3,
            FwdScanError::MissingColumn { .. }
            | FwdScanError::ColumnCollision { .. }
            | FwdScanError::InvalidValue { .. }
            | FwdScanError::DuplicateDate { .. } => 4,
            FwdScanError::Cancelled { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let schema = FwdScanError::MissingColumn {
            column: "adj_close".into(),
        };
        assert!(schema.is_schema_error());
        assert!(!schema.is_configuration_error());

        let config = FwdScanError::configuration("at least one barrier level is required");
        assert!(config.is_configuration_error());
        assert!(!config.is_schema_error());

        let cancelled = FwdScanError::Cancelled {
            completed: 1,
            total: 3,
        };
        assert!(!cancelled.is_schema_error());
        assert!(!cancelled.is_configuration_error());
    }

    #[test]
    fn display_messages() {
        let err = FwdScanError::DuplicateDate {
            ticker: "X".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        assert_eq!(err.to_string(), "duplicate date 2024-01-02 for ticker X");

        let err = FwdScanError::ConfigInvalid {
            section: "barriers".into(),
            key: "levels".into(),
            reason: "not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [barriers] levels: not a number"
        );
    }
}
