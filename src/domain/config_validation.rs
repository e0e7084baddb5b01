//! Build and validate an [`AnalysisConfig`] from a configuration source.
//!
//! Sections and keys:
//! - `[panel]` ticker_column, date_column, price_column
//! - `[horizons]` months, days, trading_days_per_year, trading_days_per_month, basis
//! - `[barriers]` levels
//! - `[engine]` strategy, parallel
//!
//! Malformed values are `ConfigInvalid`; semantic problems (no barriers,
//! windows truncating to zero) surface from [`AnalysisConfig::resolve`].

use crate::domain::analysis::{AnalysisConfig, AnalysisPlan};
use crate::domain::engine::ScanStrategy;
use crate::domain::error::FwdScanError;
use crate::domain::horizon::{DEFAULT_HORIZON_MONTHS, DayCountBasis, HorizonSpec, TradingCalendar};
use crate::domain::panel::PanelSchema;
use crate::ports::config_port::ConfigPort;

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, FwdScanError> {
    let defaults = AnalysisConfig::default();
    Ok(AnalysisConfig {
        schema: build_schema(config),
        horizons: build_horizon_specs(config)?,
        calendar: build_calendar(config)?,
        barrier_levels: build_barrier_levels(config)?,
        strategy: build_strategy(config)?,
        parallel: config.get_bool("engine", "parallel", defaults.parallel),
    })
}

/// Build the config and resolve it, surfacing every configuration error.
pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisPlan, FwdScanError> {
    build_analysis_config(config)?.resolve()
}

fn build_schema(config: &dyn ConfigPort) -> PanelSchema {
    let defaults = PanelSchema::default();
    let read = |key: &str, default: String| {
        config
            .get_string("panel", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
    };
    PanelSchema {
        ticker_column: read("ticker_column", defaults.ticker_column),
        date_column: read("date_column", defaults.date_column),
        price_column: read("price_column", defaults.price_column),
    }
}

fn build_horizon_specs(config: &dyn ConfigPort) -> Result<Vec<HorizonSpec>, FwdScanError> {
    let months = config.get_string("horizons", "months");
    let days = config.get_string("horizons", "days");

    let mut specs = Vec::new();
    match (&months, &days) {
        (None, None) => {
            specs.extend(DEFAULT_HORIZON_MONTHS.iter().map(|&m| HorizonSpec::Months {
                label: None,
                months: m,
            }));
        }
        _ => {
            if let Some(raw) = months {
                for token in split_list(&raw) {
                    specs.push(parse_month_spec(token)?);
                }
            }
            if let Some(raw) = days {
                for token in split_list(&raw) {
                    specs.push(parse_day_spec(token)?);
                }
            }
        }
    }
    Ok(specs)
}

/// `months` or `label:months`
fn parse_month_spec(token: &str) -> Result<HorizonSpec, FwdScanError> {
    let (label, months) = match token.split_once(':') {
        Some((label, months)) => (Some(label.trim().to_string()), months.trim()),
        None => (None, token),
    };
    let months = months.parse::<u32>().map_err(|_| {
        invalid("horizons", "months", format!("'{months}' is not a whole number of months"))
    })?;
    Ok(HorizonSpec::Months { label, months })
}

/// `label:window_days`
fn parse_day_spec(token: &str) -> Result<HorizonSpec, FwdScanError> {
    let (label, window) = token.split_once(':').ok_or_else(|| {
        invalid("horizons", "days", format!("'{token}' must look like label:window_days"))
    })?;
    let window_days = window.trim().parse::<usize>().map_err(|_| {
        invalid("horizons", "days", format!("'{}' is not a whole number of days", window.trim()))
    })?;
    Ok(HorizonSpec::Days {
        label: label.trim().to_string(),
        window_days,
    })
}

fn build_calendar(config: &dyn ConfigPort) -> Result<TradingCalendar, FwdScanError> {
    let defaults = TradingCalendar::default();
    let basis = match config.get_string("horizons", "basis") {
        None => defaults.basis,
        Some(raw) => DayCountBasis::parse(&raw).ok_or_else(|| {
            invalid("horizons", "basis", format!("'{}' is not one of year, month", raw.trim()))
        })?,
    };
    Ok(TradingCalendar {
        trading_days_per_year: read_positive(
            config,
            "trading_days_per_year",
            defaults.trading_days_per_year,
        )?,
        trading_days_per_month: read_positive(
            config,
            "trading_days_per_month",
            defaults.trading_days_per_month,
        )?,
        basis,
    })
}

fn read_positive(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, FwdScanError> {
    let Some(raw) = config.get_string("horizons", key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid(
            "horizons",
            key,
            format!("{key} must be a positive integer, got '{}'", raw.trim()),
        )),
    }
}

fn build_barrier_levels(config: &dyn ConfigPort) -> Result<Vec<f64>, FwdScanError> {
    let raw = config
        .get_string("barriers", "levels")
        .ok_or_else(|| FwdScanError::ConfigMissing {
            section: "barriers".to_string(),
            key: "levels".to_string(),
        })?;
    split_list(&raw)
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| invalid("barriers", "levels", format!("'{token}' is not a number")))
        })
        .collect()
}

fn build_strategy(config: &dyn ConfigPort) -> Result<ScanStrategy, FwdScanError> {
    match config.get_string("engine", "strategy") {
        None => Ok(ScanStrategy::default()),
        Some(raw) => ScanStrategy::parse(&raw).ok_or_else(|| {
            invalid("engine", "strategy", format!("'{}' is not one of rescan, sweep", raw.trim()))
        }),
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn invalid(section: &str, key: &str, reason: String) -> FwdScanError {
    FwdScanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
