//! Forward horizons: labelled window lengths in trading days.

use crate::domain::error::FwdScanError;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;

pub const DEFAULT_TRADING_DAYS_PER_YEAR: u32 = 252;
pub const DEFAULT_TRADING_DAYS_PER_MONTH: u32 = 21;
pub const DEFAULT_HORIZON_MONTHS: &[u32] = &[3, 6, 9, 12, 15, 18, 24];

/// Which constant converts months into trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayCountBasis {
    /// `trunc(months * trading_days_per_year / 12)`
    #[default]
    PerYear,
    /// `months * trading_days_per_month`
    PerMonth,
}

impl DayCountBasis {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "year" | "per_year" => Some(DayCountBasis::PerYear),
            "month" | "per_month" => Some(DayCountBasis::PerMonth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingCalendar {
    pub trading_days_per_year: u32,
    pub trading_days_per_month: u32,
    pub basis: DayCountBasis,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self {
            trading_days_per_year: DEFAULT_TRADING_DAYS_PER_YEAR,
            trading_days_per_month: DEFAULT_TRADING_DAYS_PER_MONTH,
            basis: DayCountBasis::PerYear,
        }
    }
}

impl TradingCalendar {
    pub fn validate(&self) -> Result<(), FwdScanError> {
        if self.trading_days_per_year == 0 {
            return Err(FwdScanError::configuration(
                "trading_days_per_year must be positive",
            ));
        }
        if self.trading_days_per_month == 0 {
            return Err(FwdScanError::configuration(
                "trading_days_per_month must be positive",
            ));
        }
        Ok(())
    }

    /// Window length for a horizon of `months`, truncated toward zero.
    pub fn window_days(&self, months: u32) -> usize {
        match self.basis {
            DayCountBasis::PerYear => {
                (u64::from(months) * u64::from(self.trading_days_per_year) / 12) as usize
            }
            DayCountBasis::PerMonth => {
                (u64::from(months) * u64::from(self.trading_days_per_month)) as usize
            }
        }
    }
}

/// How a horizon was requested in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HorizonSpec {
    Months { label: Option<String>, months: u32 },
    Days { label: String, window_days: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HorizonConfig {
    /// Normalised label; appears verbatim in output column names.
    pub label: String,
    pub window_days: usize,
}

impl fmt::Display for HorizonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} days)", self.label, self.window_days)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorizonSet {
    horizons: Vec<HorizonConfig>,
    /// `horizons[h].window_days`, proven non-zero at construction.
    windows: Vec<NonZeroUsize>,
}

impl HorizonSet {
    /// Validate and normalise an explicit list of horizons.
    ///
    /// Labels are slugged with [`normalize_label`]; the set must be non-empty,
    /// unique by normalised label, and every window at least one day.
    pub fn new(horizons: Vec<HorizonConfig>) -> Result<Self, FwdScanError> {
        if horizons.is_empty() {
            return Err(FwdScanError::configuration(
                "at least one horizon must be configured",
            ));
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(horizons.len());
        let mut windows = Vec::with_capacity(horizons.len());
        for h in horizons {
            let label = normalize_label(&h.label);
            if label.is_empty() {
                return Err(FwdScanError::configuration(format!(
                    "horizon label '{}' is empty after normalisation",
                    h.label
                )));
            }
            let Some(window) = NonZeroUsize::new(h.window_days) else {
                return Err(FwdScanError::configuration(format!(
                    "horizon '{label}' has a window of 0 trading days"
                )));
            };
            if !seen.insert(label.clone()) {
                return Err(FwdScanError::configuration(format!(
                    "duplicate horizon label '{label}'"
                )));
            }
            normalized.push(HorizonConfig {
                label,
                window_days: h.window_days,
            });
            windows.push(window);
        }

        Ok(Self {
            horizons: normalized,
            windows,
        })
    }

    /// Resolve month- and day-based specs against a trading calendar.
    pub fn resolve(
        specs: &[HorizonSpec],
        calendar: &TradingCalendar,
    ) -> Result<Self, FwdScanError> {
        calendar.validate()?;
        let horizons = specs
            .iter()
            .map(|spec| match spec {
                HorizonSpec::Months { label, months } => HorizonConfig {
                    label: label.clone().unwrap_or_else(|| format!("{months}mos")),
                    window_days: calendar.window_days(*months),
                },
                HorizonSpec::Days { label, window_days } => HorizonConfig {
                    label: label.clone(),
                    window_days: *window_days,
                },
            })
            .collect();
        Self::new(horizons)
    }

    pub fn from_months(months: &[u32], calendar: &TradingCalendar) -> Result<Self, FwdScanError> {
        let specs: Vec<HorizonSpec> = months
            .iter()
            .map(|&m| HorizonSpec::Months {
                label: None,
                months: m,
            })
            .collect();
        Self::resolve(&specs, calendar)
    }

    pub fn len(&self) -> usize {
        self.horizons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizons.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HorizonConfig> {
        self.horizons.iter()
    }

    /// Window lengths in horizon order.
    pub fn windows(&self) -> &[NonZeroUsize] {
        &self.windows
    }
}

impl<'a> IntoIterator for &'a HorizonSet {
    type Item = &'a HorizonConfig;
    type IntoIter = std::slice::Iter<'a, HorizonConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.horizons.iter()
    }
}

/// Lowercase; runs of characters outside `[a-z0-9]` collapse to a single `_`;
/// leading and trailing underscores are dropped. `"3 Months"` → `"3_months"`.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_sep = false;
    for ch in label.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    out
}
