//! Analysis driver: configuration resolution, per-ticker scheduling and
//! row-identity merge of every engine's columns.
//!
//! Configuration and schema problems are reported before any ticker is
//! scanned. Each ticker is one unit of work; with the `parallel` feature the
//! units run on the rayon pool, and each returns its own buffers, which are
//! then scattered to their original row positions in ticker order. A
//! [`CancelToken`] is polled at the start of every unit, never mid-ticker.

use crate::domain::barrier::{BarrierSet, DEFAULT_BARRIER_LEVELS};
use crate::domain::breach::BarrierBreachEngine;
use crate::domain::columns::{ColumnSet, TickerColumns, check_collisions};
use crate::domain::edge_weight::EdgeWeightEngine;
use crate::domain::engine::{ForwardEngine, ScanStrategy};
use crate::domain::error::FwdScanError;
use crate::domain::horizon::{DEFAULT_HORIZON_MONTHS, HorizonSet, HorizonSpec, TradingCalendar};
use crate::domain::panel::{PanelFrame, PanelSchema, TextTable, TickerGroup};
use crate::domain::volatility::ForwardVolatilityEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run configuration as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub schema: PanelSchema,
    pub horizons: Vec<HorizonSpec>,
    pub calendar: TradingCalendar,
    pub barrier_levels: Vec<f64>,
    pub strategy: ScanStrategy,
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema: PanelSchema::default(),
            horizons: DEFAULT_HORIZON_MONTHS
                .iter()
                .map(|&months| HorizonSpec::Months {
                    label: None,
                    months,
                })
                .collect(),
            calendar: TradingCalendar::default(),
            barrier_levels: DEFAULT_BARRIER_LEVELS.to_vec(),
            strategy: ScanStrategy::default(),
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Validate and resolve into an executable plan.
    pub fn resolve(&self) -> Result<AnalysisPlan, FwdScanError> {
        let horizons = HorizonSet::resolve(&self.horizons, &self.calendar)?;
        let barriers = BarrierSet::new(self.barrier_levels.clone())?;
        let plan = AnalysisPlan {
            schema: self.schema.clone(),
            breach: BarrierBreachEngine::new(horizons.clone(), barriers.clone(), self.strategy),
            volatility: ForwardVolatilityEngine::new(horizons.clone(), self.strategy),
            edge_weight: EdgeWeightEngine::new(horizons.clone()),
            horizons,
            barriers,
            parallel: self.parallel,
        };
        let names = plan.column_names();
        check_collisions([], names.iter().map(String::as_str))?;
        Ok(plan)
    }
}

/// Cooperative cancellation flag shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Validated configuration with its three engines built.
#[derive(Debug, Clone)]
pub struct AnalysisPlan {
    schema: PanelSchema,
    horizons: HorizonSet,
    barriers: BarrierSet,
    breach: BarrierBreachEngine,
    volatility: ForwardVolatilityEngine,
    edge_weight: EdgeWeightEngine,
    parallel: bool,
}

impl AnalysisPlan {
    pub fn schema(&self) -> &PanelSchema {
        &self.schema
    }

    pub fn horizons(&self) -> &HorizonSet {
        &self.horizons
    }

    pub fn barriers(&self) -> &BarrierSet {
        &self.barriers
    }

    pub fn breach_engine(&self) -> &BarrierBreachEngine {
        &self.breach
    }

    pub fn volatility_engine(&self) -> &ForwardVolatilityEngine {
        &self.volatility
    }

    pub fn edge_weight_engine(&self) -> &EdgeWeightEngine {
        &self.edge_weight
    }

    fn engines(&self) -> [&dyn ForwardEngine; 3] {
        [&self.breach, &self.volatility, &self.edge_weight]
    }

    /// Every derived column, in output order. Known before any data is read.
    pub fn column_names(&self) -> Vec<String> {
        self.engines()
            .iter()
            .flat_map(|e| e.column_names())
            .collect()
    }

    /// Parse `table` with this plan's schema.
    pub fn load_panel(&self, table: TextTable) -> Result<PanelFrame, FwdScanError> {
        PanelFrame::from_table(table, self.schema.clone())
    }

    pub fn run(&self, panel: PanelFrame) -> Result<AnnotatedPanel, FwdScanError> {
        self.run_with_cancel(panel, &CancelToken::new())
    }

    pub fn run_with_cancel(
        &self,
        panel: PanelFrame,
        cancel: &CancelToken,
    ) -> Result<AnnotatedPanel, FwdScanError> {
        let started = Instant::now();
        let names = self.column_names();
        check_collisions(
            panel.table().headers.iter().map(String::as_str),
            names.iter().map(String::as_str),
        )?;
        let partition = panel.partition()?;
        let groups = partition.groups(&panel);
        let total = groups.len();

        info!(
            rows = panel.len(),
            tickers = total,
            horizons = self.horizons.len(),
            barriers = self.barriers.len(),
            columns = names.len(),
            "starting forward scan"
        );

        let completed = AtomicUsize::new(0);
        let unit = |group: &TickerGroup<'_>| -> Result<TickerColumns, FwdScanError> {
            if cancel.is_cancelled() {
                return Err(FwdScanError::Cancelled {
                    completed: completed.load(Ordering::SeqCst),
                    total,
                });
            }
            let local = self.scan_group(group);
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(local)
        };

        let results = match self.map_units(&groups, unit) {
            Ok(results) => results,
            Err(err) => {
                if let FwdScanError::Cancelled { completed, total } = &err {
                    warn!(completed, total, "forward scan cancelled");
                }
                return Err(err);
            }
        };

        let mut derived = ColumnSet::with_rows(names, panel.len());
        for (group, local) in groups.iter().zip(&results) {
            derived.scatter(group.rows, local);
        }

        info!(
            rows = panel.len(),
            tickers = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forward scan complete"
        );
        Ok(AnnotatedPanel { panel, derived })
    }

    fn scan_group(&self, group: &TickerGroup<'_>) -> TickerColumns {
        let mut engines = self.engines().into_iter();
        let mut local = match engines.next() {
            Some(first) => first.scan_ticker(&group.prices),
            None => TickerColumns::new(0, group.len()),
        };
        for engine in engines {
            local.extend(engine.scan_ticker(&group.prices));
        }
        debug!(ticker = group.ticker, rows = group.len(), "ticker scanned");
        local
    }

    fn map_units<'g, F>(
        &self,
        groups: &[TickerGroup<'g>],
        unit: F,
    ) -> Result<Vec<TickerColumns>, FwdScanError>
    where
        F: Fn(&TickerGroup<'g>) -> Result<TickerColumns, FwdScanError> + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            if self.parallel {
                return groups.par_iter().map(unit).collect();
            }
        }

        groups.iter().map(unit).collect()
    }
}

/// Input panel plus derived columns, aligned by row.
#[derive(Debug, Clone)]
pub struct AnnotatedPanel {
    panel: PanelFrame,
    derived: ColumnSet,
}

impl AnnotatedPanel {
    pub fn panel(&self) -> &PanelFrame {
        &self.panel
    }

    pub fn derived(&self) -> &ColumnSet {
        &self.derived
    }

    pub fn len(&self) -> usize {
        self.panel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panel.is_empty()
    }

    /// Input headers followed by derived column names.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.panel.table().headers.clone();
        headers.extend(self.derived.names().iter().cloned());
        headers
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.derived.column(name)
    }
}

/// Resolve `config`, parse `table` and run the full analysis.
pub fn analyze(table: TextTable, config: &AnalysisConfig) -> Result<AnnotatedPanel, FwdScanError> {
    let plan = config.resolve()?;
    let panel = plan.load_panel(table)?;
    plan.run(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::observation::Observation;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn x_panel() -> PanelFrame {
        let prices = [100.0, 95.0, 90.0, 110.0, 105.0];
        let obs: Vec<Observation> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Observation::new(
                    "X",
                    NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                    p,
                )
            })
            .collect();
        PanelFrame::from_observations(&obs).unwrap()
    }

    fn three_day_config() -> AnalysisConfig {
        AnalysisConfig {
            horizons: vec![HorizonSpec::Days {
                label: "3d".into(),
                window_days: 3,
            }],
            barrier_levels: vec![0.95],
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn column_names_known_before_data() {
        let plan = three_day_config().resolve().unwrap();
        assert_eq!(
            plan.column_names(),
            vec![
                "pct_above_breach_3d_b1",
                "pct_below_breach_3d_b1",
                "mean_breach_price_3d_b1",
                "fwd_std_3d",
                "edge_weight_3d",
            ]
        );
    }

    #[test]
    fn default_config_resolves() {
        let plan = AnalysisConfig::default().resolve().unwrap();
        assert_eq!(plan.horizons().len(), 7);
        assert_eq!(plan.barriers().len(), 4);
        // 7 horizons * 4 barriers * 3 + 7 + 7
        assert_eq!(plan.column_names().len(), 98);
    }

    #[test]
    fn empty_barriers_is_configuration_error() {
        let config = AnalysisConfig {
            barrier_levels: vec![],
            ..AnalysisConfig::default()
        };
        assert!(config.resolve().unwrap_err().is_configuration_error());
    }

    #[test]
    fn empty_horizons_is_configuration_error() {
        let config = AnalysisConfig {
            horizons: vec![],
            ..AnalysisConfig::default()
        };
        assert!(config.resolve().unwrap_err().is_configuration_error());
    }

    #[test]
    fn worked_example_end_to_end() {
        let plan = three_day_config().resolve().unwrap();
        let out = plan.run(x_panel()).unwrap();

        assert_eq!(out.len(), 5);
        let below = out.column("pct_below_breach_3d_b1").unwrap();
        let above = out.column("pct_above_breach_3d_b1").unwrap();
        let mean = out.column("mean_breach_price_3d_b1").unwrap();
        let weight = out.column("edge_weight_3d").unwrap();
        let std = out.column("fwd_std_3d").unwrap();

        assert_relative_eq!(below[0].unwrap(), 1.0 / 3.0);
        assert_relative_eq!(above[0].unwrap(), 1.0 / 3.0);
        assert_relative_eq!(mean[0].unwrap(), 90.0);
        assert_relative_eq!(weight[3].unwrap(), 2.0 / 3.0);
        assert_eq!(std[3], None);
        assert!(std[0].is_some());
    }

    #[test]
    fn headers_append_derived_after_input() {
        let plan = three_day_config().resolve().unwrap();
        let out = plan.run(x_panel()).unwrap();
        let headers = out.headers();
        assert_eq!(&headers[..3], &["ticker", "date", "adj_close"]);
        assert_eq!(headers.len(), 8);
    }

    #[test]
    fn input_column_collision_is_schema_error() {
        let plan = three_day_config().resolve().unwrap();
        let table = TextTable::new(
            vec![
                "ticker".into(),
                "date".into(),
                "adj_close".into(),
                "fwd_std_3d".into(),
            ],
            vec![vec![
                "X".into(),
                "2024-01-01".into(),
                "1".into(),
                "".into(),
            ]],
        );
        let panel = plan.load_panel(table).unwrap();
        let err = plan.run(panel).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn cancelled_before_start() {
        let plan = three_day_config().resolve().unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = plan.run_with_cancel(x_panel(), &token).unwrap_err();
        assert!(matches!(err, FwdScanError::Cancelled { total: 1, .. }));
    }

    #[test]
    fn engines_run_independently_and_join() {
        let plan = three_day_config().resolve().unwrap();
        let panel = x_panel();

        let mut joined = plan.breach_engine().annotate(&panel).unwrap();
        joined
            .append(plan.volatility_engine().annotate(&panel).unwrap())
            .unwrap();
        joined
            .append(plan.edge_weight_engine().annotate(&panel).unwrap())
            .unwrap();

        let combined = plan.run(panel).unwrap();
        assert_eq!(&joined, combined.derived());
    }

    #[test]
    fn analyze_convenience() {
        let table = TextTable::new(
            vec!["ticker".into(), "date".into(), "adj_close".into()],
            vec![vec!["X".into(), "2024-01-01".into(), "10".into()]],
        );
        let out = analyze(table, &three_day_config()).unwrap();
        assert_eq!(out.column("edge_weight_3d").unwrap(), &[Some(1.0 / 3.0)]);
        assert_eq!(out.column("fwd_std_3d").unwrap(), &[None]);
    }
}
