//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvPanelAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{AnalysisPlan, CancelToken};
use crate::domain::config_validation::validate_analysis_config;
use crate::domain::error::FwdScanError;
use crate::ports::panel_port::{PanelSink, PanelSource};

#[derive(Parser, Debug)]
#[command(
    name = "fwdscan",
    about = "Forward-looking barrier breach and volatility annotations for price panels"
)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Annotate a panel CSV with forward-window statistics
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate a configuration file without reading any data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the derived column names a configuration produces
    Columns {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            input,
            output,
        } => run_analysis(&config, &input, &output),
        Command::Validate { config } => run_validate(&config),
        Command::Columns { config } => run_columns(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FwdScanError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Load a configuration file and resolve it into a plan.
pub fn load_plan(path: &PathBuf) -> Result<AnalysisPlan, ExitCode> {
    let adapter = load_config(path)?;
    validate_analysis_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Read, annotate and write one panel. Returns the number of rows written.
pub fn run_pipeline(
    source: &dyn PanelSource,
    sink: &dyn PanelSink,
    plan: &AnalysisPlan,
    cancel: &CancelToken,
) -> Result<usize, FwdScanError> {
    let table = source.load_table()?;
    let panel = plan.load_panel(table)?;
    let annotated = plan.run_with_cancel(panel, cancel)?;
    sink.write(&annotated)?;
    Ok(annotated.len())
}

fn run_analysis(config_path: &PathBuf, input: &PathBuf, output: &PathBuf) -> ExitCode {
    info!(config = %config_path.display(), "loading config");
    let plan = match load_plan(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let source = CsvPanelAdapter::new(input.clone());
    let sink = CsvPanelAdapter::new(output.clone());
    info!(input = %input.display(), output = %output.display(), "annotating panel");

    match run_pipeline(&source, &sink, &plan, &CancelToken::new()) {
        Ok(rows) => {
            eprintln!("Wrote {} rows to {}", rows, output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let plan = match load_plan(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    eprintln!("\nHorizons:");
    for horizon in plan.horizons() {
        eprintln!("  {horizon}");
    }
    eprintln!("\nBarriers:");
    for (k, level) in plan.barriers().indexed() {
        eprintln!("  b{k}: {level}");
    }
    eprintln!("\nDerived columns: {}", plan.column_names().len());
    eprintln!("Config is valid.");
    ExitCode::SUCCESS
}

fn run_columns(config_path: &PathBuf) -> ExitCode {
    let plan = match load_plan(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    for name in plan.column_names() {
        println!("{name}");
    }
    ExitCode::SUCCESS
}
