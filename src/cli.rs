//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::indicators::BuiltinIndicators;
use crate::adapters::text_report::TextReportAdapter;
use crate::adapters::trade_log::TradeLogAdapter;
use crate::domain::comparison::StrategyComparison;
use crate::domain::config_validation::{
    build_backtest_config, build_data_request, build_strategies, validate_backtest_config,
    validate_strategy_config,
};
use crate::domain::error::{BacktestError, ConfigError};
use crate::domain::feed::DataFeed;
use crate::domain::strategy::{Strategy, STRATEGY_CODES};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::indicator_port::IndicatorPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "quantbench", about = "Single-instrument strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one or more strategies over a price series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated strategy codes, overriding `[strategy] codes`
        #[arg(short, long)]
        strategies: Option<String>,
        /// Symbol to load, overriding `[backtest] symbol`
        #[arg(long)]
        symbol: Option<String>,
        /// Write per-strategy trade and equity CSV files here
        #[arg(long)]
        trades_dir: Option<PathBuf>,
        /// Run strategies one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// List the available strategy codes
    ListStrategies,
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Dispatch a parsed command line. Ctrl-C cancels a running backtest.
pub fn run(cli: Cli) -> ExitCode {
    let cancel = Arc::new(AtomicBool::new(false));
    if matches!(cli.command, Command::Backtest { .. }) {
        install_interrupt_handler(Arc::clone(&cancel));
    }
    execute(cli, &cancel)
}

/// Like [`run`], with the cancellation flag supplied by the caller.
pub fn execute(cli: Cli, cancel: &AtomicBool) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            strategies,
            symbol,
            trades_dir,
            sequential,
        } => run_backtest(
            &config,
            strategies.as_deref(),
            symbol.as_deref(),
            trades_dir,
            sequential,
            cancel,
        ),
        Command::ListStrategies => {
            run_list_strategies();
            Ok(())
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Raise `cancel` on the first Ctrl-C. The listener runs on its own thread
/// with a single-threaded runtime and dies with the process.
fn install_interrupt_handler(cancel: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
        };
        runtime.block_on(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling backtest");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    });
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    Ok(FileConfigAdapter::from_file(path)?)
}

fn run_backtest(
    config_path: &Path,
    codes_override: Option<&str>,
    symbol_override: Option<&str>,
    trades_dir: Option<PathBuf>,
    sequential: bool,
    cancel: &AtomicBool,
) -> Result<(), BacktestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;

    let config = WithOverrides {
        inner: &config,
        symbol: symbol_override,
    };
    let request = build_data_request(&config)?;
    let backtest_config = build_backtest_config(&config)?;
    let strategies = build_strategies(&config, codes_override)?;

    eprintln!(
        "Loading {} from {} ({} .. {})",
        request.symbol,
        request.data_dir.display(),
        request.start_date,
        request.end_date
    );
    let data = CsvAdapter::new(request.data_dir.clone());
    let bars = data.fetch_bars(&request.symbol, request.start_date, request.end_date)?;
    let feed = DataFeed::new(bars)?;
    eprintln!("Loaded {} bars", feed.len());

    let frame = BuiltinIndicators.build_frame(&feed, &strategies);

    let outcome = StrategyComparison::new(&feed, &frame, &backtest_config)
        .with_parallelism(!sequential)
        .run_all(&strategies, cancel)?;

    let report = TextReportAdapter;
    let results = outcome.results;
    match results.as_slice() {
        [] => {
            // every run failed; the first error decides the exit code
            let mut failures = outcome.failures.into_iter();
            let Some(first) = failures.next() else {
                return Ok(());
            };
            report.write_failures(&failures.collect::<Vec<_>>())?;
            return Err(first.error);
        }
        [single] => report.write_run(single, &request.symbol)?,
        many => report.write_comparison(many, &request.symbol)?,
    }
    report.write_failures(&outcome.failures)?;

    if let Some(dir) = trades_dir {
        TradeLogAdapter::new(dir.clone()).write_comparison(&results, &request.symbol)?;
        eprintln!("Trade logs written to {}", dir.display());
    }

    Ok(())
}

/// Config view that lets command-line flags take precedence.
struct WithOverrides<'a> {
    inner: &'a dyn ConfigPort,
    symbol: Option<&'a str>,
}

impl ConfigPort for WithOverrides<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key, self.symbol) {
            ("backtest", "symbol", Some(symbol)) => Some(symbol.trim().to_string()),
            _ => self.inner.get_string(section, key),
        }
    }

    fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, ConfigError> {
        self.inner.get_usize(section, key)
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
        self.inner.get_double(section, key)
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, ConfigError> {
        self.inner.get_bool(section, key)
    }
}

fn run_list_strategies() {
    println!("{:<8}Name", "Code");
    for code in STRATEGY_CODES {
        if let Ok(strategy) = code.parse::<Strategy>() {
            println!("{:<8}{}", strategy.code(), strategy.name());
        }
    }
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    validate_strategy_config(&config)?;
    println!("Configuration is valid: {}", config_path.display());
    Ok(())
}
