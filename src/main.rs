//! lamco-lock-compensator - trace replay tool
//!
//! Feeds a recorded host trace through the lock compensator, persisting what
//! it learns, or prints the learned lock database.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use lamco_lock_compensator::compensator::format_span;
use lamco_lock_compensator::config::{Config, LoggingConfig};
use lamco_lock_compensator::replay::{replay_file, ReplayDriver};
use lamco_lock_compensator::store::{JsonFileStore, LockStore};
use lamco_lock_compensator::utils::format_user_error;

/// Command-line arguments for lamco-lock-compensator
#[derive(Parser, Debug)]
#[command(name = "lamco-lock-compensator")]
#[command(version, about = "Action lock latency compensation replay tool", long_about = None)]
pub struct Args {
    /// JSON-lines trace to replay
    pub trace: Option<PathBuf>,

    /// Configuration file path (defaults when omitted)
    #[arg(short, long, env = "LOCK_COMPENSATOR_CONFIG")]
    pub config: Option<String>,

    /// Lock database file
    #[arg(short, long, env = "LOCK_COMPENSATOR_STORE")]
    pub store: Option<PathBuf>,

    /// Predict and learn nothing; only observe
    #[arg(long)]
    pub dry_run: bool,

    /// Sleep for each recorded tick
    #[arg(long)]
    pub realtime: bool,

    /// Print the learned lock database and exit
    #[arg(long)]
    pub show_database: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    let _log_guards = init_logging(&args, &config.logging)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-lock-compensator v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("════════════════════════════════════════════════════════");
    tracing::debug!("Config: {:?}", config);

    let store_path = config.persistence.resolved_path();
    let store = JsonFileStore::new(&store_path);
    info!("Lock database: {}", store_path.display());

    if args.show_database {
        return print_database(&store);
    }

    let Some(trace) = args.trace.as_ref() else {
        let e = anyhow::anyhow!("No trace file given (pass a path or --show-database)");
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    };

    let driver = ReplayDriver::new(config, Box::new(store));
    let summary = match replay_file(trace, driver, args.realtime).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    info!("{}", summary.report);
    println!(
        "Replayed {} entries ({} submissions, {} server locks) over {}",
        summary.entries,
        summary.submissions,
        summary.updates,
        format_span(summary.simulated_time)
    );
    println!(
        "Average response delay: {} ms",
        summary.report.average_delay.as_millis()
    );
    println!(
        "Submissions during packet bursts: {}",
        summary.report.burst_submissions
    );
    println!("Learned locks: {}", summary.report.learned_locks);
    println!("{}", summary.report);

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let config = config.with_overrides(args.dry_run, args.store.clone());
    config.validate().context("Invalid config after CLI overrides")?;
    Ok(config)
}

fn print_database(store: &JsonFileStore) -> Result<()> {
    let state = store
        .load()
        .with_context(|| format!("Failed to read lock database {}", store.path().display()))?;

    println!("{:>10}  {:>10}", "ACTION", "LOCK (ms)");
    for (action, lock) in &state.locks {
        println!("{:>10}  {:>10.0}", action.0, lock * 1000.0);
    }
    println!();
    println!(
        "Reduced a total time of {} from {} actions",
        format_span(
            std::time::Duration::try_from_secs_f64(state.total_seconds_saved.max(0.0))
                .unwrap_or(std::time::Duration::MAX)
        ),
        state.total_actions_affected
    );
    if let Some(saved_at) = state.saved_at {
        println!("Last saved: {}", saved_at);
    }
    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(format: &str, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ if ansi => layer.pretty().boxed(),
        _ => layer.boxed(),
    }
}

fn init_logging(args: &Args, logging: &LoggingConfig) -> Result<Vec<WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "lamco_lock_compensator={level},warn",
            level = log_level
        ))
    });

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> =
        vec![format_layer(&args.log_format, std::io::stdout, true)];

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)
            .with_context(|| format!("Failed to create log file: {}", log_file_path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        layers.push(format_layer(&args.log_format, writer, false));
        guards.push(guard);
    }

    if let Some(dir) = &logging.log_dir {
        let appender = tracing_appender::rolling::daily(dir, "lamco-lock-compensator.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(&args.log_format, writer, false));
        guards.push(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(log_file_path) = &args.log_file {
        info!("Logging to file: {}", log_file_path);
    }
    if let Some(dir) = &logging.log_dir {
        info!("Logging to directory: {}", dir.display());
    }

    Ok(guards)
}
