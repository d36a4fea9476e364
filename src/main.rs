mod db;
mod import;
mod models;
mod run;

use anyhow::{Context, Result};
use std::io::stderr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let level = run::flag_value(&args, "--log-level")
        .map(parse_log_level)
        .unwrap_or(LevelFilter::WARN);
    setup_logging(level);

    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }
    run::as_cli(&args)
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{level}', defaulting to 'warn'");
            LevelFilter::WARN
        }
    }
}

fn setup_logging(level: LevelFilter) {
    // stdout carries the JSON result
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry().with(terminal_log).init();
}

pub(crate) fn get_db_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(run::shellexpand(path)));
    }
    let proj_dirs = directories::ProjectDirs::from("com", "statement-ingest", "StatementIngest")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("statement-ingest.db"))
}
