use anyhow::Result;
use std::path::Path;
use tracing::{error, warn};

use crate::db::Database;
use crate::import::{CancelToken, ErrorKind, ErrorReport};
use crate::models::UserId;

/// Flags that may appear before the command, each taking one value.
const GLOBAL_FLAGS: &[&str] = &["--log-level"];

pub(crate) fn as_cli(args: &[String]) -> Result<()> {
    let start = command_start(args);
    let Some(command) = args.get(start) else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "import" => cli_import(&args[start + 1..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("statement-ingest {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn command_start(args: &[String]) -> usize {
    let mut i = 1;
    while args.get(i).is_some_and(|a| GLOBAL_FLAGS.contains(&a.as_str())) {
        i += 2;
    }
    i
}

pub(crate) fn print_usage() {
    println!("statement-ingest — import bank statements as transactions");
    println!();
    println!("Usage: statement-ingest <command>");
    println!();
    println!("Commands:");
    println!("  import <file>                 Import a .csv, .tsv or .xlsx statement");
    println!("    --user <id>                 Owner of the imported transactions (required)");
    println!("    --db <path>                 Database file (default: platform data dir)");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Global options:");
    println!("  --log-level <level>           error, warn, info, debug, trace (default: warn)");
}

fn cli_import(args: &[String]) -> Result<()> {
    let usage = "Usage: statement-ingest import <file> --user <id> [--db <path>]";
    let file_path = match args.first() {
        Some(p) if !p.starts_with('-') => p,
        _ => anyhow::bail!(usage),
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let user = flag_value(args, "--user")
        .and_then(UserId::new)
        .ok_or_else(|| anyhow::anyhow!(usage))?;
    let db_path = crate::get_db_path(flag_value(args, "--db"))?;
    let mut db = Database::open(&db_path)?;

    match super::import_file(path, &user, &mut db, &CancelToken::new()) {
        Ok(summary) => {
            println!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
        Err(e) => {
            let kind: ErrorKind = e.kind();
            if kind.is_user_error() {
                warn!(%kind, file = %path.display(), "statement rejected");
            } else {
                error!(%kind, error = ?e, file = %path.display(), "import failed");
            }
            println!("{}", serde_json::to_string(&ErrorReport::from(&e))?);
            anyhow::bail!("{e}")
        }
    }
}

pub(crate) fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
