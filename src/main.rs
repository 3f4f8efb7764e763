//! Quizcache CLI - keep local copies of exam question pools in sync.
//!
//! `quizcache <bank>` synchronizes one bank, `--all` synchronizes every
//! bank, `--offline <bank>` serves the cached copy without touching the
//! network, and `--status` shows per-bank cache ages.

use std::io;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quizcache::{BankName, CacheStore, Config, HttpFetcher, Synchronizer};

const USAGE: &str = "usage: quizcache <bank> | --all | --offline <bank> | --status";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("quizcache starting");

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = Config::load()?;
    let cache = CacheStore::new(config.cache_dir()?)?;
    let sync = Synchronizer::new(HttpFetcher::new()?, cache);

    match args.first().map(String::as_str) {
        Some("--all") => {
            let mut failures = 0;
            for (name, result) in sync.sync_all().await {
                match result {
                    Ok(bank) => println!(
                        "{}: {} ({} questions)",
                        name,
                        bank.outcome,
                        bank.questions.len()
                    ),
                    Err(e) => {
                        failures += 1;
                        eprintln!("{}: {}", name, e);
                    }
                }
            }
            if failures > 0 {
                bail!("{} bank(s) failed to sync", failures);
            }
        }
        Some("--offline") => {
            let name: BankName = args.get(1).context(USAGE)?.parse()?;
            let questions = sync.cached(name)?;
            println!("{}: {} questions (cached copy)", name, questions.len());
        }
        Some("--status") => {
            for (name, age) in sync.cache_ages() {
                println!("{:<12} {}", name, age);
            }
        }
        Some(arg) => {
            let name: BankName = arg.parse()?;
            let bank = sync.sync(name).await?;
            println!(
                "{}: {} ({} questions)",
                name,
                bank.outcome,
                bank.questions.len()
            );
        }
        None => bail!(USAGE),
    }

    Ok(())
}
