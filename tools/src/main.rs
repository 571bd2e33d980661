//! detector-runner: periodic violator detection.
//!
//! Usage:
//!   detector-runner [--config detector.json] [--db powerwatch.db] [--interval 10] [--cycles N]
//!   detector-runner import-clients clients.json [--db powerwatch.db]
//!   detector-runner list-violators [--db powerwatch.db]

use anyhow::{Context, Result};
use powerwatch_core::{
    account::AccountRecord,
    config::DetectorConfig,
    scheduler::Scheduler,
    store::{SqliteConnector, Store},
};
use std::env;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let config = load_config(&args)?;

    let store = Store::open(&config.db_path, config.busy_timeout())?;
    store.migrate()?;

    match args.get(1).map(String::as_str) {
        Some("import-clients") => {
            let path = args.get(2).context("import-clients needs a JSON file argument")?;
            import_clients(&store, path)
        }
        Some("list-violators") => list_violators(&store),
        _ => {
            // The scheduler opens its own connection per cycle.
            drop(store);
            run_scheduler(&args, config)
        }
    }
}

fn load_config(args: &[String]) -> Result<DetectorConfig> {
    let mut config = match find_flag(args, "--config") {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(db) = find_flag(args, "--db") {
        config.db_path = db.to_string();
    }
    if let Some(secs) = parse_flag(args, "--interval")? {
        config.interval_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

fn run_scheduler(args: &[String], config: DetectorConfig) -> Result<()> {
    log::info!(
        "detector-runner: db {}, interval {}s, seed {}",
        config.db_path,
        config.interval_secs,
        config.seed
    );
    let connector = SqliteConnector::from_config(&config);
    let mut scheduler = Scheduler::new(connector, config)?;

    match parse_flag::<u64>(args, "--cycles")? {
        Some(n) => {
            scheduler.run_cycles(n);
            log::info!(
                "Ran {} cycles, {} failed",
                scheduler.cycles_run(),
                scheduler.cycles_failed()
            );
            Ok(())
        }
        None => scheduler.run_forever(),
    }
}

fn import_clients(store: &Store, path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {path}"))?;
    let clients: Vec<AccountRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse client list in {path}"))?;
    let added = store.insert_clients_batch(&clients)?;
    println!("Imported {added} clients from {path}");
    Ok(())
}

fn list_violators(store: &Store) -> Result<()> {
    let violators = store.list_over_consumers()?;
    if violators.is_empty() {
        println!("No violators published");
        return Ok(());
    }
    println!("=== VIOLATORS ===");
    for v in violators.iter().take(10) {
        println!(
            "  id {:>8} | {:<40} | avg {:>10.2} kWh | {}",
            v.account_id,
            v.address.as_deref().unwrap_or("-"),
            v.avg_consumption_6m.unwrap_or(0.0),
            v.priority.as_deref().unwrap_or("-"),
        );
    }
    if violators.len() > 10 {
        println!("  ... and {} more", violators.len() - 10);
    }
    Ok(())
}

fn find_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// A flag that is present must parse; an absent flag is `None`.
fn parse_flag<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    find_flag(args, flag)
        .map(|v| {
            v.parse::<T>()
                .with_context(|| format!("{flag} expects a whole number, got {v:?}"))
        })
        .transpose()
}
