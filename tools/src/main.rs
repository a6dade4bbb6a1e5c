//! cfa-runner: headless batch scorer.
//!
//! Usage:
//!   cfa-runner --as-of 2025-06-30 --db balances.db
//!   cfa-runner --as-of 2025-06-30 --input records.json --format json
//!   cfa-runner --as-of 2025-06-30 --sample 300 --seed 42

use anyhow::{bail, Context, Result};
use cfa_core::{
    config::ScoringConfig,
    engine::{BatchOutcome, CfaEngine},
    report::ScoringReport,
    sample::generate_population,
    store::RecordStore,
    types::DailyRecord,
};
use chrono::NaiveDate;
use std::env;
use std::path::Path;

const DEFAULT_CONFIG: &str = "./data/config/cfa_tiers.json";
const SAMPLE_HISTORY_DAYS: u64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let as_of = match arg_value(&args, "--as-of") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--as-of must be YYYY-MM-DD, got '{s}'"))?,
        None => bail!("--as-of YYYY-MM-DD is required; the scorer never reads the clock"),
    };
    let config_path = arg_value(&args, "--config").unwrap_or(DEFAULT_CONFIG);
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let input = arg_value(&args, "--input");
    let sample_users = parse_arg(&args, "--sample", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let page_size = parse_arg(&args, "--page-size", 1_000usize);
    let format = match arg_value(&args, "--format").unwrap_or("table") {
        "table" => OutputFormat::Table,
        "json" => OutputFormat::Json,
        other => bail!("unknown --format '{other}' (expected table or json)"),
    };

    let config = load_config(config_path, as_of)?;
    let engine = CfaEngine::new(config)?;

    let batch = match input {
        Some(path) => score_json_file(&engine, path)?,
        None => score_store(&engine, db, sample_users, seed, page_size)?,
    };

    let report = ScoringReport::build(&batch, engine.config());
    match format {
        OutputFormat::Table => print!("{}", report.render_table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn load_config(path: &str, as_of: NaiveDate) -> Result<ScoringConfig> {
    if Path::new(path).exists() {
        log::info!("loading tier table from {path}");
        return Ok(ScoringConfig::load(path, Some(as_of))?);
    }
    if path != DEFAULT_CONFIG {
        bail!("config file {path} does not exist");
    }
    log::warn!("{DEFAULT_CONFIG} not found, using the built-in reference tier table");
    Ok(ScoringConfig::reference(as_of))
}

fn score_json_file(engine: &CfaEngine, path: &str) -> Result<BatchOutcome> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let records: Vec<DailyRecord> = serde_json::from_str(&content)?;
    log::info!("read {} records from {path}", records.len());
    Ok(engine.score_records(records))
}

fn score_store(
    engine: &CfaEngine,
    db: &str,
    sample_users: usize,
    seed: u64,
    page_size: usize,
) -> Result<BatchOutcome> {
    let store = if db == ":memory:" {
        RecordStore::in_memory()?
    } else {
        RecordStore::open(db)?
    };
    store.migrate()?;

    let config = engine.config();
    if sample_users > 0 {
        let records = generate_population(sample_users, SAMPLE_HISTORY_DAYS, config.as_of_date, seed);
        store.insert_records(&records)?;
        log::info!("generated {sample_users} synthetic users (seed {seed})");
    }

    let mut batch = BatchOutcome::default();
    store.for_each_user_page(
        page_size,
        config.full_window_start(),
        config.as_of_date,
        |page| {
            batch.merge(engine.score_users(page));
            Ok(())
        },
    )?;
    Ok(batch)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
