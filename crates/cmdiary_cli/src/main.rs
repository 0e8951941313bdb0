//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `cmdiary_core` linkage.
//! - Optionally open a diary file and print the ids selected by filter
//!   conditions given as arguments.
//!
//! Usage: `cmdiary_cli [DIARY_FILE [CONDITION...]]`. Files ending in
//! `.jsonl` use the JSON-lines port; anything else is a SQLite diary.

use cmdiary_core::{
    default_log_level, init_logging, FilterSession, JsonLinesRecordRepository, PersistencePort,
    RecordStore, SqliteRecordRepository, StoreConfig,
};
use std::path::Path;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "CMDIARY_LOG_DIR";
const LOG_LEVEL_ENV: &str = "CMDIARY_LOG_LEVEL";

fn main() -> ExitCode {
    println!("cmdiary_core ping={}", cmdiary_core::ping());
    println!("cmdiary_core version={}", cmdiary_core::core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut args = std::env::args().skip(1);
    let Some(diary_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    let conditions: Vec<String> = args.collect();

    let outcome = if diary_path.ends_with(".jsonl") {
        run(JsonLinesRecordRepository::new(&diary_path), &conditions)
    } else {
        match SqliteRecordRepository::open(Path::new(&diary_path)) {
            Ok(repo) => run(repo, &conditions),
            Err(err) => Err(err.to_string()),
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            log::error!("event=cli_run module=cli status=error");
            ExitCode::FAILURE
        }
    }
}

fn run<P: PersistencePort>(port: P, conditions: &[String]) -> Result<(), String> {
    let store = RecordStore::open(port, StoreConfig::default()).map_err(|err| err.to_string())?;
    println!("entries={}", store.len());

    let mut session = FilterSession::start(store.entries());
    for condition in conditions {
        session.refine(condition).map_err(|err| format!("{condition}: {err}"))?;
    }
    if session.is_refined() {
        println!("{}", session.filter_string());
    }

    for record in session.current() {
        let days = record
            .days_remaining()
            .map_or_else(|| "none".to_string(), |days| days.to_string());
        println!(
            "{}\t{}\t{}\tdays={}",
            record.id(),
            record.item_type().as_str(),
            record.subject().unwrap_or("none"),
            days
        );
    }
    Ok(())
}
