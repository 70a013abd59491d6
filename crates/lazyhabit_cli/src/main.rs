//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lazyhabit_core` linkage.
//! - Exercise boot, create, toggle and a simulated next-day rollover against
//!   an in-memory store with deterministic output.

use chrono::{Duration, TimeZone, Utc};
use lazyhabit_core::db::open_db_in_memory;
use lazyhabit_core::{
    progress_bars, FixedClock, HabitService, KvAppDataStore, SqliteKeyValueStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lazyhabit_core ping={}", lazyhabit_core::ping());
    println!("lazyhabit_core version={}", lazyhabit_core::core_version());

    match rollover_probe() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lazyhabit_core probe=failed error={err}");
            ExitCode::FAILURE
        }
    }
}

fn rollover_probe() -> Result<(), Box<dyn std::error::Error>> {
    let kv = SqliteKeyValueStore::try_new(open_db_in_memory()?)?;
    let day_one = Utc
        .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .ok_or("invalid probe date")?;
    let mut service = HabitService::new(KvAppDataStore::new(kv), FixedClock::utc(day_one));

    service.boot()?;
    let id = service.create_habit("Probe", "Smoke check")?;
    service.set_completed(id, true)?;

    service.clock_mut().set_now(day_one + Duration::days(1));
    let report = service.boot()?;

    for bar in progress_bars(&service.snapshot()) {
        println!(
            "lazyhabit_core probe decision={:?} streak={}",
            report.decision, bar.value
        );
    }
    Ok(())
}
