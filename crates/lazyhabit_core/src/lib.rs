//! Core domain logic for LazyHabit.
//! This crate is the single source of truth for habit and streak invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::app_data::{next_habit_id, AppData, AppDataError, DecodeError, Track, TrackView};
pub use model::habit::{
    validate_habit_input, validate_habit_text, Habit, HabitField, HabitId, HabitValidationError,
    MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS,
};
pub use repo::app_data_repo::{
    AppDataStore, KvAppDataStore, StoreError, StoreResult, STORAGE_KEY,
};
pub use repo::kv_repo::{KeyValueStore, SqliteKeyValueStore};
pub use service::habit_service::{HabitService, ServiceError, ServiceResult};
pub use service::hub::{AppDataHub, SubscriptionId};
pub use service::progress::{completion_summary, progress_bars, CompletionSummary, ProgressBar};
pub use service::rollover::{roll_over, RolloverDecision, RolloverReport};

/// SQLite-backed service wired the way the app runs it.
pub type SqliteHabitService<C = SystemClock> =
    HabitService<KvAppDataStore<SqliteKeyValueStore>, C>;

/// Opens the store at `path` and builds a service over it.
///
/// The returned service still publishes the empty default; call `boot` next.
pub fn open_habit_service(
    path: impl AsRef<std::path::Path>,
) -> Result<SqliteHabitService, db::DbError> {
    let conn = db::open_db(path)?;
    let kv = SqliteKeyValueStore::try_new(conn)?;
    Ok(HabitService::new(KvAppDataStore::new(kv), SystemClock))
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
