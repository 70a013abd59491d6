//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level habit functions to Dart via FRB.
//! - Own the one process-wide `HabitService`; every call goes through its
//!   mutex, which serializes all document read-modify-write sequences.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every response carries the published snapshot after the call, so the UI
//!   never keeps a stale copy.

use lazyhabit_core::{
    completion_summary, core_version as core_version_inner, init_logging as init_logging_inner,
    open_habit_service, ping as ping_inner, progress_bars, validate_habit_text, AppData,
    HabitField, HabitId, RolloverDecision, SqliteHabitService,
};
use log::error;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const STORE_DB_FILE_NAME: &str = "lazyhabit_store.sqlite3";
static STORE_DB_PATH: OnceCell<PathBuf> = OnceCell::new();
static HABIT_SERVICE: OnceCell<Mutex<SqliteHabitService>> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One habit row as rendered by the track screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    /// Stable habit ID in string form.
    pub habit_id: String,
    pub name: String,
    pub description: String,
    pub current_frequency: u32,
    pub previous_frequency: u32,
    pub completed: bool,
    /// Track date as RFC 3339 text.
    pub tracked_at: String,
}

/// Published document as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSnapshot {
    /// Habits in track order.
    pub habits: Vec<HabitItem>,
    /// RFC 3339 `currentDate`, empty when unknown.
    pub current_date: String,
    pub completed_today: u32,
}

/// Generic response envelope for habit actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created habit ID for `habit_create`.
    pub habit_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Published snapshot after the call (unchanged on failure).
    pub snapshot: Option<AppSnapshot>,
}

impl HabitActionResponse {
    fn success(message: impl Into<String>, data: &AppData) -> Self {
        Self {
            ok: true,
            habit_id: None,
            message: message.into(),
            snapshot: Some(to_snapshot(data)),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            habit_id: None,
            message: message.into(),
            snapshot: None,
        }
    }
}

/// One bar of the progress chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBarItem {
    pub habit_id: String,
    pub label: String,
    pub value: u32,
}

/// Runs the daily rollover and publishes the document.
///
/// # FFI contract
/// - Call once at app start, before any screen reads the snapshot.
/// - Never panics; corrupt stores are reported, not overwritten.
#[flutter_rust_bridge::frb(sync)]
pub fn app_boot() -> HabitActionResponse {
    with_service("app_boot", |service| {
        let report = service.boot()?;
        let message = match report.decision {
            RolloverDecision::NewDay => format!(
                "New day: {} streak(s) kept, {} reset.",
                report.streaks_advanced, report.streaks_reset
            ),
            _ => "Up to date.".to_string(),
        };
        Ok(HabitActionResponse::success(message, &service.snapshot()))
    })
}

/// Returns the currently published snapshot without touching storage.
#[flutter_rust_bridge::frb(sync)]
pub fn app_snapshot() -> HabitActionResponse {
    with_service("app_snapshot", |service| {
        Ok(HabitActionResponse::success("", &service.snapshot()))
    })
}

/// Creates a habit from the create form.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_create(name: String, description: String) -> HabitActionResponse {
    with_service("habit_create", |service| {
        let id = service.create_habit(name.trim(), description.trim())?;
        let mut response =
            HabitActionResponse::success("Habit created successfully", &service.snapshot());
        response.habit_id = Some(id.to_string());
        Ok(response)
    })
}

/// Replaces a habit's name and description from the edit form.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_edit(habit_id: String, name: String, description: String) -> HabitActionResponse {
    let Some(id) = parse_habit_id(&habit_id) else {
        return HabitActionResponse::failure(format!(
            "habit_edit failed: invalid habit id `{habit_id}`"
        ));
    };
    with_service("habit_edit", |service| {
        let data = service.edit_habit(id, name.trim(), description.trim())?;
        Ok(HabitActionResponse::success("Habit updated.", &data))
    })
}

/// Marks or unmarks today's completion from the track checkbox.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_set_completed(habit_id: String, completed: bool) -> HabitActionResponse {
    let Some(id) = parse_habit_id(&habit_id) else {
        return HabitActionResponse::failure(format!(
            "habit_set_completed failed: invalid habit id `{habit_id}`"
        ));
    };
    with_service("habit_set_completed", |service| {
        let data = service.set_completed(id, completed)?;
        Ok(HabitActionResponse::success("", &data))
    })
}

/// Deletes one habit; unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_delete(habit_id: String) -> HabitActionResponse {
    let Some(id) = parse_habit_id(&habit_id) else {
        return HabitActionResponse::failure(format!(
            "habit_delete failed: invalid habit id `{habit_id}`"
        ));
    };
    with_service("habit_delete", |service| {
        let data = service.delete_habit(id)?;
        Ok(HabitActionResponse::success("Habit deleted.", &data))
    })
}

/// Wipes app storage and resets to an empty document.
#[flutter_rust_bridge::frb(sync)]
pub fn app_clear() -> HabitActionResponse {
    with_service("app_clear", |service| {
        let data = service.clear_all()?;
        Ok(HabitActionResponse::success("App data cleared.", &data))
    })
}

/// Returns chart bars for the progress tab; empty on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_progress() -> Vec<ProgressBarItem> {
    let Ok(service) = lock_service() else {
        return Vec::new();
    };
    progress_bars(&service.snapshot())
        .into_iter()
        .map(|bar| ProgressBarItem {
            habit_id: bar.habit_id.to_string(),
            label: bar.label,
            value: bar.value,
        })
        .collect()
}

/// Validates one form field while the user types.
///
/// `field` is `name` or `description`. Returns empty string when valid,
/// otherwise the inline error message.
#[flutter_rust_bridge::frb(sync)]
pub fn validate_habit_field(field: String, value: String) -> String {
    let field = match field.trim() {
        "name" => HabitField::Name,
        "description" => HabitField::Description,
        other => return format!("unknown field `{other}`"),
    };
    match validate_habit_text(field, &value) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

fn parse_habit_id(raw: &str) -> Option<HabitId> {
    HabitId::parse_str(raw.trim()).ok()
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("LAZYHABIT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn lock_service() -> Result<MutexGuard<'static, SqliteHabitService>, String> {
    let service = HABIT_SERVICE.get_or_try_init(|| {
        open_habit_service(resolve_store_db_path())
            .map(Mutex::new)
            .map_err(|err| format!("habit store open failed: {err}"))
    })?;
    service
        .lock()
        .map_err(|_| "habit service is unavailable after an earlier panic".to_string())
}

fn with_service(
    op: &'static str,
    f: impl FnOnce(
        &mut SqliteHabitService,
    ) -> Result<HabitActionResponse, lazyhabit_core::ServiceError>,
) -> HabitActionResponse {
    let mut service = match lock_service() {
        Ok(service) => service,
        Err(err) => {
            error!("event={op} module=ffi status=error error_code=service_unavailable");
            return HabitActionResponse::failure(format!("{op} failed: {err}"));
        }
    };
    match f(&mut *service) {
        Ok(response) => response,
        Err(err) => HabitActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn to_snapshot(data: &AppData) -> AppSnapshot {
    let habits = data
        .track_views()
        .map(|view| HabitItem {
            habit_id: view.habit.id.to_string(),
            name: view.habit.name.clone(),
            description: view.habit.description.clone(),
            current_frequency: view.habit.current_frequency,
            previous_frequency: view.habit.previous_frequency,
            completed: view.habit.completed,
            tracked_at: view.track.date.to_rfc3339(),
        })
        .collect();
    let summary = completion_summary(data);
    AppSnapshot {
        habits,
        current_date: data
            .current_date()
            .map(|date| date.to_rfc3339())
            .unwrap_or_default(),
        completed_today: u32::try_from(summary.completed).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        app_boot, app_snapshot, core_version, habit_create, habit_delete, habit_edit,
        habit_progress, habit_set_completed, init_logging, ping, validate_habit_field,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn validate_habit_field_reports_inline_errors() {
        assert!(validate_habit_field("name".to_string(), "Read".to_string()).is_empty());
        assert!(!validate_habit_field("name".to_string(), "Read <3".to_string()).is_empty());
        assert!(!validate_habit_field("title".to_string(), "Read".to_string()).is_empty());
    }

    #[test]
    fn create_toggle_and_delete_flow_updates_snapshot() {
        let boot = app_boot();
        assert!(boot.ok, "{}", boot.message);

        let created = habit_create("Stretch".to_string(), "Ten minutes, daily".to_string());
        assert!(created.ok, "{}", created.message);
        let habit_id = created.habit_id.clone().expect("create should return habit_id");

        let marked = habit_set_completed(habit_id.clone(), true);
        assert!(marked.ok, "{}", marked.message);
        let item = marked
            .snapshot
            .expect("toggle should return snapshot")
            .habits
            .into_iter()
            .find(|item| item.habit_id == habit_id)
            .expect("created habit should be listed");
        assert!(item.completed);
        assert_eq!(item.current_frequency, 1);

        assert!(habit_progress().iter().any(|bar| bar.habit_id == habit_id && bar.value == 1));

        let edited = habit_edit(
            habit_id.clone(),
            "Stretch more".to_string(),
            "Fifteen minutes".to_string(),
        );
        assert!(edited.ok, "{}", edited.message);

        let deleted = habit_delete(habit_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        let snapshot = app_snapshot().snapshot.expect("snapshot should exist");
        assert!(snapshot.habits.iter().all(|item| item.habit_id != habit_id));
    }

    #[test]
    fn habit_create_rejects_invalid_name() {
        let response = habit_create("Read #1".to_string(), "Pages".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("name"));
    }

    #[test]
    fn habit_set_completed_rejects_malformed_id() {
        let response = habit_set_completed("not-a-uuid".to_string(), true);
        assert!(!response.ok);
        assert!(response.message.contains("invalid habit id"));
    }
}
