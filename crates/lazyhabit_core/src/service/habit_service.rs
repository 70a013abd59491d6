//! Habit use-case service.
//!
//! # Responsibility
//! - Run the startup rollover and every habit mutation as one
//!   read-modify-write against the document store.
//! - Republish the in-memory snapshot after each successful write.
//!
//! # Invariants
//! - All entry points take `&mut self`; one service value is the single
//!   writer of the document, so read-modify-write sequences never overlap.
//! - Validation runs before any storage access.
//! - A failed write leaves the published snapshot unchanged.
//! - Habit text is never logged; events carry ids and counts only.

use crate::clock::Clock;
use crate::model::app_data::{next_habit_id, AppData};
use crate::model::habit::{validate_habit_input, Habit, HabitId, HabitValidationError};
use crate::repo::app_data_repo::{AppDataStore, StoreError};
use crate::service::hub::{AppDataHub, SubscriptionId};
use crate::service::rollover::{roll_over, RolloverDecision, RolloverReport};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Name/description rejected by the input allow-list.
    Validation(HabitValidationError),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<HabitValidationError> for ServiceError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Single-writer facade over the habit document store.
pub struct HabitService<S: AppDataStore, C: Clock> {
    store: S,
    clock: C,
    hub: AppDataHub,
}

impl<S: AppDataStore, C: Clock> HabitService<S, C> {
    /// Creates a service publishing an empty document until [`Self::boot`].
    pub fn new(store: S, clock: C) -> Self {
        let hub = AppDataHub::new(AppData::empty(clock.now()));
        Self { store, clock, hub }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Current published document.
    pub fn snapshot(&self) -> Arc<AppData> {
        self.hub.snapshot()
    }

    pub fn subscribe(
        &mut self,
        callback: impl Fn(&Arc<AppData>) + Send + 'static,
    ) -> SubscriptionId {
        self.hub.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Loads the stored document, rolls it over to today and publishes it.
    ///
    /// Meant to run once per app start before any screen reads the snapshot.
    ///
    /// # Errors
    /// - `StoreError::CorruptDocument` when the stored text cannot be decoded;
    ///   the stored value is left as-is and nothing is published.
    /// - `StoreError::Unavailable` when storage cannot be read or written.
    pub fn boot(&mut self) -> ServiceResult<RolloverReport> {
        let started_at = Instant::now();
        let loaded = self
            .load_or_empty()
            .map_err(|err| log_error("rollover", started_at, err))?;
        let (data, report) = roll_over(loaded, &self.clock);

        if report.decision == RolloverDecision::StoredDateAhead {
            warn!("event=rollover module=service status=skipped reason=stored_date_ahead");
        }
        if report.needs_write() {
            self.store
                .save(&data)
                .map_err(|err| log_error("rollover", started_at, err.into()))?;
        }
        self.hub.publish(data);

        info!(
            "event=rollover module=service status=ok decision={:?} advanced={} reset={} duration_ms={}",
            report.decision,
            report.streaks_advanced,
            report.streaks_reset,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Validates input and appends a new habit tracked from now.
    pub fn create_habit(&mut self, name: &str, description: &str) -> ServiceResult<HabitId> {
        let started_at = Instant::now();
        validate_habit_input(name, description)
            .map_err(|err| log_error("habit_create", started_at, err.into()))?;

        let data = self
            .load_or_empty()
            .map_err(|err| log_error("habit_create", started_at, err))?;
        let id = next_habit_id(&data);
        let next = data.create_habit(Habit::new(id, name, description), self.clock.now());
        self.commit("habit_create", started_at, next)?;

        info!(
            "event=habit_create module=service status=ok habit_id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    /// Validates input and replaces one habit's name and description.
    ///
    /// Unknown ids leave the document unchanged.
    pub fn edit_habit(
        &mut self,
        id: HabitId,
        name: &str,
        description: &str,
    ) -> ServiceResult<Arc<AppData>> {
        let started_at = Instant::now();
        validate_habit_input(name, description)
            .map_err(|err| log_error("habit_edit", started_at, err.into()))?;

        self.mutate("habit_edit", id, started_at, |data, _| {
            data.edit_habit(id, name, description)
        })
    }

    /// Marks or unmarks today's completion, moving the streak by one.
    pub fn set_completed(&mut self, id: HabitId, value: bool) -> ServiceResult<Arc<AppData>> {
        self.mutate("habit_toggle", id, Instant::now(), |data, now| {
            data.set_completed(id, value, now)
        })
    }

    /// Removes one habit and its track. Unknown ids are not an error.
    pub fn delete_habit(&mut self, id: HabitId) -> ServiceResult<Arc<AppData>> {
        self.mutate("habit_delete", id, Instant::now(), |data, _| {
            data.delete_habit(id)
        })
    }

    /// Wipes storage, then saves and publishes the empty default.
    pub fn clear_all(&mut self) -> ServiceResult<Arc<AppData>> {
        let started_at = Instant::now();
        self.store
            .clear()
            .map_err(|err| log_error("app_clear", started_at, err.into()))?;
        let empty = AppData::empty(self.clock.now());
        let published = self.commit("app_clear", started_at, empty)?;

        info!(
            "event=app_clear module=service status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(published)
    }

    fn mutate(
        &mut self,
        event: &'static str,
        id: HabitId,
        started_at: Instant,
        apply: impl FnOnce(AppData, DateTime<Utc>) -> AppData,
    ) -> ServiceResult<Arc<AppData>> {
        let data = self
            .load_or_empty()
            .map_err(|err| log_error(event, started_at, err))?;
        let found = data.habit(id).is_some();
        let next = apply(data, self.clock.now());
        let published = self.commit(event, started_at, next)?;

        info!(
            "event={} module=service status={} habit_id={} duration_ms={}",
            event,
            if found { "ok" } else { "noop" },
            id,
            started_at.elapsed().as_millis()
        );
        Ok(published)
    }

    fn load_or_empty(&self) -> ServiceResult<AppData> {
        let loaded = self.store.load()?;
        Ok(loaded.unwrap_or_else(|| AppData::empty(self.clock.now())))
    }

    fn commit(
        &mut self,
        event: &'static str,
        started_at: Instant,
        data: AppData,
    ) -> ServiceResult<Arc<AppData>> {
        self.store
            .save(&data)
            .map_err(|err| log_error(event, started_at, err.into()))?;
        Ok(self.hub.publish(data))
    }
}

fn log_error(event: &'static str, started_at: Instant, err: ServiceError) -> ServiceError {
    let code = match &err {
        ServiceError::Validation(_) => "validation_failed",
        ServiceError::Store(store) if store.is_corrupt() => "corrupt_document",
        ServiceError::Store(_) => "store_failed",
    };
    error!(
        "event={} module=service status=error duration_ms={} error_code={}",
        event,
        started_at.elapsed().as_millis(),
        code
    );
    err
}
