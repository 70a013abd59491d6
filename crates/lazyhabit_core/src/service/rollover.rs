//! Daily rollover of completion flags and streak counters.
//!
//! # Responsibility
//! - Decide, once per app start, whether the calendar day changed since the
//!   stored `currentDate`.
//! - Apply the streak rule to every habit when it did.
//!
//! # Invariants
//! - Day equality is year+month+day in the clock's time zone.
//! - Running twice on the same day is a no-op the second time.
//! - `currentDate` never moves backwards.

use crate::clock::Clock;
use crate::model::app_data::AppData;
use crate::model::habit::StreakChange;

/// What the rollover concluded from the stored date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverDecision {
    /// Stored day is today; nothing to do.
    SameDay,
    /// Today is later than the stored day; streaks were rolled.
    NewDay,
    /// Stored date was missing or unreadable; treated as today and stamped.
    DateUnknown,
    /// Stored day is later than today (clock moved back); left untouched.
    StoredDateAhead,
}

/// Summary of one rollover evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverReport {
    pub decision: RolloverDecision,
    pub streaks_advanced: usize,
    pub streaks_reset: usize,
}

impl RolloverReport {
    fn unchanged(decision: RolloverDecision) -> Self {
        Self {
            decision,
            streaks_advanced: 0,
            streaks_reset: 0,
        }
    }

    /// Whether the returned document differs from the input and must be saved.
    pub fn needs_write(&self) -> bool {
        matches!(
            self.decision,
            RolloverDecision::NewDay | RolloverDecision::DateUnknown
        )
    }
}

/// Applies the daily rollover rule to `data` as of `clock.now()`.
///
/// On a new day, per habit: a streak that did not grow since the previous
/// rollover (`current <= previous`) resets both counters to zero, otherwise
/// `previous` takes the value of `current`. Every habit starts the day
/// unmarked and `currentDate` becomes now.
pub fn roll_over(mut data: AppData, clock: &impl Clock) -> (AppData, RolloverReport) {
    let now = clock.now();
    let Some(stored) = data.current_date() else {
        data.set_current_date(now);
        return (data, RolloverReport::unchanged(RolloverDecision::DateUnknown));
    };

    let stored_day = clock.calendar_day(stored);
    let today = clock.calendar_day(now);
    if stored_day == today {
        return (data, RolloverReport::unchanged(RolloverDecision::SameDay));
    }
    if stored_day > today {
        return (
            data,
            RolloverReport::unchanged(RolloverDecision::StoredDateAhead),
        );
    }

    let mut report = RolloverReport::unchanged(RolloverDecision::NewDay);
    for habit in data.habits_mut() {
        match habit.roll_over() {
            StreakChange::Advanced => report.streaks_advanced += 1,
            StreakChange::Reset => report.streaks_reset += 1,
        }
    }
    data.set_current_date(now);
    (data, report)
}

#[cfg(test)]
mod tests {
    use super::{roll_over, RolloverDecision};
    use crate::clock::FixedClock;
    use crate::model::app_data::AppData;
    use crate::model::habit::Habit;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn unknown_date_is_stamped_without_touching_streaks() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"habits":[{{"id":"{id}","name":"Run","description":"5k","currentFrequency":2,"previousFrequency":1,"completed":true}}],"tracks":[{{"id":"{id}","date":"2024-05-01T09:00:00Z"}}]}}"#
        );
        let data = AppData::from_json(&json).expect("decode");

        let (rolled, report) = roll_over(data, &FixedClock::utc(now));
        assert_eq!(report.decision, RolloverDecision::DateUnknown);
        assert!(report.needs_write());
        assert_eq!(rolled.current_date(), Some(now));
        let habit = rolled.habit(id).expect("habit kept");
        assert!(habit.completed);
        assert_eq!(habit.current_frequency, 2);
    }

    #[test]
    fn stored_date_ahead_of_clock_is_left_alone() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let future = now + Duration::days(3);
        let data = AppData::empty(future)
            .create_habit(Habit::new(Uuid::new_v4(), "Run", "5k"), future);

        let (rolled, report) = roll_over(data.clone(), &FixedClock::utc(now));
        assert_eq!(report.decision, RolloverDecision::StoredDateAhead);
        assert!(!report.needs_write());
        assert_eq!(rolled, data);
    }

    #[test]
    fn crossing_midnight_counts_advanced_and_reset_streaks() {
        let yesterday = Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 0, 5, 0).unwrap();
        let kept = Uuid::new_v4();
        let missed = Uuid::new_v4();
        let data = AppData::empty(yesterday)
            .create_habit(Habit::new(kept, "Read", "Read"), yesterday)
            .create_habit(Habit::new(missed, "Walk", "Walk"), yesterday)
            .set_completed(kept, true, yesterday);

        let (rolled, report) = roll_over(data, &FixedClock::utc(now));
        assert_eq!(report.decision, RolloverDecision::NewDay);
        assert_eq!((report.streaks_advanced, report.streaks_reset), (1, 1));
        let kept = rolled.habit(kept).expect("kept habit");
        assert_eq!((kept.current_frequency, kept.previous_frequency), (1, 1));
        assert!(!kept.completed);
    }
}
