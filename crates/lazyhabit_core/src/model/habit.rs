//! Habit domain model and user-input validation.
//!
//! # Responsibility
//! - Define the canonical habit record and its streak counters.
//! - Validate user-entered names/descriptions before they reach storage.
//!
//! # Invariants
//! - `id` is stable and never reused for another live habit.
//! - `completed == true` implies `current_frequency >= 1`.
//! - Counters are unsigned; decrements saturate at zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a habit and its track record.
pub type HabitId = Uuid;

/// Maximum accepted habit name length in characters.
pub const MAX_NAME_CHARS: usize = 64;
/// Maximum accepted habit description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 480;

static HABIT_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s.,!?-]+$").expect("valid habit text regex"));

/// User-defined behavior tracked once per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Consecutive completed days in the active streak.
    #[serde(
        default,
        alias = "currectFrequency",
        deserialize_with = "deserialize_counter"
    )]
    pub current_frequency: u32,
    /// Streak snapshot taken by the last day rollover.
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub previous_frequency: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Habit {
    /// Creates a fresh habit with zeroed counters.
    ///
    /// Does not validate text; callers run [`validate_habit_text`] first.
    pub fn new(id: HabitId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            current_frequency: 0,
            previous_frequency: 0,
            completed: false,
        }
    }

    /// Sets today's completion flag and moves the streak with it.
    ///
    /// Returns `false` when `completed` already equals `value`; counters are
    /// left untouched in that case.
    pub fn set_completed(&mut self, value: bool) -> bool {
        if self.completed == value {
            return false;
        }
        self.completed = value;
        if value {
            self.current_frequency = self.current_frequency.saturating_add(1);
        } else {
            self.current_frequency = self.current_frequency.saturating_sub(1);
        }
        true
    }

    /// Applies the day-rollover streak rule to this habit.
    pub fn roll_over(&mut self) -> StreakChange {
        let change = if self.current_frequency <= self.previous_frequency {
            self.current_frequency = 0;
            self.previous_frequency = 0;
            StreakChange::Reset
        } else {
            self.previous_frequency = self.current_frequency;
            StreakChange::Advanced
        };
        self.completed = false;
        change
    }

    /// Restores `completed => current_frequency >= 1` for decoded records.
    pub(crate) fn repair_completion(&mut self) {
        if self.completed && self.current_frequency == 0 {
            self.current_frequency = 1;
        }
    }
}

/// Outcome of [`Habit::roll_over`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// The streak grew since the last rollover and became the new baseline.
    Advanced,
    /// The streak stalled (a day was missed) and both counters went to zero.
    Reset,
}

/// Text field checked by [`validate_habit_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HabitField {
    Name,
    Description,
}

impl HabitField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
        }
    }

    fn max_chars(self) -> usize {
        match self {
            Self::Name => MAX_NAME_CHARS,
            Self::Description => MAX_DESCRIPTION_CHARS,
        }
    }
}

/// Validation failures for habit text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    Empty(HabitField),
    TooLong { field: HabitField, max_chars: usize },
    InvalidCharacters(HabitField),
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "{} cannot be empty", field.as_str()),
            Self::TooLong { field, max_chars } => write!(
                f,
                "{} exceeds {max_chars} characters",
                field.as_str()
            ),
            Self::InvalidCharacters(field) => {
                write!(f, "invalid value for {} text field", field.as_str())
            }
        }
    }
}

impl Error for HabitValidationError {}

/// Checks one habit text field against the input allow-list.
///
/// Accepted: ASCII letters, digits, whitespace and `. , ! ? -`.
pub fn validate_habit_text(field: HabitField, value: &str) -> Result<(), HabitValidationError> {
    if value.trim().is_empty() {
        return Err(HabitValidationError::Empty(field));
    }
    let max_chars = field.max_chars();
    if value.chars().count() > max_chars {
        return Err(HabitValidationError::TooLong { field, max_chars });
    }
    if !HABIT_TEXT_RE.is_match(value) {
        return Err(HabitValidationError::InvalidCharacters(field));
    }
    Ok(())
}

/// Validates both fields used by create/edit flows, name first.
pub fn validate_habit_input(name: &str, description: &str) -> Result<(), HabitValidationError> {
    validate_habit_text(HabitField::Name, name)?;
    validate_habit_text(HabitField::Description, description)
}

// Older builds could persist negative counters after repeated unmarking.
fn deserialize_counter<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use super::{
        validate_habit_input, validate_habit_text, Habit, HabitField, HabitValidationError,
        StreakChange, MAX_NAME_CHARS,
    };
    use uuid::Uuid;

    #[test]
    fn validation_accepts_basic_punctuation() {
        validate_habit_text(HabitField::Name, "Read, then walk - 20 min!")
            .expect("allow-listed text should pass");
    }

    #[test]
    fn validation_rejects_symbols_outside_allow_list() {
        let error = validate_habit_text(HabitField::Description, "50% done #goal")
            .expect_err("`%` and `#` are not allowed");
        assert_eq!(
            error,
            HabitValidationError::InvalidCharacters(HabitField::Description)
        );
    }

    #[test]
    fn validation_rejects_blank_and_overlong_values() {
        assert_eq!(
            validate_habit_text(HabitField::Name, "   "),
            Err(HabitValidationError::Empty(HabitField::Name))
        );
        let long = "a".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(
            validate_habit_text(HabitField::Name, &long),
            Err(HabitValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn input_validation_reports_name_before_description() {
        let error = validate_habit_input("", "").expect_err("both fields are empty");
        assert_eq!(error, HabitValidationError::Empty(HabitField::Name));
    }

    #[test]
    fn unmarking_at_zero_saturates() {
        let mut habit = Habit::new(Uuid::new_v4(), "Run", "Morning run");
        habit.completed = true;
        assert!(habit.set_completed(false));
        assert_eq!(habit.current_frequency, 0);
    }

    #[test]
    fn setting_same_value_is_a_no_op() {
        let mut habit = Habit::new(Uuid::new_v4(), "Run", "Morning run");
        assert!(habit.set_completed(true));
        assert!(!habit.set_completed(true));
        assert_eq!(habit.current_frequency, 1);
    }

    #[test]
    fn roll_over_resets_stalled_streak() {
        let mut habit = Habit::new(Uuid::new_v4(), "Run", "Morning run");
        habit.previous_frequency = 2;
        assert_eq!(habit.roll_over(), StreakChange::Reset);
        assert_eq!((habit.current_frequency, habit.previous_frequency), (0, 0));
    }

    #[test]
    fn negative_legacy_counter_decodes_as_zero() {
        let json = format!(
            r#"{{"id":"{}","name":"Run","currectFrequency":-2,"completed":false}}"#,
            Uuid::new_v4()
        );
        let habit: Habit = serde_json::from_str(&json).expect("legacy habit should decode");
        assert_eq!(habit.current_frequency, 0);
        assert_eq!(habit.previous_frequency, 0);
        assert_eq!(habit.description, "");
    }
}
