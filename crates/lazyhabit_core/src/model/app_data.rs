//! Root habit document and its JSON wire shape.
//!
//! # Responsibility
//! - Hold habits (source of truth) and their one-to-one track records.
//! - Provide the pure mutation functions behind every use-case.
//! - Encode/decode the persisted JSON document, including legacy shapes.
//!
//! # Invariants
//! - Habit ids are unique; every habit has exactly one track with its id.
//! - Tracks are kept in the same order as habits.
//! - `completed == true` implies `current_frequency >= 1`.
//!
//! # Wire shape
//! `{"habits": [Habit], "tracks": [{"id", "date", "habit": Habit}],
//! "currentDate": RFC 3339}`. The embedded `tracks[*].habit` copies are
//! written for compatibility and are authoritative on decode.

use crate::model::habit::{Habit, HabitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Tracking record for one habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: HabitId,
    /// When the record was created or last toggled.
    pub date: DateTime<Utc>,
}

/// Read-only join of a track and the habit it tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackView<'a> {
    pub track: &'a Track,
    pub habit: &'a Habit,
}

/// Root persisted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppData {
    habits: Vec<Habit>,
    tracks: Vec<Track>,
    /// `None` when a stored document carried no readable date.
    current_date: Option<DateTime<Utc>>,
}

/// Structural invariant violations in a habit document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppDataError {
    DuplicateHabit(HabitId),
    DuplicateTrack(HabitId),
    TrackWithoutHabit(HabitId),
    HabitWithoutTrack(HabitId),
    CompletedWithoutStreak(HabitId),
}

impl Display for AppDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateHabit(id) => write!(f, "duplicate habit id: {id}"),
            Self::DuplicateTrack(id) => write!(f, "duplicate track id: {id}"),
            Self::TrackWithoutHabit(id) => write!(f, "track has no matching habit: {id}"),
            Self::HabitWithoutTrack(id) => write!(f, "habit has no matching track: {id}"),
            Self::CompletedWithoutStreak(id) => {
                write!(f, "habit marked completed with zero streak: {id}")
            }
        }
    }
}

impl Error for AppDataError {}

/// Failure to turn stored text into an [`AppData`].
#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    Invariant(AppDataError),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed habit document: {err}"),
            Self::Invariant(err) => write!(f, "inconsistent habit document: {err}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invariant(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<AppDataError> for DecodeError {
    fn from(value: AppDataError) -> Self {
        Self::Invariant(value)
    }
}

impl AppData {
    /// First-launch / cleared document.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            habits: Vec::new(),
            tracks: Vec::new(),
            current_date: Some(now),
        }
    }

    /// Builds a document from explicit records, checking every invariant.
    pub fn from_records(
        habits: Vec<Habit>,
        tracks: Vec<Track>,
        current_date: Option<DateTime<Utc>>,
    ) -> Result<Self, AppDataError> {
        let data = Self {
            habits,
            tracks,
            current_date,
        };
        data.validate()?;
        Ok(data)
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn habit(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn track(&self, id: HabitId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    /// Tracks joined with their habits, in track order.
    pub fn track_views(&self) -> impl Iterator<Item = TrackView<'_>> {
        self.tracks.iter().filter_map(move |track| {
            self.habit(track.id)
                .map(|habit| TrackView { track, habit })
        })
    }

    pub fn current_date(&self) -> Option<DateTime<Utc>> {
        self.current_date
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Checks the document invariants listed in the module docs.
    pub fn validate(&self) -> Result<(), AppDataError> {
        let mut habit_ids = HashSet::with_capacity(self.habits.len());
        for habit in &self.habits {
            if !habit_ids.insert(habit.id) {
                return Err(AppDataError::DuplicateHabit(habit.id));
            }
            if habit.completed && habit.current_frequency == 0 {
                return Err(AppDataError::CompletedWithoutStreak(habit.id));
            }
        }

        let mut track_ids = HashSet::with_capacity(self.tracks.len());
        for track in &self.tracks {
            if !track_ids.insert(track.id) {
                return Err(AppDataError::DuplicateTrack(track.id));
            }
            if !habit_ids.contains(&track.id) {
                return Err(AppDataError::TrackWithoutHabit(track.id));
            }
        }

        if let Some(habit) = self.habits.iter().find(|habit| !track_ids.contains(&habit.id)) {
            return Err(AppDataError::HabitWithoutTrack(habit.id));
        }
        Ok(())
    }

    /// Appends a new habit and its track dated `now`.
    ///
    /// A habit whose id is already live leaves the document unchanged.
    pub fn create_habit(mut self, habit: Habit, now: DateTime<Utc>) -> Self {
        if self.habit(habit.id).is_some() {
            return self;
        }
        self.tracks.push(Track {
            id: habit.id,
            date: now,
        });
        self.habits.push(habit);
        self
    }

    /// Replaces name and description; counters and completion stay as-is.
    pub fn edit_habit(
        mut self,
        id: HabitId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        if let Some(habit) = self.habit_mut(id) {
            habit.name = name.into();
            habit.description = description.into();
        }
        self
    }

    /// Marks or unmarks today's completion for one habit.
    ///
    /// Only a real transition moves the streak and touches the track date.
    pub fn set_completed(mut self, id: HabitId, value: bool, now: DateTime<Utc>) -> Self {
        let changed = self
            .habit_mut(id)
            .is_some_and(|habit| habit.set_completed(value));
        if changed {
            if let Some(track) = self.tracks.iter_mut().find(|track| track.id == id) {
                track.date = now;
            }
        }
        self
    }

    /// Removes a habit and its track; unknown ids are ignored.
    pub fn delete_habit(mut self, id: HabitId) -> Self {
        self.habits.retain(|habit| habit.id != id);
        self.tracks.retain(|track| track.id != id);
        self
    }

    pub(crate) fn habits_mut(&mut self) -> &mut [Habit] {
        &mut self.habits
    }

    pub(crate) fn set_current_date(&mut self, date: DateTime<Utc>) {
        self.current_date = Some(date);
    }

    fn habit_mut(&mut self, id: HabitId) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    /// Encodes the full document in its persisted wire shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let document = DocumentOut {
            habits: &self.habits,
            tracks: self
                .track_views()
                .map(|view| TrackOut {
                    id: view.track.id,
                    date: view.track.date,
                    habit: view.habit,
                })
                .collect(),
            current_date: self.current_date,
        };
        serde_json::to_string(&document)
    }

    /// Decodes stored text, reconciling legacy and redundant shapes.
    ///
    /// # Errors
    /// - `DecodeError::Json` when the text is not a habit document.
    /// - `DecodeError::Invariant` when reconciled records still conflict.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let document: DocumentIn = serde_json::from_str(text)?;
        Ok(reconcile(document)?)
    }
}

/// Draws a UUID v4 not used by any live habit.
pub fn next_habit_id(data: &AppData) -> HabitId {
    loop {
        let candidate = Uuid::new_v4();
        if data.habit(candidate).is_none() {
            return candidate;
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOut<'a> {
    habits: &'a [Habit],
    tracks: Vec<TrackOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct TrackOut<'a> {
    id: HabitId,
    date: DateTime<Utc>,
    habit: &'a Habit,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentIn {
    #[serde(default)]
    habits: Vec<Habit>,
    #[serde(default, alias = "track")]
    tracks: Vec<TrackIn>,
    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    current_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TrackIn {
    id: HabitId,
    #[serde(default, deserialize_with = "deserialize_lenient_date")]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    habit: Option<Habit>,
}

fn reconcile(document: DocumentIn) -> Result<AppData, AppDataError> {
    let fallback_date = document.current_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let mut listed: HashMap<HabitId, Habit> = HashMap::with_capacity(document.habits.len());
    let mut listed_order = Vec::with_capacity(document.habits.len());
    for habit in document.habits {
        if listed.contains_key(&habit.id) {
            return Err(AppDataError::DuplicateHabit(habit.id));
        }
        listed_order.push(habit.id);
        listed.insert(habit.id, habit);
    }

    let mut habits = Vec::with_capacity(document.tracks.len().max(listed_order.len()));
    let mut tracks = Vec::with_capacity(habits.capacity());
    let mut seen = HashSet::new();
    for track in document.tracks {
        if !seen.insert(track.id) {
            return Err(AppDataError::DuplicateTrack(track.id));
        }
        let habit = match (track.habit, listed.remove(&track.id)) {
            (Some(embedded), listed) => merge_embedded(track.id, embedded, listed),
            (None, Some(listed)) => listed,
            (None, None) => return Err(AppDataError::TrackWithoutHabit(track.id)),
        };
        habits.push(habit);
        tracks.push(Track {
            id: track.id,
            date: track.date.unwrap_or(fallback_date),
        });
    }

    // Habits that never got a track are kept and tracked from the document date.
    for id in listed_order {
        if let Some(habit) = listed.remove(&id) {
            tracks.push(Track {
                id,
                date: fallback_date,
            });
            habits.push(habit);
        }
    }

    for habit in &mut habits {
        habit.repair_completion();
    }
    AppData::from_records(habits, tracks, document.current_date)
}

// Embedded copies carry the freshest counters; old builds embedded only
// `{id, completed}`, so text fields fall back to the listed habit.
fn merge_embedded(id: HabitId, mut embedded: Habit, listed: Option<Habit>) -> Habit {
    embedded.id = id;
    if let Some(listed) = listed {
        if embedded.name.is_empty() {
            embedded.name = listed.name;
        }
        if embedded.description.is_empty() {
            embedded.description = listed.description;
        }
    }
    embedded
}

fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|date| date.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::{next_habit_id, AppData, AppDataError, DecodeError, Track};
    use crate::model::habit::Habit;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn create_appends_habit_and_track_in_order() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let first = Habit::new(Uuid::new_v4(), "Read", "Read 20 pages");
        let second = Habit::new(Uuid::new_v4(), "Walk", "Walk 5k");
        let data = AppData::empty(now)
            .create_habit(first.clone(), now)
            .create_habit(second.clone(), now);

        let ids: Vec<_> = data.tracks().iter().map(|track| track.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        data.validate().expect("created document should be valid");
    }

    #[test]
    fn from_records_rejects_orphan_track() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let id = Uuid::new_v4();
        let error = AppData::from_records(Vec::new(), vec![Track { id, date: now }], Some(now))
            .expect_err("track without habit must be rejected");
        assert_eq!(error, AppDataError::TrackWithoutHabit(id));
    }

    #[test]
    fn decode_prefers_embedded_habit_counters_over_stale_list() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{
                "habits": [{{"id":"{id}","name":"Read","description":"Daily","currectFrequency":0,"previousFrequency":0,"completed":false}}],
                "tracks": [{{"id":"{id}","date":"2024-05-01T08:00:00.000Z","habit":{{"id":"{id}","name":"Read","description":"Daily","currectFrequency":1,"previousFrequency":0,"completed":true}}}}],
                "currentDate": "2024-05-01T08:00:00.000Z"
            }}"#
        );
        let data = AppData::from_json(&json).expect("legacy document should decode");
        let habit = data.habit(id).expect("habit should exist");
        assert_eq!(habit.current_frequency, 1);
        assert!(habit.completed);
    }

    #[test]
    fn decode_keeps_listed_text_when_embedded_copy_has_none() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"habits":[{{"id":"{id}","name":"Stretch","description":"Ten minutes"}}],
                "track":[{{"id":"{id}","date":"2024-05-01T08:00:00Z","habit":{{"id":"{id}","completed":false}}}}]}}"#
        );
        let data = AppData::from_json(&json).expect("oldest shape should decode");
        assert_eq!(data.habit(id).map(|habit| habit.name.as_str()), Some("Stretch"));
        assert_eq!(data.current_date(), None);
    }

    #[test]
    fn decode_tolerates_unreadable_current_date() {
        let data = AppData::from_json(r#"{"habits":[],"tracks":[],"currentDate":"yesterday"}"#)
            .expect("unreadable date is not corruption");
        assert_eq!(data.current_date(), None);
    }

    #[test]
    fn decode_rejects_non_document_text() {
        let error = AppData::from_json("not json").expect_err("garbage must fail");
        assert!(matches!(error, DecodeError::Json(_)));
    }

    #[test]
    fn encode_embeds_habit_copy_in_track() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let habit = Habit::new(Uuid::new_v4(), "Read", "Read 20 pages");
        let data = AppData::empty(now).create_habit(habit.clone(), now);

        let value: serde_json::Value =
            serde_json::from_str(&data.to_json().expect("encode should succeed"))
                .expect("encoded text should be JSON");
        assert_eq!(value["tracks"][0]["habit"]["name"], "Read");
        assert_eq!(value["tracks"][0]["habit"]["currentFrequency"], 0);
        assert_eq!(value["habits"][0]["id"], habit.id.to_string());
        assert!(value["currentDate"].is_string());
    }

    #[test]
    fn next_habit_id_is_not_live() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let data = AppData::empty(now).create_habit(Habit::new(Uuid::new_v4(), "A", "B"), now);
        let id = next_habit_id(&data);
        assert!(data.habit(id).is_none());
    }
}
