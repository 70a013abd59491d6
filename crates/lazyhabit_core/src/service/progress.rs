//! Chart and header projections over the published document.

use crate::model::app_data::AppData;
use crate::model::habit::HabitId;

/// One labeled bar in the progress chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    pub habit_id: HabitId,
    pub label: String,
    /// Active streak length in days.
    pub value: u32,
}

/// Today's completion count for the track screen header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSummary {
    pub completed: usize,
    pub total: usize,
}

/// Maps every track's habit name and current streak into bars, in track order.
pub fn progress_bars(data: &AppData) -> Vec<ProgressBar> {
    data.track_views()
        .map(|view| ProgressBar {
            habit_id: view.habit.id,
            label: view.habit.name.clone(),
            value: view.habit.current_frequency,
        })
        .collect()
}

pub fn completion_summary(data: &AppData) -> CompletionSummary {
    let total = data.habits().len();
    let completed = data.habits().iter().filter(|habit| habit.completed).count();
    CompletionSummary { completed, total }
}

#[cfg(test)]
mod tests {
    use super::{completion_summary, progress_bars};
    use crate::model::app_data::AppData;
    use crate::model::habit::Habit;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn bars_follow_track_order_and_streaks() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let read = Uuid::new_v4();
        let walk = Uuid::new_v4();
        let data = AppData::empty(now)
            .create_habit(Habit::new(read, "Read", "Read"), now)
            .create_habit(Habit::new(walk, "Walk", "Walk"), now)
            .set_completed(walk, true, now);

        let bars = progress_bars(&data);
        let labels: Vec<_> = bars.iter().map(|bar| bar.label.as_str()).collect();
        assert_eq!(labels, vec!["Read", "Walk"]);
        assert_eq!(bars[1].value, 1);

        let summary = completion_summary(&data);
        assert_eq!((summary.completed, summary.total), (1, 2));
    }
}
