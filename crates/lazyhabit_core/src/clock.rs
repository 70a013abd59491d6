//! Wall-clock source for rollover and record timestamps.
//!
//! Instants are stored in UTC; calendar-day comparisons use the clock's own
//! time zone so a rollover happens at local midnight.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Current time plus the calendar used to cut it into days.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `instant` in this clock's time zone.
    fn calendar_day(&self, instant: DateTime<Utc>) -> NaiveDate;

    fn today(&self) -> NaiveDate {
        self.calendar_day(self.now())
    }
}

/// Platform clock using the device local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn calendar_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&Local).date_naive()
    }
}

/// Clock frozen at one instant in a fixed-offset zone.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// Fixed clock on UTC calendar days.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    /// Moves the frozen instant; used to simulate app restarts on later days.
    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn calendar_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    #[test]
    fn calendar_day_follows_clock_offset() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let utc_clock = FixedClock::utc(instant);
        let tokyo_clock = FixedClock::new(instant, tokyo);

        assert_eq!(utc_clock.today(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(tokyo_clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }
}
