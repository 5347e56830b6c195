use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Rule for turning a timestamp into the calendar day a user practised on.
///
/// `Local` follows the executing machine's time zone; `Offset` pins a fixed
/// UTC offset so results do not depend on where the code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PracticeCalendar {
    #[default]
    Local,
    Offset(FixedOffset),
}

impl PracticeCalendar {
    /// Calendar pinned to UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::Offset(Utc.fix())
    }

    /// Calendar pinned to a whole-minute offset east of UTC.
    ///
    /// Returns `None` if the offset is out of range (more than 24h).
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::Offset)
    }

    /// Calendar date of `at` under this rule.
    #[must_use]
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Offset(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));
    }

    #[test]
    fn offset_calendar_shifts_day_boundary() {
        // 2023-11-14T22:13:20Z is already the 15th two hours east of UTC.
        let east = PracticeCalendar::from_offset_minutes(120).unwrap();
        let west = PracticeCalendar::from_offset_minutes(-300).unwrap();

        assert_eq!(
            PracticeCalendar::utc().day_of(fixed_now()),
            NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
        );
        assert_eq!(
            east.day_of(fixed_now()),
            NaiveDate::from_ymd_opt(2023, 11, 15).unwrap()
        );
        assert_eq!(
            west.day_of(fixed_now()),
            NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
        );
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(PracticeCalendar::from_offset_minutes(25 * 60).is_none());
    }
}
