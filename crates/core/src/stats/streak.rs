use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::PracticeSession;
use crate::time::PracticeCalendar;

/// Consecutive-day practice summary. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStat {
    /// Run of consecutive practice days ending today or yesterday; 0 once lapsed.
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
}

fn is_next_day(later: NaiveDate, earlier: NaiveDate) -> bool {
    (later - earlier).num_days() == 1
}

/// Current and longest streak of calendar days with at least one completed session.
///
/// Timestamps are bucketed into days with `calendar`; `now` is bucketed the
/// same way to decide whether the most recent run is still alive.
#[must_use]
pub fn compute_streak(
    sessions: &[PracticeSession],
    calendar: &PracticeCalendar,
    now: DateTime<Utc>,
) -> StreakStat {
    let mut days: Vec<NaiveDate> = sessions
        .iter()
        .filter_map(PracticeSession::completed_at)
        .map(|at| calendar.day_of(at))
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&most_recent) = days.first() else {
        return StreakStat::default();
    };

    let today = calendar.day_of(now);
    let mut current_streak = 0_u32;
    if (today - most_recent).num_days() <= 1 {
        current_streak = 1;
        for pair in days.windows(2) {
            if !is_next_day(pair[0], pair[1]) {
                break;
            }
            current_streak += 1;
        }
    }

    let mut longest_streak = 1_u32;
    let mut run = 1_u32;
    for pair in days.windows(2) {
        if is_next_day(pair[0], pair[1]) {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 1;
        }
    }

    StreakStat {
        current_streak,
        longest_streak: longest_streak.max(current_streak),
        last_practice_date: Some(most_recent),
    }
}
