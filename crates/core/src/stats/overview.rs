use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::category::round_one_decimal;
use crate::model::PracticeSession;

/// Headline numbers for a user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOverview {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub avg_confidence: f64,
    pub avg_quality: f64,
    pub total_duration_secs: u64,
    /// Sessions started within the last seven days.
    pub completed_this_week: u32,
    pub weekly_goal: u32,
    pub weekly_goal_met: bool,
}

fn mean_one_decimal(sum: u64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let sum = sum as f64;
    round_one_decimal(sum / f64::from(count))
}

/// Summarize all of a user's sessions. Missing ratings count as zero.
#[must_use]
pub fn practice_overview(
    sessions: &[PracticeSession],
    now: DateTime<Utc>,
    weekly_goal: u32,
) -> PracticeOverview {
    let week_ago = now - Duration::days(7);

    let mut total_sessions = 0_u32;
    let mut completed_sessions = 0_u32;
    let mut confidence_sum = 0_u64;
    let mut quality_sum = 0_u64;
    let mut total_duration_secs = 0_u64;
    let mut completed_this_week = 0_u32;

    for session in sessions {
        total_sessions = total_sessions.saturating_add(1);
        if session.is_completed() {
            completed_sessions = completed_sessions.saturating_add(1);
        }
        confidence_sum += u64::from(session.confidence_score());
        quality_sum += u64::from(session.quality_score());
        total_duration_secs += u64::from(session.duration_secs());
        if session.created_at() >= week_ago {
            completed_this_week = completed_this_week.saturating_add(1);
        }
    }

    PracticeOverview {
        total_sessions,
        completed_sessions,
        avg_confidence: mean_one_decimal(confidence_sum, total_sessions),
        avg_quality: mean_one_decimal(quality_sum, total_sessions),
        total_duration_secs,
        completed_this_week,
        weekly_goal,
        weekly_goal_met: completed_this_week >= weekly_goal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConfidenceRating, QualityRating, QuestionId, SelfAssessment, SessionId, UserId,
    };
    use crate::time::fixed_now;

    fn assessed(id: &str, days_ago: i64, confidence: u8, quality: u8, secs: u32) -> PracticeSession {
        let at = fixed_now() - Duration::days(days_ago);
        let mut session = PracticeSession::start(
            SessionId::new(id),
            UserId::new("user1"),
            QuestionId::new("q1"),
            at,
        );
        session
            .submit_assessment(
                SelfAssessment::new(ConfidenceRating::new(confidence).unwrap())
                    .with_quality(QualityRating::new(quality).unwrap()),
                secs,
                at,
            )
            .unwrap();
        session
    }

    #[test]
    fn empty_overview_is_zeroed() {
        let overview = practice_overview(&[], fixed_now(), 5);
        assert_eq!(overview.total_sessions, 0);
        assert_eq!(overview.avg_confidence, 0.0);
        assert_eq!(overview.avg_quality, 0.0);
        assert!(!overview.weekly_goal_met);
    }

    #[test]
    fn overview_sums_and_averages() {
        let open = PracticeSession::start(
            SessionId::new("open"),
            UserId::new("user1"),
            QuestionId::new("q2"),
            fixed_now(),
        );
        let sessions = vec![
            assessed("s1", 2, 4, 4, 95),
            assessed("s2", 5, 5, 5, 78),
            assessed("s3", 10, 3, 2, 120),
            open,
        ];

        let overview = practice_overview(&sessions, fixed_now(), 3);
        assert_eq!(overview.total_sessions, 4);
        assert_eq!(overview.completed_sessions, 3);
        // (4 + 5 + 3 + 0) / 4
        assert_eq!(overview.avg_confidence, 3.0);
        // (4 + 5 + 2 + 0) / 4 = 2.75
        assert_eq!(overview.avg_quality, 2.8);
        assert_eq!(overview.total_duration_secs, 293);
        assert_eq!(overview.completed_this_week, 3);
        assert!(overview.weekly_goal_met);
    }
}
