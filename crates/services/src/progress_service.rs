use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use gym_core::model::{PracticeSession, UserId};
use gym_core::stats::{
    CategoryStat, PracticeOverview, StreakStat, category_stats, compute_streak, practice_overview,
};
use gym_core::{Clock, PracticeCalendar};
use storage::repository::{PracticeSessionRepository, QuestionRepository};

use crate::error::ProgressError;

/// Sessions shown in the dashboard's "recent activity" list.
const RECENT_SESSION_LIMIT: usize = 3;

/// Default number of sessions a user aims for per week.
pub const DEFAULT_WEEKLY_GOAL: u32 = 5;

/// Everything the dashboard shows, computed from one snapshot of the user's sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub user_id: UserId,
    pub generated_at: DateTime<Utc>,
    pub overview: PracticeOverview,
    pub streak: StreakStat,
    pub categories: Vec<CategoryStat>,
    pub recent_sessions: Vec<PracticeSession>,
}

/// Read-only progress facade over the question and session stores.
///
/// Nothing is cached: every call reloads the user's sessions and recomputes.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    calendar: PracticeCalendar,
    weekly_goal: u32,
    questions: Arc<dyn QuestionRepository>,
    sessions: Arc<dyn PracticeSessionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        calendar: PracticeCalendar,
        questions: Arc<dyn QuestionRepository>,
        sessions: Arc<dyn PracticeSessionRepository>,
    ) -> Self {
        Self {
            clock,
            calendar,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            questions,
            sessions,
        }
    }

    #[must_use]
    pub fn with_weekly_goal(mut self, weekly_goal: u32) -> Self {
        self.weekly_goal = weekly_goal;
        self
    }

    /// Per-category progress for a user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn category_progress(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CategoryStat>, ProgressError> {
        let questions = self.questions.list_questions().await?;
        let sessions = self.sessions.list_sessions_for_user(user_id).await?;
        Ok(category_stats(&questions, &sessions))
    }

    /// Current and longest practice streak for a user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn streak(&self, user_id: &UserId) -> Result<StreakStat, ProgressError> {
        let sessions = self.sessions.list_sessions_for_user(user_id).await?;
        Ok(compute_streak(&sessions, &self.calendar, self.clock.now()))
    }

    /// Full dashboard for a user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn dashboard(&self, user_id: &UserId) -> Result<DashboardReport, ProgressError> {
        let now = self.clock.now();
        let questions = self.questions.list_questions().await?;
        let sessions = self.sessions.list_sessions_for_user(user_id).await?;
        debug!(
            user = %user_id,
            questions = questions.len(),
            sessions = sessions.len(),
            "recomputing dashboard"
        );

        let mut recent_sessions = sessions.clone();
        recent_sessions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        recent_sessions.truncate(RECENT_SESSION_LIMIT);

        Ok(DashboardReport {
            user_id: user_id.clone(),
            generated_at: now,
            overview: practice_overview(&sessions, now, self.weekly_goal),
            streak: compute_streak(&sessions, &self.calendar, now),
            categories: category_stats(&questions, &sessions),
            recent_sessions,
        })
    }
}
