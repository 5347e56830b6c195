use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Category, PracticeSession, Question, QuestionId};

/// Per-category practice progress. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: Category,
    pub sessions_completed: u32,
    pub total_questions: u32,
    /// Mean self-rated confidence, one decimal place; `0.0` when nothing matched.
    pub avg_confidence: f64,
    /// Completed sessions as a percentage of the category's questions, capped at 100.
    pub progress: f64,
}

impl CategoryStat {
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.sessions_completed > 0
    }
}

/// Rounds to one decimal place, half away from zero.
///
/// Ties are decided on the binary value, so `2.25` becomes `2.3`.
pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Progress for every known category, in the fixed category order.
///
/// Only completed sessions count. A session belongs to the category of the
/// question it references; sessions pointing at unknown questions, or at
/// questions outside the known categories, count nowhere.
#[must_use]
pub fn category_stats(questions: &[Question], sessions: &[PracticeSession]) -> Vec<CategoryStat> {
    let by_id: HashMap<&QuestionId, &Category> =
        questions.iter().map(|q| (q.id(), q.category())).collect();

    Category::KNOWN
        .into_iter()
        .map(|category| {
            let total_questions = questions
                .iter()
                .filter(|q| *q.category() == category)
                .count();

            let mut sessions_completed = 0_u32;
            let mut confidence_sum = 0_u32;
            for session in sessions.iter().filter(|s| s.is_completed()) {
                if by_id.get(session.question_id()) == Some(&&category) {
                    sessions_completed = sessions_completed.saturating_add(1);
                    confidence_sum = confidence_sum.saturating_add(session.confidence_score());
                }
            }

            let avg_confidence = if sessions_completed == 0 {
                0.0
            } else {
                round_one_decimal(f64::from(confidence_sum) / f64::from(sessions_completed))
            };

            let total_questions = u32::try_from(total_questions).unwrap_or(u32::MAX);
            let progress = if total_questions == 0 {
                0.0
            } else {
                (f64::from(sessions_completed) / f64::from(total_questions) * 100.0).min(100.0)
            };

            CategoryStat {
                category,
                sessions_completed,
                total_questions,
                avg_confidence,
                progress,
            }
        })
        .collect()
}
