use std::sync::Arc;

use rand::rng;
use rand::seq::IndexedRandom;
use tracing::info;
use uuid::Uuid;

use gym_core::Clock;
use gym_core::model::{
    Category, PracticeSession, Question, QuestionId, SelfAssessment, SessionId, UserId,
};
use storage::repository::{PracticeSessionRepository, QuestionRepository};

use crate::error::PracticeError;

/// A session paired with the question it was practised against.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionWithQuestion {
    pub session: PracticeSession,
    pub question: Question,
}

/// Drives a practice attempt: pick a question, start, self-assess.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    sessions: Arc<dyn PracticeSessionRepository>,
}

impl PracticeService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        sessions: Arc<dyn PracticeSessionRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            sessions,
        }
    }

    /// Pick a question uniformly at random, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::NoQuestions` if nothing matches, or
    /// `PracticeError::Storage` on repository failures.
    pub async fn random_question(
        &self,
        category: Option<&Category>,
    ) -> Result<Question, PracticeError> {
        let pool: Vec<Question> = self
            .questions
            .list_questions()
            .await?
            .into_iter()
            .filter(|q| category.is_none_or(|c| q.category() == c))
            .collect();

        let mut rng = rng();
        pool.choose(&mut rng).cloned().ok_or(PracticeError::NoQuestions)
    }

    /// Start a new attempt against an existing question.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::UnknownQuestion` if the question is missing, or
    /// `PracticeError::Storage` on repository failures.
    pub async fn start_session(
        &self,
        user_id: &UserId,
        question_id: &QuestionId,
    ) -> Result<PracticeSession, PracticeError> {
        if self.questions.get_question(question_id).await?.is_none() {
            return Err(PracticeError::UnknownQuestion(question_id.clone()));
        }

        let session = PracticeSession::start(
            SessionId::new(Uuid::new_v4().to_string()),
            user_id.clone(),
            question_id.clone(),
            self.clock.now(),
        );
        self.sessions.upsert_session(&session).await?;
        info!(session = %session.id(), user = %user_id, question = %question_id, "session started");
        Ok(session)
    }

    /// Record the user's self-assessment, completing the session.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::UnknownSession` if missing,
    /// `PracticeError::Session` if it was already assessed, or
    /// `PracticeError::Storage` on repository failures.
    pub async fn submit_assessment(
        &self,
        session_id: &SessionId,
        assessment: SelfAssessment,
        duration_secs: u32,
    ) -> Result<PracticeSession, PracticeError> {
        let mut session = self
            .sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| PracticeError::UnknownSession(session_id.clone()))?;

        session.submit_assessment(assessment, duration_secs, self.clock.now())?;
        self.sessions.upsert_session(&session).await?;
        info!(
            session = %session_id,
            confidence = session.confidence_score(),
            duration_secs,
            "assessment submitted"
        );
        Ok(session)
    }

    /// A user's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on repository failures.
    pub async fn list_sessions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeSession>, PracticeError> {
        Ok(self.sessions.list_sessions_for_user(user_id).await?)
    }

    /// Sessions whose question text or category contains `term`, ignoring case.
    ///
    /// Sessions referencing unknown questions never match.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on repository failures.
    pub async fn search_sessions(
        &self,
        user_id: &UserId,
        term: &str,
    ) -> Result<Vec<SessionWithQuestion>, PracticeError> {
        let sessions = self.sessions.list_sessions_for_user(user_id).await?;
        let questions = self.questions.list_questions().await?;

        Ok(sessions
            .into_iter()
            .filter_map(|session| {
                let question = questions.iter().find(|q| q.id() == session.question_id())?;
                question.matches_search(term).then(|| SessionWithQuestion {
                    session,
                    question: question.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gym_core::catalog::builtin_questions;
    use gym_core::model::{ConfidenceRating, SessionError};
    use gym_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn setup(clock: Clock) -> (InMemoryRepository, PracticeService) {
        let repo = InMemoryRepository::new();
        for q in builtin_questions() {
            repo.upsert_question(&q).await.unwrap();
        }
        let svc = PracticeService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()));
        (repo, svc)
    }

    #[tokio::test]
    async fn random_question_respects_category() {
        let (_, svc) = setup(Clock::fixed(fixed_now())).await;
        for _ in 0..10 {
            let q = svc
                .random_question(Some(&Category::DataValidity))
                .await
                .unwrap();
            assert_eq!(q.category(), &Category::DataValidity);
        }

        let err = svc
            .random_question(Some(&Category::Other("Product".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, PracticeError::NoQuestions));
    }

    #[tokio::test]
    async fn start_then_assess_once() {
        let mut clock = Clock::fixed(fixed_now());
        let (repo, svc) = setup(clock).await;
        let user = UserId::new("user1");

        let started = svc
            .start_session(&user, &QuestionId::new("q3"))
            .await
            .unwrap();
        assert!(!started.is_completed());

        clock.advance(Duration::seconds(75));
        let svc = PracticeService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()));
        let done = svc
            .submit_assessment(
                started.id(),
                SelfAssessment::new(ConfidenceRating::new(5).unwrap()),
                75,
            )
            .await
            .unwrap();
        assert_eq!(done.completed_at(), Some(fixed_now() + Duration::seconds(75)));

        let stored = repo.get_session(started.id()).await.unwrap().unwrap();
        assert_eq!(stored, done);

        let err = svc
            .submit_assessment(
                started.id(),
                SelfAssessment::new(ConfidenceRating::new(1).unwrap()),
                5,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Session(SessionError::AlreadyCompleted(_))
        ));
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let (_, svc) = setup(Clock::fixed(fixed_now())).await;
        let err = svc
            .start_session(&UserId::new("user1"), &QuestionId::new("q99"))
            .await
            .unwrap_err();
        assert!(matches!(err, PracticeError::UnknownQuestion(_)));

        let err = svc
            .submit_assessment(
                &SessionId::new("missing"),
                SelfAssessment::new(ConfidenceRating::new(3).unwrap()),
                0,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PracticeError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn search_matches_text_and_category() {
        let (_, svc) = setup(Clock::fixed(fixed_now())).await;
        let user = UserId::new("user1");
        svc.start_session(&user, &QuestionId::new("q17")).await.unwrap();
        svc.start_session(&user, &QuestionId::new("q1")).await.unwrap();

        let by_text = svc.search_sessions(&user, "INFUSION").await.unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].question.id().as_str(), "q17");

        let by_category = svc.search_sessions(&user, "cost &").await.unwrap();
        assert_eq!(by_category.len(), 1);

        let all = svc.search_sessions(&user, "").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(svc.list_sessions(&user).await.unwrap().len(), 2);
    }
}
