use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, SessionId, UserId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RatingError {
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(u8),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session {0} already has a self-assessment")]
    AlreadyCompleted(SessionId),

    #[error("completed_at is before created_at")]
    InvalidTimeRange,
}

//
// ─── RATINGS ──────────────────────────────────────────────────────────────────
//

/// Self-rated confidence on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConfidenceRating(u8);

impl ConfidenceRating {
    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Self-rated answer quality on a 1-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct QualityRating(u8);

impl QualityRating {
    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConfidenceRating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfidenceRating> for u8 {
    fn from(value: ConfidenceRating) -> Self {
        value.0
    }
}

impl TryFrom<u8> for QualityRating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QualityRating> for u8 {
    fn from(value: QualityRating) -> Self {
        value.0
    }
}

//
// ─── SELF-ASSESSMENT ──────────────────────────────────────────────────────────
//

/// What the user reports after finishing an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfAssessment {
    pub confidence: ConfidenceRating,
    pub quality: Option<QualityRating>,
    pub notes: Option<String>,
}

impl SelfAssessment {
    #[must_use]
    pub fn new(confidence: ConfidenceRating) -> Self {
        Self {
            confidence,
            quality: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_quality(mut self, quality: QualityRating) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = (!notes.trim().is_empty()).then_some(notes);
        self
    }
}

//
// ─── PRACTICE SESSION ─────────────────────────────────────────────────────────
//

/// One practice attempt by a user against a question.
///
/// Created in progress; completed exactly once by `submit_assessment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    id: SessionId,
    user_id: UserId,
    question_id: QuestionId,
    confidence: Option<ConfidenceRating>,
    quality: Option<QualityRating>,
    notes: Option<String>,
    duration_secs: u32,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
    /// Start a new, in-progress attempt.
    #[must_use]
    pub fn start(
        id: SessionId,
        user_id: UserId,
        question_id: QuestionId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            question_id,
            confidence: None,
            quality: None,
            notes: None,
            duration_secs: 0,
            created_at: now,
            completed_at: None,
        }
    }

    /// Rehydrate a session from persisted storage or a backend payload.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTimeRange` if `completed_at` precedes `created_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        question_id: QuestionId,
        confidence: Option<ConfidenceRating>,
        quality: Option<QualityRating>,
        notes: Option<String>,
        duration_secs: u32,
        created_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SessionError> {
        if completed_at.is_some_and(|done| done < created_at) {
            return Err(SessionError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            user_id,
            question_id,
            confidence,
            quality,
            notes,
            duration_secs,
            created_at,
            completed_at,
        })
    }

    /// Record the self-assessment and mark the session completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` on a second submission, or
    /// `SessionError::InvalidTimeRange` if `now` is before `created_at`.
    pub fn submit_assessment(
        &mut self,
        assessment: SelfAssessment,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.completed_at.is_some() {
            return Err(SessionError::AlreadyCompleted(self.id.clone()));
        }
        if now < self.created_at {
            return Err(SessionError::InvalidTimeRange);
        }

        self.confidence = Some(assessment.confidence);
        self.quality = assessment.quality;
        self.notes = assessment.notes;
        self.duration_secs = duration_secs;
        self.completed_at = Some(now);
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn confidence(&self) -> Option<ConfidenceRating> {
        self.confidence
    }

    #[must_use]
    pub fn quality(&self) -> Option<QualityRating> {
        self.quality
    }

    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Confidence as a number, with a missing rating counting as zero.
    #[must_use]
    pub fn confidence_score(&self) -> u32 {
        self.confidence.map_or(0, |c| u32::from(c.value()))
    }

    /// Quality as a number, with a missing rating counting as zero.
    #[must_use]
    pub fn quality_score(&self) -> u32 {
        self.quality.map_or(0, |q| u32::from(q.value()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
