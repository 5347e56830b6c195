use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("unknown difficulty label: {0}")]
    UnknownDifficulty(String),
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// Topical grouping of practice questions.
///
/// The seven known categories form a fixed enumeration; any other label read
/// from storage or the backend is kept verbatim in `Other` and never matches a
/// known category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    CostAndValue,
    ClinicalDataAndEvidence,
    PatientAcceptance,
    ClinicalDecisionMaking,
    DataValidity,
    TreatmentPracticality,
    SkepticismAndPushback,
    Other(String),
}

impl Category {
    /// Known categories in display order.
    pub const KNOWN: [Category; 7] = [
        Category::CostAndValue,
        Category::ClinicalDataAndEvidence,
        Category::PatientAcceptance,
        Category::ClinicalDecisionMaking,
        Category::DataValidity,
        Category::TreatmentPracticality,
        Category::SkepticismAndPushback,
    ];

    /// Maps a label to a category by exact string equality.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "Cost & Value" => Self::CostAndValue,
            "Clinical Data & Evidence" => Self::ClinicalDataAndEvidence,
            "Patient Acceptance & Treatment Burden" => Self::PatientAcceptance,
            "Clinical Decision-Making & Time Constraints" => Self::ClinicalDecisionMaking,
            "Data Validity & Study Design" => Self::DataValidity,
            "Treatment Practicality" => Self::TreatmentPracticality,
            "Skepticism & Pushback" => Self::SkepticismAndPushback,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::CostAndValue => "Cost & Value",
            Self::ClinicalDataAndEvidence => "Clinical Data & Evidence",
            Self::PatientAcceptance => "Patient Acceptance & Treatment Burden",
            Self::ClinicalDecisionMaking => "Clinical Decision-Making & Time Constraints",
            Self::DataValidity => "Data Validity & Study Design",
            Self::TreatmentPracticality => "Treatment Practicality",
            Self::SkepticismAndPushback => "Skepticism & Pushback",
            Self::Other(label) => label,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Parses a difficulty label, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::UnknownDifficulty` for any other label.
    pub fn parse(label: &str) -> Result<Self, QuestionError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestionError::UnknownDifficulty(label.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A physician question users rehearse answers to. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category: Category,
    text: String,
    difficulty: Difficulty,
    context: Option<String>,
}

impl Question {
    /// Build a question, trimming the prompt text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the text is blank.
    pub fn new(
        id: QuestionId,
        category: Category,
        text: impl Into<String>,
        difficulty: Difficulty,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        Ok(Self {
            id,
            category,
            text: trimmed.to_string(),
            difficulty,
            context: None,
        })
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Case-insensitive match against the question text or category label.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.text.to_lowercase().contains(&needle)
            || self.category.label().to_lowercase().contains(&needle)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
