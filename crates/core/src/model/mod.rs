mod ids;
mod question;
mod session;

pub use ids::{ParseIdError, QuestionId, SessionId, UserId};

pub use question::{Category, Difficulty, Question, QuestionError};
pub use session::{
    ConfidenceRating, PracticeSession, QualityRating, RatingError, SelfAssessment, SessionError,
};
