use chrono::{DateTime, Utc};
use gym_core::model::{
    Category, ConfidenceRating, Difficulty, PracticeSession, QualityRating, Question, QuestionId,
    SessionId, UserId,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn rating_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u8>, StorageError> {
    v.map(|raw| {
        u8::try_from(raw).map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
    })
    .transpose()
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let category: String = row.try_get("category").map_err(ser)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;
    let context: Option<String> = row.try_get("context").map_err(ser)?;

    let question = Question::new(
        QuestionId::new(id),
        Category::from_label(&category),
        text,
        Difficulty::parse(&difficulty).map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(match context {
        Some(context) => question.with_context(context),
        None => question,
    })
}

pub(crate) fn map_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PracticeSession, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let question_id: String = row.try_get("question_id").map_err(ser)?;

    let confidence = rating_from_i64("confidence", row.try_get("confidence").map_err(ser)?)?
        .map(ConfidenceRating::new)
        .transpose()
        .map_err(ser)?;
    let quality = rating_from_i64("quality", row.try_get("quality").map_err(ser)?)?
        .map(QualityRating::new)
        .transpose()
        .map_err(ser)?;

    let notes: Option<String> = row.try_get("notes").map_err(ser)?;
    let duration: i64 = row.try_get("duration_secs").map_err(ser)?;
    let duration_secs = u32::try_from(duration)
        .map_err(|_| StorageError::Serialization(format!("invalid duration_secs: {duration}")))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;

    PracticeSession::from_persisted(
        SessionId::new(id),
        UserId::new(user_id),
        QuestionId::new(question_id),
        confidence,
        quality,
        notes,
        duration_secs,
        created_at,
        completed_at,
    )
    .map_err(ser)
}
