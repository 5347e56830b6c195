use gym_core::model::{PracticeSession, SessionId, UserId};

use super::{SqliteRepository, mapping::map_session_row};
use crate::repository::{PracticeSessionRepository, StorageError};

#[async_trait::async_trait]
impl PracticeSessionRepository for SqliteRepository {
    async fn upsert_session(&self, session: &PracticeSession) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO practice_sessions (
                    id, user_id, question_id, confidence, quality, notes,
                    duration_secs, created_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    -- owner and creation time are fixed at first insert
                    question_id = excluded.question_id,
                    confidence = excluded.confidence,
                    quality = excluded.quality,
                    notes = excluded.notes,
                    duration_secs = excluded.duration_secs,
                    completed_at = excluded.completed_at
                WHERE practice_sessions.user_id = excluded.user_id
            ",
        )
        .bind(session.id().as_str())
        .bind(session.user_id().as_str())
        .bind(session.question_id().as_str())
        .bind(session.confidence().map(|c| i64::from(c.value())))
        .bind(session.quality().map(|q| i64::from(q.value())))
        .bind(session.notes())
        .bind(i64::from(session.duration_secs()))
        .bind(session.created_at())
        .bind(session.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<PracticeSession>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, user_id, question_id, confidence, quality, notes,
                    duration_secs, created_at, completed_at
                FROM practice_sessions
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn list_sessions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, question_id, confidence, quality, notes,
                    duration_secs, created_at, completed_at
                FROM practice_sessions
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_session_row(&row)?);
        }
        Ok(out)
    }
}
