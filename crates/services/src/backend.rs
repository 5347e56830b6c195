//! Client for the hosted practice backend.
//!
//! Authentication lives elsewhere; this client only attaches the bearer token
//! it is given and relays the backend's status and message on failure.

use std::env;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use gym_core::model::{
    ConfidenceRating, PracticeSession, QualityRating, QuestionId, SessionId, UserId,
};
use storage::repository::{PracticeSessionRepository, StorageError};

use crate::error::BackendError;

const DEFAULT_BASE_URL: &str = "https://dnate-backend.vercel.app/api";

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub token: String,
}

impl BackendConfig {
    /// Build a config, validating the base URL.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, BackendError> {
        // A trailing slash keeps `join` from dropping the last path segment.
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        Ok(Self {
            base_url: Url::parse(&normalized)?,
            token: token.into(),
        })
    }

    /// Reads `GYM_API_TOKEN` and `GYM_API_BASE_URL`.
    ///
    /// Returns `Ok(None)` when no token is configured.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if the base URL does not parse.
    pub fn from_env() -> Result<Option<Self>, BackendError> {
        let Ok(token) = env::var("GYM_API_TOKEN") else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            return Ok(None);
        }
        let base_url = env::var("GYM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(&base_url, token).map(Some)
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    config: Option<BackendConfig>,
}

impl BackendClient {
    #[must_use]
    pub fn new(config: Option<BackendConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Fetch the authenticated user's sessions.
    ///
    /// Records that cannot form a session are dropped and counted in
    /// `SessionBatch::malformed`; the rest of the batch is kept.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Disabled` without a config, `BackendError::Status`
    /// for non-success responses, or `BackendError::Http` on transport failures.
    pub async fn fetch_sessions(&self) -> Result<SessionBatch, BackendError> {
        let config = self.config.as_ref().ok_or(BackendError::Disabled)?;
        let url = config.endpoint("sessions")?;
        debug!(%url, "fetching sessions");

        let response = self
            .client
            .get(url)
            .bearer_auth(&config.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status,
                message: error_message(&body, status),
            });
        }

        let body: SessionsResponse = response.json().await?;
        Ok(decode_sessions(body.sessions))
    }
}

/// Sessions decoded from one backend response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionBatch {
    pub sessions: Vec<PracticeSession>,
    pub malformed: usize,
}

/// Outcome of one `sync_sessions` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub stored: usize,
    /// Sessions whose id already belongs to another local user.
    pub conflicts: usize,
    pub malformed: usize,
}

/// Pull sessions from the backend into a local repository.
///
/// A session whose id is owned by a different local user is skipped and
/// counted as a conflict. Upserts are idempotent, so a run that fails midway
/// can simply be repeated.
///
/// # Errors
///
/// Returns `BackendError` if fetching fails or the repository reports
/// anything other than an ownership conflict.
pub async fn sync_sessions(
    client: &BackendClient,
    sessions: &dyn PracticeSessionRepository,
) -> Result<SyncReport, BackendError> {
    let batch = client.fetch_sessions().await?;
    let mut report = SyncReport {
        malformed: batch.malformed,
        ..SyncReport::default()
    };

    for session in &batch.sessions {
        match sessions.upsert_session(session).await {
            Ok(()) => report.stored += 1,
            Err(StorageError::Conflict) => {
                warn!(session = %session.id(), user = %session.user_id(), "session id owned by another user");
                report.conflicts += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(
        stored = report.stored,
        conflicts = report.conflicts,
        malformed = report.malformed,
        "sessions synced from backend"
    );
    Ok(report)
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| format!("API Error: {}", status.as_u16()))
}

fn decode_sessions(records: Vec<Value>) -> SessionBatch {
    let mut batch = SessionBatch::default();
    for record in records {
        match serde_json::from_value::<SessionDto>(record) {
            Ok(dto) => match dto.into_session() {
                Some(session) => batch.sessions.push(session),
                None => batch.malformed += 1,
            },
            Err(err) => {
                warn!(%err, "skipping unreadable backend session");
                batch.malformed += 1;
            }
        }
    }
    batch
}

/// Reads an integer out of a loosely typed field; anything else is missing.
#[allow(clippy::cast_possible_truncation)]
fn loose_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    #[serde(default)]
    sessions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDto {
    id: String,
    user_id: String,
    question_id: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    confidence_rating: Option<Value>,
    #[serde(default)]
    quality_rating: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    completed_at: Option<Value>,
}

impl SessionDto {
    /// Ratings, durations and timestamps that do not fit degrade to
    /// "missing"; only records that cannot form a session are dropped.
    fn into_session(self) -> Option<PracticeSession> {
        let confidence = loose_int(self.confidence_rating.as_ref())
            .and_then(|v| u8::try_from(v).ok())
            .and_then(|v| ConfidenceRating::new(v).ok());
        let quality = loose_int(self.quality_rating.as_ref())
            .and_then(|v| u8::try_from(v).ok())
            .and_then(|v| QualityRating::new(v).ok());
        let duration_secs = loose_int(self.duration.as_ref())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        let notes = match self.notes {
            Some(Value::String(notes)) => Some(notes),
            _ => None,
        };
        let completed_at = loose_timestamp(self.completed_at.as_ref());

        match PracticeSession::from_persisted(
            SessionId::new(self.id.clone()),
            UserId::new(self.user_id),
            QuestionId::new(self.question_id),
            confidence,
            quality,
            notes,
            duration_secs,
            self.created_at,
            completed_at,
        ) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(session = %self.id, %err, "skipping backend session");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "sessions": [
            {
                "id": "session1",
                "userId": "user1",
                "questionId": "q1",
                "personaId": "persona1",
                "status": "completed",
                "confidenceRating": 4,
                "qualityRating": 4,
                "notes": "Good explanation of value proposition",
                "duration": 95,
                "createdAt": "2023-11-12T22:13:20.000Z",
                "completedAt": "2023-11-12T22:14:55.000Z"
            },
            {
                "id": "session2",
                "userId": "user1",
                "questionId": "q8",
                "confidenceRating": 9,
                "duration": -3,
                "createdAt": "2023-11-09T22:13:20.000Z"
            },
            {
                "id": "session3",
                "userId": "user1",
                "questionId": "q4",
                "confidenceRating": "4",
                "qualityRating": 2.0,
                "notes": 17,
                "duration": 95.5,
                "createdAt": "2023-11-10T22:13:20.000Z",
                "completedAt": "yesterday"
            },
            {
                "id": "broken",
                "userId": "user1",
                "questionId": "q2",
                "createdAt": "2023-11-09T22:13:20.000Z",
                "completedAt": "2023-11-08T22:13:20.000Z"
            },
            {
                "id": "undated",
                "userId": "user1",
                "questionId": "q2",
                "createdAt": "not a timestamp"
            }
        ]
    }"#;

    #[test]
    fn backend_payload_maps_to_sessions() {
        let body: SessionsResponse = serde_json::from_str(PAYLOAD).unwrap();
        let batch = decode_sessions(body.sessions);
        let sessions = &batch.sessions;

        assert_eq!(sessions.len(), 3);
        assert_eq!(batch.malformed, 2);
        let first = &sessions[0];
        assert_eq!(first.confidence_score(), 4);
        assert_eq!(first.duration_secs(), 95);
        assert!(first.is_completed());

        let second = &sessions[1];
        assert_eq!(second.confidence(), None);
        assert_eq!(second.duration_secs(), 0);
        assert!(!second.is_completed());
    }

    #[test]
    fn wrongly_typed_fields_count_as_missing() {
        let body: SessionsResponse = serde_json::from_str(PAYLOAD).unwrap();
        let batch = decode_sessions(body.sessions);
        let third = &batch.sessions[2];

        assert_eq!(third.id().as_str(), "session3");
        assert_eq!(third.confidence_score(), 4);
        assert_eq!(third.quality_score(), 2);
        assert_eq!(third.notes(), None);
        assert_eq!(third.duration_secs(), 0);
        assert!(!third.is_completed());
    }

    #[test]
    fn error_message_prefers_body_fields() {
        let status = reqwest::StatusCode::UNAUTHORIZED;
        assert_eq!(
            error_message(r#"{"error":"Not authenticated"}"#, status),
            "Not authenticated"
        );
        assert_eq!(
            error_message(r#"{"message":"Token expired","error":"x"}"#, status),
            "Token expired"
        );
        assert_eq!(error_message("<html>", status), "API Error: 401");
    }

    #[test]
    fn base_url_keeps_its_path() {
        let config = BackendConfig::new("https://example.test/api/", "t").unwrap();
        assert_eq!(
            config.endpoint("sessions").unwrap().as_str(),
            "https://example.test/api/sessions"
        );
        assert!(matches!(
            BackendConfig::new("not a url", "t"),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn disabled_client_reports_it() {
        let client = BackendClient::new(None);
        assert!(!client.enabled());
    }
}
