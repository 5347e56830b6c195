use chrono::Duration;
use gym_core::catalog::builtin_questions;
use gym_core::model::{
    Category, ConfidenceRating, PracticeSession, QualityRating, QuestionId, SelfAssessment,
    SessionId, UserId,
};
use gym_core::time::fixed_now;
use storage::repository::{PracticeSessionRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_persists_question_bank() {
    let repo = connect("memdb_questions").await;
    for q in builtin_questions() {
        repo.upsert_question(&q).await.unwrap();
    }
    // Upserting twice must not duplicate rows.
    for q in builtin_questions() {
        repo.upsert_question(&q).await.unwrap();
    }

    let listed = repo.list_questions().await.unwrap();
    assert_eq!(listed.len(), 20);

    let q12 = repo
        .get_question(&QuestionId::new("q12"))
        .await
        .unwrap()
        .expect("q12 exists");
    assert_eq!(q12.category(), &Category::ClinicalDecisionMaking);
    assert_eq!(
        q12.context(),
        Some("Busy physician with limited time for new information")
    );
}

#[tokio::test]
async fn sqlite_persists_session_lifecycle() {
    let repo = connect("memdb_sessions").await;
    let now = fixed_now();
    let user = UserId::new("user1");

    let mut session = PracticeSession::start(
        SessionId::new("session1"),
        user.clone(),
        QuestionId::new("q1"),
        now - Duration::days(2),
    );
    repo.upsert_session(&session).await.unwrap();

    let stored = repo
        .get_session(session.id())
        .await
        .unwrap()
        .expect("stored");
    assert!(!stored.is_completed());

    session
        .submit_assessment(
            SelfAssessment::new(ConfidenceRating::new(4).unwrap())
                .with_quality(QualityRating::new(5).unwrap())
                .with_notes("Good explanation of value proposition"),
            95,
            now - Duration::days(2) + Duration::seconds(95),
        )
        .unwrap();
    repo.upsert_session(&session).await.unwrap();

    let later = PracticeSession::start(
        SessionId::new("session2"),
        user.clone(),
        QuestionId::new("q8"),
        now,
    );
    repo.upsert_session(&later).await.unwrap();

    let listed = repo.list_sessions_for_user(&user).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id().as_str(), "session2");
    assert_eq!(listed[1], session);
    assert_eq!(listed[1].confidence_score(), 4);
    assert_eq!(listed[1].notes(), Some("Good explanation of value proposition"));
}

#[tokio::test]
async fn sqlite_rejects_session_owner_change() {
    let repo = connect("memdb_owner").await;
    let now = fixed_now();
    let original = PracticeSession::start(
        SessionId::new("shared"),
        UserId::new("user1"),
        QuestionId::new("q1"),
        now,
    );
    repo.upsert_session(&original).await.unwrap();

    let hijack = PracticeSession::start(
        SessionId::new("shared"),
        UserId::new("user2"),
        QuestionId::new("q1"),
        now,
    );
    let err = repo.upsert_session(&hijack).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let other = repo
        .list_sessions_for_user(&UserId::new("user2"))
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrations").await;
    repo.migrate().await.expect("second migrate");

    let (applied,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}
