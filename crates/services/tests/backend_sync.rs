use gym_core::model::{PracticeSession, QuestionId, SessionId, UserId};
use gym_core::time::fixed_now;
use services::{BackendClient, BackendConfig, BackendError, SyncReport, sync_sessions};
use storage::repository::{InMemoryRepository, PracticeSessionRepository};

const SESSIONS_BODY: &str = r#"{
    "sessions": [
        {
            "id": "session1",
            "userId": "user1",
            "questionId": "q1",
            "confidenceRating": 4,
            "qualityRating": 5,
            "duration": 95,
            "createdAt": "2023-11-12T22:13:20.000Z",
            "completedAt": "2023-11-12T22:14:55.000Z"
        },
        {
            "id": "session2",
            "userId": "user1",
            "questionId": "q8",
            "confidenceRating": "3",
            "duration": 95.5,
            "createdAt": "2023-11-13T22:13:20.000Z",
            "completedAt": 12
        },
        {
            "id": "session3",
            "userId": "user1",
            "createdAt": "2023-11-14T22:13:20.000Z"
        }
    ]
}"#;

fn client_for(server: &mockito::Server) -> BackendClient {
    BackendClient::new(Some(BackendConfig::new(&server.url(), "secret").unwrap()))
}

#[tokio::test]
async fn sync_stores_fetched_sessions() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sessions")
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SESSIONS_BODY)
        .create_async()
        .await;

    let repo = InMemoryRepository::new();
    let report = sync_sessions(&client_for(&server), &repo).await.unwrap();
    mock.assert_async().await;

    assert_eq!(
        report,
        SyncReport {
            stored: 2,
            conflicts: 0,
            malformed: 1,
        }
    );

    let stored = repo
        .list_sessions_for_user(&UserId::new("user1"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id().as_str(), "session2");
    assert_eq!(stored[0].confidence_score(), 3);
    assert!(!stored[0].is_completed());
    assert_eq!(stored[1].quality_score(), 5);
    assert!(stored[1].is_completed());
}

#[tokio::test]
async fn sync_skips_sessions_owned_by_another_user() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/sessions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SESSIONS_BODY)
        .create_async()
        .await;

    let repo = InMemoryRepository::new();
    let local = PracticeSession::start(
        SessionId::new("session1"),
        UserId::new("user2"),
        QuestionId::new("q1"),
        fixed_now(),
    );
    repo.upsert_session(&local).await.unwrap();

    let report = sync_sessions(&client_for(&server), &repo).await.unwrap();
    assert_eq!(report.stored, 1);
    assert_eq!(report.conflicts, 1);

    let kept = repo
        .get_session(&SessionId::new("session1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.user_id().as_str(), "user2");

    let synced = repo
        .list_sessions_for_user(&UserId::new("user1"))
        .await
        .unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].id().as_str(), "session2");
}

#[tokio::test]
async fn unauthorized_response_carries_backend_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/sessions")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Not authenticated"}"#)
        .create_async()
        .await;

    let repo = InMemoryRepository::new();
    let err = sync_sessions(&client_for(&server), &repo)
        .await
        .unwrap_err();
    mock.assert_async().await;

    match err {
        BackendError::Status { status, message } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(
        repo.list_sessions_for_user(&UserId::new("user1"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn disabled_client_does_not_sync() {
    let repo = InMemoryRepository::new();
    let err = sync_sessions(&BackendClient::new(None), &repo)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Disabled));
}
