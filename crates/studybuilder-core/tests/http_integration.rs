//! Integration tests for the HTTP study service adapter.
//!
//! Runs against a local mockito server.

use std::sync::Arc;

use mockito::Matcher;
use studybuilder_core::{
    ApiConfig, ConfigError, CoreError, Duration, EnrollmentType, HttpStudyApi, RemoteError,
    RunOutcome, StartDateType, StudyApi, StudyEditor, StudySession, ValidationError,
};

fn api_for(server: &mockito::ServerGuard, token: Option<&str>) -> HttpStudyApi {
    let config = ApiConfig {
        base_url: server.url(),
        session_token: token.map(String::from),
        ..ApiConfig::default()
    };
    HttpStudyApi::new(&config).unwrap()
}

const STUDY_BODY: &str = r#"{"data": {
    "identifier": "S1",
    "name": "Sleep",
    "status": "DRAFT",
    "version": 4,
    "clientData": {"enrollmentType": "ID", "theme": "blue"}
}}"#;

const SESSIONS_BODY: &str = r#"{"items": [
    {"id": "b", "studyId": "S1", "name": "Later", "order": 9,
     "startDate": {"type": "NDAYS_DAY1", "offset": "2W"}},
    {"id": "a", "studyId": "S1", "name": "First"}
]}"#;

#[test]
fn test_rejects_relative_base_url() {
    let config = ApiConfig {
        base_url: "not a url".into(),
        ..ApiConfig::default()
    };
    assert!(matches!(
        HttpStudyApi::new(&config),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "api.base_url"
    ));
}

#[test]
fn test_rejects_base_url_without_path() {
    let config = ApiConfig {
        base_url: "mailto:team@example.org".into(),
        ..ApiConfig::default()
    };
    assert!(matches!(
        HttpStudyApi::new(&config),
        Err(ConfigError::InvalidValue { ref key, .. }) if key == "api.base_url"
    ));
}

#[tokio::test]
async fn test_study_id_is_one_escaped_segment() {
    let mut server = mockito::Server::new_async().await;
    let escaped = server
        .mock("GET", "/v5/studies/a%2Fb")
        .with_status(200)
        .with_body(r#"{"data": {"identifier": "a/b", "name": "Slashed"}}"#)
        .create_async()
        .await;
    let split = server
        .mock("GET", "/v5/studies/a/b")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let study = api_for(&server, None).get_study("a/b").await.unwrap();
    assert_eq!(study.identifier, "a/b");
    escaped.assert_async().await;
    split.assert_async().await;
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v5/studies/S1/schedule")
        .with_status(200)
        .with_body(r#"{"data": {"studyId": "S1"}}"#)
        .create_async()
        .await;

    let config = ApiConfig {
        base_url: format!("{}/api/", server.url()),
        ..ApiConfig::default()
    };
    let api = HttpStudyApi::new(&config).unwrap();
    assert_eq!(api.get_schedule("S1").await.unwrap().study_id, "S1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_study_sends_session_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v5/studies/S1")
        .match_header("Bridge-Session", "token-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(STUDY_BODY)
        .create_async()
        .await;

    let api = api_for(&server, Some("token-123"));
    let study = api.get_study("S1").await.unwrap();
    assert_eq!(study.version, 4);
    assert_eq!(study.options.enrollment_type, Some(EnrollmentType::Id));
    assert_eq!(study.options.extra["theme"], "blue");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_sessions_orders_positionally() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v5/studies/S1/schedule/sessions")
        .with_status(200)
        .with_body(SESSIONS_BODY)
        .create_async()
        .await;

    let sessions = api_for(&server, None).get_sessions("S1").await.unwrap();
    let listed: Vec<_> = sessions.iter().map(|s| (s.id.as_str(), s.order)).collect();
    assert_eq!(listed, vec![("b", 0), ("a", 1)]);
    assert_eq!(sessions[0].start_date.start_type, StartDateType::NDaysDay1);
    assert_eq!(sessions[0].start_date.offset, Some(Duration::weeks(2)));
}

#[tokio::test]
async fn test_status_errors_are_mapped() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v5/studies/missing")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/v5/studies/S1/schedule")
        .with_status(500)
        .with_body("backend down")
        .create_async()
        .await;

    let api = api_for(&server, None);
    assert_eq!(
        api.get_study("missing").await.unwrap_err(),
        RemoteError::NotFound {
            resource: "study".into(),
            id: "missing".into()
        }
    );
    assert_eq!(
        api.get_schedule("S1").await.unwrap_err(),
        RemoteError::Status {
            status: 500,
            message: "backend down".into()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v5/studies/S1")
        .with_status(200)
        .with_body(r#"{"data": {"identifier": 7}}"#)
        .create_async()
        .await;

    let err = api_for(&server, None).get_study("S1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_save_sessions_posts_full_list() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v5/studies/S1/schedule/sessions")
        .match_body(Matcher::PartialJson(serde_json::json!([
            {"id": "a", "studyId": "S1", "startDate": {"type": "DAY1"}},
            {"id": "b", "studyId": "S1", "duration": "3D"}
        ])))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let sessions = [
        StudySession::with_id("a", "S1", "First"),
        StudySession::with_id("b", "S1", "Second").with_duration(Duration::days(3)),
    ];
    api_for(&server, None)
        .save_sessions("S1", &sessions)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_editor_loads_over_http() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v5/studies/S1")
        .with_status(200)
        .with_body(STUDY_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/v5/studies/S1/schedule")
        .with_status(200)
        .with_body(r#"{"data": {"studyId": "S1", "name": "Main", "duration": "12W"}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v5/studies/S1/schedule/sessions")
        .with_status(200)
        .with_body(SESSIONS_BODY)
        .create_async()
        .await;

    let editor = StudyEditor::new(Arc::new(api_for(&server, None)));
    assert_eq!(editor.load("S1").await.unwrap(), RunOutcome::Resolved);

    let state = editor.state();
    let schedule = state.schedule.as_ref().unwrap();
    assert_eq!(schedule.name, "Main");
    assert_eq!(schedule.duration, Some(Duration::weeks(12)));
    let ids: Vec<_> = editor
        .sessions()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(!editor.needs_enrollment_type().unwrap());
}

#[tokio::test]
async fn test_schedule_of_another_study_is_not_published() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v5/studies/S1")
        .with_status(200)
        .with_body(STUDY_BODY)
        .create_async()
        .await;
    server
        .mock("GET", "/v5/studies/S1/schedule")
        .with_status(200)
        .with_body(r#"{"data": {"studyId": "S9", "name": "Other"}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v5/studies/S1/schedule/sessions")
        .with_status(200)
        .with_body(r#"{"items": []}"#)
        .create_async()
        .await;

    let editor = StudyEditor::new(Arc::new(api_for(&server, None)));
    let err = editor.load("S1").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::StudyMismatch { ref expected, ref found })
            if expected == "S1" && found == "S9"
    ));
    assert!(editor.state().is_empty());
}
