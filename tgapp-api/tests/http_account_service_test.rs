//! Integration tests for [`tgapp_api::HttpAccountService`] against a mockito server.
//!
//! Covers the auth header, status classification (401/404 vs other), envelope decoding,
//! registration, and an end-to-end resolver pass over HTTP.

use std::sync::Arc;

use mockito::Matcher;
use tgapp_api::{ApiConfig, HttpAccountService, INIT_DATA_HEADER};
use tgapp_core::{
    AccountService, HostIdentity, IdentityClaim, RegistrationForm, Role, ServiceError, Session,
};
use tgapp_session::SessionResolver;

const INIT_DATA: &str = "user=%7B%22id%22%3A424242%7D&auth_date=1700000000&hash=abc";

fn service_for(server: &mockito::ServerGuard) -> HttpAccountService {
    HttpAccountService::new(&ApiConfig::with_base_url(format!("{}/api", server.url())))
        .expect("valid config")
}

fn claim() -> IdentityClaim {
    IdentityClaim::from_init_data(INIT_DATA)
}

/// **Test: 200 with camelCase body → Account; init data sent in the auth header.**
#[tokio::test]
async fn current_account_sends_header_and_decodes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/auth/me")
        .match_header(INIT_DATA_HEADER, INIT_DATA)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"u1","firstName":"Ada","role":"teacher","telegramId":424242}"#)
        .create_async()
        .await;

    let account = service_for(&server).current_account(&claim()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(account.id, "u1");
    assert_eq!(account.first_name.as_deref(), Some("Ada"));
    assert_eq!(account.external_id, Some(424242));
}

/// **Test: 404 and 401 → NotRegistered; 500 → Http with body.**
#[tokio::test]
async fn status_codes_are_classified() {
    let mut server = mockito::Server::new_async().await;
    let service = service_for(&server);

    for status in [401usize, 404] {
        let mock = server
            .mock("GET", "/api/auth/me")
            .with_status(status)
            .with_body(r#"{"detail":"User not found"}"#)
            .create_async()
            .await;
        let err = service.current_account(&claim()).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::NotRegistered { status: s } if s as usize == status),
            "status {} gave {:?}",
            status,
            err
        );
        mock.remove_async().await;
    }

    let _mock = server
        .mock("GET", "/api/auth/me")
        .with_status(500)
        .with_body("oops")
        .create_async()
        .await;
    let err = service.current_account(&claim()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Http { status: 500, ref body } if body == "oops"));
}

/// **Test: Claim with no payload → request goes out without the header.**
#[tokio::test]
async fn missing_payload_omits_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/auth/me")
        .match_header(INIT_DATA_HEADER, Matcher::Missing)
        .with_status(401)
        .create_async()
        .await;

    let claim = IdentityClaim {
        external_id: Some(1),
        ..IdentityClaim::default()
    };
    let err = service_for(&server).current_account(&claim).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ServiceError::NotRegistered { status: 401 }));
}

/// **Test: Non-JSON success body → Decode error.**
#[tokio::test]
async fn garbage_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/auth/me")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = service_for(&server).current_account(&claim()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)));
}

/// **Test: Register posts the form as JSON and decodes an enveloped account.**
#[tokio::test]
async fn register_posts_form() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/auth/register")
        .match_header(INIT_DATA_HEADER, INIT_DATA)
        .match_body(Matcher::PartialJsonString(
            r#"{"first_name":"Ada","role":"teacher"}"#.to_string(),
        ))
        .with_status(201)
        .with_body(r#"{"user":{"id":"u7","first_name":"Ada","role":"teacher"}}"#)
        .create_async()
        .await;

    let form = RegistrationForm {
        first_name: "Ada".to_string(),
        last_name: None,
        role: Role::Teacher,
        timezone: Some("Europe/Moscow".to_string()),
    };
    let account = service_for(&server).register(&claim(), &form).await.unwrap();

    mock.assert_async().await;
    assert_eq!(account.id, "u7");
}

/// **Test: Resolver over HTTP → Authenticated with the observed Telegram id after one lookup.**
#[tokio::test]
async fn resolver_end_to_end_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/auth/me")
        .with_status(200)
        .with_body(r#"{"id":"u1","role":"teacher"}"#)
        .expect(1)
        .create_async()
        .await;

    let host = Arc::new(HostIdentity::present(claim()));
    let service = Arc::new(service_for(&server));
    let session = SessionResolver::new(host, service).resolve_session().await;

    mock.assert_async().await;
    match session {
        Session::Authenticated(account) => {
            assert_eq!(account.id, "u1");
            assert_eq!(account.role, Role::Teacher);
            assert_eq!(account.external_id, Some(424242));
        }
        other => panic!("expected Authenticated, got {:?}", other),
    }
}
