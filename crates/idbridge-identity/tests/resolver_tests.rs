//! Integration tests for the identity resolver against a mock identity
//! service (token endpoint + user endpoint).

use idbridge_identity::{ClientCredentials, IdentityClient, IdentityError, TokenSource};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_TOKEN: &str = "test-access-token";

async fn mock_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> IdentityClient {
    let auth = TokenSource::new(
        ClientCredentials {
            client_id: "demo-service-client".to_string(),
            client_secret: "demo-service-secret".to_string(),
            token_endpoint: format!("{}/oauth2/token", server.uri()),
            scopes: vec!["internal.read".to_string()],
        },
        reqwest::Client::new(),
    )
    .unwrap();

    IdentityClient::with_http_client(
        format!("{}/api", server.uri()),
        "/users/{}",
        auth,
        reqwest::Client::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn resolves_full_profile() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/abc-123"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}")))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "abc-123",
            "email": "A@Ex.com",
            "name": "Ada",
            "roles": ["ADMIN_ROLE"],
            "enabled": true
        })))
        .mount(&server)
        .await;

    let profile = client_for(&server)
        .resolve("abc-123")
        .await
        .unwrap()
        .expect("profile should resolve");

    assert_eq!(profile.external_id, "abc-123");
    assert_eq!(profile.email.as_deref(), Some("A@Ex.com"));
    assert_eq!(profile.display_name, "Ada");
    assert_eq!(profile.profile_image_url, "/user.png");
    assert_eq!(profile.roles, vec!["ADMIN_ROLE"]);
    assert!(profile.enabled);
}

#[tokio::test]
async fn missing_user_resolves_to_none() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/xyz-999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolved = client_for(&server).resolve("xyz-999").await.unwrap();
    assert!(resolved.is_none());
}

#[tokio::test]
async fn upstream_failure_is_an_error() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/abc-123"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server).resolve("abc-123").await.unwrap_err();
    match err {
        IdentityError::Upstream { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("Expected Upstream error, got: {other:?}"),
    }
}

#[tokio::test]
async fn token_endpoint_rejection_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let err = client_for(&server).resolve("abc-123").await.unwrap_err();
    assert!(matches!(err, IdentityError::Auth(_)));
}

#[tokio::test]
async fn undecodable_profile_body_is_invalid_response() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).resolve("abc-123").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidResponse(_)));
}

#[tokio::test]
async fn token_is_cached_across_resolutions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TEST_TOKEN,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "abc-123",
            "email": "a@ex.com"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.resolve("abc-123").await.unwrap();
    client.resolve("abc-123").await.unwrap();
}

#[tokio::test]
async fn identifier_is_path_escaped() {
    let server = MockServer::start().await;
    mock_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/users/abc%20123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@ex.com"
        })))
        .mount(&server)
        .await;

    let resolved = client_for(&server).resolve("abc 123").await.unwrap();
    assert!(resolved.is_some());
}
