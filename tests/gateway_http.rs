#![allow(clippy::unwrap_used)]

use anyhow::Result;
use futures_util::future::join_all;
use schoolgate::{
    client::types::{EntityId, LoginPayload},
    config::ClientConfig,
    gateway::ApiRequest,
    identity::{IdentityState, Role},
    routes::{Decision, Destination},
    AppError, SchoolClient,
};
use secrecy::SecretString;
use serde_json::json;
use std::{net::TcpListener, time::Duration};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client(server: &MockServer, timeout: Duration) -> SchoolClient {
    let config = ClientConfig::new(&server.uri(), timeout).unwrap();
    SchoolClient::connect(config).unwrap()
}

#[tokio::test]
async fn expired_session_on_groups_is_refreshed_and_replayed() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Unauthorized"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "9A", "curatorId": 4 },
            { "id": "g-2", "name": "10B", "curatorId": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));
    let groups = client.groups().await?;

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].curator_id, Some(EntityId::Number(4)));
    assert_eq!(groups[1].id, EntityId::Text("g-2".to_string()));
    assert_eq!(client.gateway().recovery().attempts(), 1);

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn ten_concurrent_failures_share_one_failed_refresh() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Session expired"
        })))
        .expect(10)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));
    let request = ApiRequest::get("/groups");
    let outcomes = join_all((0..10).map(|_| client.call(&request))).await;

    for outcome in outcomes {
        let err = outcome.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Session expired");
    }
    assert_eq!(client.gateway().recovery().attempts(), 1);
    assert_eq!(client.identity_state(), IdentityState::Absent);
    assert_eq!(
        client.navigate("/admin/groups").await,
        Decision::Redirect(Destination::Login)
    );

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_presented_and_rotated() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(201).insert_header("set-cookie", "sid=old; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("cookie", "sid=old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "sid=old"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "sid=new; Path=/; HttpOnly"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("cookie", "sid=new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "login": "director",
            "firstName": "Olga",
            "lastName": "Smirnova",
            "role": "admin"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));
    let payload = LoginPayload::new("director", SecretString::from("pw".to_string()));
    client.login(&payload).await?;

    let state = client.resolve_identity().await?;
    let identity = state.identity().unwrap();
    assert_eq!(identity.role(), Role::Admin);
    assert_eq!(identity.display_name(), "Olga Smirnova");
    assert_eq!(
        client.navigate("/admin/teachers").await,
        Decision::Allow(Destination::AdminTeachers)
    );

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn login_rejection_is_not_recovered() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid login or password",
            "error": "Unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));
    let payload = LoginPayload::new("nobody", SecretString::from("bad".to_string()));
    let err = client.login(&payload).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid login or password");

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn domain_failures_pass_through_without_refresh() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/teachers"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Login already taken"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));

    let input = schoolgate::client::types::TeacherInput {
        login: "t.new".to_string(),
        password: "pw".to_string(),
        ..Default::default()
    };
    let err = client.create_teacher(&input).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "Login already taken");

    let err = client.groups().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), schoolgate::errors::FALLBACK_MESSAGE);

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn slow_backend_is_a_timeout_not_an_auth_failure() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(1));
    let err = client.groups().await.unwrap_err();

    assert!(matches!(err, AppError::Timeout(_)));
    assert!(!err.is_unauthorized());
    assert_eq!(client.gateway().recovery().attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn large_error_bodies_keep_their_message() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/teachers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Login taken",
            "details": "x".repeat(3_000)
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/students"))
        .respond_with(ResponseTemplate::new(422).set_body_string("y".repeat(3_000)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/groups"))
        .respond_with(ResponseTemplate::new(400).set_body_bytes(vec![b'o', b'k', 0xff]))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Duration::from_secs(5));

    let input = schoolgate::client::types::TeacherInput {
        login: "taken".to_string(),
        password: "pw".to_string(),
        ..Default::default()
    };
    let err = client.create_teacher(&input).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "Login taken");

    let input = schoolgate::client::types::StudentInput {
        login: "pupil".to_string(),
        password: "pw".to_string(),
        ..Default::default()
    };
    let err = client.create_student(&input).await.unwrap_err();
    assert_eq!(err.user_message().chars().count(), 2_000);

    let err = client.groups().await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "ok\u{FFFD}");

    server.verify().await;
    Ok(())
}
