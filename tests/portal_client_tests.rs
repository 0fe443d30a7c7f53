//! End-to-end: a real listener on an ephemeral port, driven by `PortalClient`.

use std::sync::Arc;

use anyhow::Result;

use leaguegate::client::{Location, MemoryLocation, MemoryStorage, PortalClient, SessionStorage, ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY, REFRESH_TOKEN_KEY};
use leaguegate::config::AuthConfig;
use leaguegate::error::AppError;
use leaguegate::identity::Principal;
use leaguegate::server::{serve, AppState};

/// Upstream that answers with bodies that are not JSON.
async fn spawn_garbled_upstream() -> Result<String> {
    use axum::http::StatusCode;
    use axum::routing::get;

    let app = axum::Router::new()
        .route("/api/csrf", get(|| async { axum::Json(serde_json::json!({ "csrfToken": "ab".repeat(32) })) }))
        .route("/api/garbled", get(|| async { (StatusCode::OK, "<html>not json</html>") }))
        .route("/api/down", get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

async fn spawn_server() -> Result<(String, AppState)> {
    let mut cfg = AuthConfig::default();
    // plain http: the cookie jar would drop Secure cookies
    cfg.csrf.secure_cookie = false;
    let state = AppState::new(cfg);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let st = state.clone();
    tokio::spawn(async move {
        let _ = serve(listener, st).await;
    });
    Ok((format!("http://{}", addr), state))
}

#[tokio::test]
async fn connect_stores_token_and_state_changes_succeed() -> Result<()> {
    let (base, state) = spawn_server().await?;
    let session = state.sessions.issue(Principal::new("9").with_roles(["admin"]))?;

    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACCESS_TOKEN_KEY, &session.session_id)?;
    let location = Arc::new(MemoryLocation::new("/admin"));
    let client = PortalClient::connect(&base, storage.clone(), location.clone()).await?;

    let csrf = storage.get(CSRF_TOKEN_KEY)?.expect("csrf token stored");
    assert_eq!(csrf.len(), 64);

    let me = client.me().await?;
    assert_eq!(me["roles"], serde_json::json!(["admin"]));

    let pong = client.post_json("/api/admin/ping", &serde_json::json!({})).await?;
    assert_eq!(pong["status"], "ok");
    assert_eq!(location.href(), None);
    Ok(())
}

#[tokio::test]
async fn tampered_echo_token_is_rejected_as_csrf() -> Result<()> {
    let (base, state) = spawn_server().await?;
    let session = state.sessions.issue(Principal::new("9").with_roles(["admin"]))?;
    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACCESS_TOKEN_KEY, &session.session_id)?;
    let client = PortalClient::connect(&base, storage.clone(), Arc::new(MemoryLocation::new("/admin"))).await?;

    storage.set(CSRF_TOKEN_KEY, &"0".repeat(64))?;
    let err = client.post_json("/api/admin/ping", &serde_json::json!({})).await.unwrap_err();
    let app = err.downcast_ref::<AppError>().expect("AppError");
    assert_eq!(app.http_status(), 403);
    assert_eq!(app.code_str(), "Invalid CSRF token");
    Ok(())
}

#[tokio::test]
async fn expired_session_terminates_and_redirects() -> Result<()> {
    let (base, state) = spawn_server().await?;
    let session = state.sessions.issue(Principal::new("3").with_roles(["referee"]))?;
    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACCESS_TOKEN_KEY, &session.session_id)?;
    storage.set(REFRESH_TOKEN_KEY, "refresh")?;
    let location = Arc::new(MemoryLocation::new("/referee/assignments"));
    let client = PortalClient::connect(&base, storage.clone(), location.clone()).await?;

    assert_eq!(state.sessions.revoke_user("3"), 1);
    let err = client.me().await.unwrap_err();
    assert_eq!(err.downcast_ref::<AppError>().map(|e| e.http_status()), Some(401));

    for k in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CSRF_TOKEN_KEY] {
        assert_eq!(storage.get(k)?, None);
    }
    assert_eq!(location.href().as_deref(), Some("/login"));
    assert_eq!(location.pathname().as_deref(), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn logout_revokes_server_side_and_clears_locally() -> Result<()> {
    let (base, state) = spawn_server().await?;
    let session = state.sessions.issue(Principal::new("4").with_roles(["clubadmin"]))?;
    let storage = Arc::new(MemoryStorage::new());
    storage.set(ACCESS_TOKEN_KEY, &session.session_id)?;
    let location = Arc::new(MemoryLocation::new("/club"));
    let client = PortalClient::connect(&base, storage.clone(), location.clone()).await?;

    client.logout().await?;
    assert!(state.sessions.validate(&session.session_id).is_none());
    assert!(storage.is_empty());
    assert_eq!(location.href().as_deref(), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn malformed_success_body_is_an_error_not_an_empty_object() -> Result<()> {
    let base = spawn_garbled_upstream().await?;
    let client = PortalClient::connect(&base, Arc::new(MemoryStorage::new()), Arc::new(MemoryLocation::new("/"))).await?;

    let err = client.get_json("/api/garbled").await.unwrap_err();
    assert!(err.downcast_ref::<AppError>().is_none());
    assert!(err.to_string().contains("/api/garbled"));

    // error statuses keep the status mapping even without a JSON body
    let err = client.get_json("/api/down").await.unwrap_err();
    let app = err.downcast_ref::<AppError>().expect("AppError");
    assert_eq!(app.http_status(), 500);
    assert_eq!(app.code_str(), "remote_error");
    Ok(())
}
