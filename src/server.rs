//!
//! leaguegate HTTP server
//! ----------------------
//! Axum router exposing the session-integrity surface of the portal.
//!
//! Responsibilities:
//! - CSRF token delivery (`GET /api/csrf`): HTTP-only cookie plus a body field to echo back.
//! - Principal lookup from the session cookie or a bearer session id.
//! - Logout, which revokes the session and expires both cookies.
//! - An admin-only probe showing role gating behind the CSRF guard.
//!
//! Every state-changing route is wrapped with [`guard_route`], so handlers never see a request
//! whose CSRF token failed validation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::cookies;
use crate::csrf::{self, guard_route};
use crate::error::{AppError, AppResult};
use crate::identity::{extract_user_roles, require_role, roles, Principal, SessionRegistry};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: AuthConfig) -> Self {
        let sessions = SessionRegistry::new(config.session_ttl());
        Self { config: Arc::new(config), sessions }
    }

    /// Session id from the session cookie, falling back to `Authorization: Bearer <id>`.
    fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        cookies::parse_cookie(headers, &self.config.session_cookie)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
    }

    fn principal(&self, headers: &HeaderMap) -> Option<Principal> {
        let sid = self.session_id(headers)?;
        self.sessions.validate(&sid)
    }
}

fn unauthorized() -> AppError {
    AppError::auth("unauthorized", "authentication required")
}

pub fn router(state: AppState) -> Router {
    let csrf_cfg = state.config.csrf.clone();
    Router::new()
        .route("/", get(|| async { "leaguegate ok" }))
        .route("/api/csrf", get(get_csrf))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", guard_route(post(logout), csrf_cfg.clone()))
        .route("/api/admin/ping", guard_route(post(admin_ping), csrf_cfg))
        .with_state(state)
}

/// Serve on an already bound listener. Tests bind `127.0.0.1:0` and pass it in.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr().ok();
    info!(target: "startup", "leaguegate listening on {:?}", addr);
    spawn_session_sweeper(state.sessions.clone());
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn spawn_session_sweeper(sessions: SessionRegistry) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;
            let removed = sessions.prune_expired();
            if removed > 0 { debug!(target: "session", removed, "session_sweep"); }
        }
    });
}

pub async fn run(config: AuthConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.http_port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind_addr, config.http_port))?;
    info!(
        target: "startup",
        "leaguegate starting: addr={}, csrf_header={}, csrf_cookie={}, secure_cookies={}, session_ttl_secs={}",
        addr, config.csrf.header_name, config.csrf.cookie_name, config.csrf.secure_cookie, config.session_ttl_secs
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve(listener, AppState::new(config)).await
}

async fn get_csrf(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let token = csrf::generate_csrf_token()?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, csrf::issue_cookie(&token, &state.config.csrf)?);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok((StatusCode::OK, headers, Json(json!({ "csrfToken": token }))))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let principal = state.principal(&headers).ok_or_else(unauthorized)?;
    let display_name = principal.display_name();
    Ok(Json(json!({
        "user_id": principal.user_id,
        "username": principal.username,
        "display_name": display_name,
        "email": principal.email,
        "is_staff": principal.is_staff,
        "is_superuser": principal.is_superuser,
        "roles": extract_user_roles(Some(&principal)),
    })))
}

/// Idempotent: with or without a live session the cookies are expired and the answer is 200.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let revoked = match state.session_id(&headers) {
        Some(sid) => state.sessions.logout(&sid),
        None => false,
    };
    let mut out = HeaderMap::new();
    out.append(header::SET_COOKIE, cookies::expired_cookie(&state.config.session_cookie, state.config.csrf.secure_cookie)?);
    out.append(header::SET_COOKIE, csrf::clear_cookie(&state.config.csrf)?);
    info!(target: "auth", revoked, "logout");
    Ok((StatusCode::OK, out, Json(json!({ "status": "ok", "revoked": revoked }))))
}

async fn admin_ping(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let principal = state.principal(&headers).ok_or_else(unauthorized)?;
    require_role(Some(&principal), &[roles::ADMIN])?;
    Ok(Json(json!({ "status": "ok", "user_id": principal.user_id })))
}
