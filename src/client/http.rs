//! HTTP client for the portal API.
//!
//! Bootstraps a CSRF token from `/api/csrf` (the reference cookie lands in the client's cookie
//! jar, the echo value in session storage), sends it back on every state-changing call, and
//! terminates the local session whenever the server answers 401.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use super::location::Location;
use super::storage::{SessionStorage, ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY};
use super::terminator::handle_auth_failure;
use crate::config::DEFAULT_CSRF_HEADER;
use crate::error::AppError;

#[derive(Clone)]
pub struct PortalClient {
    base: Url,
    client: reqwest::Client,
    csrf_header: String,
    storage: Arc<dyn SessionStorage>,
    location: Arc<dyn Location>,
}

impl PortalClient {
    /// Connect and fetch a CSRF token. Uses the default `x-csrf-token` header name.
    pub async fn connect(base: &str, storage: Arc<dyn SessionStorage>, location: Arc<dyn Location>) -> Result<Self> {
        Self::connect_with_header(base, DEFAULT_CSRF_HEADER, storage, location).await
    }

    pub async fn connect_with_header(
        base: &str,
        csrf_header: &str,
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn Location>,
    ) -> Result<Self> {
        let base_url = Url::parse(base).context("invalid base URL")?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()?;
        let me = Self { base: base_url, client, csrf_header: csrf_header.to_string(), storage, location };
        me.refresh_csrf().await?;
        Ok(me)
    }

    /// GET /api/csrf and remember the echo value.
    pub async fn refresh_csrf(&self) -> Result<()> {
        let v = self.request(Method::GET, "/api/csrf", None).await?;
        let csrf = v.get("csrfToken").and_then(|s| s.as_str()).unwrap_or("").to_string();
        if csrf.is_empty() {
            return Err(anyhow!("csrf token missing from response"));
        }
        self.storage.set(CSRF_TOKEN_KEY, &csrf)?;
        debug!(target: "auth", "csrf token refreshed");
        Ok(())
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }

    /// Current principal as reported by the server.
    pub async fn me(&self) -> Result<Value> {
        self.get_json("/api/auth/me").await
    }

    /// Server-side logout followed by local cleanup.
    pub async fn logout(&self) -> Result<()> {
        let res = self.post_json("/api/auth/logout", &serde_json::json!({})).await;
        super::terminator::terminate(self.location.as_ref(), self.storage.as_ref())?;
        res.map(|_| ())
    }

    fn headers_for(&self, method: &Method) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(access) = self.storage.get(ACCESS_TOKEN_KEY)? {
            let v = HeaderValue::from_str(&format!("Bearer {}", access)).context("access token is not a valid header")?;
            headers.insert(AUTHORIZATION, v);
        }
        if !crate::csrf::is_safe_method(method) {
            if let Some(csrf) = self.storage.get(CSRF_TOKEN_KEY)? {
                let name = reqwest::header::HeaderName::from_bytes(self.csrf_header.as_bytes())
                    .context("invalid csrf header name")?;
                headers.insert(name, HeaderValue::from_str(&csrf).context("csrf token is not a valid header")?);
            }
        }
        Ok(headers)
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.base.join(path)?;
        let mut req = self.client.request(method.clone(), url).headers(self.headers_for(&method)?);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return resp.json().await.with_context(|| format!("malformed response body from {}", path));
        }
        // error bodies are best-effort; the status alone decides the outcome
        let val: Value = resp.json().await.unwrap_or(serde_json::json!({}));
        if status == StatusCode::UNAUTHORIZED {
            handle_auth_failure(status.as_u16(), self.location.as_ref(), self.storage.as_ref())?;
            return Err(AppError::auth("unauthorized", "session expired").into());
        }
        let code = val.get("error").and_then(|v| v.as_str()).unwrap_or("remote_error").to_string();
        let message = val.get("message").and_then(|v| v.as_str()).unwrap_or("request failed").to_string();
        let err = match status.as_u16() {
            403 if code == AppError::csrf_denied().code_str() => AppError::csrf(code, message),
            403 => AppError::forbidden(code, message),
            404 => AppError::not_found(code, message),
            s if s >= 500 => AppError::internal(code, message),
            _ => AppError::user(code, message),
        };
        Err(err.into())
    }
}
