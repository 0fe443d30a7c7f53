use std::collections::HashMap;

use axum::http::{HeaderMap, Method};

use crate::config::CsrfConfig;
use crate::cookies::parse_cookies;

/// Read-only view of one request as seen by the CSRF guard: method, headers and parsed cookies.
#[derive(Debug)]
pub struct ProtectedRequestContext<'a> {
    method: &'a Method,
    headers: &'a HeaderMap,
    cookies: HashMap<String, String>,
}

impl<'a> ProtectedRequestContext<'a> {
    pub fn new(method: &'a Method, headers: &'a HeaderMap) -> Self {
        Self { method, headers, cookies: parse_cookies(headers) }
    }

    pub fn method(&self) -> &Method { self.method }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Token echoed back by the client.
    pub fn submitted_token(&self, config: &CsrfConfig) -> Option<&str> {
        self.header(&config.header_name).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Token held in the HTTP-only cookie.
    pub fn reference_token(&self, config: &CsrfConfig) -> Option<&str> {
        self.cookie(&config.cookie_name).filter(|s| !s.is_empty())
    }
}
