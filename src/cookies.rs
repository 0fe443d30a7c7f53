//! Minimal cookie helpers: reading the `Cookie` request header and building `Set-Cookie` values.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::{AppError, AppResult};

/// Parse every `Cookie` header into a name -> value map. The first occurrence of a name wins,
/// malformed pairs (no `=`) are skipped.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for raw in headers.get_all(header::COOKIE).iter() {
        let Ok(s) = raw.to_str() else { continue; };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                let k = k.trim();
                if k.is_empty() { continue; }
                out.entry(k.to_string()).or_insert_with(|| v.trim().to_string());
            }
        }
    }
    out
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    parse_cookies(headers).remove(name)
}

/// HttpOnly, SameSite=Strict cookie scoped to path `/`.
pub fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> AppResult<HeaderValue> {
    let secure_attr = if secure { "; Secure" } else { "" };
    let s = format!("{}={}; HttpOnly{}; SameSite=Strict; Path=/; Max-Age={}", name, value, secure_attr, max_age_secs);
    HeaderValue::from_str(&s).map_err(|_| AppError::internal("cookie_encoding", "cookie value is not a valid header"))
}

pub fn expired_cookie(name: &str, secure: bool) -> AppResult<HeaderValue> {
    let secure_attr = if secure { "; Secure" } else { "" };
    let s = format!(
        "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly{}; SameSite=Strict; Path=/",
        name, secure_attr
    );
    HeaderValue::from_str(&s).map_err(|_| AppError::internal("cookie_encoding", "cookie name is not a valid header"))
}
