//! Runtime configuration.
//!
//! Values come from `LEAGUEGATE_*` environment variables with the defaults below; the
//! server binary lets command-line flags override them. Unparseable values are logged and
//! ignored rather than aborting startup.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_HTTP_PORT: u16 = 7878;
pub const DEFAULT_CSRF_HEADER: &str = "x-csrf-token";
pub const DEFAULT_CSRF_COOKIE: &str = "csrf-token";
pub const DEFAULT_SESSION_COOKIE: &str = "sessionid";

/// Names and lifetime used by the CSRF guard and token delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsrfConfig {
    /// Request header the client echoes the token in.
    #[serde(default = "CsrfConfig::default_header_name")]
    pub header_name: String,
    /// HTTP-only cookie holding the reference token.
    #[serde(default = "CsrfConfig::default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "CsrfConfig::default_max_age_secs")]
    pub max_age_secs: u64,
    /// Emit the `Secure` cookie attribute. Disable only for plain-http local setups.
    #[serde(default = "CsrfConfig::default_secure_cookie")]
    pub secure_cookie: bool,
}

impl CsrfConfig {
    fn default_header_name() -> String { DEFAULT_CSRF_HEADER.to_string() }
    fn default_cookie_name() -> String { DEFAULT_CSRF_COOKIE.to_string() }
    fn default_max_age_secs() -> u64 { 24 * 60 * 60 }
    fn default_secure_cookie() -> bool { true }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: Self::default_header_name(),
            cookie_name: Self::default_cookie_name(),
            max_age_secs: Self::default_max_age_secs(),
            secure_cookie: Self::default_secure_cookie(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_http_port")]
    pub http_port: u16,
    #[serde(default = "AuthConfig::default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub csrf: CsrfConfig,
    #[serde(default = "AuthConfig::default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "AuthConfig::default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl AuthConfig {
    fn default_http_port() -> u16 { DEFAULT_HTTP_PORT }
    fn default_bind_addr() -> String { "0.0.0.0".to_string() }
    fn default_session_cookie() -> String { DEFAULT_SESSION_COOKIE.to_string() }
    fn default_session_ttl_secs() -> u64 { 60 * 60 }

    pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

    /// Defaults overlaid with whatever `LEAGUEGATE_*` variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`AuthConfig::from_env`] but reading from an arbitrary lookup, so tests do not
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(p) = parse_var(&lookup, "LEAGUEGATE_HTTP_PORT", |v| v.parse::<u16>().ok()) { cfg.http_port = p; }
        if let Some(b) = lookup("LEAGUEGATE_BIND").filter(|s| !s.trim().is_empty()) { cfg.bind_addr = b.trim().to_string(); }
        if let Some(h) = lookup("LEAGUEGATE_CSRF_HEADER").filter(|s| !s.trim().is_empty()) {
            cfg.csrf.header_name = h.trim().to_ascii_lowercase();
        }
        if let Some(c) = lookup("LEAGUEGATE_CSRF_COOKIE").filter(|s| !s.trim().is_empty()) { cfg.csrf.cookie_name = c.trim().to_string(); }
        if let Some(a) = parse_var(&lookup, "LEAGUEGATE_CSRF_MAX_AGE_SECS", |v| v.parse::<u64>().ok()) { cfg.csrf.max_age_secs = a; }
        if let Some(s) = parse_var(&lookup, "LEAGUEGATE_SECURE_COOKIES", parse_bool) { cfg.csrf.secure_cookie = s; }
        if let Some(c) = lookup("LEAGUEGATE_SESSION_COOKIE").filter(|s| !s.trim().is_empty()) { cfg.session_cookie = c.trim().to_string(); }
        if let Some(t) = parse_var(&lookup, "LEAGUEGATE_SESSION_TTL_SECS", |v| v.parse::<u64>().ok()) { cfg.session_ttl_secs = t; }
        cfg
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            http_port: Self::default_http_port(),
            bind_addr: Self::default_bind_addr(),
            csrf: CsrfConfig::default(),
            session_cookie: Self::default_session_cookie(),
            session_ttl_secs: Self::default_session_ttl_secs(),
        }
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_var<F, T, P>(lookup: &F, name: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(name)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!(target: "config", "ignoring {}: unparseable value {:?}", name, raw);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_match_wire_contract() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.http_port, 7878);
        assert_eq!(cfg.csrf.header_name, "x-csrf-token");
        assert_eq!(cfg.csrf.cookie_name, "csrf-token");
        assert_eq!(cfg.csrf.max_age_secs, 86_400);
        assert!(cfg.csrf.secure_cookie);
        assert_eq!(cfg.session_cookie, "sessionid");
    }

    #[test]
    fn env_overrides_and_bad_values() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[
            ("LEAGUEGATE_HTTP_PORT", "9000"),
            ("LEAGUEGATE_CSRF_HEADER", "X-Portal-CSRF"),
            ("LEAGUEGATE_SECURE_COOKIES", "off"),
            ("LEAGUEGATE_SESSION_TTL_SECS", "soon"),
        ]));
        assert_eq!(cfg.http_port, 9000);
        assert_eq!(cfg.csrf.header_name, "x-portal-csrf");
        assert!(!cfg.csrf.secure_cookie);
        assert_eq!(cfg.session_ttl_secs, 3600);
    }

    #[test]
    fn partial_json_uses_field_defaults() {
        let cfg: AuthConfig = serde_json::from_str(r#"{"http_port": 8080, "csrf": {"secure_cookie": false}}"#).unwrap();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.csrf.cookie_name, "csrf-token");
        assert!(!cfg.csrf.secure_cookie);
        assert_eq!(cfg.session_cookie, "sessionid");
    }
}
