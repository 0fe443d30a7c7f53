use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use parking_lot::RwLock;
use tracing::debug;

use super::principal::Principal;
use crate::error::{AppError, AppResult};

pub type SessionId = String;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub principal: Principal,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, Session>,
    by_user: HashMap<String, HashSet<SessionId>>,
}

fn gen_id() -> AppResult<String> {
    // 256-bit random id, base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AppError::internal("entropy_unavailable".to_string(), e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// In-process stand-in for the identity/session collaborator: session id -> principal with a TTL.
/// Cloning shares the underlying table.
#[derive(Clone)]
pub struct SessionRegistry {
    pub ttl: Duration,
    inner: Arc<RwLock<Inner>>,
}

impl Default for SessionRegistry {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, inner: Arc::new(RwLock::new(Inner::default())) }
    }

    pub fn issue(&self, principal: Principal) -> AppResult<Session> {
        let now = Instant::now();
        let session = Session {
            session_id: gen_id()?,
            principal,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let mut inner = self.inner.write();
        Self::sweep(&mut inner, now);
        inner
            .by_user
            .entry(session.principal.user_id.clone())
            .or_default()
            .insert(session.session_id.clone());
        inner.sessions.insert(session.session_id.clone(), session.clone());
        debug!(target: "session", user = %session.principal.user_id, ttl_secs = self.ttl.as_secs(), "session issued");
        Ok(session)
    }

    /// Principal for a live session; expired entries are dropped on the way.
    pub fn validate(&self, session_id: &str) -> Option<Principal> {
        let now = Instant::now();
        {
            let inner = self.inner.read();
            match inner.sessions.get(session_id) {
                Some(s) if s.expires_at > now => return Some(s.principal.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.remove(session_id);
        debug!(target: "session", "expired session pruned");
        None
    }

    /// Returns whether a session was actually removed; logging out twice is harmless.
    pub fn logout(&self, session_id: &str) -> bool {
        self.remove(session_id)
    }

    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut inner = self.inner.write();
        let ids = inner.by_user.remove(user_id).unwrap_or_default();
        let count = ids.iter().filter(|id| inner.sessions.remove(*id).is_some()).count();
        debug!(target: "session", user = %user_id, count, "sessions revoked");
        count
    }

    /// Drop every expired session and its user-index entry. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let mut inner = self.inner.write();
        Self::sweep(&mut inner, Instant::now())
    }

    pub fn len(&self) -> usize { self.inner.read().sessions.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn sweep(inner: &mut Inner, now: Instant) -> usize {
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at > now);
        let removed = before - inner.sessions.len();
        if removed > 0 {
            let Inner { sessions, by_user } = inner;
            by_user.retain(|_, ids| {
                ids.retain(|id| sessions.contains_key(id));
                !ids.is_empty()
            });
            debug!(target: "session", removed, "expired sessions swept");
        }
        removed
    }

    fn remove(&self, session_id: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(s) = inner.sessions.remove(session_id) else { return false; };
        if let Some(set) = inner.by_user.get_mut(&s.principal.user_id) {
            set.remove(session_id);
            if set.is_empty() { inner.by_user.remove(&s.principal.user_id); }
        }
        true
    }
}
