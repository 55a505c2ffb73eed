//! In-memory login sessions.
//!
//! A successful login mints an opaque token (32 random bytes, base64url
//! without padding, 43 characters) mapped to the user's id. The token
//! travels in the `session` cookie; the store is the only place it is
//! resolved. Sessions expire after the configured TTL and are dropped
//! lazily, on access or when the store runs full.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, trace, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

const DEFAULT_MAX_CAPACITY: usize = 10_000;
const TOKEN_BYTES: usize = 32;
const TOKEN_LENGTH: usize = 43;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store at maximum capacity ({max_capacity} sessions)")]
    AtCapacity { max_capacity: usize },
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    expires_at: Instant,
}

/// Cheap to clone; clones share the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    max_capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: usize) -> Self {
        debug!(ttl_secs = ttl.as_secs(), max_capacity, "Creating session store");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_capacity,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a session for `user_id` and returns its token.
    pub fn create(&self, user_id: Uuid) -> Result<String, SessionError> {
        let token = generate_token();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        if sessions.len() >= self.max_capacity {
            let now = Instant::now();
            sessions.retain(|_, s| s.expires_at > now);
        }
        if sessions.len() >= self.max_capacity {
            warn!(max_capacity = self.max_capacity, "Session store at capacity, rejecting login");
            return Err(SessionError::AtCapacity {
                max_capacity: self.max_capacity,
            });
        }

        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        trace!(user_id = %user_id, "Session created");
        Ok(token)
    }

    /// Resolves a token to its user, forgetting it if it has expired.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        if token.len() != TOKEN_LENGTH {
            return None;
        }

        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(token) {
                Some(session) if session.expires_at > Instant::now() => {
                    return Some(session.user_id);
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        trace!("Dropped expired session");
        None
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .field("ttl", &self.ttl)
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Pulls the session token out of a `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_43_url_safe_characters() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn create_then_resolve() {
        let store = SessionStore::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let token = store.create(user).unwrap();
        assert_eq!(store.resolve(&token), Some(user));
        assert_eq!(store.resolve("not-a-token"), None);
    }

    #[test]
    fn expired_sessions_do_not_resolve_and_are_removed() {
        let store = SessionStore::new(Duration::ZERO);
        let token = store.create(Uuid::new_v4()).unwrap();
        assert_eq!(store.resolve(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn revoke_ends_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(Uuid::new_v4()).unwrap();
        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert_eq!(store.resolve(&token), None);
    }

    #[test]
    fn capacity_is_enforced_after_purging_expired() {
        let store = SessionStore::with_capacity(Duration::from_secs(60), 2);
        store.create(Uuid::new_v4()).unwrap();
        store.create(Uuid::new_v4()).unwrap();
        assert_eq!(
            store.create(Uuid::new_v4()),
            Err(SessionError::AtCapacity { max_capacity: 2 })
        );

        let expiring = SessionStore::with_capacity(Duration::ZERO, 1);
        expiring.create(Uuid::new_v4()).unwrap();
        assert!(expiring.create(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn cookie_round_trip() {
        let cookie = session_cookie("abc", Duration::from_secs(10), true);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(!session_cookie("abc", Duration::from_secs(10), false).contains("Secure"));

        assert_eq!(token_from_cookie_header("theme=dark; session=abc"), Some("abc"));
        assert_eq!(token_from_cookie_header("session="), None);
        assert_eq!(token_from_cookie_header("other=1"), None);
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
