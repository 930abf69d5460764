//! In-memory login sessions.
//!
//! A session is a random token handed to the browser in an HttpOnly
//! cookie, mapped server-side to the logged-in user. Sessions live for
//! the process lifetime; logout removes the mapping.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::HeaderMap;

use crate::core::security::generate_token;

pub const SESSION_COOKIE: &str = "hr_session";

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub email: String,
    pub is_verified: bool,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionUser>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user: SessionUser) -> String {
        let token = generate_token();
        self.inner
            .write()
            .expect("session lock poisoned")
            .insert(token.clone(), user);
        token
    }

    pub fn get(&self, token: &str) -> Option<SessionUser> {
        self.inner
            .read()
            .expect("session lock poisoned")
            .get(token)
            .cloned()
    }

    pub fn remove(&self, token: &str) {
        self.inner
            .write()
            .expect("session lock poisoned")
            .remove(token);
    }
}

/// Cookie value for a freshly created session.
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// Cookie value that expires the session cookie in the browser.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Resolve the current session from the request headers, returning the
/// token alongside the user so callers can invalidate it.
pub fn session_from_headers(
    headers: &HeaderMap,
    store: &SessionStore,
) -> Option<(String, SessionUser)> {
    let token = cookie_value(headers, SESSION_COOKIE)?;
    let user = store.get(&token)?;
    Some((token, user))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn create_get_remove_roundtrip() {
        let store = SessionStore::new();
        let token = store.create(SessionUser {
            user_id: 1,
            email: "a@b.com".to_string(),
            is_verified: true,
        });

        let user = store.get(&token).unwrap();
        assert_eq!(user.user_id, 1);

        store.remove(&token);
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn session_from_headers_parses_cookie() {
        let store = SessionStore::new();
        let token = store.create(SessionUser {
            user_id: 7,
            email: "a@b.com".to_string(),
            is_verified: false,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {}={}", SESSION_COOKIE, token)).unwrap(),
        );

        let (found, user) = session_from_headers(&headers, &store).unwrap();
        assert_eq!(found, token);
        assert_eq!(user.user_id, 7);
    }

    #[test]
    fn unknown_or_missing_cookie_is_no_session() {
        let store = SessionStore::new();

        let headers = HeaderMap::new();
        assert!(session_from_headers(&headers, &store).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("hr_session=bogus"),
        );
        assert!(session_from_headers(&headers, &store).is_none());
    }
}
