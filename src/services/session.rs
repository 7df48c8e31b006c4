use crate::models::auth::AuthData;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine as _};
use parking_lot::RwLock;
use std::sync::Arc;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::{Cookie, Cookies};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Holder of the current login. Reads never fail: missing or unreadable data
/// is simply "not logged in".
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    fn save(&self, data: &AuthData) -> Result<(), SessionError>;
    fn get(&self) -> Option<AuthData>;
    /// Idempotent.
    fn remove(&self);
}

pub type SharedSessionStore = Arc<dyn SessionStore + Send + Sync>;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: RwLock<Option<AuthData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(data: AuthData) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, data: &AuthData) -> Result<(), SessionError> {
        *self.data.write() = Some(data.clone());
        Ok(())
    }

    fn get(&self) -> Option<AuthData> {
        self.data.read().clone()
    }

    fn remove(&self) {
        self.data.write().take();
    }
}

/// Session kept in the browser as a cookie holding base64url-encoded JSON.
#[derive(Clone)]
pub struct CookieSessionStore {
    cookies: Cookies,
    name: String,
    max_age_hours: i64,
    secure: bool,
}

impl CookieSessionStore {
    pub fn new(cookies: Cookies, name: impl Into<String>, max_age_hours: i64, secure: bool) -> Self {
        Self {
            cookies,
            name: name.into(),
            max_age_hours,
            secure,
        }
    }
}

/// Cookie value for a session; the inverse of [`decode_cookie_value`].
pub fn encode_cookie_value(data: &AuthData) -> Result<String, SessionError> {
    Ok(BASE64_URL.encode(serde_json::to_vec(data)?))
}

pub fn decode_cookie_value(value: &str) -> Option<AuthData> {
    let bytes = BASE64_URL.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}

impl SessionStore for CookieSessionStore {
    fn save(&self, data: &AuthData) -> Result<(), SessionError> {
        let cookie = Cookie::build((self.name.clone(), encode_cookie_value(data)?))
            .http_only(true)
            .secure(self.secure)
            .path("/")
            .max_age(CookieDuration::hours(self.max_age_hours));
        self.cookies.add(cookie.into());
        Ok(())
    }

    fn get(&self) -> Option<AuthData> {
        let cookie = self.cookies.get(&self.name)?;
        let data = decode_cookie_value(cookie.value());
        if data.is_none() {
            debug!(cookie = %self.name, "Ignoring corrupt session cookie");
        }
        data
    }

    fn remove(&self) {
        let cookie = Cookie::build((self.name.clone(), "")).path("/");
        self.cookies.remove(cookie.into());
    }
}
