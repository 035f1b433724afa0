//! Session tokens and the cookie that carries them

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Cookie name holding the session token
pub const SESSION_COOKIE: &str = "numtree_session";

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

/// Session cookie settings
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl_hours: u32,
    /// Set the `Secure` attribute (HTTPS only)
    pub secure_cookies: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 24 * 7,
            secure_cookies: false,
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours))
    }

    /// Cookie carrying a freshly issued token
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(time::Duration::hours(i64::from(self.ttl_hours)))
            .build()
    }

    /// Cookie that makes the browser drop the session cookie
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }
}

/// Generate an opaque session token (base64url, no padding).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
