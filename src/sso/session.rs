//! Local session issuance for accepted logins.

use crate::sso::store::TtlStore;
use anyhow::{Context, Result};
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

const SESSION_COOKIE_NAME: &str = "ponto_session";

/// Mints session tokens and resolves presented cookies back to a subject.
/// Only a hash of the token ever reaches the store.
pub struct SessionBroker {
    store: Arc<dyn TtlStore>,
    ttl_seconds: i64,
    secure: bool,
}

impl SessionBroker {
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>, ttl_seconds: i64, secure: bool) -> Self {
        Self {
            store,
            ttl_seconds,
            secure,
        }
    }

    /// Establish a session for `user_email` and return the cookie to set.
    ///
    /// # Errors
    /// Returns an error if random bytes are unavailable or the cookie value
    /// is not a valid header.
    pub async fn grant(&self, user_email: &str) -> Result<HeaderValue> {
        let token = generate_session_token()?;
        let ttl = u64::try_from(self.ttl_seconds).unwrap_or(0).max(1);

        self.store
            .put(
                &session_key(&token),
                user_email.to_string(),
                Duration::from_secs(ttl),
            )
            .await;

        self.cookie(&token)
    }

    /// Resolve the session cookie from `headers` to the subject it was
    /// granted for, if the session is still live.
    pub async fn lookup(&self, headers: &HeaderMap) -> Option<String> {
        let token = extract_session_cookie(headers)?;
        self.store.get(&session_key(&token)).await
    }

    fn cookie(&self, token: &str) -> Result<HeaderValue> {
        let ttl_seconds = self.ttl_seconds;
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).context("Failed to build session cookie")
    }
}

/// Create a new session token. The raw value is only returned to set the
/// cookie; the store sees a hash.
fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn session_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("session:{}", Base64UrlUnpadded::encode_string(&hasher.finalize()))
}

fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}
