//! Optional server-to-server token redemption with the issuing application.
//!
//! A second single-use check that survives a flushed local nonce store: the
//! issuer marks the token consumed on its side and refuses a second
//! redemption. Runs after local claim validation so locally-dead tokens never
//! spend the outbound call budget.

use crate::sso::{settings::Settings, APP_USER_AGENT};
use anyhow::Result;
use axum::http::StatusCode;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Redemption endpoint on the issuing application.
pub const REDEEM_PATH: &str = "/api/wp-sso/redeem";

const REDEEM_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("app base URL is not configured")]
    NotConfigured,
    #[error("issuing application rejected the token: {0}")]
    Rejected(StatusCode),
    #[error("redemption request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct RedemptionClient {
    client: Client,
}

impl RedemptionClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REDEEM_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    /// Confirm `token` with the issuing application. Success is HTTP 200
    /// exactly; a timed-out call is a plain failure, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`RedeemError`] when the base URL is missing, the request
    /// fails, or the issuer answers with any non-200 status.
    pub async fn redeem(&self, token: &str, settings: &Settings) -> Result<(), RedeemError> {
        let base = settings.app_base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(RedeemError::NotConfigured);
        }

        let mut request = self
            .client
            .post(format!("{base}{REDEEM_PATH}"))
            .json(&json!({ "token": token }));

        if let Some(api_key) = &settings.redeem_api_key {
            request = request.header("X-API-Key", api_key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(RedeemError::Rejected(
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            ))
        }
    }
}
