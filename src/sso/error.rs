//! Typed rejection reasons and their HTTP mapping.
//!
//! Every failure in the login state machine is a [`Reject`] value carried up
//! through `Result`, translated to a response in exactly one place. Handlers
//! never panic on bad input.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Reject {
    #[error("request is not eligible for single sign-on")]
    IneligibleRequest,
    #[error("single sign-on is disabled")]
    Disabled,
    #[error("too many failed attempts, try again later")]
    RateLimited,
    #[error("missing token parameter")]
    MissingToken,
    #[error("no shared secret is configured")]
    NotConfigured,
    #[error("token signature or format is invalid")]
    InvalidToken,
    #[error("token has no usable jti claim")]
    InvalidJti,
    #[error("token has already been used")]
    Replay,
    #[error("token claims are malformed")]
    InvalidClaims,
    #[error("token has expired")]
    Expired,
    #[error("token issuer mismatch")]
    InvalidIss,
    #[error("token audience mismatch")]
    InvalidAud,
    #[error("token site mismatch")]
    InvalidSid,
    #[error("token audience does not match the serving host")]
    HostMismatch,
    #[error("token redemption was refused by the issuing application")]
    RedeemFailed,
    #[error("token subject is missing or empty")]
    InvalidSub,
    #[error("no matching local user")]
    NoUser,
    #[error("user lacks the required capability")]
    Forbidden,
}

impl Reject {
    /// Stable wire-level error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IneligibleRequest => "ineligible_request",
            Self::Disabled => "disabled",
            Self::RateLimited => "rate_limited",
            Self::MissingToken => "missing_token",
            Self::NotConfigured => "not_configured",
            Self::InvalidToken => "invalid_token",
            Self::InvalidJti => "invalid_jti",
            Self::Replay => "replay",
            Self::InvalidClaims => "invalid_claims",
            Self::Expired => "expired",
            Self::InvalidIss => "invalid_iss",
            Self::InvalidAud => "invalid_aud",
            Self::InvalidSid => "invalid_sid",
            Self::HostMismatch => "host_mismatch",
            Self::RedeemFailed => "redeem_failed",
            Self::InvalidSub => "invalid_sub",
            Self::NoUser => "no_user",
            Self::Forbidden => "forbidden",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::IneligibleRequest | Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::Disabled | Self::NoUser | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidToken
            | Self::InvalidJti
            | Self::Replay
            | Self::InvalidClaims
            | Self::Expired
            | Self::InvalidIss
            | Self::InvalidAud
            | Self::InvalidSid
            | Self::HostMismatch
            | Self::RedeemFailed
            | Self::InvalidSub => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code, see [`Reject::code`]
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for Reject {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
