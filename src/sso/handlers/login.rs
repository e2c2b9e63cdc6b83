//! The login endpoint: one accept path, many reject paths.
//!
//! Control flow is strictly linear. Each stage either passes the request to
//! the next one or ends the attempt with a typed [`Reject`]; every rejection
//! after the eligibility gate also counts against the client's rate limit.

use crate::sso::{
    claims, client_ip, error::Reject, gate, now_unix_seconds, redirect, state::AppState, token,
};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Extension, Host, RawQuery},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

#[utoipa::path(
    get,
    path = "/sso/v1/login",
    params(
        ("token" = Option<String>, Query, description = "Compact signed single sign-on token"),
    ),
    responses(
        (status = 302, description = "Token accepted, session established, redirecting"),
        (status = 400, description = "Ineligible request or missing token", body = crate::sso::error::ErrorBody),
        (status = 401, description = "Token rejected", body = crate::sso::error::ErrorBody),
        (status = 403, description = "Feature disabled or user not allowed", body = crate::sso::error::ErrorBody),
        (status = 429, description = "Client is rate limited", body = crate::sso::error::ErrorBody),
    ),
    tag = "sso"
)]
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    method: Method,
    Host(host): Host,
    RawQuery(query): RawQuery,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ip = client_ip::client_address(&headers, connect.map(|ConnectInfo(addr)| addr));

    let accepted = match run(
        &state,
        &method,
        &host,
        query.as_deref(),
        ip.as_deref(),
        &headers,
        &body,
    )
    .await
    {
        Ok(accepted) => accepted,
        Err(reject) => {
            warn!(
                error = reject.code(),
                client = ip.as_deref().unwrap_or("unknown"),
                "single sign-on rejected"
            );
            return reject.into_response();
        }
    };

    match state.sessions.grant(&accepted.email).await {
        Ok(cookie) => {
            info!(
                subject = %accepted.email,
                location = %accepted.location,
                "single sign-on accepted"
            );

            let location = HeaderValue::from_str(&accepted.location)
                .unwrap_or_else(|_| HeaderValue::from_static(redirect::DEFAULT_REDIRECT));

            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(LOCATION, location);
            response.headers_mut().insert(SET_COOKIE, cookie);
            response
        }
        Err(err) => {
            error!("Failed to establish session: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

struct Accepted {
    email: String,
    location: String,
}

async fn run(
    state: &AppState,
    method: &Method,
    host: &str,
    query: Option<&str>,
    ip: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Accepted, Reject> {
    let settings = &state.settings;

    if !gate::is_eligible(method, headers, query, body) {
        // Whether the gate feeds the rate limiter is an operator choice
        if settings.penalize_ineligible {
            return Err(fail(state, ip, Reject::IneligibleRequest).await);
        }
        return Err(Reject::IneligibleRequest);
    }

    if !settings.enabled {
        return Err(fail(state, ip, Reject::Disabled).await);
    }

    if let Some(client) = ip {
        if state.rate_limiter.is_locked(client).await {
            return Err(fail(state, ip, Reject::RateLimited).await);
        }
    }

    let Some(token_value) = token_param(query) else {
        return Err(fail(state, ip, Reject::MissingToken).await);
    };

    // Fail closed when no shared secret is configured at all
    let secrets = settings.secrets();
    if secrets.is_empty() {
        return Err(fail(state, ip, Reject::NotConfigured).await);
    }

    let (token_claims, secret_index) = match token::verify_hs256(&token_value, &secrets) {
        Ok(verified) => verified,
        Err(err) => {
            debug!(error = %err, "token verification failed");
            return Err(fail(state, ip, Reject::InvalidToken).await);
        }
    };

    if secret_index > 0 {
        debug!(secret_index, "token verified with a rotated secret");
    }

    let now = now_unix_seconds();

    // Burn the jti before any claim check so a signed token is consumed even
    // when it goes on to fail validation
    let jti = token_claims.jti.as_deref().map(str::trim).unwrap_or_default();
    if jti.is_empty() {
        return Err(fail(state, ip, Reject::InvalidJti).await);
    }

    if !state
        .replay
        .check_and_burn(&settings.site_id, jti, token_claims.exp, now)
        .await
    {
        return Err(fail(state, ip, Reject::Replay).await);
    }

    if let Err(reject) = claims::validate(&token_claims, settings, host, now) {
        return Err(fail(state, ip, reject).await);
    }

    if settings.require_redemption {
        if let Err(err) = state.redemption.redeem(&token_value, settings).await {
            warn!(error = %err, "token redemption failed");
            return Err(fail(state, ip, Reject::RedeemFailed).await);
        }
    }

    let subject = token_claims.sub.as_deref().map(str::trim).unwrap_or_default();
    if subject.is_empty() {
        return Err(fail(state, ip, Reject::InvalidSub).await);
    }

    let Some(user) = state.directory.resolve(subject).await else {
        return Err(fail(state, ip, Reject::NoUser).await);
    };

    if !user.can_read || (settings.require_manage_capability && !user.can_manage) {
        return Err(fail(state, ip, Reject::Forbidden).await);
    }

    let location = redirect::sanitize(
        token_claims.rp.as_deref().unwrap_or_default(),
        &settings.allowed_redirect_paths,
    );

    Ok(Accepted {
        email: user.email,
        location,
    })
}

/// Record the failed attempt against the client before handing the rejection
/// back. Rate limiting is about request volume, so this runs on every reject
/// path, signature-valid or not.
async fn fail(state: &AppState, ip: Option<&str>, reject: Reject) -> Reject {
    if let Some(client) = ip {
        let failures = state.rate_limiter.record_failure(client).await;
        debug!(failures, "recorded failed attempt");
    }
    reject
}

fn token_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key.as_ref() == "token")
        .map(|(_, value)| value.into_owned())
        .filter(|token| !token.is_empty())
}
