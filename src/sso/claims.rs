//! Claim policy: temporal validity, issuer/audience/site binding, and the
//! audience-as-hostname check.

use crate::sso::{error::Reject, settings::Settings, token::Claims};
use subtle::ConstantTimeEq;

/// Tolerated clock drift between issuer and this host, in seconds.
pub const CLOCK_SKEW_SECONDS: i64 = 60;

/// Constant-time string equality. Claim values are compared against
/// configured strings without leaking a timing oracle on where they differ.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Validate verified claims against the configured bindings.
///
/// Checks run in a fixed order and each failure carries its own rejection,
/// so operators can tell a stale token from a copy-pasted misconfiguration.
///
/// # Errors
///
/// Returns the first failing check as a [`Reject`].
pub fn validate(
    claims: &Claims,
    settings: &Settings,
    request_host: &str,
    now: i64,
) -> Result<(), Reject> {
    let (Some(iat), Some(exp)) = (claims.iat, claims.exp) else {
        return Err(Reject::InvalidClaims);
    };
    if iat <= 0 || exp <= 0 {
        return Err(Reject::InvalidClaims);
    }

    if iat > now + CLOCK_SKEW_SECONDS {
        return Err(Reject::InvalidClaims);
    }

    if exp < now - CLOCK_SKEW_SECONDS {
        return Err(Reject::Expired);
    }

    if !constant_time_eq(claims.iss.as_deref().unwrap_or_default(), &settings.issuer) {
        return Err(Reject::InvalidIss);
    }

    if !constant_time_eq(claims.aud.as_deref().unwrap_or_default(), &settings.audience) {
        return Err(Reject::InvalidAud);
    }

    if !constant_time_eq(claims.sid.as_deref().unwrap_or_default(), &settings.site_id) {
        return Err(Reject::InvalidSid);
    }

    // When the audience looks like a hostname, bind the token to the serving
    // host as well: a token minted for one site must not land on another even
    // if sid/aud were copied across configurations.
    let audience = settings.audience.to_lowercase();
    if audience.contains('.') {
        let host = host_without_port(request_host).to_lowercase();
        if !constant_time_eq(&audience, &host) {
            return Err(Reject::HostMismatch);
        }
    }

    Ok(())
}

fn host_without_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        // Bare IPv6 hosts keep their colons
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
