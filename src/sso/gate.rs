//! Request eligibility: the login endpoint accepts exactly one shape of
//! request and nothing else.

use axum::http::{HeaderMap, Method};
use tracing::debug;
use url::form_urlencoded;

/// Pure predicate deciding whether a request may enter the login pipeline.
///
/// Eligible means: `GET`, TLS in effect upstream, no body, and no query
/// parameter other than `token`. Anything else is refused before a single
/// byte of the token is parsed.
#[must_use]
pub fn is_eligible(method: &Method, headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> bool {
    if method != Method::GET {
        debug!(%method, "ineligible: method");
        return false;
    }

    if !tls_in_effect(headers) {
        debug!("ineligible: not over TLS");
        return false;
    }

    if !body.is_empty() {
        debug!("ineligible: unexpected body");
        return false;
    }

    if let Some(query) = query {
        for (key, _) in form_urlencoded::parse(query.as_bytes()) {
            if key != "token" {
                debug!(parameter = %key, "ineligible: unexpected query parameter");
                return false;
            }
        }
    }

    true
}

/// TLS is terminated upstream; the proxy attests to it per request.
fn tls_in_effect(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}
