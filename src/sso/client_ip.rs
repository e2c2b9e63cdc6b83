//! Client address derivation, kept separate from the HTTP stack so the
//! precedence rules are unit-testable.

use axum::http::HeaderMap;
use regex::Regex;
use std::net::SocketAddr;

/// Derive the client address: CDN header first, then proxy headers, then the
/// socket peer. The winner is filtered to IP characters so a forged header
/// cannot smuggle arbitrary bytes into store keys or logs.
#[must_use]
pub fn client_address(headers: &HeaderMap, socket: Option<SocketAddr>) -> Option<String> {
    let from_headers = header_value(headers, "cf-connecting-ip")
        .or_else(|| forwarded_for(headers))
        .or_else(|| header_value(headers, "x-real-ip"));

    let candidate = match from_headers {
        Some(value) => value,
        None => socket?.ip().to_string(),
    };

    sanitize(&candidate)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// First entry of `x-forwarded-for`, the hop closest to the client.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn sanitize(candidate: &str) -> Option<String> {
    let filtered = Regex::new(r"[^0-9a-fA-F:.]")
        .map_or_else(|_| candidate.to_string(), |re| re.replace_all(candidate, "").to_string());

    if filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}
