//! Post-login redirect target validation.

/// Where to land when the requested path is missing or unacceptable.
pub const DEFAULT_REDIRECT: &str = "/wp-admin/";

/// Validate the requested return path against the allow-list.
///
/// Hygiene first: empty, unrooted, or protocol-relative (`//`) paths fall
/// back to the default. An empty allow-list accepts any hygienic path;
/// otherwise the path must equal an allowed prefix or sit under it.
#[must_use]
pub fn sanitize(requested: &str, allowed_prefixes: &[String]) -> String {
    let requested = requested.trim();

    if requested.is_empty() || !requested.starts_with('/') || requested.starts_with("//") {
        return DEFAULT_REDIRECT.to_string();
    }

    if allowed_prefixes.is_empty() {
        return requested.to_string();
    }

    for prefix in allowed_prefixes {
        if requested == prefix || requested.starts_with(&format!("{}/", prefix.trim_end_matches('/')))
        {
            return requested.to_string();
        }
    }

    DEFAULT_REDIRECT.to_string()
}
