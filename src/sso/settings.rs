//! Merged single sign-on settings, static configuration over stored values.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const DEFAULT_RATE_LIMIT_MAX: u32 = 5;
const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 900;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 12 * 60 * 60;

// Floors, not defaults: stored values below these are raised, never trusted
const MIN_RATE_LIMIT_MAX: u32 = 1;
const MIN_RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

/// One layer of configuration. Deserialized from the stored settings file and
/// built from flags/env by the CLI; `None` fields defer to the next layer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PartialSettings {
    pub enabled: Option<bool>,
    pub app_base_url: Option<String>,
    pub site_id: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    #[serde(deserialize_with = "secret_opt")]
    pub secret_active: Option<SecretString>,
    #[serde(deserialize_with = "secret_opt")]
    pub secret_previous: Option<SecretString>,
    /// Newline-delimited path prefixes, parsed by [`parse_allowed_paths`].
    pub allowed_redirect_paths: Option<String>,
    pub require_manage_capability: Option<bool>,
    pub require_redemption: Option<bool>,
    #[serde(deserialize_with = "secret_opt")]
    pub redeem_api_key: Option<SecretString>,
    pub rate_limit_max: Option<u32>,
    pub rate_limit_window_seconds: Option<u64>,
    pub session_ttl_seconds: Option<i64>,
    pub penalize_ineligible: Option<bool>,
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(SecretString::from))
}

/// Resolved per-process settings, read-only once built.
#[derive(Debug)]
pub struct Settings {
    pub enabled: bool,
    pub app_base_url: String,
    pub site_id: String,
    pub issuer: String,
    pub audience: String,
    pub secret_active: SecretString,
    pub secret_previous: SecretString,
    pub allowed_redirect_paths: Vec<String>,
    pub require_manage_capability: bool,
    pub require_redemption: bool,
    pub redeem_api_key: Option<SecretString>,
    pub rate_limit_max: u32,
    pub rate_limit_window_seconds: u64,
    pub session_ttl_seconds: i64,
    pub penalize_ineligible: bool,
}

impl Settings {
    /// Merge two configuration layers, field by field. `static_settings`
    /// (deployment flags/env) always wins over `stored` (mutable store).
    #[must_use]
    pub fn merge(static_settings: PartialSettings, stored: PartialSettings) -> Self {
        let raw_paths = static_settings
            .allowed_redirect_paths
            .or(stored.allowed_redirect_paths)
            .unwrap_or_default();

        Self {
            enabled: static_settings.enabled.or(stored.enabled).unwrap_or(true),
            app_base_url: static_settings
                .app_base_url
                .or(stored.app_base_url)
                .unwrap_or_default(),
            site_id: static_settings
                .site_id
                .or(stored.site_id)
                .unwrap_or_default(),
            issuer: static_settings.issuer.or(stored.issuer).unwrap_or_default(),
            audience: static_settings
                .audience
                .or(stored.audience)
                .unwrap_or_default(),
            secret_active: static_settings
                .secret_active
                .or(stored.secret_active)
                .unwrap_or_default(),
            secret_previous: static_settings
                .secret_previous
                .or(stored.secret_previous)
                .unwrap_or_default(),
            allowed_redirect_paths: parse_allowed_paths(&raw_paths),
            require_manage_capability: static_settings
                .require_manage_capability
                .or(stored.require_manage_capability)
                .unwrap_or(false),
            require_redemption: static_settings
                .require_redemption
                .or(stored.require_redemption)
                .unwrap_or(false),
            redeem_api_key: static_settings.redeem_api_key.or(stored.redeem_api_key),
            rate_limit_max: static_settings
                .rate_limit_max
                .or(stored.rate_limit_max)
                .unwrap_or(DEFAULT_RATE_LIMIT_MAX)
                .max(MIN_RATE_LIMIT_MAX),
            rate_limit_window_seconds: static_settings
                .rate_limit_window_seconds
                .or(stored.rate_limit_window_seconds)
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECONDS)
                .max(MIN_RATE_LIMIT_WINDOW_SECONDS),
            session_ttl_seconds: static_settings
                .session_ttl_seconds
                .or(stored.session_ttl_seconds)
                .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
            penalize_ineligible: static_settings
                .penalize_ineligible
                .or(stored.penalize_ineligible)
                .unwrap_or(false),
        }
    }

    /// Candidate secrets in verification order: active first, then previous.
    /// Empty secrets are skipped so rotation can retire one side at a time.
    #[must_use]
    pub fn secrets(&self) -> Vec<&SecretString> {
        [&self.secret_active, &self.secret_previous]
            .into_iter()
            .filter(|secret| !secret.expose_secret().is_empty())
            .collect()
    }

    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secrets().is_empty()
    }
}

/// Parse the newline-delimited allow-list into ordered, deduplicated
/// `/`-rooted prefixes. Protocol-relative (`//`) and unrooted lines are
/// dropped.
#[must_use]
pub fn parse_allowed_paths(raw: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || !line.starts_with('/') || line.starts_with("//") {
            continue;
        }
        if !paths.iter().any(|seen| seen == line) {
            paths.push(line.to_string());
        }
    }

    paths
}
