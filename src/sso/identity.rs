//! Local identity resolution for verified token subjects.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct LocalUser {
    pub id: String,
    pub email: String,
    /// Baseline capability, required for every login.
    #[serde(default = "default_true")]
    pub can_read: bool,
    /// Elevated capability, required when the site demands it.
    #[serde(default)]
    pub can_manage: bool,
}

fn default_true() -> bool {
    true
}

/// Maps a verified subject email to a local user. The real identity store
/// lives outside this service; implementations adapt it.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, email: &str) -> Option<LocalUser>;
}

/// Normalize an email for lookup: trimmed, lower-cased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Directory loaded once at startup from a JSON array of users.
/// Keeps the binary runnable stand-alone and doubles as the test resolver.
pub struct StaticDirectory {
    users: HashMap<String, LocalUser>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(users: Vec<LocalUser>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (normalize_email(&user.email), user))
            .collect();
        Self { users }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory file {}", path.display()))?;
        let users: Vec<LocalUser> =
            serde_json::from_str(&raw).context("Failed to parse directory file")?;
        Ok(Self::new(users))
    }
}

#[async_trait]
impl IdentityResolver for StaticDirectory {
    async fn resolve(&self, email: &str) -> Option<LocalUser> {
        self.users.get(&normalize_email(email)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new(vec![LocalUser {
            id: "u-1".to_string(),
            email: "Alice@Example.COM".to_string(),
            can_read: true,
            can_manage: false,
        }])
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[tokio::test]
    async fn resolve_is_case_insensitive_and_trimmed() {
        let directory = directory();
        let user = directory.resolve(" alice@example.com ").await;
        assert_eq!(user.map(|u| u.id), Some("u-1".to_string()));
    }

    #[tokio::test]
    async fn unknown_email_resolves_to_none() {
        let directory = directory();
        assert!(directory.resolve("bob@example.com").await.is_none());
    }

    #[test]
    fn directory_json_defaults_capabilities() {
        let raw = r#"[{"id": "u-2", "email": "bob@example.com"}]"#;
        let users: Vec<LocalUser> = serde_json::from_str(raw).unwrap();
        assert!(users[0].can_read);
        assert!(!users[0].can_manage);
    }
}
