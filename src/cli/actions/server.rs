use crate::cli::actions::Action;
use crate::sso;
use crate::sso::{
    identity::{IdentityResolver, StaticDirectory},
    settings::{PartialSettings, Settings},
    state::AppState,
    store::InMemoryTtlStore,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::warn;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            static_settings,
            settings_file,
            directory,
        } => {
            let stored = match settings_file {
                Some(path) => read_stored_settings(&path)?,
                None => PartialSettings::default(),
            };

            // Static deployment configuration always wins over the stored settings
            let settings = Settings::merge(static_settings, stored);

            if !settings.has_secret() {
                warn!("no shared secret configured, all login attempts will fail closed");
            }

            let directory: Arc<dyn IdentityResolver> = match directory {
                Some(path) => Arc::new(
                    StaticDirectory::from_json_file(&path).with_context(|| {
                        format!("Failed to load directory {}", path.display())
                    })?,
                ),
                None => Arc::new(StaticDirectory::empty()),
            };

            let store = Arc::new(InMemoryTtlStore::new());
            let state = AppState::new(settings, store, directory)?;

            sso::new(port, state).await?;
        }
    }

    Ok(())
}

fn read_stored_settings(path: &std::path::Path) -> Result<PartialSettings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    serde_json::from_str::<PartialSettings>(&raw)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}
