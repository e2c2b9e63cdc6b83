//! Shared per-process state wired once at startup.

use crate::sso::{
    identity::IdentityResolver, rate_limit::RateLimiter, redeem::RedemptionClient,
    replay::ReplayGuard, session::SessionBroker, settings::Settings, store::TtlStore,
};
use anyhow::Result;
use std::sync::Arc;

pub struct AppState {
    pub settings: Settings,
    pub rate_limiter: RateLimiter,
    pub replay: ReplayGuard,
    pub redemption: RedemptionClient,
    pub directory: Arc<dyn IdentityResolver>,
    pub sessions: SessionBroker,
}

impl AppState {
    /// # Errors
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(
        settings: Settings,
        store: Arc<dyn TtlStore>,
        directory: Arc<dyn IdentityResolver>,
    ) -> Result<Self> {
        let rate_limiter = RateLimiter::new(
            store.clone(),
            settings.rate_limit_max,
            settings.rate_limit_window_seconds,
        );
        let replay = ReplayGuard::new(store.clone());
        // Session cookies are always Secure: the gate refuses non-TLS requests
        let sessions = SessionBroker::new(store, settings.session_ttl_seconds, true);
        let redemption = RedemptionClient::new()?;

        Ok(Self {
            settings,
            rate_limiter,
            replay,
            redemption,
            directory,
            sessions,
        })
    }
}
