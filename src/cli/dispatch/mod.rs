use crate::cli::actions::Action;
use crate::sso::settings::PartialSettings;
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let get = |name: &str| -> Option<String> {
        matches.get_one::<String>(name).map(|s: &String| s.to_string())
    };

    // Flags only override the stored settings when set, absent means "no opinion"
    let flag = |name: &str| -> Option<bool> {
        if matches.get_flag(name) {
            Some(true)
        } else {
            None
        }
    };

    let static_settings = PartialSettings {
        enabled: flag("disabled").map(|d| !d),
        app_base_url: get("app-base-url"),
        site_id: get("site-id"),
        issuer: get("issuer"),
        audience: get("audience"),
        secret_active: get("secret-active").map(SecretString::from),
        secret_previous: get("secret-previous").map(SecretString::from),
        allowed_redirect_paths: get("allowed-redirect-paths"),
        require_manage_capability: flag("require-manage-capability"),
        require_redemption: flag("require-redemption"),
        redeem_api_key: get("redeem-api-key").map(SecretString::from),
        rate_limit_max: matches.get_one::<u32>("rate-limit-max").copied(),
        rate_limit_window_seconds: matches.get_one::<u64>("rate-limit-window").copied(),
        session_ttl_seconds: matches.get_one::<i64>("session-ttl").copied(),
        penalize_ineligible: flag("penalize-ineligible"),
    };

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        static_settings,
        settings_file: matches
            .get_one::<std::path::PathBuf>("settings-file")
            .cloned(),
        directory: matches.get_one::<std::path::PathBuf>("directory").cloned(),
    })
}
