use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("ponto")
        .about("Stateless token based single sign-on bridge")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PONTO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("app-base-url")
                .long("app-base-url")
                .help("Base URL of the issuing identity application, example: https://id.example.com")
                .env("PONTO_APP_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new("site-id")
                .long("site-id")
                .help("Site identifier bound to the sid claim")
                .env("PONTO_SITE_ID")
                .required(true),
        )
        .arg(
            Arg::new("issuer")
                .long("issuer")
                .help("Expected iss claim value")
                .env("PONTO_ISSUER")
                .required(true),
        )
        .arg(
            Arg::new("audience")
                .long("audience")
                .help("Expected aud claim value, host binding applies when it contains a dot")
                .env("PONTO_AUDIENCE")
                .required(true),
        )
        .arg(
            Arg::new("secret-active")
                .long("secret-active")
                .help("Active shared secret for token verification")
                .env("PONTO_SECRET_ACTIVE"),
        )
        .arg(
            Arg::new("secret-previous")
                .long("secret-previous")
                .help("Previous shared secret, kept valid during rotation")
                .env("PONTO_SECRET_PREVIOUS"),
        )
        .arg(
            Arg::new("allowed-redirect-paths")
                .long("allowed-redirect-paths")
                .help("Newline-delimited list of allowed post-login path prefixes")
                .env("PONTO_ALLOWED_REDIRECT_PATHS"),
        )
        .arg(
            Arg::new("require-manage-capability")
                .long("require-manage-capability")
                .help("Require the resolved user to hold the manage capability")
                .env("PONTO_REQUIRE_MANAGE_CAPABILITY")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("require-redemption")
                .long("require-redemption")
                .help("Confirm each token server-to-server with the issuing application")
                .env("PONTO_REQUIRE_REDEMPTION")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("redeem-api-key")
                .long("redeem-api-key")
                .help("X-API-Key header value for the redemption callback")
                .env("PONTO_REDEEM_API_KEY"),
        )
        .arg(
            Arg::new("rate-limit-max")
                .long("rate-limit-max")
                .help("Failed attempts per client address before lockout")
                .env("PONTO_RATE_LIMIT_MAX")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("rate-limit-window")
                .long("rate-limit-window")
                .help("Lockout window in seconds")
                .env("PONTO_RATE_LIMIT_WINDOW")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("session-ttl")
                .long("session-ttl")
                .help("Session lifetime in seconds")
                .env("PONTO_SESSION_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("penalize-ineligible")
                .long("penalize-ineligible")
                .help("Count ineligible requests against the rate limiter")
                .env("PONTO_PENALIZE_INELIGIBLE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("disabled")
                .long("disabled")
                .help("Refuse all single sign-on attempts")
                .env("PONTO_DISABLED")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("directory")
                .long("directory")
                .help("JSON directory file mapping emails to local users")
                .env("PONTO_DIRECTORY")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("settings-file")
                .long("settings-file")
                .help("Stored settings JSON, overridden field by field by flags and env")
                .env("PONTO_SETTINGS_FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PONTO_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
