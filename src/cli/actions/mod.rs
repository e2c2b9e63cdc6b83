pub mod server;

use crate::sso::settings::PartialSettings;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        static_settings: PartialSettings,
        settings_file: Option<PathBuf>,
        directory: Option<PathBuf>,
    },
}
