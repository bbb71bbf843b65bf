use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub routing: RoutingSettings,
    pub log: LogSettings,
}

/// Backend REST API settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_milliseconds: u64,
    /// Route the application navigates to when the session expires
    pub login_route: String,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct StorageSettings {
    pub token_file: PathBuf,
}

/// OpenRouteService directions API
#[derive(serde::Deserialize, Clone, Debug)]
pub struct RoutingSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_milliseconds: u64,
}

impl RoutingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct LogSettings {
    pub filter: String,
}

/// Load settings from the optional `configuration` file (or `path` when given,
/// which must then exist), overridden by `APP__SECTION__KEY` environment variables.
pub fn get_configuration(path: Option<&str>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::with_name(path).required(true),
        None => config::File::with_name("configuration").required(false),
    };

    let settings = config::Config::builder()
        .set_default("api.base_url", "http://localhost:3002")?
        .set_default("api.timeout_milliseconds", 10_000_i64)?
        .set_default("api.login_route", "/login")?
        .set_default("storage.token_file", ".trash-mboa/session.json")?
        .set_default("routing.base_url", "https://api.openrouteservice.org")?
        .set_default("routing.api_key", "")?
        .set_default("routing.timeout_milliseconds", 10_000_i64)?
        .set_default("log.filter", "info")?
        .add_source(file)
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
