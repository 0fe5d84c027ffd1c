use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upstream: UpstreamConfig,
    pub renderer: RendererConfig,
    pub tickets: TicketConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Hold window requested on reserve calls when the caller does not pick
    /// one. Must sit inside the upstream's accepted [30, 900] range.
    pub default_hold_seconds: i64,
    #[serde(default)]
    pub use_mock: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RendererConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TicketConfig {
    /// Base of the canonical link persisted with every cached artifact.
    pub public_base_url: String,
    pub booked_by: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("COACHLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
