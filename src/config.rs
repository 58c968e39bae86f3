use std::net::SocketAddr;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    /// Path to the sqlite file, created on first connect
    pub path: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
}

impl ApplicationSettings {
    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

impl Settings {
    /// Reads `trivia.toml` (optional) and then `TRIVIA_*` variables,
    /// e.g. `TRIVIA_DATABASE__PATH=trivia.db`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::builder()?
            .add_source(config::File::with_name("trivia").required(false))
            .add_source(
                config::Environment::with_prefix("TRIVIA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8080)?
            .set_default("database.path", "trivia.db")?
            .set_default("database.max_connections", 5)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.database.path, "trivia.db");
        assert_eq!(settings.database.max_connections, 5);
    }

    #[test]
    fn port_is_parsed_from_string() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("application.port", "3000")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.application.port, 3000);
        assert_eq!(
            settings.application.address().unwrap().to_string(),
            "0.0.0.0:3000"
        );
    }
}
