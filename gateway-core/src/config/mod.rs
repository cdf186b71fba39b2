use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the common settings.
    ///
    /// `PORT` (set by serverless runtimes) seeds the default listen port;
    /// `APP__*` variables and an optional `configuration` file override it.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let runtime_port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let config = Cfg::builder()
            .set_default("port", i64::from(runtime_port))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
