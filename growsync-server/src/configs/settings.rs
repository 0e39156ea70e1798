use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub secret: String,
    pub expiration: u64,
}

/// Boot-time defaults for the nightly posting window. The live window is
/// owned by `PostingConfig` and can be changed at runtime; this only seeds
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub window_start_hour: u8,
    pub window_end_hour: u8,
}

impl Default for Posting {
    fn default() -> Self {
        Self {
            window_start_hour: 1,
            window_end_hour: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub auth: Auth,
    #[serde(default)]
    pub posting: Posting,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::default().separator("_"))
            .build()?
            .try_deserialize()?;

        if settings.posting.window_start_hour >= settings.posting.window_end_hour
            || settings.posting.window_end_hour > 23
        {
            return Err(ConfigError::Message(
                "posting window must satisfy 0 <= start < end <= 23".into(),
            ));
        }

        Ok(settings)
    }
}
