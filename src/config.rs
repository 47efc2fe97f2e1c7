use std::env;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_WORKSHEET: &str = "Sheet1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Environment-supplied settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub credentials_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Settings {
            spreadsheet_id: require("MOOD_SHEET_ID")?,
            worksheet: env::var("MOOD_WORKSHEET")
                .unwrap_or_else(|_| DEFAULT_WORKSHEET.to_string()),
            credentials_path: require("GOOGLE_APPLICATION_CREDENTIALS")?.into(),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
