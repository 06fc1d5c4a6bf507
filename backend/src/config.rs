//! Runtime configuration from the environment (and `.env`).

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DATA_DIR_VAR: &str = "REPAIRLOG_DATA_DIR";
pub const PORT_VAR: &str = "REPAIRLOG_PORT";
pub const DEFAULT_USER_VAR: &str = "REPAIRLOG_DEFAULT_USER";

const DEFAULT_DATA_DIR: &str = ".repairlog";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_USER_ID: u64 = 1;

/// Settings shared by the CLI and the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the asset store
    pub data_dir: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// User imports run as when none is given
    pub default_user_id: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            port: DEFAULT_PORT,
            default_user_id: DEFAULT_USER_ID,
        }
    }
}

impl AppConfig {
    /// Read configuration from environment variables, loading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(port) = get(PORT_VAR) {
            config.port = parse_var(PORT_VAR, &port)?;
        }
        if let Some(user) = get(DEFAULT_USER_VAR) {
            config.default_user_id = parse_var(DEFAULT_USER_VAR, &user)?;
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
