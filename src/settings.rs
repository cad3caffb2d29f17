//! Application settings read from the environment
//!
//! Settings are read once at process start. Every value has a default, so
//! an empty environment yields a usable configuration.

use crate::error::{ComposeError, Result};
use crate::utils::is_true;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Prefix shared by every settings variable except the debug flag
pub const ENV_PREFIX: &str = "SWARM_COMPOSE_";

/// Variable that toggles debug mode
pub const DEBUG_VAR: &str = "DEBUG_SWARM_COMPOSE";

/// Format used when displaying timestamps
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M%z";

/// Database engine that stores records as a JSON document
pub const FILE_ENGINE: &str = "file";

/// Default time zone name
pub const DEFAULT_TIME_ZONE: &str = "America/Chicago";

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    /// Storage engine
    pub engine: String,
    /// Database name, a file path for the file engine
    pub name: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub host: String,
    /// Only read by engines that connect over the network
    pub port: String,
}

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub debug: bool,
    pub time_zone: String,
    pub datetime_format: String,
}

/// Directory that holds the default database file
pub fn base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("swarm-compose")
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).unwrap_or_else(|| default.to_string())
        };

        let default_name = base_dir().join("db.json").to_string_lossy().into_owned();

        let database = DatabaseSettings {
            engine: var("SQL_ENGINE", FILE_ENGINE),
            name: var("SQL_DATABASE", &default_name),
            user: var("SQL_USER", "user"),
            password: var("SQL_PASSWORD", "password"),
            host: var("SQL_HOST", "localhost"),
            port: var("SQL_PORT", "5432"),
        };

        let debug = lookup(DEBUG_VAR).map_or(true, |value| is_true(&value));

        let time_zone = var("TIME_ZONE", DEFAULT_TIME_ZONE);
        if time_zone.trim().is_empty() {
            return Err(ComposeError::InvalidConfig(format!(
                "{}TIME_ZONE cannot be blank",
                ENV_PREFIX
            )));
        }

        Ok(Self {
            database,
            debug,
            time_zone,
            datetime_format: DATETIME_FORMAT.to_string(),
        })
    }

    /// Format a timestamp for display
    pub fn format_timestamp(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.format(&self.datetime_format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.database.engine, FILE_ENGINE);
        assert!(settings.database.name.ends_with("db.json"));
        assert_eq!(settings.database.user, "user");
        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, "5432");
        assert!(settings.debug);
        assert_eq!(settings.time_zone, "America/Chicago");
        assert_eq!(settings.datetime_format, "%Y-%m-%d %H:%M%z");
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("SWARM_COMPOSE_SQL_DATABASE", "/tmp/compose.json"),
            ("SWARM_COMPOSE_SQL_PORT", "6543"),
            ("SWARM_COMPOSE_TIME_ZONE", "UTC"),
            ("DEBUG_SWARM_COMPOSE", "off"),
        ])
        .unwrap();

        assert_eq!(settings.database.name, "/tmp/compose.json");
        assert_eq!(settings.database.port, "6543");
        assert_eq!(settings.time_zone, "UTC");
        assert!(!settings.debug);
    }

    #[test]
    fn test_debug_accepts_truthy_strings() {
        assert!(settings_from(&[("DEBUG_SWARM_COMPOSE", "Y")]).unwrap().debug);
        assert!(!settings_from(&[("DEBUG_SWARM_COMPOSE", "nope")]).unwrap().debug);
    }

    #[test]
    fn test_port_is_not_parsed() {
        let settings = settings_from(&[("SWARM_COMPOSE_SQL_PORT", "")]).unwrap();
        assert_eq!(settings.database.port, "");

        let settings = settings_from(&[("SWARM_COMPOSE_SQL_PORT", "postgres")]).unwrap();
        assert_eq!(settings.database.port, "postgres");
    }

    #[test]
    fn test_blank_time_zone() {
        let result = settings_from(&[("SWARM_COMPOSE_TIME_ZONE", " ")]);
        assert!(matches!(result, Err(ComposeError::InvalidConfig(_))));
    }

    #[test]
    fn test_password_not_serialized() {
        let settings = settings_from(&[("SWARM_COMPOSE_SQL_PASSWORD", "hunter2")]).unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_format_timestamp() {
        let settings = settings_from(&[]).unwrap();
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(settings.format_timestamp(&timestamp), "2024-03-09 14:05+0000");
    }
}
