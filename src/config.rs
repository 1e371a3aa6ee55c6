// Driver configuration

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{DriverError, Result};

const DEFAULT_DATABASE: &str = "mysql";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// SQLite journal mode applied with `PRAGMA journal_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JournalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DELETE" => Ok(JournalMode::Delete),
            "TRUNCATE" => Ok(JournalMode::Truncate),
            "PERSIST" => Ok(JournalMode::Persist),
            "MEMORY" => Ok(JournalMode::Memory),
            "WAL" => Ok(JournalMode::Wal),
            "OFF" => Ok(JournalMode::Off),
            _ => Err(format!(
                "Unknown journal mode: '{}'. Supported: DELETE, TRUNCATE, PERSIST, MEMORY, WAL, OFF",
                s
            )),
        }
    }
}

/// Connection settings for a [`Driver`](crate::driver::Driver)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// MySQL database name the connection pretends to be
    pub database: String,
    /// SQLite file; in-memory when absent
    pub path: Option<PathBuf>,
    /// Busy timeout, given in seconds in TOML
    #[serde(deserialize_with = "deserialize_seconds")]
    pub timeout: Duration,
    pub journal_mode: Option<JournalMode>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            path: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            journal_mode: None,
        }
    }
}

impl DriverConfig {
    pub fn in_memory(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DriverConfig =
            toml::from_str(text).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("reading '{}': {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(DriverError::Config("database name must not be empty".into()));
        }
        Ok(())
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(serde::de::Error::custom("timeout must be a non-negative number of seconds"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.database, "mysql");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.path.is_none(), "Default config should be in memory");
        assert!(config.journal_mode.is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let config = DriverConfig::from_toml_str(
            r#"
            database = "wp"
            path = "/tmp/wp.sqlite"
            timeout = 3
            journal_mode = "WAL"
            "#,
        )
        .unwrap();
        assert_eq!(config.database, "wp");
        assert_eq!(config.path, Some(PathBuf::from("/tmp/wp.sqlite")));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.journal_mode, Some(JournalMode::Wal));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DriverConfig::from_toml_str("database = \"blog\"").unwrap();
        assert_eq!(config.database, "blog");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        match DriverConfig::from_toml_str("timeout = -1") {
            Err(DriverError::Config(_)) => {}
            other => panic!("Expected Config error, got {:?}", other),
        }
        match DriverConfig::from_toml_str("database = \"\"") {
            Err(DriverError::Config(msg)) => assert!(msg.contains("empty"), "Got: {}", msg),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database = \"shop\"\njournal_mode = \"MEMORY\"").unwrap();
        let config = DriverConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.database, "shop");
        assert_eq!(config.journal_mode, Some(JournalMode::Memory));
    }

    #[test]
    fn test_journal_mode_from_str() {
        assert_eq!("wal".parse::<JournalMode>(), Ok(JournalMode::Wal));
        assert_eq!("Delete".parse::<JournalMode>(), Ok(JournalMode::Delete));
        assert!("fast".parse::<JournalMode>().is_err());
    }
}
