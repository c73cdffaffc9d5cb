use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = ".coderepos/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    /// Send `repository_new` notices on creation.
    pub notifications: bool,
    /// Repository types to enable; every installed backend when unset.
    pub backends: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: ".coderepos/coderepos.db".to_string(),
            port: 4830,
            notifications: true,
            backends: None,
        }
    }
}

impl Config {
    /// Reads `path`, or the default location when none is given. Only an
    /// explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|err| ConfigError::Parse {
                path: path.clone(),
                message: err.to_string(),
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("CODEREPOS_DB_PATH") {
            self.db_path = value;
        }
        if let Some(value) = lookup("CODEREPOS_PORT") {
            self.port = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "CODEREPOS_PORT",
                value,
            })?;
        }
        if let Some(value) = lookup("CODEREPOS_NOTIFICATIONS") {
            self.notifications = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "CODEREPOS_NOTIFICATIONS",
                        value,
                    });
                }
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "db_path = \"/var/lib/coderepos.db\"\nbackends = [\"git\"]\n",
        )
        .unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.db_path, "/var/lib/coderepos.db");
        assert_eq!(config.backends, Some(vec!["git".to_string()]));
        assert!(config.notifications);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "prot = 1\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn environment_wins() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CODEREPOS_PORT", "9000"),
            ("CODEREPOS_NOTIFICATIONS", "off"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|name| env.get(name).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert!(!config.notifications);

        let err = config
            .apply_env(|name| (name == "CODEREPOS_PORT").then(|| "high".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "CODEREPOS_PORT", .. }));
    }
}
