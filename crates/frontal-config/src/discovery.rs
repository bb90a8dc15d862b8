//! File-based config discovery.
//!
//! Finds the project configuration, layers it over the defaults and applies
//! `FRONTAL_` environment overrides.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde_json::Value;

use crate::config::FrontalConfig;
use crate::error::{ConfigError, Result};
use crate::snapshot::ConfigSnapshot;
use crate::validation::validate;

pub const CONFIG_FILE: &str = "frontal.toml";
pub const PACKAGE_JSON_FIELD: &str = "frontal";
pub const ENV_PREFIX: &str = "FRONTAL_";

/// Searches a project root for its configuration and loads it.
///
/// # Example
///
/// ```no_run
/// use frontal_config::ConfigDiscovery;
///
/// let snapshot = ConfigDiscovery::new(".").load().unwrap();
/// println!("serving on port {}", snapshot.server.port);
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. TOML config: frontal.toml
    /// 2. package.json (frontal field)
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.exists() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join("package.json");
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        match parsed.get(PACKAGE_JSON_FIELD) {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Load a snapshot, falling back to the defaults when no file exists.
    pub fn load(&self) -> Result<ConfigSnapshot> {
        let source = self.find();
        let user = match &source {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                read_user_value(path)?
            }
            None => {
                tracing::debug!(root = %self.root.display(), "no configuration file, using defaults");
                Value::Object(Default::default())
            }
        };

        let layered = FrontalConfig::layer_user_value(user)?;
        let config: FrontalConfig = Figment::from(Serialized::defaults(layered))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        validate(&config)?;

        Ok(ConfigSnapshot::new(self.root.clone(), source, config))
    }

    /// Like [`load`](Self::load) but fails when no file exists.
    pub fn load_required(&self) -> Result<ConfigSnapshot> {
        if self.find().is_none() {
            return Err(ConfigError::NotFound(self.root.clone()));
        }
        self.load()
    }
}

/// Read the raw user configuration from `path`.
pub fn read_user_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;

    if path.file_name() == Some(OsStr::new("package.json")) {
        let parsed: Value =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "package.json".to_string(),
                hint: Some(format!("Invalid JSON: {e}")),
            })?;
        return match parsed.get(PACKAGE_JSON_FIELD) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(ConfigError::InvalidValue {
                field: PACKAGE_JSON_FIELD.to_string(),
                hint: Some("Add a 'frontal' field to your package.json".to_string()),
            }),
        };
    }

    match path.extension().and_then(OsStr::to_str) {
        Some("toml") => {
            let toml_val: toml::Value =
                toml::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                    field: "toml".to_string(),
                    hint: Some(format!("Invalid TOML syntax: {e}")),
                })?;
            serde_json::to_value(toml_val).map_err(|e| ConfigError::InvalidValue {
                field: "toml".to_string(),
                hint: Some(format!("TOML to JSON conversion failed: {e}")),
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: "json".to_string(),
            hint: Some(format!("Invalid JSON: {e}")),
        }),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or_default().to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn find_prefers_toml_over_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"frontal": {}}"#).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let found = ConfigDiscovery::new(dir.path()).find().unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
    }

    #[test]
    fn package_json_without_field_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "site"}"#).unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().is_none());
    }

    #[test]
    fn load_required_fails_without_file() {
        let dir = TempDir::new().unwrap();
        let err = ConfigDiscovery::new(dir.path()).load_required().unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn invalid_toml_reports_hint() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "server = [").unwrap();
        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(err.hint().unwrap().contains("Invalid TOML"));
    }

    #[test]
    fn env_overlay_wins_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "[server]\nport = 4000\nhost = \"0.0.0.0\"\n")?;
            jail.set_env("FRONTAL_SERVER__PORT", 8080);

            let snapshot = ConfigDiscovery::new(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(snapshot.server.port, 8080);
            assert_eq!(snapshot.server.host, "0.0.0.0");
            Ok(())
        });
    }
}
