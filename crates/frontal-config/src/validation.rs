//! Shape checks run after a configuration is materialized.
//!
//! Only structural rules live here; whether referenced files exist is left to
//! the build, which reports missing assets as resolution errors.

use globset::Glob;

use crate::config::FrontalConfig;
use crate::error::{ConfigError, Result};

pub fn validate(config: &FrontalConfig) -> Result<()> {
    if !config.server.base.starts_with('/') {
        return Err(ConfigError::SchemaValidation {
            message: format!("server.base `{}` must start with '/'", config.server.base),
            hint: Some("Use an absolute URL prefix such as \"/\" or \"/docs/\"".to_string()),
        });
    }

    if config.pages.extensions.is_empty() {
        return Err(ConfigError::SchemaValidation {
            message: "pages.extensions cannot be empty".to_string(),
            hint: Some("List at least one page extension, e.g. [\"html\"]".to_string()),
        });
    }

    for plugin in &config.plugins {
        if plugin.plugin.trim().is_empty() {
            return Err(ConfigError::SchemaValidation {
                message: "plugin name cannot be empty".to_string(),
                hint: Some("Remove empty entries from the 'plugins' array".to_string()),
            });
        }
    }

    for (name, bundle) in &config.bundles {
        if name.trim().is_empty() {
            return Err(ConfigError::SchemaValidation {
                message: "bundle names cannot be empty".to_string(),
                hint: None,
            });
        }

        for asset in &bundle.assets {
            if asset.path.trim().is_empty() {
                return Err(ConfigError::SchemaValidation {
                    message: format!("bundle `{name}` contains an asset with an empty path"),
                    hint: Some("Remove the empty asset entry".to_string()),
                });
            }
        }

        for pattern in &bundle.pages {
            if let Err(err) = Glob::new(pattern) {
                return Err(ConfigError::SchemaValidation {
                    message: format!("bundle `{name}` has an invalid page pattern `{pattern}`"),
                    hint: Some(err.to_string()),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{AssetReference, BundleDescriptor};

    #[test]
    fn defaults_are_valid() {
        validate(&FrontalConfig::default()).unwrap();
    }

    #[test]
    fn rejects_relative_base() {
        let mut config = FrontalConfig::default();
        config.server.base = "docs/".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::SchemaValidation { .. })
        ));
    }

    #[test]
    fn rejects_malformed_page_glob() {
        let mut config = FrontalConfig::default();
        config.bundles.insert(
            "broken".to_string(),
            BundleDescriptor::with_assets([AssetReference::new("a.js")]).pages(["blog/[a-"]),
        );
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn rejects_empty_asset_path() {
        let mut config = FrontalConfig::default();
        config
            .bundles
            .insert("empty".to_string(), BundleDescriptor::with_assets([" "]));
        assert!(validate(&config).is_err());
    }
}
