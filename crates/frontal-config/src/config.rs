//! Top-level configuration structure for Frontal.
//!
//! `FrontalConfig` holds every section with its defaults. User values are
//! layered on top with [`FrontalConfig::from_user_value`]; for file
//! discovery see the `discovery` module.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bundle::{AssetReference, BundleDescriptor, BundleMap};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontalConfig {
    #[serde(default = "default_plugins")]
    pub plugins: Vec<PluginSpec>,

    #[serde(default)]
    pub assets: AssetsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default = "default_bundles")]
    pub bundles: BundleMap,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub icons: IconsConfig,
}

impl Default for FrontalConfig {
    fn default() -> Self {
        Self {
            plugins: default_plugins(),
            assets: AssetsConfig::default(),
            server: ServerConfig::default(),
            build: BuildConfig::default(),
            pages: PagesConfig::default(),
            bundles: default_bundles(),
            library: LibraryConfig::default(),
            icons: IconsConfig::default(),
        }
    }
}

/// A plugin entry: a bare name or `{ plugin = "name", options = { .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PluginRepr")]
pub struct PluginSpec {
    pub plugin: String,

    #[serde(default)]
    pub options: Value,
}

impl PluginSpec {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            options: Value::Object(Default::default()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PluginRepr {
    Name(String),
    Full {
        plugin: String,
        #[serde(default)]
        options: Value,
    },
}

impl From<PluginRepr> for PluginSpec {
    fn from(repr: PluginRepr) -> Self {
        match repr {
            PluginRepr::Name(name) => PluginSpec::new(name),
            PluginRepr::Full { plugin, options } => PluginSpec {
                plugin,
                options: if options.is_null() {
                    Value::Object(Default::default())
                } else {
                    options
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory aliased as `@assets`.
    #[serde(default = "default_assets_path")]
    pub path: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            path: default_assets_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of files served verbatim and copied into the build.
    #[serde(default = "default_public")]
    pub public: PathBuf,

    /// Public URL prefix for emitted assets.
    #[serde(default = "default_base")]
    pub base: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public: default_public(),
            base: default_base(),
        }
    }
}

/// Sub-directory an output kind is written into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDir {
    pub into: String,
}

impl OutputDir {
    fn new(into: &str) -> Self {
        Self {
            into: into.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_path")]
    pub path: PathBuf,

    #[serde(default = "default_assets_into")]
    pub assets: OutputDir,

    #[serde(default = "default_js_into")]
    pub js: OutputDir,

    #[serde(default = "default_style_into")]
    pub style: OutputDir,

    #[serde(default = "default_images_into")]
    pub images: OutputDir,

    #[serde(default = "default_fonts_into")]
    pub fonts: OutputDir,

    #[serde(default = "default_videos_into")]
    pub videos: OutputDir,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            path: default_build_path(),
            assets: default_assets_into(),
            js: default_js_into(),
            style: default_style_into(),
            images: default_images_into(),
            fonts: default_fonts_into(),
            videos: default_videos_into(),
        }
    }
}

impl BuildConfig {
    /// `<assets.into>/<js.into>`
    pub fn js_dir(&self) -> String {
        format!("{}/{}", self.assets.into, self.js.into)
    }

    /// `<assets.into>/<style.into>`
    pub fn style_dir(&self) -> String {
        format!("{}/{}", self.assets.into, self.style.into)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_pages_path")]
    pub path: PathBuf,

    /// Directory under `path` holding partials; never treated as pages.
    #[serde(default = "default_partials")]
    pub partials: String,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            path: default_pages_path(),
            partials: default_partials(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Library descriptor file.
    #[serde(default = "default_library_location")]
    pub location: PathBuf,

    /// Bundle receiving the library-level assets.
    #[serde(default = "default_library_bundle")]
    pub bundle: String,

    /// Options passed to the library setup.
    #[serde(default)]
    pub options: serde_json::Map<String, Value>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_library_location(),
            bundle: default_library_bundle(),
            options: Default::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory of icon sets, one sub-directory per set.
    #[serde(default = "default_icons_path")]
    pub path: PathBuf,

    /// Optional descriptor overriding the tag name and adding replacements.
    #[serde(default = "default_icons_config")]
    pub config: PathBuf,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_icons_path(),
            config: default_icons_config(),
        }
    }
}

fn default_plugins() -> Vec<PluginSpec> {
    ["library", "live-reload", "icons"]
        .into_iter()
        .map(PluginSpec::new)
        .collect()
}

fn default_bundles() -> BundleMap {
    let mut bundles = IndexMap::new();
    bundles.insert(
        "main".to_string(),
        BundleDescriptor::with_assets([AssetReference::new("@assets/app.js")]).pages(["**/*.html"]),
    );
    bundles
}

fn default_assets_path() -> PathBuf {
    PathBuf::from("assets")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public() -> PathBuf {
    PathBuf::from("public")
}

fn default_base() -> String {
    "/".to_string()
}

fn default_build_path() -> PathBuf {
    PathBuf::from(".frontal")
}

fn default_assets_into() -> OutputDir {
    OutputDir::new("assets")
}

fn default_js_into() -> OutputDir {
    OutputDir::new("js")
}

fn default_style_into() -> OutputDir {
    OutputDir::new("css")
}

fn default_images_into() -> OutputDir {
    OutputDir::new("images")
}

fn default_fonts_into() -> OutputDir {
    OutputDir::new("fonts")
}

fn default_videos_into() -> OutputDir {
    OutputDir::new("videos")
}

fn default_pages_path() -> PathBuf {
    PathBuf::from("pages")
}

fn default_partials() -> String {
    ".partials".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["html".to_string()]
}

fn default_library_location() -> PathBuf {
    PathBuf::from("library/library.toml")
}

fn default_library_bundle() -> String {
    "main".to_string()
}

fn default_icons_path() -> PathBuf {
    PathBuf::from("icons")
}

fn default_icons_config() -> PathBuf {
    PathBuf::from("icons/icons.toml")
}

fn default_true() -> bool {
    true
}

impl FrontalConfig {
    /// Layer a user-supplied value over the defaults.
    ///
    /// Sections merge recursively except for two keys: user `plugins` are
    /// appended to the default plugin list and user `bundles` replace the
    /// default bundles entirely.
    ///
    /// # Example
    ///
    /// ```
    /// use frontal_config::FrontalConfig;
    /// use serde_json::json;
    ///
    /// let config = FrontalConfig::from_user_value(json!({
    ///     "server": { "port": 8080 },
    ///     "bundles": { "blog": { "assets": ["blog.js"], "pages": ["blog/**"] } }
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.server.port, 8080);
    /// assert_eq!(config.server.base, "/");
    /// assert_eq!(config.bundles.keys().collect::<Vec<_>>(), vec!["blog"]);
    /// ```
    pub fn from_user_value(value: Value) -> Result<Self> {
        let merged = Self::layer_user_value(value)?;
        Self::from_value(merged)
    }

    /// Deserialize a fully materialized value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// The defaults with `value` layered on, still as a raw value.
    pub(crate) fn layer_user_value(value: Value) -> Result<Value> {
        let Value::Object(mut user) = value else {
            return Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                hint: Some("The configuration must be a table".to_string()),
            });
        };

        let user_plugins = user.remove("plugins");
        let user_bundles = user.remove("bundles");

        let mut base = Self::default().to_value()?;
        merge_values(&mut base, &Value::Object(user));

        if let Some(Value::Array(plugins)) = user_plugins {
            if let Some(Value::Array(list)) = base.get_mut("plugins") {
                list.extend(plugins);
            }
        } else if let Some(other) = user_plugins {
            return Err(ConfigError::InvalidValue {
                field: "plugins".to_string(),
                hint: Some(format!("Expected an array of plugins, found {other}")),
            });
        }

        if let Some(bundles) = user_bundles {
            base["bundles"] = bundles;
        }

        Ok(base)
    }
}

fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
