#![cfg_attr(docsrs, feature(doc_cfg))]

//! # frontal-bundler
//!
//! Turns declarative bundles into build targets for a static site.
//!
//! Plugins contribute assets to named bundles, the library expander turns
//! component selections into concrete assets, pages are matched to bundles by
//! glob, and a two-phase compile produces the primary bundle targets followed by
//! one target per page carrying the files it must load.
//!
//! ## Quick Start
//!
//! ```no_run
//! use frontal_bundler::{AppContext, Mode, Pipeline, PluginFactory};
//! use frontal_config::ConfigDiscovery;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigDiscovery::new(".").load()?;
//! let ctx = AppContext::new(config, Mode::Production);
//! let pipeline = Pipeline::new(ctx, &PluginFactory::with_builtins());
//!
//! let report = pipeline.build().await;
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! # Ok(()) }
//! ```

pub mod bundles;
pub mod context;
pub mod engine;
pub mod entries;
pub mod inject;
pub mod library;
pub mod modules;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod plugins;
pub mod watch;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

pub use bundles::{ResolvedBundles, resolve_bundles};
pub use context::{AppContext, Mode};
pub use engine::{BuildEngine, Compilation, EmittedAsset, EngineConfig, FsEngine, Manifest};
pub use entries::{AggregationUnit, AssetKind, BuildTarget, PageAssets, TargetKind};
pub use library::{Component, Library, LibraryHandle};
pub use modules::ModuleRegistry;
pub use pages::{PageMatcher, PageRecord};
pub use pipeline::{AssetStat, BuildReport, BuildStats, Pipeline};
pub use plugins::{
    FrontalPlugin, Hook, HookContext, HookRegistry, PAGE_BEFORE_EMIT, PluginFactory,
    PluginRegistry,
};
pub use watch::{WatchOrigin, WatchRegistry, WatchRequest};

/// Error types for frontal-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration that parsed but cannot be acted on.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A plugin could not be constructed.
    #[error("Failed to load plugin `{plugin}`: {message}")]
    PluginLoad { plugin: String, message: String },

    /// A plugin capability or hook failed while running.
    #[error("Plugin `{plugin}` failed: {message}")]
    PluginRuntime { plugin: String, message: String },

    /// The build engine failed to produce a target.
    #[error("Build failed for `{target}`: {message}")]
    BuildEngine { target: String, message: String },

    /// An asset specifier could not be resolved to a file or module.
    #[error("Cannot resolve `{specifier}` (requested by {requested_by})")]
    Resolution {
        specifier: String,
        requested_by: String,
    },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// I/O error with context message.
    #[error("{message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] frontal_config::ConfigError),
}

/// Result type alias for frontal-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn plugin_runtime(plugin: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::PluginRuntime {
            plugin: plugin.into(),
            message: message.to_string(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::IoError {
            message: message.into(),
            source,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::PluginLoad { .. } => "PLUGIN_LOAD_ERROR",
            Error::PluginRuntime { .. } => "PLUGIN_RUNTIME_ERROR",
            Error::BuildEngine { .. } => "BUILD_ENGINE_ERROR",
            Error::Resolution { .. } => "RESOLUTION_ERROR",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::IoError { .. } => "IO_ERROR",
            Error::Config(_) => "CONFIGURATION_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Configuration(msg) => Some(Box::new(format!(
                "Check frontal.toml for this setting.\nError: {}",
                msg
            ))),
            Error::PluginLoad { plugin, .. } => Some(Box::new(format!(
                "Plugin '{}' is not available. Check the name in the 'plugins' list.",
                plugin
            ))),
            Error::Resolution { specifier, .. } => Some(Box::new(format!(
                "Could not find '{}'.\nCheck that the file exists, or that the package is installed in node_modules.",
                specifier
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it stays within the build directory.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::Config(err) => err
                .hint()
                .map(|h| Box::new(h) as Box<dyn std::fmt::Display + '_>),
            _ => None,
        }
    }
}
