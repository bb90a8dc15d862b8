//! CLI error type.
//!
//! Library errors convert in via `#[from]`; the binary turns the final error
//! into a miette report with [`cli_error_to_miette`].

mod report;

use std::path::PathBuf;

use thiserror::Error;

pub use report::cli_error_to_miette;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be found, read or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] frontal_config::ConfigError),

    /// A bundler failure outside of a build report (e.g. writing output).
    #[error(transparent)]
    Bundler(#[from] frontal_bundler::Error),

    /// The build finished with errors; they were already printed.
    #[error("Build failed with {count} error(s)")]
    BuildFailed { count: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

impl CliError {
    /// What the user can do about it, when there is something to say.
    pub fn hint(&self) -> Option<String> {
        match self {
            CliError::Config(err) => err.hint().map(str::to_string),
            CliError::BuildFailed { .. } => {
                Some("Fix the errors listed above and run the build again".to_string())
            }
            CliError::DirectoryNotFound(_) => {
                Some("Pass an existing project directory with --cwd".to_string())
            }
            CliError::Server(msg) if msg.contains("bind") => {
                Some("Choose another port with --port or server.port".to_string())
            }
            _ => None,
        }
    }
}
