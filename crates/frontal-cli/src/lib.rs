//! Frontal CLI: `frontal build` and `frontal dev`.
//!
//! - [`cli`] - argument definitions
//! - [`commands`] - command implementations
//! - [`dev`] - dev session: live-reload channel, watcher, generations, server
//! - [`error`] - CLI errors and their miette reports
//! - [`logger`] - `tracing` subscriber setup
//! - [`ui`] - terminal status output

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
