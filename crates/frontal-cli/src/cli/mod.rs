//! Command-line interface definition.
//!
//! - `frontal build` - build the site into `build.path`
//! - `frontal dev` - serve the site with live reload

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, Command, DevArgs};

/// Frontal - build static sites from pages and declarative bundles
#[derive(Parser, Debug)]
#[command(
    name = "frontal",
    version,
    about = "Build static sites from pages and declarative bundles",
    long_about = "Frontal compiles the bundles declared in frontal.toml, matches them to\n\
                  pages by glob and injects the compiled files into every page. The dev\n\
                  command serves the result and reloads connected browsers on change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
