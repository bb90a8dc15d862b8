use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available frontal subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the site for production
    ///
    /// Compiles every bundle, injects the compiled files into the pages and
    /// writes the result, together with the public directory, to `build.path`.
    Build(BuildArgs),

    /// Start the development server with live reload
    ///
    /// Serves the site from memory, watches pages, assets, the library and the
    /// configuration, and notifies connected browsers after every rebuild.
    Dev(DevArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the dev command
#[derive(Args, Debug, Default)]
pub struct DevArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Port to listen on, overriding `server.port`
    ///
    /// A port already in use falls back to one chosen by the system.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Host to bind, overriding `server.host`
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,
}
