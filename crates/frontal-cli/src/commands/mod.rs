//! Command implementations.
//!
//! - [`build`] writes the site to the build directory
//! - [`dev`] serves it with live reload

pub mod build;
pub mod dev;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
