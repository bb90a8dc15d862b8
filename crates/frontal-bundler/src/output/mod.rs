//! Writing a compilation to the build directory.

pub mod writer;

pub use writer::{copy_public_dir, write_compilation, write_site};
