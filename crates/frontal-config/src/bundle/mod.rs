//! Bundle data model shared by configuration and the build pipeline.

mod merge;
mod types;

pub use merge::merge_bundle_maps;
pub use types::*;
