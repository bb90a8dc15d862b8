//! Libraries and components.
//!
//! A library registers global stylesheets, scripts and a catalog of components
//! on a [`LibraryHandle`]. Bundles activate components by name; each
//! activation runs the component's setup on a fresh handle and its assets are
//! appended to that bundle only.

mod descriptor;
mod expand;
mod handle;

pub use descriptor::{
    ComponentDescriptor, ComponentsSection, LibraryDescriptor, OptionalAssets, ScriptSection,
    StyleSection,
};
pub use expand::{GlobalStyles, expand_library};
pub use handle::{Components, LibraryHandle, PendingSource, Scripts, Styles};

use serde_json::{Map, Value};

use crate::Result;

/// Entry point of a library.
pub trait Library: Send + Sync {
    fn setup(&self, options: &Map<String, Value>, lib: &mut LibraryHandle) -> Result<()>;
}

pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self, lib: &mut LibraryHandle, options: &Map<String, Value>) -> Result<()>;
}
