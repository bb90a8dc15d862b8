//! The seam between target compilation and the engine that produces files.
//!
//! An engine receives [`BuildTarget`]s and returns a [`Compilation`]: the
//! emitted files, a manifest of which files belong to which target, and the
//! errors and warnings raised while producing them.

mod fs;
mod resolve;

pub use fs::FsEngine;
pub use resolve::{Resolved, Resolver};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::context::AppContext;
use crate::entries::BuildTarget;
use crate::plugins::PluginRegistry;
use crate::{Error, Result};

#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Compile `targets`. Per-target failures are recorded in the returned
    /// compilation; an `Err` means the engine could not run at all.
    async fn compile(&self, targets: &[BuildTarget], plugins: &PluginRegistry)
    -> Result<Compilation>;
}

/// Settings plugins may adjust before the first build.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Specifier prefix to directory, e.g. `@assets` -> `<root>/assets`.
    pub aliases: IndexMap<String, PathBuf>,
    /// Directories searched for bare module specifiers, in order.
    pub module_dirs: Vec<PathBuf>,
    /// Modules served from memory instead of disk.
    pub virtual_modules: IndexMap<String, Arc<str>>,
}

impl EngineConfig {
    /// Defaults for a project: the `@assets` alias and `<root>/node_modules`.
    pub fn for_context(ctx: &AppContext) -> Self {
        let config = ctx.config();
        let mut engine = Self::default();
        engine.alias("@assets", config.assets_dir());
        engine.module_dir(config.resolve("node_modules"));
        engine
    }

    pub fn alias(&mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> &mut Self {
        self.aliases.insert(prefix.into(), dir.into());
        self
    }

    pub fn module_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        let dir = dir.into();
        if !self.module_dirs.contains(&dir) {
            self.module_dirs.push(dir);
        }
        self
    }

    pub fn virtual_module(&mut self, specifier: impl Into<String>, source: impl Into<Arc<str>>) -> &mut Self {
        self.virtual_modules.insert(specifier.into(), source.into());
        self
    }
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub content: Vec<u8>,
    /// Content differs from what the engine produced last time under this name.
    pub emitted: bool,
    /// Only useful while developing (source maps and the like).
    pub development: bool,
}

/// Target name to the files it produced, in emission order.
pub type Manifest = IndexMap<String, Vec<String>>;

#[derive(Debug, Default)]
pub struct Compilation {
    pub hash: String,
    pub manifest: Manifest,
    pub assets: IndexMap<String, EmittedAsset>,
    pub errors: Vec<Error>,
    pub warnings: Vec<String>,
}

impl Compilation {
    /// Fold a later compilation into this one. Later assets replace earlier
    /// ones with the same name.
    pub fn absorb(&mut self, other: Compilation) {
        self.manifest.extend(other.manifest);
        self.assets.extend(other.assets);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.rehash();
    }

    pub fn delete_asset(&mut self, name: &str) -> Option<EmittedAsset> {
        let removed = self.assets.shift_remove(name);
        if removed.is_some() {
            for files in self.manifest.values_mut() {
                files.retain(|f| f != name);
            }
        }
        removed
    }

    /// Recompute the compilation hash from asset names and contents.
    pub fn rehash(&mut self) {
        let mut hasher = blake3::Hasher::new();
        let mut names: Vec<&String> = self.assets.keys().collect();
        names.sort();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(blake3::hash(&self.assets[name].content).as_bytes());
        }
        self.hash = hasher.finalize().to_hex().as_str()[..20].to_string();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(content: &str) -> EmittedAsset {
        EmittedAsset {
            content: content.as_bytes().to_vec(),
            emitted: true,
            development: false,
        }
    }

    #[test]
    fn delete_asset_updates_manifest() {
        let mut compilation = Compilation::default();
        compilation.assets.insert("a.js".into(), asset("a"));
        compilation.assets.insert("b.js".into(), asset("b"));
        compilation
            .manifest
            .insert("main".into(), vec!["a.js".into(), "b.js".into()]);

        assert!(compilation.delete_asset("a.js").is_some());
        assert!(compilation.delete_asset("a.js").is_none());
        assert_eq!(compilation.manifest["main"], vec!["b.js".to_string()]);
    }

    #[test]
    fn hash_depends_on_content_not_insertion_order() {
        let mut first = Compilation::default();
        first.assets.insert("a.js".into(), asset("a"));
        first.assets.insert("b.js".into(), asset("b"));
        first.rehash();

        let mut second = Compilation::default();
        second.assets.insert("b.js".into(), asset("b"));
        second.assets.insert("a.js".into(), asset("a"));
        second.rehash();
        assert_eq!(first.hash, second.hash);
        assert_eq!(first.hash.len(), 20);

        second.assets.insert("a.js".into(), asset("changed"));
        second.rehash();
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn absorb_merges_errors_and_assets() {
        let mut first = Compilation::default();
        first.assets.insert("a.js".into(), asset("a"));
        let mut second = Compilation::default();
        second.assets.insert("index.html".into(), asset("<html>"));
        second.errors.push(Error::Configuration("x".into()));

        first.absorb(second);
        assert_eq!(first.assets.len(), 2);
        assert!(first.has_errors());
        assert!(!first.hash.is_empty());
    }
}
