//! Resolution of asset specifiers to files or in-memory modules.
//!
//! Order of attempts:
//!
//! 1. Virtual modules registered by plugins (exact specifier)
//! 2. Aliases (`@assets/app.js`, `@library/style/main.scss`)
//! 3. Absolute paths
//! 4. Paths relative to the project root (`./x`, `../x` and bare paths that exist)
//! 5. Module directories (`node_modules`), honouring `package.json` `main`
//!
//! File candidates are tried as given, with a `.js` extension, and as a
//! directory `index.js`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use path_clean::PathClean;

use crate::engine::EngineConfig;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    Virtual(Arc<str>),
}

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    aliases: IndexMap<String, PathBuf>,
    module_dirs: Vec<PathBuf>,
    virtual_modules: IndexMap<String, Arc<str>>,
}

impl Resolver {
    pub fn new(config: &EngineConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aliases: config.aliases.clone(),
            module_dirs: config.module_dirs.clone(),
            virtual_modules: config.virtual_modules.clone(),
        }
    }

    /// Resolve `specifier`; any `?query` is ignored.
    pub async fn resolve(&self, specifier: &str, requested_by: &str) -> Result<Resolved> {
        let bare = specifier.split_once('?').map_or(specifier, |(bare, _)| bare);

        if let Some(source) = self.virtual_modules.get(bare) {
            return Ok(Resolved::Virtual(Arc::clone(source)));
        }

        let not_found = || Error::Resolution {
            specifier: specifier.to_string(),
            requested_by: requested_by.to_string(),
        };

        if let Some(path) = self.expand_alias(bare) {
            return probe(&path).await.map(Resolved::File).ok_or_else(not_found);
        }

        let path = Path::new(bare);
        if path.is_absolute() {
            return probe(path).await.map(Resolved::File).ok_or_else(not_found);
        }

        if bare.starts_with("./") || bare.starts_with("../") {
            return probe(&self.root.join(bare))
                .await
                .map(Resolved::File)
                .ok_or_else(not_found);
        }

        if let Some(found) = probe(&self.root.join(bare)).await {
            return Ok(Resolved::File(found));
        }

        for dir in &self.module_dirs {
            if let Some(found) = probe_package(&dir.join(bare)).await {
                return Ok(Resolved::File(found));
            }
        }

        Err(not_found())
    }

    fn expand_alias(&self, specifier: &str) -> Option<PathBuf> {
        self.aliases.iter().find_map(|(prefix, dir)| {
            if specifier == prefix {
                return Some(dir.clone());
            }
            let rest = specifier.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
            Some(dir.join(rest))
        })
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// `path`, `path.js` or `path/index.js`, whichever exists first.
async fn probe(path: &Path) -> Option<PathBuf> {
    let path = path.to_path_buf().clean();
    if is_file(&path).await {
        return Some(path);
    }

    let mut with_js = path.clone().into_os_string();
    with_js.push(".js");
    let with_js = PathBuf::from(with_js);
    if is_file(&with_js).await {
        return Some(with_js);
    }

    let index = path.join("index.js");
    if is_file(&index).await {
        return Some(index);
    }
    None
}

/// Like [`probe`], but a directory's `package.json` `main` takes precedence
/// over its `index.js`.
async fn probe_package(path: &Path) -> Option<PathBuf> {
    let manifest = path.join("package.json");
    if let Ok(source) = tokio::fs::read_to_string(&manifest).await {
        let main = serde_json::from_str::<serde_json::Value>(&source)
            .ok()
            .and_then(|pkg| pkg.get("main").and_then(|m| m.as_str()).map(str::to_string));
        if let Some(main) = main {
            if let Some(found) = probe(&path.join(main)).await {
                return Some(found);
            }
        }
    }
    probe(path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolver(root: &Path) -> Resolver {
        let mut config = EngineConfig::default();
        config
            .alias("@assets", root.join("assets"))
            .module_dir(root.join("node_modules"))
            .virtual_module("virtual:client", "console.log(1)");
        Resolver::new(&config, root)
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("assets/js")).unwrap();
        fs::create_dir_all(root.join("node_modules/jquery/dist")).unwrap();
        fs::create_dir_all(root.join("node_modules/plain")).unwrap();
        fs::write(root.join("assets/js/app.js"), "").unwrap();
        fs::write(root.join("assets/main.scss"), "").unwrap();
        fs::write(
            root.join("node_modules/jquery/package.json"),
            r#"{ "main": "dist/jquery.js" }"#,
        )
        .unwrap();
        fs::write(root.join("node_modules/jquery/dist/jquery.js"), "").unwrap();
        fs::write(root.join("node_modules/plain/index.js"), "").unwrap();
        dir
    }

    #[tokio::test]
    async fn resolves_each_kind_of_specifier() {
        let dir = fixture();
        let root = dir.path();
        let r = resolver(root);

        assert_eq!(
            r.resolve("@assets/js/app", "test").await.unwrap(),
            Resolved::File(root.join("assets/js/app.js"))
        );
        assert_eq!(
            r.resolve("./assets/main.scss?globals=x", "test").await.unwrap(),
            Resolved::File(root.join("assets/main.scss"))
        );
        assert_eq!(
            r.resolve("jquery", "test").await.unwrap(),
            Resolved::File(root.join("node_modules/jquery/dist/jquery.js"))
        );
        assert_eq!(
            r.resolve("plain", "test").await.unwrap(),
            Resolved::File(root.join("node_modules/plain/index.js"))
        );
        assert!(matches!(
            r.resolve("virtual:client", "test").await.unwrap(),
            Resolved::Virtual(_)
        ));
    }

    #[tokio::test]
    async fn missing_specifier_is_a_resolution_error() {
        let dir = fixture();
        let err = resolver(dir.path())
            .resolve("@assets/missing.js", "bundle `main`")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution { ref specifier, ref requested_by }
                if specifier == "@assets/missing.js" && requested_by == "bundle `main`"
        ));
    }
}
