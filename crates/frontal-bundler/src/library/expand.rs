//! Expansion of the configured library into bundle assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use frontal_config::{AssetReference, BundleMap};
use globset::GlobBuilder;
use indexmap::IndexMap;
use walkdir::WalkDir;

use crate::context::AppContext;
use crate::library::{ComponentDescriptor, Library, LibraryDescriptor, LibraryHandle, PendingSource};
use crate::watch::WatchOrigin;
use crate::{Error, Result};

/// Global style files grouped by extension, in registration order, each once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStyles(IndexMap<String, Vec<String>>);

impl GlobalStyles {
    pub fn collect<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for file in files {
            let Some(ext) = AssetReference::new(file.as_str()).extension() else {
                continue;
            };
            let group = grouped.entry(ext).or_default();
            if !group.contains(file) {
                group.push(file.clone());
            }
        }
        Self(grouped)
    }

    pub fn for_extension(&self, ext: &str) -> &[String] {
        self.0.get(ext).map(Vec::as_slice).unwrap_or_default()
    }

    /// Add the globals matching the stylesheet's extension to its `globals`.
    fn annotate(&self, asset: &mut AssetReference) {
        let Some(ext) = asset.extension() else {
            return;
        };
        for global in self.for_extension(&ext) {
            if !asset.globals.contains(global) {
                asset.globals.push(global.clone());
            }
        }
    }
}

/// Expand the configured library against `bundles`.
///
/// Library-level assets go to `library.bundle` (or the first bundle when that
/// one does not exist) and every enabled component selection adds the
/// component's assets to the selecting bundle. Returns `None` when the
/// library is disabled or its descriptor does not exist.
pub async fn expand_library(
    ctx: &AppContext,
    library: Option<Arc<dyn Library>>,
    bundles: &BundleMap,
) -> Result<Option<BundleMap>> {
    let config = ctx.config();
    let settings = &config.library;
    if !settings.enabled {
        return Ok(None);
    }

    let location = config.resolve(&settings.location);
    let dir = location
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.root().to_path_buf());

    let library: Arc<dyn Library> = match library {
        Some(library) => library,
        None => match load_descriptor(ctx, &location).await? {
            Some(descriptor) => Arc::new(descriptor),
            None => return Ok(None),
        },
    };

    let mut root = LibraryHandle::new(&dir);
    library.setup(&settings.options, &mut root)?;
    load_components(ctx, &mut root).await?;

    let globals = GlobalStyles::collect(root.style.globals());
    let target = if bundles.contains_key(&settings.bundle) {
        settings.bundle.clone()
    } else {
        bundles
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| settings.bundle.clone())
    };

    let mut expanded = BundleMap::new();
    append_contribution(&mut expanded, &target, &root, &globals);

    for (bundle, desc) in bundles {
        let Some(selection) = &desc.components else {
            continue;
        };
        for (name, options) in selection.enabled() {
            let Some(component) = root.components.get(&name) else {
                tracing::warn!(bundle = %bundle, component = %name, "unknown component, skipping");
                continue;
            };
            let mut handle = LibraryHandle::new(&dir);
            component.setup(&mut handle, &options)?;
            append_contribution(&mut expanded, bundle, &handle, &globals);
        }
    }

    Ok(Some(expanded))
}

async fn load_descriptor(ctx: &AppContext, location: &Path) -> Result<Option<LibraryDescriptor>> {
    if !tokio::fs::try_exists(location).await.unwrap_or(false) {
        tracing::debug!(path = %location.display(), "no library descriptor");
        return Ok(None);
    }
    if ctx.in_dev_mode() {
        ctx.watches().watch(location, WatchOrigin::Library);
    }

    let source = ctx.modules().load(location).await.map_err(|err| {
        Error::io(format!("Failed to read library {}", location.display()), err)
    })?;
    LibraryDescriptor::parse(&source).map(Some).map_err(|err| {
        Error::Configuration(format!("invalid library {}: {err}", location.display()))
    })
}

async fn load_components(ctx: &AppContext, lib: &mut LibraryHandle) -> Result<()> {
    for source in lib.components.take_pending() {
        let files = match source {
            PendingSource::File(path) => {
                if ctx.in_dev_mode() {
                    ctx.watches().watch(&path, WatchOrigin::Component);
                }
                vec![path]
            }
            PendingSource::Glob(pattern) => {
                let (base, files) = glob_files(&pattern)?;
                if ctx.in_dev_mode() {
                    ctx.watches().watch(&base, WatchOrigin::Component);
                }
                files
            }
        };

        for file in files {
            let source = ctx.modules().load(&file).await.map_err(|err| {
                Error::io(format!("Failed to read component {}", file.display()), err)
            })?;
            let descriptor = ComponentDescriptor::parse(&source).map_err(|err| {
                Error::Configuration(format!("invalid component {}: {err}", file.display()))
            })?;
            lib.components.add_component(Arc::new(descriptor));
        }
    }
    Ok(())
}

/// Files matching an absolute glob, sorted, plus the directory walked.
fn glob_files(pattern: &str) -> Result<(PathBuf, Vec<PathBuf>)> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| Error::Configuration(format!("invalid component pattern `{pattern}`: {err}")))?
        .compile_matcher();

    let base = literal_base(pattern);
    let mut files: Vec<PathBuf> = WalkDir::new(&base)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| matcher.is_match(path.to_string_lossy().replace('\\', "/")))
        .collect();
    files.sort();
    Ok((base, files))
}

/// Leading path components of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    if pattern.starts_with('/') {
        base.push("/");
    }
    for part in pattern.split('/').filter(|p| !p.is_empty()) {
        if part.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(part);
    }
    base
}

/// Append a handle's stylesheets, then its scripts, to `bundle`.
fn append_contribution(
    out: &mut BundleMap,
    bundle: &str,
    handle: &LibraryHandle,
    globals: &GlobalStyles,
) {
    let own = GlobalStyles::collect(handle.style.globals());
    let entry = out.entry(bundle.to_string()).or_default();

    for style in handle.style.imports() {
        let mut style = style.clone();
        globals.annotate(&mut style);
        own.annotate(&mut style);
        entry.assets.push(style);
    }
    entry.assets.extend(handle.script.imports().iter().cloned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Mode;
    use frontal_config::{BundleDescriptor, ComponentSelection, ConfigSnapshot};
    use serde_json::{Map, Value, json};
    use std::fs;

    struct Programmatic;

    impl Library for Programmatic {
        fn setup(&self, _options: &Map<String, Value>, lib: &mut LibraryHandle) -> Result<()> {
            lib.style
                .global(["vars.scss", "mixins.scss"])
                .global(["vars.scss", "theme.less"])
                .import(["main.scss", "print.css"]);
            lib.script.import(["framework.js"]);
            lib.components.add("alert", |lib, options| {
                lib.style.import(["alert.scss"]);
                if options.get("dismiss").is_some() {
                    lib.script.import(["alert-dismiss.js"]);
                }
                Ok(())
            });
            Ok(())
        }
    }

    fn paths(map: &BundleMap, bundle: &str) -> Vec<String> {
        map[bundle].assets.iter().map(|a| a.path.clone()).collect()
    }

    fn bundles(entries: Vec<(&str, Option<ComponentSelection>)>) -> BundleMap {
        entries
            .into_iter()
            .map(|(name, components)| {
                (
                    name.to_string(),
                    BundleDescriptor {
                        components,
                        ..BundleDescriptor::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn globals_group_by_extension_once() {
        let files: Vec<String> = ["a.scss", "b.less", "a.scss", "c.scss"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let globals = GlobalStyles::collect(&files);
        assert_eq!(globals.for_extension("scss"), ["a.scss", "c.scss"]);
        assert_eq!(globals.for_extension("less"), ["b.less"]);
        assert!(globals.for_extension("css").is_empty());
    }

    #[test]
    fn literal_base_stops_at_first_wildcard() {
        assert_eq!(
            literal_base("/lib/components/**/*.toml"),
            PathBuf::from("/lib/components")
        );
        assert_eq!(literal_base("/lib/c/button.toml"), PathBuf::from("/lib/c/button.toml"));
    }

    #[tokio::test]
    async fn library_assets_target_first_bundle_when_configured_one_is_missing() {
        let ctx = AppContext::new(ConfigSnapshot::defaults("/site"), Mode::Production);
        let map = bundles(vec![("vendor", None), ("blog", None)]);

        let expanded = expand_library(&ctx, Some(Arc::new(Programmatic)), &map)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            paths(&expanded, "vendor"),
            vec!["main.scss", "print.css", "framework.js"]
        );
        let main_scss = &expanded["vendor"].assets[0];
        assert_eq!(main_scss.globals, vec!["vars.scss", "mixins.scss"]);
        assert!(expanded["vendor"].assets[1].globals.is_empty());
    }

    #[tokio::test]
    async fn component_activations_do_not_leak_between_bundles() {
        let ctx = AppContext::new(ConfigSnapshot::defaults("/site"), Mode::Production);
        let map = bundles(vec![
            ("main", None),
            (
                "plain",
                Some(ComponentSelection::List(vec!["alert".into(), "missing".into()])),
            ),
            (
                "dismissable",
                Some(ComponentSelection::Map(
                    [("alert".to_string(), json!({ "dismiss": true }))]
                        .into_iter()
                        .collect(),
                )),
            ),
            (
                "disabled",
                Some(ComponentSelection::Map(
                    [("alert".to_string(), json!(false))].into_iter().collect(),
                )),
            ),
        ]);

        let expanded = expand_library(&ctx, Some(Arc::new(Programmatic)), &map)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paths(&expanded, "plain"), vec!["alert.scss"]);
        assert_eq!(
            paths(&expanded, "dismissable"),
            vec!["alert.scss", "alert-dismiss.js"]
        );
        assert!(!expanded.contains_key("disabled"));
        assert_eq!(
            expanded["plain"].assets[0].globals,
            vec!["vars.scss", "mixins.scss"]
        );
    }

    #[tokio::test]
    async fn missing_descriptor_or_disabled_library_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(ConfigSnapshot::defaults(dir.path()), Mode::Production);
        let map = bundles(vec![("main", None)]);
        assert!(expand_library(&ctx, None, &map).await.unwrap().is_none());

        let mut config = frontal_config::FrontalConfig::default();
        config.library.enabled = false;
        let ctx = AppContext::new(
            ConfigSnapshot::new(dir.path(), None, config),
            Mode::Production,
        );
        assert!(
            expand_library(&ctx, Some(Arc::new(Programmatic)), &map)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn descriptor_files_register_components_and_watches() {
        let dir = tempfile::tempdir().unwrap();
        let lib_dir = dir.path().join("library");
        fs::create_dir_all(lib_dir.join("components/forms")).unwrap();
        fs::write(
            lib_dir.join("library.toml"),
            r#"
[style]
globals = ["@library/vars.scss"]

[components]
register = ["components/button.toml"]
auto_register = ["components/**/*.component.toml"]
"#,
        )
        .unwrap();
        fs::write(
            lib_dir.join("components/button.toml"),
            "name = \"button\"\nstyles = [\"@library/button.scss\"]\n",
        )
        .unwrap();
        fs::write(
            lib_dir.join("components/forms/input.component.toml"),
            "name = \"input\"\nscripts = [\"@library/input.js\"]\n",
        )
        .unwrap();

        let ctx = AppContext::new(ConfigSnapshot::defaults(dir.path()), Mode::Development);
        let map = bundles(vec![(
            "main",
            Some(ComponentSelection::List(vec!["button".into(), "input".into()])),
        )]);

        let expanded = expand_library(&ctx, None, &map).await.unwrap().unwrap();
        assert_eq!(
            paths(&expanded, "main"),
            vec!["@library/button.scss", "@library/input.js"]
        );
        assert_eq!(expanded["main"].assets[0].globals, vec!["@library/vars.scss"]);

        let watched = ctx.watches().requests();
        assert!(watched.iter().any(|w| w.origin == WatchOrigin::Library));
        assert!(
            watched
                .iter()
                .any(|w| w.origin == WatchOrigin::Component
                    && w.path == lib_dir.join("components"))
        );
    }
}
