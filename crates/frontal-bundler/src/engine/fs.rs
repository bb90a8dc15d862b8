//! A build engine that works directly on the file system.
//!
//! Scripts of a bundle are wrapped into a small module runtime and emitted as
//! one file, stylesheets are concatenated into one file, other files are
//! copied under a content-hashed name. Pages get their compiled files
//! injected and run through the `page:beforeEmit` hooks.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;

use crate::context::AppContext;
use crate::engine::{BuildEngine, Compilation, EmittedAsset, EngineConfig, Resolved, Resolver};
use crate::entries::{AggregationUnit, BuildTarget, PageEntry, TargetKind};
use crate::inject::inject_page_assets;
use crate::plugins::{HookContext, PAGE_BEFORE_EMIT, PluginRegistry};
use crate::{Error, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "eot", "otf"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mp3", "ogg", "wav"];

pub struct FsEngine {
    ctx: AppContext,
    resolver: Resolver,
    /// Content hashes of each target's files from its latest compile.
    previous: Mutex<HashMap<String, HashMap<String, blake3::Hash>>>,
}

#[derive(Default)]
struct TargetOutput {
    files: Vec<(String, EmittedAsset)>,
    errors: Vec<Error>,
    warnings: Vec<String>,
}

impl TargetOutput {
    fn emit(&mut self, name: String, content: Vec<u8>, development: bool) {
        self.files.push((
            name,
            EmittedAsset {
                content,
                emitted: true,
                development,
            },
        ));
    }
}

/// First `len` hex digits of the content hash.
fn short_hash(content: &[u8], len: usize) -> String {
    blake3::hash(content).to_hex().as_str()[..len].to_string()
}

impl FsEngine {
    pub fn new(ctx: AppContext, config: &EngineConfig) -> Self {
        let resolver = Resolver::new(config, ctx.config().root());
        Self {
            ctx,
            resolver,
            previous: Mutex::new(HashMap::new()),
        }
    }

    async fn compile_target(&self, target: &BuildTarget, plugins: &PluginRegistry) -> TargetOutput {
        match &target.kind {
            TargetKind::Bundle => self.compile_bundle(target).await,
            TargetKind::Page(page) => self.compile_page(page, plugins).await,
        }
    }

    async fn compile_bundle(&self, target: &BuildTarget) -> TargetOutput {
        let mut out = TargetOutput::default();
        if target.is_empty() {
            out.warnings
                .push(format!("bundle `{}` has no assets", target.name));
            return out;
        }

        if let Some(unit) = &target.scripts {
            self.compile_scripts(&target.name, unit, &mut out).await;
        }
        if !target.styles.is_empty() {
            self.compile_styles(target, &mut out).await;
        }
        for asset in &target.other {
            self.copy_file(&target.name, &asset.path, &mut out).await;
        }
        out
    }

    /// Resolve and read every specifier. Failures are recorded and left out.
    async fn load_all<'a>(
        &self,
        target: &str,
        specifiers: impl Iterator<Item = &'a str>,
        out: &mut TargetOutput,
    ) -> Vec<Option<String>> {
        let requested_by = format!("bundle `{target}`");
        let loads = specifiers.map(|specifier| self.load(specifier, &requested_by));
        join_all(loads)
            .await
            .into_iter()
            .map(|loaded| match loaded {
                Ok(source) => Some(source),
                Err(err) => {
                    tracing::debug!(target = %target, error = %err, "asset skipped");
                    out.errors.push(err);
                    None
                }
            })
            .collect()
    }

    async fn load(&self, specifier: &str, requested_by: &str) -> Result<String> {
        match self.resolver.resolve(specifier, requested_by).await? {
            Resolved::Virtual(source) => Ok(source.to_string()),
            Resolved::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| Error::io(format!("Failed to read {}", path.display()), err)),
        }
    }

    async fn compile_scripts(&self, target: &str, unit: &AggregationUnit, out: &mut TargetOutput) {
        let sources = self
            .load_all(target, unit.modules.iter().map(|m| m.path.as_str()), out)
            .await;

        let mut loaded = AggregationUnit {
            name: unit.name.clone(),
            modules: Vec::new(),
        };
        let mut definitions = String::new();
        for (module, source) in unit.modules.iter().zip(sources) {
            let Some(source) = source else { continue };
            let id = serde_json::Value::String(module.path.clone()).to_string();
            definitions.push_str(&format!(
                "  {id}: function (module, exports, require) {{\n{source}\n  }},\n"
            ));
            loaded.modules.push(module.clone());
        }

        let bundle = format!(
            "(function () {{\n\
             var __frontal_modules = {{\n{definitions}}};\n\
             var __frontal_cache = {{}};\n\
             function require(id) {{\n\
             \x20 if (__frontal_cache[id]) return __frontal_cache[id].exports;\n\
             \x20 var factory = __frontal_modules[id];\n\
             \x20 if (!factory) throw new Error('Cannot find module ' + id);\n\
             \x20 var module = (__frontal_cache[id] = {{ exports: {{}} }});\n\
             \x20 factory.call(module.exports, module, module.exports, require);\n\
             \x20 return module.exports;\n\
             }}\n\
             {}}})();\n",
            loaded.render()
        );

        let name = format!(
            "{}/{target}.{}.js",
            self.ctx.config().build.js_dir(),
            short_hash(bundle.as_bytes(), 8)
        );
        if self.ctx.in_dev_mode() {
            let map = serde_json::json!({
                "version": 3,
                "file": name.rsplit('/').next().unwrap_or(&name),
                "sources": loaded.modules.iter().map(|m| m.path.as_str()).collect::<Vec<_>>(),
                "names": [],
                "mappings": "",
            });
            out.emit(format!("{name}.map"), map.to_string().into_bytes(), true);
        }
        out.emit(name, bundle.into_bytes(), false);
    }

    async fn compile_styles(&self, target: &BuildTarget, out: &mut TargetOutput) {
        let sources = self
            .load_all(&target.name, target.styles.iter().map(|s| s.path.as_str()), out)
            .await;

        let mut css = String::new();
        for (style, source) in target.styles.iter().zip(sources) {
            let Some(source) = source else { continue };
            css.push_str(&format!("/* {} */\n", style.bare_path()));
            for global in &style.globals {
                css.push_str(&format!("@import {};\n", serde_json::Value::String(global.clone())));
            }
            css.push_str(&source);
            if !css.ends_with('\n') {
                css.push('\n');
            }
        }
        if css.is_empty() {
            return;
        }

        let name = format!(
            "{}/{}.{}.css",
            self.ctx.config().build.style_dir(),
            target.name,
            short_hash(css.as_bytes(), 8)
        );
        out.emit(name, css.into_bytes(), false);
    }

    async fn copy_file(&self, target: &str, specifier: &str, out: &mut TargetOutput) {
        let requested_by = format!("bundle `{target}`");
        let path = match self.resolver.resolve(specifier, &requested_by).await {
            Ok(Resolved::File(path)) => path,
            Ok(Resolved::Virtual(source)) => {
                let name = format!("{}/{}", self.ctx.config().build.assets.into, specifier.replace(':', "_"));
                out.emit(name, source.as_bytes().to_vec(), false);
                return;
            }
            Err(err) => {
                out.errors.push(err);
                return;
            }
        };

        match tokio::fs::read(&path).await {
            Ok(content) => {
                let name = self.output_name_for(&path, &content);
                out.emit(name, content, false);
            }
            Err(err) => out
                .errors
                .push(Error::io(format!("Failed to read {}", path.display()), err)),
        }
    }

    /// `<assets.into>/<kind dir>/<stem>.<hash>.<ext>`
    fn output_name_for(&self, path: &Path, content: &[u8]) -> String {
        let build = &self.ctx.config().build;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let dir = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            format!("{}/{}", build.assets.into, build.images.into)
        } else if FONT_EXTENSIONS.contains(&ext.as_str()) {
            format!("{}/{}", build.assets.into, build.fonts.into)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            format!("{}/{}", build.assets.into, build.videos.into)
        } else {
            build.assets.into.clone()
        };

        let hash = short_hash(content, 8);
        if ext.is_empty() {
            format!("{dir}/{stem}.{hash}")
        } else {
            format!("{dir}/{stem}.{hash}.{ext}")
        }
    }

    async fn compile_page(&self, page: &PageEntry, plugins: &PluginRegistry) -> TargetOutput {
        let mut out = TargetOutput::default();
        let html = match tokio::fs::read_to_string(&page.source).await {
            Ok(html) => html,
            Err(err) => {
                out.errors.push(Error::BuildEngine {
                    target: page.name.clone(),
                    message: format!("cannot read {}: {err}", page.source.display()),
                });
                return out;
            }
        };

        if page.assets.is_empty() {
            out.warnings
                .push(format!("page `{}` loads no compiled assets", page.name));
        }

        let html = inject_page_assets(&html, &page.assets, &self.ctx.config().server.base);
        let hook_ctx = HookContext {
            app: &self.ctx,
            page_name: &page.name,
            page_path: &page.source,
        };
        let html = match plugins.apply_hooks(PAGE_BEFORE_EMIT, &hook_ctx, html).await {
            Ok(html) => html,
            Err(err) => {
                tracing::error!(page = %page.name, error = %err, "page hook failed");
                out.errors.push(err);
                return out;
            }
        };

        // The page's own entry script; only useful to the engine.
        let bootstrap = format!("/* {} */\n", page.request);
        let bootstrap_name = format!(
            "{}/{}.{}.js",
            self.ctx.config().build.js_dir(),
            page.name,
            short_hash(bootstrap.as_bytes(), 8)
        );
        out.emit(bootstrap_name, bootstrap.into_bytes(), false);
        out.emit(page.name.clone(), html.into_bytes(), false);
        out
    }

    /// Flag files whose content differs from the target's last compile and
    /// remember only this compile's files.
    fn mark_emitted(&self, target: &str, files: &mut [(String, EmittedAsset)]) {
        let mut previous = self.previous.lock();
        let last = previous.remove(target).unwrap_or_default();
        let mut current = HashMap::with_capacity(files.len());
        for (name, asset) in files.iter_mut() {
            let hash = blake3::hash(&asset.content);
            asset.emitted = last.get(name) != Some(&hash);
            current.insert(name.clone(), hash);
        }
        previous.insert(target.to_string(), current);
    }

    /// Number of file hashes kept for change detection.
    pub fn tracked_files(&self) -> usize {
        self.previous.lock().values().map(HashMap::len).sum()
    }
}

#[async_trait]
impl BuildEngine for FsEngine {
    async fn compile(&self, targets: &[BuildTarget], plugins: &PluginRegistry) -> Result<Compilation> {
        let outputs = join_all(targets.iter().map(|t| self.compile_target(t, plugins))).await;

        let mut compilation = Compilation::default();
        for (target, mut output) in targets.iter().zip(outputs) {
            self.mark_emitted(&target.name, &mut output.files);
            let files = output.files.iter().map(|(name, _)| name.clone()).collect();
            compilation.manifest.insert(target.name.clone(), files);
            compilation.assets.extend(output.files);
            compilation.errors.extend(output.errors);
            compilation.warnings.extend(output.warnings);
        }

        compilation.rehash();
        tracing::debug!(
            targets = targets.len(),
            assets = compilation.assets.len(),
            errors = compilation.errors.len(),
            "compiled"
        );
        Ok(compilation)
    }
}
