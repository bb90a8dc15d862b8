//! Turn computed bundles into build targets.
//!
//! Assets are normalized, stably sorted by `order`, deduplicated and grouped:
//! every script-like asset of a bundle goes into a single [`AggregationUnit`]
//! while stylesheets and other files stay independent inputs.

mod pages;

pub use pages::{
    PAGE_ASSETS_QUERY, PageAssets, PageEntry, cleanup_page_scripts, collect_page_assets,
    compile_page_targets, page_request, parse_page_request,
};

use std::collections::HashSet;
use std::path::Path;

use frontal_config::{AssetReference, BundleMap};

/// Extensions handled as stylesheets.
pub const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl"];

/// Extensions of files that are neither scripts nor stylesheets.
pub const OTHER_EXTENSIONS: &[&str] = &[
    "html", "htm", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "woff", "woff2",
    "ttf", "eot", "otf", "mp4", "webm", "mov", "mp3", "ogg", "wav", "pdf", "txt", "json",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Style,
    Other,
}

impl AssetKind {
    pub fn of(asset: &AssetReference) -> Self {
        match asset.extension() {
            Some(ext) if STYLE_EXTENSIONS.contains(&ext.as_str()) => AssetKind::Style,
            Some(ext) if OTHER_EXTENSIONS.contains(&ext.as_str()) => AssetKind::Other,
            _ => AssetKind::Script,
        }
    }

    /// Kind of an emitted file name.
    pub fn of_output(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("js") => AssetKind::Script,
            Some("css") => AssetKind::Style,
            _ => AssetKind::Other,
        }
    }
}

/// Normalize paths, stably sort by `order` and drop repeated paths.
///
/// The first occurrence of a path (after sorting) is kept.
pub fn normalize_assets(assets: &[AssetReference]) -> Vec<AssetReference> {
    let mut normalized: Vec<AssetReference> = assets
        .iter()
        .cloned()
        .map(|mut asset| {
            asset.path = asset.path.replace('\\', "/");
            asset
        })
        .collect();

    // sort_by_key is stable: equal orders keep declaration order
    normalized.sort_by_key(|asset| asset.order);

    let mut seen = HashSet::new();
    normalized.retain(|asset| seen.insert(asset.path.clone()));
    normalized
}

/// The synthetic module that loads every script of a bundle in order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationUnit {
    pub name: String,
    pub modules: Vec<AssetReference>,
}

impl AggregationUnit {
    /// Source of the unit: one `require` per module in order, with global
    /// aliases assigned right after the module that provides them.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, module) in self.modules.iter().enumerate() {
            let specifier = js_string(&module.path);
            if module.provide_as.is_empty() {
                out.push_str(&format!("require({specifier});\n"));
                continue;
            }

            let binding = format!("__frontal_{index}");
            out.push_str(&format!("var {binding} = require({specifier});\n"));
            for alias in &module.provide_as {
                out.push_str(&format!("globalThis[{}] = {binding};\n", js_string(alias)));
            }
        }
        out
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind {
    Bundle,
    Page(PageEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    pub name: String,
    pub kind: TargetKind,
    pub scripts: Option<AggregationUnit>,
    pub styles: Vec<AssetReference>,
    pub other: Vec<AssetReference>,
}

impl BuildTarget {
    /// Group the assets of one bundle into a target.
    pub fn from_bundle(name: &str, assets: &[AssetReference]) -> Self {
        let mut scripts = Vec::new();
        let mut styles = Vec::new();
        let mut other = Vec::new();

        for asset in normalize_assets(assets) {
            match AssetKind::of(&asset) {
                AssetKind::Script => scripts.push(asset),
                AssetKind::Style => styles.push(asset),
                AssetKind::Other => other.push(asset),
            }
        }

        BuildTarget {
            name: name.to_string(),
            kind: TargetKind::Bundle,
            scripts: (!scripts.is_empty()).then(|| AggregationUnit {
                name: name.to_string(),
                modules: scripts,
            }),
            styles,
            other,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_none() && self.styles.is_empty() && self.other.is_empty()
    }

    pub fn page(&self) -> Option<&PageEntry> {
        match &self.kind {
            TargetKind::Page(page) => Some(page),
            TargetKind::Bundle => None,
        }
    }
}

/// Phase one: one target per computed bundle, in declaration order.
pub fn compile_bundle_targets(bundles: &BundleMap) -> Vec<BuildTarget> {
    bundles
        .iter()
        .map(|(name, desc)| BuildTarget::from_bundle(name, &desc.assets))
        .collect()
}
