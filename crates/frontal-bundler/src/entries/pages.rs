//! Phase two: per-page targets derived from the phase-one manifest.

use std::path::PathBuf;

use frontal_config::BuildConfig;
use serde::{Deserialize, Serialize};

use crate::engine::Compilation;
use crate::entries::{AssetKind, BuildTarget, TargetKind};
use crate::pages::PageRecord;

/// Query parameter carrying the serialized [`PageAssets`] on a page request.
pub const PAGE_ASSETS_QUERY: &str = "frontal_page_assets";

/// Compiled files a page has to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAssets {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
}

impl PageAssets {
    fn push(&mut self, file: &str) {
        let list = match AssetKind::of_output(file) {
            AssetKind::Script => &mut self.scripts,
            AssetKind::Style => &mut self.styles,
            AssetKind::Other => return,
        };
        if !list.iter().any(|f| f == file) {
            list.push(file.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry {
    pub source: PathBuf,
    pub name: String,
    /// `<source>?frontal_page_assets=<json>`
    pub request: String,
    pub assets: PageAssets,
}

/// Union of the manifest entries of every bundle the page matched, in
/// bundle-declaration order. Development-only files are left out.
pub fn collect_page_assets(page: &PageRecord, compilation: &Compilation) -> PageAssets {
    let mut assets = PageAssets::default();
    for bundle in &page.bundles {
        let Some(files) = compilation.manifest.get(bundle) else {
            continue;
        };
        for file in files {
            let development = compilation
                .assets
                .get(file)
                .is_some_and(|asset| asset.development);
            if !development {
                assets.push(file);
            }
        }
    }
    assets
}

pub fn page_request(source: &std::path::Path, assets: &PageAssets) -> String {
    let json = serde_json::to_string(assets).unwrap_or_else(|_| "{}".to_string());
    let path = source.to_string_lossy().replace('\\', "/");
    format!("{path}?{PAGE_ASSETS_QUERY}={json}")
}

/// Split a page request back into its path and asset descriptor.
pub fn parse_page_request(request: &str) -> Option<(String, PageAssets)> {
    let marker = format!("?{PAGE_ASSETS_QUERY}=");
    let (path, json) = request.split_once(&marker)?;
    let assets = serde_json::from_str(json).ok()?;
    Some((path.to_string(), assets))
}

/// One target per page, carrying the files its matched bundles produced.
pub fn compile_page_targets(pages: &[PageRecord], compilation: &Compilation) -> Vec<BuildTarget> {
    pages
        .iter()
        .map(|page| {
            let assets = collect_page_assets(page, compilation);
            BuildTarget {
                name: page.name.clone(),
                kind: TargetKind::Page(PageEntry {
                    source: page.path.clone(),
                    name: page.name.clone(),
                    request: page_request(&page.path, &assets),
                    assets,
                }),
                scripts: None,
                styles: Vec::new(),
                other: Vec::new(),
            }
        })
        .collect()
}

/// Remove the bootstrap scripts page compilation leaves behind:
/// `<assets.into>/<js.into>/<page name>.*.js`. Returns the deleted names.
pub fn cleanup_page_scripts(
    compilation: &mut Compilation,
    pages: &[PageRecord],
    build: &BuildConfig,
) -> Vec<String> {
    let js_dir = build.js_dir();
    let doomed: Vec<String> = compilation
        .assets
        .keys()
        .filter(|name| pages.iter().any(|page| is_page_script(name, &js_dir, &page.name)))
        .cloned()
        .collect();

    for name in &doomed {
        compilation.delete_asset(name);
        tracing::trace!(asset = %name, "removed page script");
    }
    doomed
}

fn is_page_script(asset: &str, js_dir: &str, page: &str) -> bool {
    let Some(rest) = asset
        .strip_prefix(js_dir)
        .and_then(|r| r.strip_prefix('/'))
        .and_then(|r| r.strip_prefix(page))
        .and_then(|r| r.strip_prefix('.'))
    else {
        return false;
    };
    // `*` never crosses a separator
    match rest.strip_suffix(".js") {
        Some(middle) => !middle.contains('/'),
        None => false,
    }
}
