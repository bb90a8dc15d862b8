//! Page discovery and page-to-bundle matching.

use std::path::{Path, PathBuf};

use frontal_config::{BundleMap, ConfigSnapshot};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Pattern used for bundles that list no pages.
pub const MATCH_ALL: &str = "**/*";

/// A page file and the bundles that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub path: PathBuf,
    /// Path relative to the pages root with `/` separators, e.g. `blog/post.html`.
    pub name: String,
    /// Matched bundle names in bundle-declaration order.
    pub bundles: Vec<String>,
}

/// Find every page under the configured pages directory, sorted by name.
///
/// The partials directory is skipped, and only files with one of the
/// configured extensions count. A missing pages directory yields no pages.
pub fn discover_pages(config: &ConfigSnapshot) -> Vec<PageRecord> {
    let root = config.pages_dir();
    let partials = config.partials_dir();
    let extensions = &config.pages.extensions;

    let mut pages: Vec<PageRecord> = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.path() != partials)
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_extension(entry.path(), extensions))
        .filter_map(|entry| {
            let name = page_name(&root, entry.path())?;
            Some(PageRecord {
                path: entry.into_path(),
                name,
                bundles: Vec::new(),
            })
        })
        .collect();

    pages.sort_by(|a, b| a.name.cmp(&b.name));
    pages
}

/// Whether `path` carries one of the page `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// Logical page name of `path` under `root`.
pub fn page_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Compiled page globs of every bundle.
#[derive(Debug)]
pub struct PageMatcher {
    bundles: Vec<(String, GlobSet)>,
}

impl PageMatcher {
    pub fn new(bundles: &BundleMap) -> Result<Self> {
        let mut compiled = Vec::with_capacity(bundles.len());
        for (name, desc) in bundles {
            let mut builder = GlobSetBuilder::new();
            let patterns: Vec<&str> = if desc.pages.is_empty() {
                vec![MATCH_ALL]
            } else {
                desc.pages.iter().map(String::as_str).collect()
            };
            for pattern in patterns {
                let glob = GlobBuilder::new(pattern)
                    .literal_separator(true)
                    .build()
                    .map_err(|err| {
                        Error::Configuration(format!(
                            "bundle `{name}` has an invalid page pattern `{pattern}`: {err}"
                        ))
                    })?;
                builder.add(glob);
            }
            let set = builder.build().map_err(|err| {
                Error::Configuration(format!("bundle `{name}` page patterns: {err}"))
            })?;
            compiled.push((name.clone(), set));
        }
        Ok(Self { bundles: compiled })
    }

    /// Bundles whose patterns match `page_name`, in declaration order.
    pub fn matches(&self, page_name: &str) -> Vec<String> {
        self.bundles
            .iter()
            .filter(|(_, set)| set.is_match(page_name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Fill in the matched bundles of every page.
    pub fn assign(&self, pages: &mut [PageRecord]) {
        for page in pages {
            page.bundles = self.matches(&page.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontal_config::BundleDescriptor;
    use std::fs;

    fn bundles() -> BundleMap {
        let mut map = BundleMap::new();
        map.insert(
            "main".into(),
            BundleDescriptor::default().pages(["**/*.html"]),
        );
        map.insert("stats".into(), BundleDescriptor::default().pages(["stats.html"]));
        map.insert("everywhere".into(), BundleDescriptor::default());
        map.insert("top".into(), BundleDescriptor::default().pages(["*.html"]));
        map
    }

    #[test]
    fn nested_page_matches_recursive_glob_only() {
        let matcher = PageMatcher::new(&bundles()).unwrap();
        assert_eq!(matcher.matches("blog/post.html"), vec!["main", "everywhere"]);
        assert_eq!(
            matcher.matches("stats.html"),
            vec!["main", "stats", "everywhere", "top"]
        );
    }

    #[test]
    fn invalid_pattern_is_configuration_error() {
        let mut map = BundleMap::new();
        map.insert("bad".into(), BundleDescriptor::default().pages(["[oops"]));
        let err = PageMatcher::new(&map).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn discovery_skips_partials_and_foreign_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        fs::create_dir_all(pages.join("blog")).unwrap();
        fs::create_dir_all(pages.join(".partials")).unwrap();
        fs::write(pages.join("index.html"), "").unwrap();
        fs::write(pages.join("blog/post.html"), "").unwrap();
        fs::write(pages.join("notes.md"), "").unwrap();
        fs::write(pages.join(".partials/header.html"), "").unwrap();

        let config = ConfigSnapshot::defaults(dir.path());
        let found: Vec<String> = discover_pages(&config).into_iter().map(|p| p.name).collect();
        assert_eq!(found, vec!["blog/post.html", "index.html"]);
    }

    #[test]
    fn missing_pages_dir_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_pages(&ConfigSnapshot::defaults(dir.path())).is_empty());
    }
}
