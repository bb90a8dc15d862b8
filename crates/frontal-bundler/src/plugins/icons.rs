//! Built-in `icons` plugin: replaces `<icon set="…" name="…">` elements in
//! pages with the inline SVG they refer to.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::context::AppContext;
use crate::plugins::hooks::{Hook, HookContext, HookRegistry, PAGE_BEFORE_EMIT};
use crate::plugins::plugin::FrontalPlugin;
use crate::watch::WatchOrigin;
use crate::{Error, Result};

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap_or_else(|err| panic!("invalid attribute pattern: {err}"))
});

static SVG_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<svg\b([^>]*?)(/?)>")
        .unwrap_or_else(|err| panic!("invalid svg pattern: {err}"))
});

/// Contents of the icons descriptor file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IconsDescriptor {
    /// Element name replaced with icons.
    pub tag: String,
    /// Pattern to replacement, applied to the icon source. First match wins.
    pub map: IndexMap<String, String>,
    pub strip_dimensions: bool,
}

impl Default for IconsDescriptor {
    fn default() -> Self {
        Self {
            tag: "icon".to_string(),
            map: IndexMap::new(),
            strip_dimensions: true,
        }
    }
}

impl IconsDescriptor {
    fn map_source(&self, src: &str) -> Result<String> {
        for (pattern, replacement) in &self.map {
            let regex = Regex::new(pattern).map_err(|err| {
                Error::Configuration(format!("invalid icon map pattern `{pattern}`: {err}"))
            })?;
            if regex.is_match(src) {
                return Ok(regex.replace(src, replacement.as_str()).into_owned());
            }
        }
        Ok(src.to_string())
    }
}

pub struct IconsPlugin {
    hooks: HookRegistry,
}

impl IconsPlugin {
    pub const NAME: &'static str = "icons";

    pub fn new(ctx: AppContext) -> Self {
        let mut hooks = HookRegistry::new();
        let settings = &ctx.config().icons;
        if settings.enabled {
            let config_path = ctx.config().resolve(&settings.config);
            if ctx.in_dev_mode() {
                ctx.watches().watch(&config_path, WatchOrigin::Icons);
            }
            hooks.add_hook(
                PAGE_BEFORE_EMIT,
                Arc::new(IconsHook {
                    ctx: ctx.clone(),
                    config_path,
                }),
            );
        }
        Self { hooks }
    }
}

#[async_trait]
impl FrontalPlugin for IconsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hooks(&self) -> Option<&HookRegistry> {
        Some(&self.hooks)
    }
}

struct IconsHook {
    ctx: AppContext,
    config_path: PathBuf,
}

impl IconsHook {
    async fn descriptor(&self) -> Result<IconsDescriptor> {
        if !tokio::fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(IconsDescriptor::default());
        }
        let source = self.ctx.modules().load(&self.config_path).await.map_err(|err| {
            Error::io(
                format!("Failed to read icons config {}", self.config_path.display()),
                err,
            )
        })?;
        toml::from_str(&source).map_err(|err| {
            Error::Configuration(format!(
                "invalid icons config {}: {err}",
                self.config_path.display()
            ))
        })
    }

    /// File an icon element refers to.
    fn locate(
        &self,
        descriptor: &IconsDescriptor,
        attrs: &IndexMap<String, String>,
    ) -> Result<(String, PathBuf)> {
        let config = self.ctx.config();
        let src = match attrs.get("src") {
            Some(src) => src.clone(),
            None => {
                let set = attrs.get("set").map(String::as_str).unwrap_or_default();
                let name = attrs.get("name").map(String::as_str).unwrap_or_default();
                let base = config.icons.path.to_string_lossy().replace('\\', "/");
                [base.as_str(), set, name]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/")
            }
        };

        let mut src = descriptor.map_source(&src)?;
        if Path::new(&src).extension().is_none() {
            src.push_str(".svg");
        }

        let file = match src.strip_prefix('/') {
            Some(public) => config.public_dir().join(public),
            None => match src.strip_prefix("@assets/") {
                Some(asset) => config.assets_dir().join(asset),
                None => config.resolve(&src),
            },
        };
        Ok((src, file))
    }
}

#[async_trait]
impl Hook for IconsHook {
    async fn call(&self, ctx: &HookContext<'_>, input: String) -> Result<String> {
        let descriptor = self.descriptor().await?;
        let tag = regex::escape(&descriptor.tag);
        let element = Regex::new(&format!(r"(?s)<{tag}\b([^>]*?)(?:/>|>\s*</{tag}\s*>|>)"))
            .map_err(|err| Error::Configuration(format!("invalid icon tag: {err}")))?;

        let elements: Vec<(std::ops::Range<usize>, IndexMap<String, String>)> = element
            .captures_iter(&input)
            .filter_map(|found| {
                let whole = found.get(0)?;
                let attrs = parse_attributes(found.get(1)?.as_str());
                Some((whole.range(), attrs))
            })
            .collect();

        let mut output = String::with_capacity(input.len());
        let mut last = 0;
        for (range, attrs) in elements {
            let (src, file) = self.locate(&descriptor, &attrs)?;
            let svg = tokio::fs::read_to_string(&file)
                .await
                .map_err(|_| Error::Resolution {
                    specifier: src,
                    requested_by: format!("icon in page `{}`", ctx.page_name),
                })?;

            output.push_str(&input[last..range.start]);
            output.push_str(&render_icon(&svg, &attrs, descriptor.strip_dimensions));
            last = range.end;
        }
        output.push_str(&input[last..]);
        Ok(output)
    }
}

fn parse_attributes(raw: &str) -> IndexMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// The SVG document with the element's remaining attributes applied to the
/// root `<svg>` element.
fn render_icon(svg: &str, attrs: &IndexMap<String, String>, strip_dimensions: bool) -> String {
    let Some(open) = SVG_OPEN.captures(svg) else {
        return svg.trim().to_string();
    };
    let (Some(whole), Some(raw)) = (open.get(0), open.get(1)) else {
        return svg.trim().to_string();
    };
    let self_closing = open.get(2).is_some_and(|m| !m.as_str().is_empty());

    let mut svg_attrs = parse_attributes(raw.as_str());
    if strip_dimensions {
        let width = svg_attrs.shift_remove("width");
        let height = svg_attrs.shift_remove("height");
        if let (Some(w), Some(h)) = (width, height) {
            if !svg_attrs.contains_key("viewBox") {
                if let (Ok(w), Ok(h)) = (w.parse::<f64>(), h.parse::<f64>()) {
                    svg_attrs.insert("viewBox".to_string(), format!("0 0 {w} {h}"));
                }
            }
        }
    }
    for (name, value) in attrs {
        if !matches!(name.as_str(), "src" | "set" | "name") {
            svg_attrs.insert(name.clone(), value.clone());
        }
    }

    let mut tag = String::from("<svg");
    for (name, value) in &svg_attrs {
        tag.push_str(&format!(" {name}=\"{}\"", value.replace('"', "&quot;")));
    }
    tag.push_str(if self_closing { "/>" } else { ">" });

    let body = &svg[whole.end()..];
    format!("{tag}{body}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Mode;
    use frontal_config::ConfigSnapshot;
    use std::fs;

    const ARROW: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"><path d="M0 0"/></svg>"#;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("icons/ui")).unwrap();
        fs::create_dir_all(dir.path().join("public/img")).unwrap();
        fs::write(dir.path().join("icons/ui/arrow.svg"), ARROW).unwrap();
        fs::write(dir.path().join("public/img/logo.svg"), "<svg><circle/></svg>").unwrap();
        dir
    }

    async fn run(ctx: &AppContext, html: &str) -> Result<String> {
        let plugin = IconsPlugin::new(ctx.clone());
        let hook = Arc::clone(&plugin.hooks().unwrap().get_hooks(PAGE_BEFORE_EMIT)[0]);
        let page = ctx.config().pages_dir().join("index.html");
        let hook_ctx = HookContext {
            app: ctx,
            page_name: "index.html",
            page_path: &page,
        };
        hook.call(&hook_ctx, html.to_string()).await
    }

    #[test]
    fn element_patterns_compile() {
        assert!(ATTRIBUTE.is_match("class=\"x\""));
        assert!(SVG_OPEN.is_match("<svg viewBox=\"0 0 1 1\"/>"));
    }

    #[test]
    fn attributes_parse_all_quote_styles() {
        let attrs = parse_attributes(r#" set="ui" name='arrow' class=big hidden"#);
        assert_eq!(attrs["set"], "ui");
        assert_eq!(attrs["name"], "arrow");
        assert_eq!(attrs["class"], "big");
        assert_eq!(attrs["hidden"], "");
    }

    #[test]
    fn render_strips_dimensions_and_copies_attributes() {
        let mut attrs = IndexMap::new();
        attrs.insert("set".to_string(), "ui".to_string());
        attrs.insert("class".to_string(), "icon".to_string());

        let out = render_icon(ARROW, &attrs, true);
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" class="icon"><path d="M0 0"/></svg>"#
        );
    }

    #[test]
    fn map_uses_first_matching_pattern() {
        let mut descriptor = IconsDescriptor::default();
        descriptor.map.insert("^icons/fa/".into(), "node_modules/fa/svgs/".into());
        descriptor.map.insert("^icons/".into(), "unused/".into());
        assert_eq!(
            descriptor.map_source("icons/fa/solid/user").unwrap(),
            "node_modules/fa/svgs/solid/user"
        );
        assert_eq!(descriptor.map_source("other/x").unwrap(), "other/x");
    }

    #[tokio::test]
    async fn icons_are_inlined_from_set_or_public_src() {
        let dir = site();
        let ctx = AppContext::new(ConfigSnapshot::defaults(dir.path()), Mode::Production);

        let html = r#"<p><icon set="ui" name="arrow" class="a"></icon> <icon src="/img/logo" /></p>"#;
        let out = run(&ctx, html).await.unwrap();
        assert_eq!(
            out,
            r#"<p><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" class="a"><path d="M0 0"/></svg> <svg><circle/></svg></p>"#
        );
    }

    #[tokio::test]
    async fn custom_tag_from_descriptor_and_missing_icon_errors() {
        let dir = site();
        fs::write(dir.path().join("icons/icons.toml"), "tag = \"i-con\"\n").unwrap();
        let ctx = AppContext::new(ConfigSnapshot::defaults(dir.path()), Mode::Development);

        let out = run(&ctx, r#"<i-con set="ui" name="arrow"/><icon set="ui" name="x">"#)
            .await
            .unwrap();
        assert!(out.starts_with("<svg"));
        assert!(out.ends_with(r#"<icon set="ui" name="x">"#));
        assert!(
            ctx.watches()
                .requests()
                .iter()
                .any(|w| w.origin == WatchOrigin::Icons)
        );

        let err = run(&ctx, r#"<i-con set="ui" name="missing"/>"#).await.unwrap_err();
        assert!(matches!(err, Error::Resolution { ref specifier, .. } if specifier == "icons/ui/missing.svg"));
    }
}
