//! Tag injection into page HTML.

use crate::entries::PageAssets;

/// Add the page's compiled files to its HTML.
///
/// Stylesheets and script preloads go before `</head>`. Script tags go before
/// the first `<script>` inside the body, or before `</body>` when the body has
/// none, or at the end of the document. URLs are prefixed with `base`.
pub fn inject_page_assets(html: &str, assets: &PageAssets, base: &str) -> String {
    if assets.is_empty() {
        return html.to_string();
    }

    let mut head = String::new();
    for style in &assets.styles {
        head.push_str(&format!(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n",
            public_url(base, style)
        ));
    }
    for script in &assets.scripts {
        head.push_str(&format!(
            "<link rel=\"preload\" href=\"{}\" as=\"script\">\n",
            public_url(base, script)
        ));
    }

    let scripts: String = assets
        .scripts
        .iter()
        .map(|script| format!("<script src=\"{}\"></script>\n", public_url(base, script)))
        .collect();

    // offsets into the lowercased copy are valid in the original
    let lower = html.to_ascii_lowercase();
    let head_at = lower.find("</head>");
    let body_at = lower.find("<body");
    let script_at = body_at.and_then(|body| lower[body..].find("<script").map(|pos| body + pos));
    let script_at = script_at.or_else(|| lower.rfind("</body>"));

    let mut inserts: Vec<(usize, &str)> = Vec::new();
    if let Some(pos) = head_at {
        inserts.push((pos, head.as_str()));
    }
    if let Some(pos) = script_at {
        inserts.push((pos, scripts.as_str()));
    }
    inserts.sort_by_key(|(pos, _)| *pos);

    let mut out = String::with_capacity(html.len() + head.len() + scripts.len());
    let mut last = 0;
    for (pos, text) in &inserts {
        out.push_str(&html[last..*pos]);
        out.push_str(text);
        last = *pos;
    }
    out.push_str(&html[last..]);

    if head_at.is_none() {
        out.insert_str(0, &head);
    }
    if script_at.is_none() {
        out.push('\n');
        out.push_str(&scripts);
    }
    out
}

/// `file` as served under `base`.
pub fn public_url(base: &str, file: &str) -> String {
    let file = file.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{base}{file}")
    } else {
        format!("{base}/{file}")
    }
}
