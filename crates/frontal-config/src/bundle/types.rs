use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered map of bundle name to descriptor. Declaration order is significant.
pub type BundleMap = IndexMap<String, BundleDescriptor>;

/// A named bundle: ordered assets, the page globs it applies to and an
/// optional component selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleDescriptor {
    #[serde(default)]
    pub assets: Vec<AssetReference>,

    #[serde(default)]
    pub pages: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<ComponentSelection>,
}

impl BundleDescriptor {
    pub fn with_assets<I, A>(assets: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetReference>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    /// Copy of this descriptor with assets and pages emptied; components kept.
    pub fn seed(&self) -> Self {
        Self {
            assets: Vec::new(),
            pages: Vec::new(),
            components: self.components.clone(),
        }
    }
}

/// One asset declared in a bundle.
///
/// Deserializes from either a bare string (`"@assets/app.js"`) or a table
/// with a `path` and optional flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssetRepr")]
pub struct AssetReference {
    pub path: String,

    #[serde(default)]
    pub order: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provide_as: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoped_with: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub define: IndexMap<String, Value>,

    /// Preprocessor-only files that must be made available to this stylesheet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub globals: Vec<String>,
}

impl AssetReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn provide_as<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provide_as = names.into_iter().map(Into::into).collect();
        self
    }

    /// Path with any `?query` directive removed.
    pub fn bare_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((bare, _)) => bare,
            None => &self.path,
        }
    }

    /// Extension of the bare path, lowercased. `None` for bare module specifiers.
    pub fn extension(&self) -> Option<String> {
        let bare = self.bare_path();
        let file = bare.rsplit(['/', '\\']).next().unwrap_or(bare);
        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl From<&str> for AssetReference {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for AssetReference {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssetRepr {
    Path(String),
    Detailed(DetailedAsset),
}

#[derive(Deserialize)]
struct DetailedAsset {
    path: String,
    #[serde(default)]
    order: i32,
    #[serde(default, alias = "provideAs")]
    provide_as: Vec<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default, alias = "scopedWith")]
    scoped_with: Option<String>,
    #[serde(default)]
    define: IndexMap<String, Value>,
    #[serde(default)]
    globals: Vec<String>,
}

impl From<AssetRepr> for AssetReference {
    fn from(repr: AssetRepr) -> Self {
        match repr {
            AssetRepr::Path(path) => AssetReference::new(path),
            AssetRepr::Detailed(d) => AssetReference {
                path: d.path,
                order: d.order,
                provide_as: d.provide_as,
                imports: d.imports,
                scoped_with: d.scoped_with,
                define: d.define,
                globals: d.globals,
            },
        }
    }
}

/// Components a bundle activates from the configured library.
///
/// Either a plain list of names or a table of name to options. A `false`
/// value disables the component; any other non-table value enables it with
/// empty options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentSelection {
    List(Vec<String>),
    Map(IndexMap<String, Value>),
}

impl ComponentSelection {
    /// Enabled components with their options, in declaration order.
    pub fn enabled(&self) -> Vec<(String, Map<String, Value>)> {
        match self {
            ComponentSelection::List(names) => {
                names.iter().map(|n| (n.clone(), Map::new())).collect()
            }
            ComponentSelection::Map(entries) => entries
                .iter()
                .filter_map(|(name, value)| match value {
                    Value::Bool(false) => None,
                    Value::Object(options) => Some((name.clone(), options.clone())),
                    _ => Some((name.clone(), Map::new())),
                })
                .collect(),
        }
    }

    pub(crate) fn into_map(self) -> IndexMap<String, Value> {
        match self {
            ComponentSelection::List(names) => names
                .into_iter()
                .map(|n| (n, Value::Object(Map::new())))
                .collect(),
            ComponentSelection::Map(entries) => entries,
        }
    }
}
