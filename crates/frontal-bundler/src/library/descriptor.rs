//! Declarative libraries and components read from TOML files.

use frontal_config::AssetReference;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::Result;
use crate::library::{Component, Library, LibraryHandle};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StyleSection {
    pub globals: Vec<String>,
    pub imports: Vec<AssetReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptSection {
    pub imports: Vec<AssetReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentsSection {
    /// Component files, relative to the library directory.
    pub register: Vec<String>,
    /// Globs of component files, relative to the library directory.
    #[serde(alias = "autoRegister")]
    pub auto_register: Vec<String>,
}

/// Assets added when the option of the same name is truthy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptionalAssets {
    pub globals: Vec<String>,
    pub styles: Vec<AssetReference>,
    pub scripts: Vec<AssetReference>,
}

impl OptionalAssets {
    fn apply(&self, lib: &mut LibraryHandle) {
        lib.style.global(self.globals.iter().cloned());
        lib.style.import(self.styles.iter().cloned());
        lib.script.import(self.scripts.iter().cloned());
    }
}

/// Contents of `library.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibraryDescriptor {
    pub style: StyleSection,
    pub script: ScriptSection,
    pub components: ComponentsSection,
    pub options: IndexMap<String, OptionalAssets>,
}

impl LibraryDescriptor {
    pub fn parse(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

impl Library for LibraryDescriptor {
    fn setup(&self, options: &Map<String, Value>, lib: &mut LibraryHandle) -> Result<()> {
        lib.style.global(self.style.globals.iter().cloned());
        lib.style.import(self.style.imports.iter().cloned());
        lib.script.import(self.script.imports.iter().cloned());

        for file in &self.components.register {
            let path = lib.path(file);
            lib.components.register(path);
        }
        for pattern in &self.components.auto_register {
            let pattern = lib.path(pattern).to_string_lossy().replace('\\', "/");
            lib.components.auto_register(pattern);
        }

        apply_options(&self.options, options, lib);
        Ok(())
    }
}

/// Contents of a component file.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDescriptor {
    pub name: String,
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub styles: Vec<AssetReference>,
    #[serde(default)]
    pub scripts: Vec<AssetReference>,
    #[serde(default)]
    pub options: IndexMap<String, OptionalAssets>,
}

impl ComponentDescriptor {
    pub fn parse(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

impl Component for ComponentDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, lib: &mut LibraryHandle, options: &Map<String, Value>) -> Result<()> {
        lib.style.global(self.globals.iter().cloned());
        lib.style.import(self.styles.iter().cloned());
        lib.script.import(self.scripts.iter().cloned());
        apply_options(&self.options, options, lib);
        Ok(())
    }
}

fn apply_options(
    blocks: &IndexMap<String, OptionalAssets>,
    options: &Map<String, Value>,
    lib: &mut LibraryHandle,
) {
    for (key, assets) in blocks {
        if options.get(key).is_some_and(truthy) {
            assets.apply(lib);
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LIBRARY: &str = r#"
[style]
globals = ["@library/style/variables.scss"]
imports = ["@library/style/main.scss"]

[[script.imports]]
path = "jquery"
provide_as = ["$", "jQuery"]

[components]
register = ["components/buttons.toml"]
auto_register = ["components/**/*.component.toml"]

[options.dark]
styles = ["@library/style/dark.scss"]
"#;

    fn options(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn library_setup_registers_everything() {
        let desc = LibraryDescriptor::parse(LIBRARY).unwrap();
        let mut lib = LibraryHandle::new("/site/library");
        desc.setup(&options(json!({ "dark": true })), &mut lib).unwrap();

        assert_eq!(lib.style.globals(), ["@library/style/variables.scss"]);
        let styles: Vec<_> = lib.style.imports().iter().map(|a| a.path.as_str()).collect();
        assert_eq!(styles, vec!["@library/style/main.scss", "@library/style/dark.scss"]);
        assert_eq!(lib.script.imports()[0].provide_as, vec!["$", "jQuery"]);

        let pending = lib.components.take_pending();
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn falsy_options_skip_blocks() {
        let desc = LibraryDescriptor::parse(LIBRARY).unwrap();
        for value in [json!({}), json!({ "dark": false }), json!({ "dark": 0 }), json!({ "dark": "" })] {
            let mut lib = LibraryHandle::new("/site/library");
            desc.setup(&options(value), &mut lib).unwrap();
            assert_eq!(lib.style.imports().len(), 1);
        }
    }

    #[test]
    fn component_descriptor_applies_options() {
        let desc = ComponentDescriptor::parse(
            r#"
name = "modal"
styles = ["@library/components/modal.scss"]
scripts = ["@library/components/modal.js"]

[options.animated]
scripts = ["@library/components/modal-animations.js"]
"#,
        )
        .unwrap();

        let mut plain = LibraryHandle::new("/lib");
        desc.setup(&mut plain, &Map::new()).unwrap();
        assert_eq!(plain.script.imports().len(), 1);

        let mut animated = LibraryHandle::new("/lib");
        desc.setup(&mut animated, &options(json!({ "animated": 1 }))).unwrap();
        assert_eq!(animated.script.imports().len(), 2);
        assert_eq!(desc.name(), "modal");
    }
}
