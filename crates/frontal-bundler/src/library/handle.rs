use std::path::{Path, PathBuf};
use std::sync::Arc;

use frontal_config::AssetReference;
use serde_json::{Map, Value};

use crate::Result;
use crate::library::Component;

/// Stylesheets and preprocessor globals registered by a library or component.
#[derive(Debug, Clone, Default)]
pub struct Styles {
    globals: Vec<String>,
    imports: Vec<AssetReference>,
}

impl Styles {
    /// Register preprocessor-only files (variables, mixins). They are made
    /// available to every imported stylesheet of the same extension and must
    /// not emit any CSS themselves.
    pub fn global<I, S>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globals.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn import<I, A>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetReference>,
    {
        self.imports.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    pub fn imports(&self) -> &[AssetReference] {
        &self.imports
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scripts {
    imports: Vec<AssetReference>,
}

impl Scripts {
    pub fn import<I, A>(&mut self, files: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetReference>,
    {
        self.imports.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn imports(&self) -> &[AssetReference] {
        &self.imports
    }
}

/// A component registration that still has to be read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingSource {
    File(PathBuf),
    Glob(String),
}

struct FnComponent<F> {
    name: String,
    setup: F,
}

impl<F> Component for FnComponent<F>
where
    F: Fn(&mut LibraryHandle, &Map<String, Value>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, lib: &mut LibraryHandle, options: &Map<String, Value>) -> Result<()> {
        (self.setup)(lib, options)
    }
}

/// Component catalog of a library handle.
#[derive(Default)]
pub struct Components {
    registered: Vec<Arc<dyn Component>>,
    pending: Vec<PendingSource>,
}

impl Components {
    /// Register a component from a setup closure.
    pub fn add<F>(&mut self, name: impl Into<String>, setup: F) -> &mut Self
    where
        F: Fn(&mut LibraryHandle, &Map<String, Value>) -> Result<()> + Send + Sync + 'static,
    {
        self.add_component(Arc::new(FnComponent {
            name: name.into(),
            setup,
        }))
    }

    pub fn add_component(&mut self, component: Arc<dyn Component>) -> &mut Self {
        if self.exists(component.name()) {
            tracing::warn!(
                component = component.name(),
                "component registered twice, the last registration wins"
            );
        }
        self.registered.push(component);
        self
    }

    /// Register the component described by `file`.
    pub fn register(&mut self, file: impl Into<PathBuf>) -> &mut Self {
        self.pending.push(PendingSource::File(file.into()));
        self
    }

    /// Register every component file matching `pattern`.
    pub fn auto_register(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.pending.push(PendingSource::Glob(pattern.into()));
        self
    }

    /// The last component registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.registered
            .iter()
            .rev()
            .find(|c| c.name() == name)
            .cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.registered.iter().any(|c| c.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.registered.iter().map(|c| c.name()).collect()
    }

    pub(crate) fn take_pending(&mut self) -> Vec<PendingSource> {
        std::mem::take(&mut self.pending)
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components")
            .field("registered", &self.names())
            .field("pending", &self.pending)
            .finish()
    }
}

/// What a library or component setup writes into.
///
/// A fresh handle is created for the library and for every component
/// activation, so nothing registered for one bundle leaks into another.
#[derive(Debug)]
pub struct LibraryHandle {
    dir: PathBuf,
    pub style: Styles,
    pub script: Scripts,
    pub components: Components,
}

impl LibraryHandle {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            style: Styles::default(),
            script: Scripts::default(),
            components: Components::default(),
        }
    }

    /// Directory of the library descriptor.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `file` resolved against the library directory.
    pub fn path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_last_registration() {
        let mut lib = LibraryHandle::new("/lib");
        lib.components.add("button", |lib, _| {
            lib.style.import(["first.css"]);
            Ok(())
        });
        lib.components.add("button", |lib, _| {
            lib.style.import(["second.css"]);
            Ok(())
        });

        let component = lib.components.get("button").unwrap();
        let mut fresh = LibraryHandle::new("/lib");
        component.setup(&mut fresh, &Map::new()).unwrap();
        assert_eq!(fresh.style.imports()[0].path, "second.css");
        assert!(lib.components.exists("button"));
        assert!(lib.components.get("modal").is_none());
    }

    #[test]
    fn registrations_are_pending_until_taken() {
        let mut lib = LibraryHandle::new("/lib");
        let file = lib.path("components/a.toml");
        lib.components
            .register(file)
            .auto_register("/lib/components/**/*.toml");

        let pending = lib.components.take_pending();
        assert_eq!(
            pending,
            vec![
                PendingSource::File(PathBuf::from("/lib/components/a.toml")),
                PendingSource::Glob("/lib/components/**/*.toml".into()),
            ]
        );
        assert!(lib.components.take_pending().is_empty());
    }
}
