//! Window type catalog
//!
//! Maps a window type name to its descriptor and a factory for its content.
//! Each type is resolved once at registration, so showing a window is a map
//! lookup plus a factory call.

use super::{WindowContent, WindowDescriptor};
use crate::error::{Result, WindowError};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds fresh content for one window instance
pub type ContentFactory = Box<dyn Fn() -> Box<dyn WindowContent>>;

/// A window type known at compile time
///
/// ```
/// use strata::window::{CreateContext, WindowContent, WindowDescriptor, WindowKind};
///
/// #[derive(Default)]
/// struct Inventory;
///
/// impl WindowContent for Inventory {
///     fn create(&mut self, _ctx: &CreateContext<'_>) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// impl WindowKind for Inventory {
///     const NAME: &'static str = "Inventory";
///
///     fn descriptor() -> WindowDescriptor {
///         WindowDescriptor::new(1, "ui/inventory.layout")
///     }
///
///     fn new_content() -> Self {
///         Inventory
///     }
/// }
/// ```
pub trait WindowKind: WindowContent + Sized + 'static {
    /// Type name, also used as the window identifier
    const NAME: &'static str;

    /// Built-in descriptor, used unless configuration declares one
    fn descriptor() -> WindowDescriptor;

    /// Fresh content for a new instance
    fn new_content() -> Self;
}

struct CatalogEntry {
    descriptor: Arc<WindowDescriptor>,
    factory: ContentFactory,
}

/// Registry of window types
#[derive(Default)]
pub struct WindowCatalog {
    entries: HashMap<String, CatalogEntry>,
    declared: HashMap<String, WindowDescriptor>,
}

impl fmt::Debug for WindowCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("WindowCatalog")
            .field("types", &names)
            .field("declared", &self.declared.len())
            .finish()
    }
}

impl WindowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose registrations prefer the given declared descriptors
    /// (typically `StrataConfig::windows`)
    pub fn with_declared(declared: HashMap<String, WindowDescriptor>) -> Self {
        Self {
            entries: HashMap::new(),
            declared,
        }
    }

    /// Register a compile-time window kind
    pub fn register<K: WindowKind>(&mut self) -> Result<()> {
        let descriptor = self
            .declared
            .get(K::NAME)
            .cloned()
            .unwrap_or_else(K::descriptor);
        self.insert(
            K::NAME,
            descriptor,
            Box::new(|| Box::new(K::new_content()) as Box<dyn WindowContent>),
        )
    }

    /// Register a type with an explicit descriptor and factory
    pub fn register_with<F>(
        &mut self,
        name: impl Into<String>,
        descriptor: WindowDescriptor,
        factory: F,
    ) -> Result<()>
    where
        F: Fn() -> Box<dyn WindowContent> + 'static,
    {
        self.insert(name, descriptor, Box::new(factory))
    }

    /// Register a factory for a type whose descriptor was declared in configuration
    pub fn register_declared<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn WindowContent> + 'static,
    {
        let descriptor = self
            .declared
            .get(name)
            .cloned()
            .ok_or_else(|| WindowError::UnknownWindowType(name.to_string()))?;
        self.insert(name, descriptor, Box::new(factory))
    }

    fn insert(
        &mut self,
        name: impl Into<String>,
        descriptor: WindowDescriptor,
        factory: ContentFactory,
    ) -> Result<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(WindowError::DuplicateWindowType(name));
        }

        debug!(
            "Registered window type '{}' (layer {}, full_screen {})",
            name, descriptor.layer, descriptor.full_screen
        );
        self.entries.insert(
            name,
            CatalogEntry {
                descriptor: Arc::new(descriptor),
                factory,
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&WindowDescriptor> {
        self.entries.get(name).map(|entry| entry.descriptor.as_ref())
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor and fresh content for `name`
    pub(crate) fn instantiate(
        &self,
        name: &str,
    ) -> Result<(Arc<WindowDescriptor>, Box<dyn WindowContent>)> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| WindowError::UnknownWindowType(name.to_string()))?;
        Ok((Arc::clone(&entry.descriptor), (entry.factory)()))
    }
}
