//! Name-keyed registry of live windows
//!
//! The registry owns every live [`WindowInstance`] and guarantees at most one
//! instance per identifier. Instance creation always goes through
//! [`WindowRegistry::put`].

use crate::error::{Result, WindowError};
use crate::window::{WindowId, WindowInstance};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<WindowId, WindowInstance>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.windows.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&WindowInstance> {
        self.windows.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut WindowInstance> {
        self.windows.get_mut(id)
    }

    /// Register `instance` under its own identifier
    ///
    /// Fails with [`WindowError::DuplicateWindow`] if the identifier is taken;
    /// the registry is left unchanged.
    pub fn put(&mut self, instance: WindowInstance) -> Result<()> {
        let id = instance.id().clone();
        if self.windows.contains_key(&id) {
            return Err(WindowError::DuplicateWindow(id));
        }
        self.windows.insert(id, instance);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<WindowInstance> {
        self.windows.remove(id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Registered identifiers, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = &WindowId> {
        self.windows.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WindowInstance> {
        self.windows.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::tests::instance;

    #[test]
    fn test_put_and_get() -> Result<()> {
        let mut registry = WindowRegistry::new();
        registry.put(instance("Inventory", 1, false))?;

        assert!(registry.contains("Inventory"));
        assert_eq!(registry.get("Inventory").map(|w| w.layer()), Some(1));
        assert_eq!(registry.len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_put_is_rejected() -> Result<()> {
        let mut registry = WindowRegistry::new();
        registry.put(instance("Inventory", 1, false))?;

        let err = registry.put(instance("Inventory", 3, true)).unwrap_err();
        assert!(matches!(err, WindowError::DuplicateWindow(ref id) if id.as_str() == "Inventory"));

        // The original registration survives
        assert_eq!(registry.get("Inventory").map(|w| w.layer()), Some(1));
        assert_eq!(registry.len(), 1);
        Ok(())
    }

    #[test]
    fn test_remove() -> Result<()> {
        let mut registry = WindowRegistry::new();
        registry.put(instance("Inventory", 1, false))?;

        assert!(registry.remove("Inventory").is_some());
        assert!(registry.remove("Inventory").is_none());
        assert!(registry.is_empty());

        // Identifier is free again
        registry.put(instance("Inventory", 1, false))?;
        Ok(())
    }
}
