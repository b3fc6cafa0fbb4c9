// registry.rs - Hasher registry for managing available hashers

use std::collections::HashMap;
use super::traits::CodeHasher;
use super::{Crc32Hasher, Md5Hasher, Sha256Hasher};

/// Registry for available hashers
pub struct HasherRegistry {
    hashers: HashMap<String, Box<dyn CodeHasher>>,
}

impl HasherRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            hashers: HashMap::new(),
        };

        // Register built-in hashers
        registry.register_hasher("crc32", Box::new(Crc32Hasher));
        registry.register_hasher("sha256", Box::new(Sha256Hasher));
        registry.register_hasher("md5", Box::new(Md5Hasher));

        registry
    }

    /// Register a new hasher
    pub fn register_hasher(&mut self, name: &str, hasher: Box<dyn CodeHasher>) {
        self.hashers.insert(name.to_string(), hasher);
    }

    /// Get a hasher by name
    pub fn get_hasher(&self, name: &str) -> Option<&dyn CodeHasher> {
        self.hashers.get(name).map(|h| h.as_ref())
    }

    /// Remove a hasher from the registry and hand over ownership
    pub fn take_hasher(&mut self, name: &str) -> Option<Box<dyn CodeHasher>> {
        self.hashers.remove(name)
    }

    /// Check if a hasher exists
    pub fn has_hasher(&self, name: &str) -> bool {
        self.hashers.contains_key(name)
    }

    /// List all available hashers
    pub fn list_hashers(&self) -> Vec<(&str, &str)> {
        let mut list: Vec<_> = self
            .hashers
            .values()
            .map(|h| (h.name(), h.description()))
            .collect();
        list.sort();
        list
    }

    /// Get all hasher names
    pub fn get_hasher_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hashers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for HasherRegistry {
    fn default() -> Self {
        Self::new()
    }
}
