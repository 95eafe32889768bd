//! Resource cache for deduplicating emitted definitions
//!
//! Each resource kind keeps its own identifier namespace, a map from host
//! handle to assigned identifier and the `DEF` name of every handle whose
//! full definition has been written. Later encounters of an emitted
//! resource write a `USE` reference instead. All `DEF` names of one export
//! share a single namespace, since derived names of different kinds can
//! coincide.

use std::collections::HashMap;
use std::hash::Hash;

use super::identifier::IdentifierNamespace;
use crate::scene::{ImageHandle, MeshHandle, ObjectHandle};

/// Identifier and emission state for one resource kind
#[derive(Debug)]
pub struct KindCache<K> {
    /// Handle -> assigned identifier
    identifiers: HashMap<K, String>,
    /// Identifiers handed out so far
    namespace: IdentifierNamespace,
    /// Handle -> `DEF` name of its written definition
    emitted: HashMap<K, String>,
}

impl<K> Default for KindCache<K> {
    fn default() -> Self {
        Self {
            identifiers: HashMap::new(),
            namespace: IdentifierNamespace::new(),
            emitted: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> KindCache<K> {
    /// Identifier of `key`, assigning one derived from `name` on first use
    ///
    /// Once assigned, later calls return the same identifier whatever name
    /// they pass.
    pub fn lookup_or_create(&mut self, key: K, name: &str) -> String {
        if let Some(identifier) = self.identifiers.get(&key) {
            return identifier.clone();
        }
        let identifier = self.namespace.unique(name);
        self.identifiers.insert(key, identifier.clone());
        identifier
    }

    /// Identifier previously assigned to `key`
    pub fn identifier(&self, key: K) -> Option<&str> {
        self.identifiers.get(&key).map(String::as_str)
    }

    /// Record that the definition of `key` has been written as
    /// `DEF definition`.
    ///
    /// Returns `false` if it already was; the first name is kept.
    pub fn mark_emitted(&mut self, key: K, definition: String) -> bool {
        debug_assert!(
            self.identifiers.contains_key(&key),
            "resource emitted before an identifier was assigned"
        );
        if self.emitted.contains_key(&key) {
            return false;
        }
        self.emitted.insert(key, definition);
        true
    }

    /// Whether the definition of `key` has been written
    pub fn is_emitted(&self, key: K) -> bool {
        self.emitted.contains_key(&key)
    }

    /// `DEF` name under which `key` was written
    pub fn definition(&self, key: K) -> Option<&str> {
        self.emitted.get(&key).map(String::as_str)
    }

    /// Number of emitted definitions
    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }
}

/// Per-export cache for objects, meshes and images
#[derive(Debug, Default)]
pub struct ResourceCache {
    /// Scene objects
    pub objects: KindCache<ObjectHandle>,
    /// Mesh data
    pub meshes: KindCache<MeshHandle>,
    /// Texture images
    pub images: KindCache<ImageHandle>,
    /// Every `DEF` name written so far
    pub definitions: IdentifierNamespace,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}
