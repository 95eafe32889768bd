//! Specialized collection types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Typed handle for type-safe references into a [`HandleMap`]
///
/// Slot map keys are versioned, so a handle to a removed entry never
/// compares equal to a handle for a later entry reusing the same slot.
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

// Manual impls: derives would needlessly require `T` to implement each trait.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Payload;

    #[test]
    fn test_handles_survive_without_trait_bounds() {
        let mut map: HandleMap<Payload> = HandleMap::new();
        let a = TypedHandle::<Payload>::new(map.insert(Payload));
        let b = TypedHandle::<Payload>::new(map.insert(Payload));

        let set: HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_reused_slot_yields_distinct_handle() {
        let mut map: HandleMap<Payload> = HandleMap::new();
        let first = TypedHandle::<Payload>::new(map.insert(Payload));
        map.remove(first.key());
        let second = TypedHandle::<Payload>::new(map.insert(Payload));

        assert_ne!(first, second);
    }
}
