//! Identifier sanitizing
//!
//! Node names in a world file must start with a letter and may only contain
//! upper-case letters, digits and single underscores. [`sanitize`] maps any
//! display name onto that grammar; [`IdentifierNamespace`] adds the numeric
//! suffix that keeps identifiers of one kind, and every `DEF` name, unique
//! within an export.

use std::collections::HashSet;

/// Placeholder for names with no usable characters
pub const EMPTY_IDENTIFIER: &str = "NONE";

/// Map a free-form name to a legal identifier.
///
/// Every character that is not an ASCII letter becomes `_`, runs of `_`
/// collapse to one and leading or trailing `_` are dropped.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_uppercase) {
        let c = if c.is_ascii_uppercase() { c } else { '_' };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        EMPTY_IDENTIFIER.to_string()
    } else {
        out
    }
}

/// Set of identifiers already handed out for one resource kind
#[derive(Debug, Default)]
pub struct IdentifierNamespace {
    used: HashSet<String>,
}

impl IdentifierNamespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize `name` and reserve it, appending `_001`, `_002`, ... until
    /// the result is unused.
    pub fn unique(&mut self, name: &str) -> String {
        self.reserve(&sanitize(name))
    }

    /// Reserve an identifier that is already legal, suffixing it like
    /// [`unique`](Self::unique) when taken.
    ///
    /// Digits in `identifier` are kept, so derived names such as
    /// `ARM_001_TRANSFORM` survive unchanged.
    pub fn reserve(&mut self, identifier: &str) -> String {
        let mut candidate = identifier.to_string();
        let mut counter = 1u32;
        while self.used.contains(&candidate) {
            candidate = format!("{identifier}_{counter:03}");
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    /// Whether an identifier is taken
    pub fn contains(&self, identifier: &str) -> bool {
        self.used.contains(identifier)
    }

    /// Number of identifiers handed out
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Whether no identifier has been handed out
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Whether `identifier` matches `^[A-Z][A-Z0-9_]*$` with no `__` and no
/// trailing `_`
pub fn is_legal(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase()
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && !identifier.contains("__")
        && !identifier.ends_with('_')
}
