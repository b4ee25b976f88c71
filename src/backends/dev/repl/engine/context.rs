//! Session scope
//!
//! Everything earlier units made visible to later ones: import clauses and
//! bound names, each tagged with the wrapper that introduced it. The scope
//! only ever grows, and only the execution engine writes to it, once per
//! successful unit.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Identifier of a unit's wrapper, rendered as `$line<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId(u64);

impl WrapperId {
    /// Create a wrapper id
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }

    /// Name of the object holding the unit's members in class mode
    pub fn instance_name(&self) -> String {
        format!("{}$instance", self)
    }
}

impl fmt::Display for WrapperId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "$line{}", self.0)
    }
}

/// An import clause committed to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub path: String,
    pub origin: WrapperId,
}

/// A bound name committed to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    pub name: String,
    pub origin: WrapperId,
    pub lazy: bool,
}

/// What one unit adds to the scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeDelta {
    pub imports: Vec<String>,
    /// Bound names with their laziness
    pub bindings: Vec<(String, bool)>,
}

impl ScopeDelta {
    /// Whether the delta adds nothing
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.bindings.is_empty()
    }
}

/// Scope shared between the engine and readers such as the completer
pub type SharedScope = Arc<RwLock<SessionScope>>;

/// Append-only session scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionScope {
    imports: Vec<ImportEntry>,
    bindings: Vec<BindingEntry>,
    /// Bumped on every commit
    version: u64,
}

impl SessionScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope behind a lock
    pub fn shared() -> SharedScope {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Imports in commit order
    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    /// Every binding ever committed, in commit order
    pub fn bindings(&self) -> &[BindingEntry] {
        &self.bindings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.imports.len() + self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One entry per name, the latest definition winning
    ///
    /// Names keep the position of their first definition.
    pub fn visible_bindings(&self) -> Vec<&BindingEntry> {
        let mut visible: IndexMap<&str, &BindingEntry> = IndexMap::new();
        for entry in &self.bindings {
            visible.insert(entry.name.as_str(), entry);
        }
        visible.into_values().collect()
    }

    /// Latest definition of `name`
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&BindingEntry> {
        self.bindings.iter().rev().find(|entry| entry.name == name)
    }

    /// Append the entries of a successful unit
    pub(crate) fn commit(
        &mut self,
        origin: WrapperId,
        delta: ScopeDelta,
    ) {
        self.imports.extend(
            delta
                .imports
                .into_iter()
                .map(|path| ImportEntry { path, origin }),
        );
        self.bindings.extend(
            delta
                .bindings
                .into_iter()
                .map(|(name, lazy)| BindingEntry { name, origin, lazy }),
        );
        self.version += 1;
    }
}
