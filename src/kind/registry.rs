use super::{LeafKind, StringKind};
use crate::flow::FLOW_KIND;
use ahash::AHashMap;
use std::sync::Arc;
use tracing::warn;

/// The table of node kinds an engine understands.
///
/// Built once at startup through [`KindRegistry::builder`] and read-only afterwards.
/// It is shared behind an [`Arc`] by the validator and the interpreter, so a flow
/// is always evaluated with the same kinds it was validated against.
pub struct KindRegistry {
    kinds: AHashMap<String, Arc<dyn LeafKind>>,
    aliases: AHashMap<String, String>,
}

pub struct KindRegistryBuilder {
    kinds: AHashMap<String, Arc<dyn LeafKind>>,
    aliases: AHashMap<String, String>,
}

impl KindRegistryBuilder {
    /// Starts from the built-in kinds.
    pub fn new() -> Self {
        let builder = Self::empty();
        builder.with_kind(Arc::new(StringKind))
    }

    /// Starts from no leaf kinds at all; only `flow` composites are accepted.
    pub fn empty() -> Self {
        Self {
            kinds: AHashMap::new(),
            aliases: AHashMap::new(),
        }
    }

    /// Registers a leaf kind under its own name, replacing any kind of the same name.
    pub fn with_kind(mut self, kind: Arc<dyn LeafKind>) -> Self {
        let name = kind.name().to_string();
        if name == FLOW_KIND {
            warn!("Ignoring leaf kind registration under the reserved name '{}'", FLOW_KIND);
            return self;
        }
        self.aliases.remove(&name);
        self.kinds.insert(name, kind);
        self
    }

    /// Maps a user-facing kind name onto a registered one (or onto `flow`).
    ///
    /// Aliases onto unknown kinds are ignored.
    pub fn with_kind_alias(mut self, alias: &str, canonical: &str) -> Self {
        let known = canonical == FLOW_KIND || self.kinds.contains_key(canonical);
        if !known || alias == canonical {
            warn!("Ignoring alias '{}' for unregistered kind '{}'", alias, canonical);
            return self;
        }
        self.aliases
            .insert(alias.to_string(), canonical.to_string());
        self
    }

    pub fn build(self) -> Arc<KindRegistry> {
        Arc::new(KindRegistry {
            kinds: self.kinds,
            aliases: self.aliases,
        })
    }
}

impl Default for KindRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KindRegistry {
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::new()
    }

    /// A registry holding only the built-in kinds.
    pub fn with_builtins() -> Arc<Self> {
        Self::builder().build()
    }

    /// Resolves a kind name as written in a definition to its canonical name.
    ///
    /// Returns `None` for names that are neither `flow`, a registered kind, nor an alias.
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if name == FLOW_KIND || self.kinds.contains_key(name) {
            return Some(name);
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Looks up a leaf kind by its canonical name.
    pub fn get(&self, canonical: &str) -> Option<&Arc<dyn LeafKind>> {
        self.kinds.get(canonical)
    }

    /// All accepted kind names (including `flow`), sorted.
    pub fn kind_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = std::iter::once(FLOW_KIND)
            .chain(self.kinds.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }
}
