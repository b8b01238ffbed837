//! Named schema registry.
//!
//! Provides [`SchemaRegistry`], the process-wide table of named definitions.
//! Definitions are registered during startup, the registry is then frozen and
//! shared read-only (usually behind an `Arc`) by every decode and encode.
//!
//! References between definitions are resolved by name at use time, so a
//! definition may refer to itself or to a definition registered after it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::node::{Definition, EnumType, NodeKind, SchemaNode};

/// Thread-safe, write-once-then-frozen table of schema definitions.
///
/// # Examples
///
/// ```
/// use ruststack_s3_schema::{LeafType, SchemaNode, SchemaRegistry};
///
/// let registry = SchemaRegistry::new();
/// registry
///     .register_schema(
///         "CommonPrefixes",
///         SchemaNode::element("CommonPrefixes", [SchemaNode::leaf("Prefix", LeafType::String)]),
///     )
///     .unwrap();
/// registry.freeze();
///
/// let node = registry.resolve_element("CommonPrefixes").unwrap();
/// assert_eq!(node.children().len(), 1);
/// assert!(registry.register_schema("Late", SchemaNode::leaf("Late", LeafType::Int)).is_err());
/// ```
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: DashMap<String, Definition>,
    frozen: AtomicBool,
    /// Held shared by registrations and exclusively by `freeze`.
    phase: RwLock<()>,
}

impl SchemaRegistry {
    /// Create an empty, unfrozen registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named definition.
    ///
    /// # Errors
    ///
    /// `DuplicateSchema` if the name is taken, `RegistryFrozen` after
    /// [`freeze`](Self::freeze), `InvalidDefinition` if an element tree breaks
    /// a structural rule.
    pub fn register_schema(
        &self,
        name: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> SchemaResult<()> {
        let name = name.into();
        let definition = definition.into();
        if let Definition::Element(node) = &definition {
            node.check()?;
        }

        let _phase = self.phase.read();
        if self.is_frozen() {
            return Err(SchemaError::RegistryFrozen(name));
        }
        match self.inner.entry(name) {
            Entry::Occupied(e) => Err(SchemaError::DuplicateSchema(e.key().clone())),
            Entry::Vacant(e) => {
                debug!(
                    schema = %e.key(),
                    kind = match &definition {
                        Definition::Element(_) => "element",
                        Definition::Enum(_) => "enum",
                    },
                    "registered schema definition"
                );
                e.insert(definition);
                Ok(())
            }
        }
    }

    /// Register an enumeration under its own name.
    ///
    /// # Errors
    ///
    /// Same as [`register_schema`](Self::register_schema).
    pub fn register_enum(&self, enum_type: EnumType) -> SchemaResult<()> {
        let name = enum_type.name().to_owned();
        self.register_schema(name, enum_type)
    }

    /// Register a batch of definitions, all or none.
    ///
    /// Every element tree is checked before anything is inserted. If a name
    /// turns out to be taken, the definitions inserted so far are removed
    /// again.
    ///
    /// # Errors
    ///
    /// Same as [`register_schema`](Self::register_schema).
    pub fn register_all(&self, definitions: Vec<(String, Definition)>) -> SchemaResult<usize> {
        for (_, definition) in &definitions {
            if let Definition::Element(node) = definition {
                node.check()?;
            }
        }

        let _phase = self.phase.read();
        if let Some((name, _)) = definitions.first() {
            if self.is_frozen() {
                return Err(SchemaError::RegistryFrozen(name.clone()));
            }
        }
        let mut added: Vec<String> = Vec::with_capacity(definitions.len());
        for (name, definition) in definitions {
            match self.inner.entry(name) {
                Entry::Occupied(e) => {
                    let taken = e.key().clone();
                    drop(e);
                    for name in &added {
                        self.inner.remove(name);
                    }
                    return Err(SchemaError::DuplicateSchema(taken));
                }
                Entry::Vacant(e) => {
                    added.push(e.key().clone());
                    e.insert(definition);
                }
            }
        }
        debug!(definitions = added.len(), "registered schema batch");
        Ok(added.len())
    }

    /// Stop accepting registrations.
    ///
    /// Registrations already in progress complete first; none lands after
    /// this returns.
    pub fn freeze(&self) {
        let _phase = self.phase.write();
        if !self.frozen.swap(true, Ordering::AcqRel) {
            debug!(definitions = self.inner.len(), "schema registry frozen");
        }
    }

    /// Whether [`freeze`](Self::freeze) has been called.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Look up a definition by name.
    ///
    /// # Errors
    ///
    /// `UnknownSchema` if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> SchemaResult<Definition> {
        self.inner
            .get(name)
            .map(|d| d.value().clone())
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_owned()))
    }

    /// Look up an element definition by name.
    ///
    /// # Errors
    ///
    /// `UnknownSchema` if absent, `NotAnElement` if it is an enumeration.
    pub fn resolve_element(&self, name: &str) -> SchemaResult<Arc<SchemaNode>> {
        match self.resolve(name)? {
            Definition::Element(node) => Ok(node),
            Definition::Enum(_) => Err(SchemaError::NotAnElement(name.to_owned())),
        }
    }

    /// Look up an enumeration by name.
    ///
    /// # Errors
    ///
    /// `UnknownSchema` if absent, `NotAnEnum` if it is an element definition.
    pub fn resolve_enum(&self, name: &str) -> SchemaResult<Arc<EnumType>> {
        match self.resolve(name)? {
            Definition::Enum(e) => Ok(e),
            Definition::Element(_) => Err(SchemaError::NotAnEnum(name.to_owned())),
        }
    }

    /// Resolve the content model of `node`.
    ///
    /// Element and leaf nodes are their own content. For a reference, the
    /// chain of referenced definitions is followed until it reaches an element
    /// or leaf. Only references are chased here; the element structure of the
    /// target is not expanded.
    ///
    /// # Errors
    ///
    /// `UnknownSchema` / `NotAnElement` for a dangling reference and
    /// `CyclicReference` for a chain that only visits references.
    pub fn content_of(&self, node: &Arc<SchemaNode>) -> SchemaResult<Arc<SchemaNode>> {
        let mut current = Arc::clone(node);
        let mut hops = 0usize;
        while let NodeKind::Reference(target) = current.kind() {
            if hops > self.inner.len() {
                return Err(SchemaError::CyclicReference(node.name().to_owned()));
            }
            let next = self.resolve_element(target)?;
            current = next;
            hops += 1;
        }
        Ok(current)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
