//! Errors raised while registering, loading, or resolving schema definitions.

use std::io;

/// Errors from the schema registry and schema document loader.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A definition with this name is already registered.
    #[error("schema already registered: {0}")]
    DuplicateSchema(String),

    /// No definition with this name is registered.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// The registry was frozen and no longer accepts registrations.
    #[error("schema registry is frozen, cannot register {0}")]
    RegistryFrozen(String),

    /// The named definition exists but is an enumeration, not an element.
    #[error("schema {0} is an enumeration, expected an element definition")]
    NotAnElement(String),

    /// The named definition exists but is an element, not an enumeration.
    #[error("schema {0} is an element definition, expected an enumeration")]
    NotAnEnum(String),

    /// A chain of references never reaches an element or leaf.
    #[error("cyclic reference chain starting at {0}")]
    CyclicReference(String),

    /// A definition violates a structural rule.
    #[error("invalid definition {name}: {reason}")]
    InvalidDefinition {
        /// Name of the offending definition or node.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The schema document is not valid JSON or has the wrong shape.
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema document could not be read.
    #[error("failed to read schema document: {0}")]
    Io(#[from] io::Error),
}

impl SchemaError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
