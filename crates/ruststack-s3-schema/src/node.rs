//! In-memory schema model.
//!
//! A schema is a tree of [`SchemaNode`]s. Each node names one XML element,
//! states how often it may occur among its siblings, and describes its
//! content: ordered child elements, a typed text leaf, or a by-name reference
//! to another registered definition. References are never expanded into the
//! tree, so self-referential and mutually-referential definitions are plain
//! data.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

/// How many times an element may appear at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Occurrence {
    /// Exactly once.
    #[default]
    Required,
    /// Zero or one time.
    Optional,
    /// Any number of times, in document order.
    ZeroOrMore,
}

impl Occurrence {
    /// Whether the element may appear more than once.
    #[must_use]
    pub fn is_repeatable(self) -> bool {
        matches!(self, Self::ZeroOrMore)
    }

    /// Whether the element must appear at least once.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }

    /// Returns the string value of this occurrence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::ZeroOrMore => "zeroOrMore",
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar type of a leaf element's text content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeafType {
    /// `xsd:string`.
    String,
    /// `xsd:int`, a 32-bit signed integer.
    Int,
    /// `xsd:long`, a 64-bit signed integer.
    Long,
    /// `xsd:boolean`, exactly `true` or `false`.
    Boolean,
    /// `xsd:dateTime` restricted to UTC with a `Z` suffix.
    DateTime,
    /// A registered enumeration, referenced by name.
    Enum(String),
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Boolean => f.write_str("boolean"),
            Self::DateTime => f.write_str("dateTime"),
            Self::Enum(name) => write!(f, "enum {name}"),
        }
    }
}

/// Content model of a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Ordered child elements. Sequencing is positional.
    Element {
        /// Children in wire order.
        children: Vec<Arc<SchemaNode>>,
    },
    /// Typed text content.
    Leaf(LeafType),
    /// Content is the named definition, looked up at use time.
    Reference(String),
}

/// One element declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    name: String,
    occurrence: Occurrence,
    kind: NodeKind,
}

impl SchemaNode {
    /// An element with ordered children.
    pub fn element(name: impl Into<String>, children: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self {
            name: name.into(),
            occurrence: Occurrence::Required,
            kind: NodeKind::Element {
                children: children.into_iter().map(Arc::new).collect(),
            },
        }
    }

    /// A leaf element with typed text content.
    pub fn leaf(name: impl Into<String>, leaf_type: LeafType) -> Self {
        Self {
            name: name.into(),
            occurrence: Occurrence::Required,
            kind: NodeKind::Leaf(leaf_type),
        }
    }

    /// An element whose content is the definition registered as `ref_name`.
    pub fn reference(name: impl Into<String>, ref_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occurrence: Occurrence::Required,
            kind: NodeKind::Reference(ref_name.into()),
        }
    }

    /// Set the occurrence of this node.
    #[must_use]
    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = occurrence;
        self
    }

    /// Mark this node optional.
    #[must_use]
    pub fn optional(self) -> Self {
        self.with_occurrence(Occurrence::Optional)
    }

    /// Mark this node repeatable.
    #[must_use]
    pub fn zero_or_more(self) -> Self {
        self.with_occurrence(Occurrence::ZeroOrMore)
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Occurrence among siblings.
    #[must_use]
    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    /// Content model.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Ordered children, empty unless this is an `Element` node.
    #[must_use]
    pub fn children(&self) -> &[Arc<SchemaNode>] {
        match &self.kind {
            NodeKind::Element { children } => children,
            NodeKind::Leaf(_) | NodeKind::Reference(_) => &[],
        }
    }

    /// Find the first child with the given element name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Check the structural rules of this subtree.
    pub(crate) fn check(&self) -> SchemaResult<()> {
        if self.name.is_empty() {
            return Err(SchemaError::invalid("<unnamed>", "element name is empty"));
        }
        match &self.kind {
            NodeKind::Element { children } => children.iter().try_for_each(|c| c.check()),
            NodeKind::Leaf(LeafType::Enum(e)) | NodeKind::Reference(e) if e.is_empty() => Err(
                SchemaError::invalid(&self.name, "referenced definition name is empty"),
            ),
            NodeKind::Leaf(_) | NodeKind::Reference(_) => Ok(()),
        }
    }
}

/// A named enumeration of canonical string tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    name: String,
    values: Vec<String>,
}

impl EnumType {
    /// Create an enumeration.
    ///
    /// # Errors
    ///
    /// Fails if the set is empty, or a value is empty, repeated, or contains a
    /// character that would need XML escaping.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> SchemaResult<Self> {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SchemaError::invalid(name, "enumeration has no values"));
        }
        for (i, v) in values.iter().enumerate() {
            if v.is_empty() {
                return Err(SchemaError::invalid(name, "enumeration value is empty"));
            }
            if v.contains(['&', '<', '>', '\'', '"']) {
                return Err(SchemaError::invalid(
                    name,
                    format!("enumeration value {v:?} contains an XML special character"),
                ));
            }
            if values[..i].contains(v) {
                return Err(SchemaError::invalid(
                    name,
                    format!("enumeration value {v:?} is repeated"),
                ));
            }
        }
        Ok(Self { name, values })
    }

    /// Enumeration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allowed values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether `value` is a member of the set.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Return the canonical `&str` stored for `value`, if it is a member.
    #[must_use]
    pub fn canonical(&self, value: &str) -> Option<&str> {
        self.values.iter().find(|v| *v == value).map(String::as_str)
    }
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// A structural definition usable as a document root or reference target.
    Element(Arc<SchemaNode>),
    /// An enumeration usable by `LeafType::Enum` leaves.
    Enum(Arc<EnumType>),
}

impl From<SchemaNode> for Definition {
    fn from(node: SchemaNode) -> Self {
        Self::Element(Arc::new(node))
    }
}

impl From<EnumType> for Definition {
    fn from(e: EnumType) -> Self {
        Self::Enum(Arc::new(e))
    }
}
