//! Typed record trees.
//!
//! A [`Record`] mirrors one instantiation of a schema: an element name plus
//! either a scalar [`LeafValue`] or its child records in document order.
//! Records are plain immutable values; the decoder returns them and callers
//! build them for the encoder.

use chrono::{DateTime, Utc};

/// Scalar content of a leaf element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LeafValue {
    /// `xsd:string` text, unescaped.
    String(String),
    /// `xsd:int`.
    Int(i32),
    /// `xsd:long`.
    Long(i64),
    /// `xsd:boolean`.
    Bool(bool),
    /// `xsd:dateTime` in UTC.
    DateTime(DateTime<Utc>),
    /// Canonical token of an enumeration member.
    Enum(String),
}

impl LeafValue {
    /// Enumeration value.
    pub fn enumeration(token: impl Into<String>) -> Self {
        Self::Enum(token.into())
    }

    /// Text of a string or enum value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value, widening `Int` to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Timestamp value.
    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Bool(_) => "boolean",
            Self::DateTime(_) => "dateTime",
            Self::Enum(_) => "enum",
        }
    }
}

impl From<String> for LeafValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for LeafValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<i32> for LeafValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for LeafValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for LeafValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<DateTime<Utc>> for LeafValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

/// Content of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordValue {
    /// Scalar leaf content.
    Leaf(LeafValue),
    /// Child records in document order.
    Children(Vec<Record>),
}

/// One element of a typed document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    name: String,
    value: RecordValue,
}

impl Record {
    /// A leaf record.
    pub fn leaf(name: impl Into<String>, value: impl Into<LeafValue>) -> Self {
        Self {
            name: name.into(),
            value: RecordValue::Leaf(value.into()),
        }
    }

    /// A structural record with ordered children.
    pub fn element(name: impl Into<String>, children: impl IntoIterator<Item = Record>) -> Self {
        Self {
            name: name.into(),
            value: RecordValue::Children(children.into_iter().collect()),
        }
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record content.
    #[must_use]
    pub fn value(&self) -> &RecordValue {
        &self.value
    }

    /// Leaf content, if this is a leaf record.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafValue> {
        match &self.value {
            RecordValue::Leaf(v) => Some(v),
            RecordValue::Children(_) => None,
        }
    }

    /// Child records; empty for a leaf.
    #[must_use]
    pub fn children(&self) -> &[Record] {
        match &self.value {
            RecordValue::Children(c) => c,
            RecordValue::Leaf(_) => &[],
        }
    }

    /// First child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Record> {
        self.children().iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.children().iter().filter(move |c| c.name == name)
    }

    /// Leaf value of the first child with the given name.
    #[must_use]
    pub fn leaf_of(&self, name: &str) -> Option<&LeafValue> {
        self.child(name).and_then(Record::as_leaf)
    }

    /// Text of the first string or enum child with the given name.
    #[must_use]
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.leaf_of(name).and_then(LeafValue::as_str)
    }

    /// Total number of records in this tree, including `self`.
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Record::element_count)
            .sum::<usize>()
    }
}
