//! JSON schema documents.
//!
//! Schema definitions are configuration: they are declared in a JSON document
//! (embedded in the binary or read from disk) and loaded into a
//! [`SchemaRegistry`] once at startup.
//!
//! ```json
//! { "definitions": [
//!   { "name": "EncodingType", "enum": ["url"] },
//!   { "name": "CommonPrefixes", "element": {
//!       "name": "CommonPrefixes",
//!       "children": [ { "name": "Prefix", "type": "string" } ] } }
//! ] }
//! ```
//!
//! A node has exactly one of `type`, `ref` or `children`. `occurrence` is one
//! of `required` (default), `optional`, `zeroOrMore`. Enum leaves use
//! `"type": "enum"` together with `"enum": "<EnumName>"`.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SchemaError, SchemaResult};
use crate::node::{Definition, EnumType, LeafType, Occurrence, SchemaNode};
use crate::registry::SchemaRegistry;

/// Top-level schema document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Definitions in declaration order.
    pub definitions: Vec<DefinitionDoc>,
}

/// A named definition: either an element tree or an enumeration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionDoc {
    /// Registry name.
    pub name: String,
    /// Element tree, for structural definitions.
    #[serde(default)]
    pub element: Option<NodeDoc>,
    /// Allowed values, for enumerations.
    #[serde(default, rename = "enum")]
    pub values: Option<Vec<String>>,
}

/// One node of an element tree.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDoc {
    /// Element name.
    pub name: String,
    /// Occurrence among siblings.
    #[serde(default)]
    pub occurrence: Occurrence,
    /// Leaf type, for text leaves.
    #[serde(default, rename = "type")]
    pub leaf_type: Option<LeafTypeDoc>,
    /// Enumeration name, for `"type": "enum"` leaves.
    #[serde(default, rename = "enum")]
    pub enum_name: Option<String>,
    /// Referenced definition, for reference nodes.
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    /// Ordered children, for element nodes.
    #[serde(default)]
    pub children: Option<Vec<NodeDoc>>,
}

/// Leaf type tokens accepted in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeafTypeDoc {
    /// `xsd:string`.
    String,
    /// `xsd:int`.
    Int,
    /// `xsd:long`.
    Long,
    /// `xsd:boolean`.
    Boolean,
    /// `xsd:dateTime`.
    DateTime,
    /// Named enumeration.
    Enum,
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// `Json` if the text is not a well-formed schema document.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Json` if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Register every definition into `registry`, returning how many were added.
    ///
    /// All definitions are converted before any is registered, and the
    /// registration is all or nothing.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` for a malformed node, plus any registration error.
    pub fn register_into(self, registry: &SchemaRegistry) -> SchemaResult<usize> {
        let definitions = self
            .definitions
            .into_iter()
            .map(DefinitionDoc::into_definition)
            .collect::<SchemaResult<Vec<_>>>()?;
        registry.register_all(definitions)
    }
}

impl DefinitionDoc {
    fn into_definition(self) -> SchemaResult<(String, Definition)> {
        let definition = match (self.element, self.values) {
            (Some(node), None) => Definition::from(node.into_node()?),
            (None, Some(values)) => Definition::from(EnumType::new(self.name.clone(), values)?),
            _ => {
                return Err(SchemaError::invalid(
                    self.name,
                    "definition needs exactly one of \"element\" or \"enum\"",
                ));
            }
        };
        Ok((self.name, definition))
    }
}

impl NodeDoc {
    /// Convert into a [`SchemaNode`].
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` if the node does not carry exactly one content kind
    /// or an enum leaf lacks its enumeration name.
    pub fn into_node(self) -> SchemaResult<SchemaNode> {
        let Self {
            name,
            occurrence,
            leaf_type,
            enum_name,
            reference,
            children,
        } = self;

        let node = match (leaf_type, reference, children) {
            (Some(t), None, None) => {
                let leaf = match (t, enum_name) {
                    (LeafTypeDoc::Enum, Some(e)) => LeafType::Enum(e),
                    (LeafTypeDoc::Enum, None) => {
                        return Err(SchemaError::invalid(name, "enum leaf needs \"enum\""));
                    }
                    (_, Some(_)) => {
                        return Err(SchemaError::invalid(
                            name,
                            "\"enum\" is only valid with \"type\": \"enum\"",
                        ));
                    }
                    (LeafTypeDoc::String, None) => LeafType::String,
                    (LeafTypeDoc::Int, None) => LeafType::Int,
                    (LeafTypeDoc::Long, None) => LeafType::Long,
                    (LeafTypeDoc::Boolean, None) => LeafType::Boolean,
                    (LeafTypeDoc::DateTime, None) => LeafType::DateTime,
                };
                SchemaNode::leaf(name, leaf)
            }
            (None, Some(target), None) if enum_name.is_none() => {
                SchemaNode::reference(name, target)
            }
            (None, None, Some(children)) if enum_name.is_none() => {
                let children = children
                    .into_iter()
                    .map(NodeDoc::into_node)
                    .collect::<SchemaResult<Vec<_>>>()?;
                SchemaNode::element(name, children)
            }
            _ => {
                return Err(SchemaError::invalid(
                    name,
                    "node needs exactly one of \"type\", \"ref\" or \"children\"",
                ));
            }
        };
        Ok(node.with_occurrence(occurrence))
    }
}
