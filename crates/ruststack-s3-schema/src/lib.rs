//! Schema model and registry for RustStack S3 XML documents.
//!
//! This crate describes the structural shape of S3 XML bodies: element names,
//! ordering, occurrence, and leaf data types. The XML codec in
//! `ruststack-s3-xml` walks these schemas to validate, decode and encode
//! documents.
//!
//! # Key components
//!
//! - [`SchemaNode`], [`LeafType`], [`EnumType`]: the schema model
//! - [`SchemaRegistry`]: named, write-once-then-frozen definitions with lazy
//!   by-name reference resolution
//! - [`SchemaDocument`]: JSON schema documents loaded at startup
//! - [`builtin`]: the embedded S3 response schemas

pub mod builtin;
pub mod document;
pub mod error;
pub mod node;
pub mod registry;

pub use document::SchemaDocument;
pub use error::{SchemaError, SchemaResult};
pub use node::{Definition, EnumType, LeafType, NodeKind, Occurrence, SchemaNode};
pub use registry::SchemaRegistry;
