//! Built-in S3 response schemas.
//!
//! The definitions live in `schemas/s3.json` and are embedded at compile time.

use std::sync::Arc;

use crate::document::SchemaDocument;
use crate::error::SchemaResult;
use crate::registry::SchemaRegistry;

/// The embedded S3 schema document.
pub const S3_SCHEMAS: &str = include_str!("../schemas/s3.json");

/// Root definition name for `ListMultipartUploads` responses.
pub const LIST_MULTIPART_UPLOADS_RESULT: &str = "ListMultipartUploadsResult";

/// Root definition name for `ListParts` responses.
pub const LIST_PARTS_RESULT: &str = "ListPartsResult";

/// Root definition name for S3 error bodies.
pub const ERROR: &str = "Error";

/// Register the built-in S3 definitions into an existing registry.
///
/// Used when callers add their own definitions next to the built-in ones
/// before freezing.
///
/// # Errors
///
/// Fails if a built-in name is already registered or the registry is frozen.
pub fn register_s3_schemas(registry: &SchemaRegistry) -> SchemaResult<usize> {
    SchemaDocument::from_json(S3_SCHEMAS)?.register_into(registry)
}

/// A frozen registry holding only the built-in S3 definitions.
///
/// # Errors
///
/// Only fails if the embedded document is broken.
pub fn s3_registry() -> SchemaResult<Arc<SchemaRegistry>> {
    let registry = SchemaRegistry::new();
    register_s3_schemas(&registry)?;
    registry.freeze();
    Ok(Arc::new(registry))
}
