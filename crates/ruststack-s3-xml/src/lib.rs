//! Schema-directed XML codec for `RustStack` S3.
//!
//! This crate validates, decodes and encodes S3 XML bodies against the
//! schemas held in a [`ruststack_s3_schema::SchemaRegistry`]. Decoding streams
//! over quick-xml events and checks each token against the schema as it
//! arrives; the result is a typed [`Record`] tree. Encoding walks a record and
//! its schema in lock step and only produces output for conforming records.
//!
//! # Key components
//!
//! - [`XmlCodec`]: the shared handle (frozen registry plus [`CodecConfig`])
//! - [`Record`] / [`LeafValue`]: typed document trees
//! - [`next_request`] / [`next_parts_request`]: marker-based pagination cursors
//! - [`ValidationError`], [`EncodingError`], [`PaginationError`]: path-carrying
//!   error types
//!
//! # S3 XML conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 UTC (`2006-02-03T16:45:09.000Z`)
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

pub mod codec;
pub mod config;
mod decode;
mod encode;
pub mod error;
pub mod leaf;
pub mod pagination;
pub mod record;

pub use codec::XmlCodec;
pub use config::{CodecConfig, S3_NAMESPACE, UnknownElementPolicy};
pub use error::{EncodingError, EncodingErrorKind, ValidationError, ValidationErrorKind, XmlError};
pub use pagination::{
    ContinuationParams, PaginationError, PaginationState, PartsContinuation, next_parts_request,
    next_request,
};
pub use record::{LeafValue, Record, RecordValue};
