//! Error types for schema-directed decoding and encoding.
//!
//! Every document-level failure carries the element path from the root, so a
//! caller can report `kind at /Root/Child` without re-parsing the input.

use std::fmt;

use ruststack_s3_schema::SchemaError;

/// What went wrong while validating a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// An element not acceptable at this position.
    UnexpectedElement,
    /// A required element never appeared.
    MissingElement,
    /// Leaf text does not parse as the declared type.
    TypeMismatch,
    /// Leaf text is not a member of the declared enumeration.
    InvalidEnumValue,
    /// Non-whitespace text inside a structural element.
    UnexpectedText,
    /// The input is not well-formed XML.
    MalformedXml,
    /// Elements nest deeper than the configured limit.
    DepthExceeded,
}

impl ValidationErrorKind {
    /// Returns the string value of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnexpectedElement => "unexpected element",
            Self::MissingElement => "missing element",
            Self::TypeMismatch => "type mismatch",
            Self::InvalidEnumValue => "invalid enum value",
            Self::UnexpectedText => "unexpected text",
            Self::MalformedXml => "malformed XML",
            Self::DepthExceeded => "depth exceeded",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}: {detail}", display_path(.path))]
pub struct ValidationError {
    path: Vec<String>,
    kind: ValidationErrorKind,
    detail: String,
}

impl ValidationError {
    pub(crate) fn new(
        path: Vec<String>,
        kind: ValidationErrorKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind,
            detail: detail.into(),
        }
    }

    /// Element names from the document root to the failing element.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    /// Human-readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// What went wrong while encoding a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingErrorKind {
    /// The record does not have the shape the schema demands.
    SchemaMismatch,
    /// The XML writer failed.
    Write,
}

impl fmt::Display for EncodingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SchemaMismatch => "schema mismatch",
            Self::Write => "write failure",
        })
    }
}

/// A record could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}: {detail}", display_path(.path))]
pub struct EncodingError {
    path: Vec<String>,
    kind: EncodingErrorKind,
    detail: String,
}

impl EncodingError {
    pub(crate) fn mismatch(path: &[String], detail: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            kind: EncodingErrorKind::SchemaMismatch,
            detail: detail.into(),
        }
    }

    pub(crate) fn write(path: &[String], err: impl fmt::Display) -> Self {
        Self {
            path: path.to_vec(),
            kind: EncodingErrorKind::Write,
            detail: err.to_string(),
        }
    }

    /// Element names from the record root to the failing record.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Failure category.
    #[must_use]
    pub fn kind(&self) -> EncodingErrorKind {
        self.kind
    }

    /// Human-readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Errors returned by [`XmlCodec`](crate::XmlCodec) decode and encode calls.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The requested or referenced schema could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The input document is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl XmlError {
    /// The validation failure, if this is one.
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Schema(_) | Self::Encoding(_) => None,
        }
    }

    /// S3 error code used when reporting this error to a client.
    ///
    /// Documents the client sent that fail validation are `MalformedXML`;
    /// everything else is a server-side fault.
    #[must_use]
    pub fn s3_error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "MalformedXML",
            Self::Schema(_) | Self::Encoding(_) => "InternalError",
        }
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }
    let mut out = String::new();
    for segment in path {
        out.push('/');
        out.push_str(segment);
    }
    out
}
