//! Codec configuration.
//!
//! Provides [`CodecConfig`] for tuning the XML codec. Values are loaded from
//! environment variables, following the same conventions as the RustStack
//! service configs.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Default maximum element nesting depth accepted by the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What the decoder does with elements its schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownElementPolicy {
    /// Fail with `UnexpectedElement`.
    #[default]
    Reject,
    /// Skip the element and its subtree, logging a warning.
    Skip,
}

impl UnknownElementPolicy {
    /// Parse `reject` / `skip` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("reject") {
            Some(Self::Reject)
        } else if value.eq_ignore_ascii_case("skip") {
            Some(Self::Skip)
        } else {
            None
        }
    }
}

/// XML codec configuration.
///
/// # Examples
///
/// ```
/// use ruststack_s3_xml::config::{CodecConfig, UnknownElementPolicy};
///
/// let config = CodecConfig::default();
/// assert_eq!(config.max_depth, 64);
/// assert_eq!(config.unknown_elements, UnknownElementPolicy::Reject);
/// assert!(config.write_declaration);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CodecConfig {
    /// Maximum element nesting depth accepted by the decoder.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Handling of undeclared elements while decoding.
    #[builder(default)]
    pub unknown_elements: UnknownElementPolicy,

    /// Whether encoded documents start with an XML declaration.
    #[builder(default = true)]
    pub write_declaration: bool,

    /// Default namespace written on the encoded root element.
    #[builder(default = Some(S3_NAMESPACE.to_owned()))]
    pub namespace: Option<String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            unknown_elements: UnknownElementPolicy::Reject,
            write_declaration: true,
            namespace: Some(S3_NAMESPACE.to_owned()),
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default kept:
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_XML_MAX_DEPTH` | `64` |
    /// | `S3_XML_UNKNOWN_ELEMENTS` | `reject` |
    /// | `S3_XML_WRITE_DECLARATION` | `true` |
    /// | `S3_XML_NAMESPACE` | S3 namespace (empty disables) |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("S3_XML_MAX_DEPTH") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_depth = n;
            }
        }
        if let Some(v) = lookup("S3_XML_UNKNOWN_ELEMENTS") {
            if let Some(policy) = UnknownElementPolicy::parse(&v) {
                config.unknown_elements = policy;
            }
        }
        if let Some(v) = lookup("S3_XML_WRITE_DECLARATION") {
            config.write_declaration = parse_bool(&v);
        }
        if let Some(v) = lookup("S3_XML_NAMESPACE") {
            config.namespace = if v.is_empty() { None } else { Some(v) };
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
