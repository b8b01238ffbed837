//! The shared codec handle.

use std::sync::Arc;

use bytes::Bytes;
use ruststack_s3_schema::builtin::{ERROR, s3_registry};
use ruststack_s3_schema::{SchemaNode, SchemaRegistry, SchemaResult};

use crate::config::CodecConfig;
use crate::error::XmlError;
use crate::record::Record;
use crate::{decode, encode};

/// A frozen schema registry plus codec settings.
///
/// Cloning is cheap and every operation takes `&self`, so one handle can be
/// shared by any number of threads.
///
/// # Examples
///
/// ```
/// use ruststack_s3_xml::{Record, XmlCodec};
///
/// let codec = XmlCodec::s3().unwrap();
/// let xml = b"<Error><Code>NoSuchUpload</Code><Message>gone</Message></Error>";
/// let record = codec.decode(xml, "Error").unwrap();
/// assert_eq!(record.text_of("Code"), Some("NoSuchUpload"));
///
/// let encoded = codec.encode(&record, "Error").unwrap();
/// assert_eq!(codec.decode(&encoded, "Error").unwrap(), record);
/// ```
#[derive(Debug, Clone)]
pub struct XmlCodec {
    registry: Arc<SchemaRegistry>,
    config: CodecConfig,
}

impl XmlCodec {
    /// Create a codec over `registry`, freezing it if it is not frozen yet.
    #[must_use]
    pub fn new(registry: Arc<SchemaRegistry>, config: CodecConfig) -> Self {
        registry.freeze();
        Self { registry, config }
    }

    /// A codec over the built-in S3 schemas, configured from the environment.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded schema document is broken.
    pub fn s3() -> SchemaResult<Self> {
        Ok(Self::new(s3_registry()?, CodecConfig::from_env()))
    }

    /// The schema registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The codec settings.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode and validate `xml` against the definition named `root_name`.
    ///
    /// # Errors
    ///
    /// `XmlError::Schema` if `root_name` or a reference cannot be resolved,
    /// `XmlError::Validation` at the first token that breaks the schema.
    pub fn decode(&self, xml: &[u8], root_name: &str) -> Result<Record, XmlError> {
        decode::decode(&self.registry, &self.config, xml, root_name)
    }

    /// Encode `record` as a document of the definition named `root_name`.
    ///
    /// # Errors
    ///
    /// `XmlError::Schema` for unresolvable names, `XmlError::Encoding` if the
    /// record does not match the schema.
    pub fn encode(&self, record: &Record, root_name: &str) -> Result<Bytes, XmlError> {
        let root = self.registry.resolve_element(root_name)?;
        encode::encode(&self.registry, &self.config, record, &root)
    }

    /// Encode `record` against an unregistered root node. References inside
    /// the node still resolve through the registry.
    ///
    /// # Errors
    ///
    /// Same as [`encode`](Self::encode).
    pub fn encode_node(&self, record: &Record, node: &SchemaNode) -> Result<Bytes, XmlError> {
        encode::encode(&self.registry, &self.config, record, &Arc::new(node.clone()))
    }

    /// Render `err` as an S3 `<Error>` body.
    ///
    /// S3 error bodies carry no namespace. Returns an empty body, after
    /// logging, if the registry has no usable `Error` definition.
    #[must_use]
    pub fn error_document(&self, err: &XmlError, resource: Option<&str>, request_id: &str) -> Bytes {
        let mut children = vec![
            Record::leaf("Code", err.s3_error_code()),
            Record::leaf("Message", err.to_string()),
        ];
        children.extend(resource.map(|r| Record::leaf("Resource", r)));
        children.push(Record::leaf("RequestId", request_id));
        let record = Record::element(ERROR, children);

        let config = CodecConfig {
            namespace: None,
            ..self.config.clone()
        };
        let rendered = self
            .registry
            .resolve_element(ERROR)
            .map_err(XmlError::from)
            .and_then(|root| encode::encode(&self.registry, &config, &record, &root));
        match rendered {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize S3 error XML");
                Bytes::new()
            }
        }
    }
}
