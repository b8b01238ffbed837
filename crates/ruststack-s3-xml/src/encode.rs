//! Schema-directed XML encoding.
//!
//! The encoder walks a [`Record`] and its schema in lock step. Every record
//! is checked against its schema node before anything is written for it, so
//! only conforming records produce output. Documents are written without
//! indentation; the declaration and root namespace follow [`CodecConfig`].

use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use ruststack_s3_schema::{LeafType, NodeKind, Occurrence, SchemaNode, SchemaRegistry};
use tracing::debug;

use crate::config::CodecConfig;
use crate::error::{EncodingError, XmlError};
use crate::leaf::{datetime_unwritable, format_value, value_matches};
use crate::record::{LeafValue, Record};

/// Encode `record` as a document rooted at `root`.
pub(crate) fn encode(
    registry: &SchemaRegistry,
    config: &CodecConfig,
    record: &Record,
    root: &Arc<SchemaNode>,
) -> Result<Bytes, XmlError> {
    let mut path = Vec::new();
    if record.name() != root.name() {
        return Err(EncodingError::mismatch(
            &[record.name().to_owned()],
            format!("expected root <{}>, found <{}>", root.name(), record.name()),
        )
        .into());
    }

    let mut encoder = Encoder {
        registry,
        namespace: config.namespace.as_deref(),
        writer: Writer::new(Vec::with_capacity(512)),
        elements: 0,
    };
    if config.write_declaration {
        encoder
            .writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| EncodingError::write(&path, e))?;
    }
    encoder.element(root, record, &mut path, true)?;

    let elements = encoder.elements;
    let buf = encoder.writer.into_inner();
    debug!(
        root = %root.name(),
        bytes = buf.len(),
        elements,
        "encoded XML document"
    );
    Ok(Bytes::from(buf))
}

struct Encoder<'a, W> {
    registry: &'a SchemaRegistry,
    namespace: Option<&'a str>,
    writer: Writer<W>,
    elements: usize,
}

impl<W: Write> Encoder<'_, W> {
    fn element(
        &mut self,
        node: &Arc<SchemaNode>,
        record: &Record,
        path: &mut Vec<String>,
        is_root: bool,
    ) -> Result<(), XmlError> {
        path.push(record.name().to_owned());
        let content = self.registry.content_of(node)?;

        let mut start = BytesStart::new(record.name());
        if is_root {
            if let Some(ns) = self.namespace {
                start.push_attribute(("xmlns", ns));
            }
        }

        match content.kind() {
            NodeKind::Leaf(leaf_type) => {
                let value = record.as_leaf().ok_or_else(|| {
                    EncodingError::mismatch(
                        path,
                        format!("expected {leaf_type} leaf, found structural record"),
                    )
                })?;
                self.check_leaf(value, leaf_type, path)?;
                self.write(path, Event::Start(start))?;
                let text = format_value(value);
                let event = match value {
                    LeafValue::String(_) => BytesText::new(text.as_ref()),
                    _ => BytesText::from_escaped(text.as_ref()),
                };
                if !text.is_empty() {
                    self.write(path, Event::Text(event))?;
                }
            }
            NodeKind::Element { .. } | NodeKind::Reference(_) => {
                if let Some(value) = record.as_leaf() {
                    return Err(EncodingError::mismatch(
                        path,
                        format!(
                            "expected structural element, found {} leaf",
                            value.type_name()
                        ),
                    )
                    .into());
                }
                self.write(path, Event::Start(start))?;
                self.children(&content, record, path)?;
            }
        }

        self.write(path, Event::End(BytesEnd::new(record.name())))?;
        self.elements += 1;
        path.pop();
        Ok(())
    }

    fn children(
        &mut self,
        model: &SchemaNode,
        record: &Record,
        path: &mut Vec<String>,
    ) -> Result<(), XmlError> {
        let items = record.children();
        let mut pos = 0;
        for child in model.children() {
            let run = items[pos..]
                .iter()
                .take_while(|r| r.name() == child.name())
                .count();
            match (child.occurrence(), run) {
                (Occurrence::Required, 0) => {
                    return Err(EncodingError::mismatch(
                        path,
                        format!("required element <{}> is missing", child.name()),
                    )
                    .into());
                }
                (Occurrence::Required | Occurrence::Optional, n) if n > 1 => {
                    return Err(EncodingError::mismatch(
                        path,
                        format!("<{}> appears {n} times, at most once allowed", child.name()),
                    )
                    .into());
                }
                _ => {}
            }
            for item in &items[pos..pos + run] {
                self.element(child, item, path, false)?;
            }
            pos += run;
        }

        if let Some(extra) = items.get(pos) {
            let detail = if model.child(extra.name()).is_some() {
                format!("<{}> is out of schema order", extra.name())
            } else {
                format!("<{}> is not declared in <{}>", extra.name(), record.name())
            };
            return Err(EncodingError::mismatch(path, detail).into());
        }
        Ok(())
    }

    fn check_leaf(
        &self,
        value: &LeafValue,
        leaf_type: &LeafType,
        path: &[String],
    ) -> Result<(), XmlError> {
        if !value_matches(value, leaf_type) {
            return Err(EncodingError::mismatch(
                path,
                format!("expected {leaf_type}, found {} value", value.type_name()),
            )
            .into());
        }
        if let LeafValue::DateTime(dt) = value {
            if let Some(reason) = datetime_unwritable(dt) {
                return Err(EncodingError::mismatch(
                    path,
                    format!("dateTime {dt} cannot be written exactly: {reason}"),
                )
                .into());
            }
        }
        if let (LeafType::Enum(enum_name), LeafValue::Enum(token)) = (leaf_type, value) {
            let allowed = self.registry.resolve_enum(enum_name)?;
            if !allowed.contains(token) {
                return Err(EncodingError::mismatch(
                    path,
                    format!(
                        "{token:?} is not a valid {enum_name}, expected one of: {}",
                        allowed.values().join(", ")
                    ),
                )
                .into());
            }
        }
        Ok(())
    }

    fn write(&mut self, path: &[String], event: Event<'_>) -> Result<(), EncodingError> {
        self.writer
            .write_event(event)
            .map_err(|e| EncodingError::write(path, e))
    }
}
