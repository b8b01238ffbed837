//! Schema-directed XML decoding.
//!
//! The decoder is a pushdown automaton over the quick-xml event stream. Each
//! open element has a frame holding its content model, the position reached
//! in the model's ordered children, and the records decoded so far. Every
//! token is checked against the schema as it arrives, so an invalid document
//! is rejected at the first offending token and no generic DOM is built.
//! Memory is bounded by nesting depth, not document size.

use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};
use ruststack_s3_schema::{LeafType, NodeKind, SchemaNode, SchemaRegistry};
use tracing::{debug, warn};

use crate::config::{CodecConfig, UnknownElementPolicy};
use crate::error::{ValidationError, ValidationErrorKind, XmlError};
use crate::leaf::parse_scalar;
use crate::record::{LeafValue, Record};

/// Decode `xml` against the element definition registered as `root_name`.
pub(crate) fn decode(
    registry: &SchemaRegistry,
    config: &CodecConfig,
    xml: &[u8],
    root_name: &str,
) -> Result<Record, XmlError> {
    let root = registry.resolve_element(root_name)?;
    let mut state = DecodeState {
        registry,
        config,
        root,
        stack: Vec::new(),
        result: None,
        skip_depth: 0,
        elements: 0,
    };

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    loop {
        let event = reader
            .read_event()
            .map_err(|e| state.error(None, ValidationErrorKind::MalformedXml, e.to_string()))?;

        if state.skip_depth > 0 {
            match event {
                Event::Start(_) => state.skip_depth += 1,
                Event::End(_) => state.skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                let tag = state.tag_name(e.local_name().as_ref())?;
                state.start(&tag)?;
            }
            Event::Empty(e) => {
                let tag = state.tag_name(e.local_name().as_ref())?;
                state.start(&tag)?;
                if state.skip_depth > 0 {
                    state.skip_depth = 0;
                } else {
                    state.end()?;
                }
            }
            Event::End(_) => state.end()?,
            Event::Text(e) => {
                let decoded = e.decode().map_err(|err| {
                    state.error(None, ValidationErrorKind::MalformedXml, err.to_string())
                })?;
                let text = quick_xml::escape::unescape(&decoded).map_err(|err| {
                    state.error(None, ValidationErrorKind::MalformedXml, err.to_string())
                })?;
                state.text(&text)?;
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(|err| {
                    state.error(None, ValidationErrorKind::MalformedXml, err.to_string())
                })?;
                state.text(text)?;
            }
            Event::GeneralRef(e) => {
                let text = resolve_reference(&e).map_err(|detail| {
                    state.error(None, ValidationErrorKind::MalformedXml, detail)
                })?;
                state.text(&text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    let record = state.finish()?;
    debug!(
        root = %root_name,
        bytes = xml.len(),
        elements = state.elements,
        "decoded XML document"
    );
    Ok(record)
}

/// Resolve a character or predefined entity reference.
fn resolve_reference(e: &BytesRef<'_>) -> Result<String, String> {
    if let Some(ch) = e.resolve_char_ref().map_err(|err| err.to_string())? {
        return Ok(ch.to_string());
    }
    let name = e.decode().map_err(|err| err.to_string())?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_owned)
        .ok_or_else(|| format!("unknown entity reference &{name};"))
}

fn is_xml_whitespace(text: &str) -> bool {
    text.bytes()
        .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// One open element.
struct Frame {
    name: String,
    content: FrameContent,
}

enum FrameContent {
    /// Structural element: `model` supplies the ordered children, `index` is
    /// the schema child last matched and `count` how often it matched.
    Element {
        model: Arc<SchemaNode>,
        index: usize,
        count: usize,
        children: Vec<Record>,
    },
    /// Leaf element accumulating text.
    Leaf { leaf_type: LeafType, text: String },
}

/// Outcome of matching a start tag against the current frame.
enum Step {
    Enter {
        child: Arc<SchemaNode>,
        index: usize,
        count: usize,
    },
    Skip,
}

struct DecodeState<'a> {
    registry: &'a SchemaRegistry,
    config: &'a CodecConfig,
    root: Arc<SchemaNode>,
    stack: Vec<Frame>,
    result: Option<Record>,
    skip_depth: usize,
    elements: usize,
}

impl DecodeState<'_> {
    fn path(&self, extra: Option<&str>) -> Vec<String> {
        self.stack
            .iter()
            .map(|f| f.name.clone())
            .chain(extra.map(str::to_owned))
            .collect()
    }

    fn error(
        &self,
        extra: Option<&str>,
        kind: ValidationErrorKind,
        detail: impl Into<String>,
    ) -> ValidationError {
        ValidationError::new(self.path(extra), kind, detail)
    }

    fn tag_name(&self, raw: &[u8]) -> Result<String, ValidationError> {
        std::str::from_utf8(raw).map(str::to_owned).map_err(|e| {
            self.error(
                None,
                ValidationErrorKind::MalformedXml,
                format!("element name is not UTF-8: {e}"),
            )
        })
    }

    fn start(&mut self, tag: &str) -> Result<(), XmlError> {
        if self.stack.is_empty() {
            return self.start_root(tag);
        }

        match self.locate(tag)? {
            Step::Enter {
                child,
                index,
                count,
            } => {
                if let Some(Frame {
                    content:
                        FrameContent::Element {
                            index: cur_index,
                            count: cur_count,
                            ..
                        },
                    ..
                }) = self.stack.last_mut()
                {
                    *cur_index = index;
                    *cur_count = count;
                }
                self.push(&child)
            }
            Step::Skip => {
                warn!(
                    element = %tag,
                    parent = self.stack.last().map_or("", |f| f.name.as_str()),
                    "skipping undeclared element"
                );
                self.skip_depth = 1;
                Ok(())
            }
        }
    }

    fn start_root(&mut self, tag: &str) -> Result<(), XmlError> {
        if self.result.is_some() {
            return Err(self
                .error(
                    Some(tag),
                    ValidationErrorKind::MalformedXml,
                    "document has more than one root element",
                )
                .into());
        }
        if tag != self.root.name() {
            return Err(self
                .error(
                    Some(tag),
                    ValidationErrorKind::UnexpectedElement,
                    format!("expected root <{}>, found <{tag}>", self.root.name()),
                )
                .into());
        }
        let root = Arc::clone(&self.root);
        self.push(&root)
    }

    /// Match `tag` against the children of the current frame's model.
    fn locate(&self, tag: &str) -> Result<Step, ValidationError> {
        let Some(frame) = self.stack.last() else {
            return Err(self.error(Some(tag), ValidationErrorKind::MalformedXml, "no open element"));
        };
        let (model, index, count) = match &frame.content {
            FrameContent::Element {
                model,
                index,
                count,
                ..
            } => (model, *index, *count),
            FrameContent::Leaf { leaf_type, .. } => {
                return Err(self.error(
                    Some(tag),
                    ValidationErrorKind::UnexpectedElement,
                    format!(
                        "<{}> holds {leaf_type} text, found child element <{tag}>",
                        frame.name
                    ),
                ));
            }
        };

        let children = model.children();
        let mut first_missing: Option<&Arc<SchemaNode>> = None;
        let mut seen = count;
        for (i, child) in children.iter().enumerate().skip(index) {
            let can_take = seen == 0 || child.occurrence().is_repeatable();
            if can_take && child.name() == tag {
                if let Some(missing) = first_missing {
                    return Err(self.error(
                        None,
                        ValidationErrorKind::MissingElement,
                        format!(
                            "required element <{}> not found before <{tag}>",
                            missing.name()
                        ),
                    ));
                }
                return Ok(Step::Enter {
                    child: Arc::clone(child),
                    index: i,
                    count: seen + 1,
                });
            }
            if first_missing.is_none() && seen == 0 && child.occurrence().is_required() {
                first_missing = Some(child);
            }
            seen = 0;
        }

        if self.config.unknown_elements == UnknownElementPolicy::Skip && model.child(tag).is_none()
        {
            return Ok(Step::Skip);
        }

        let expected = expected_names(children, index, count);
        let detail = if expected.is_empty() {
            format!("<{tag}> not allowed, <{}> accepts no further elements", frame.name)
        } else {
            format!("<{tag}> not allowed here, expected one of: {}", expected.join(", "))
        };
        Err(self.error(Some(tag), ValidationErrorKind::UnexpectedElement, detail))
    }

    fn push(&mut self, node: &Arc<SchemaNode>) -> Result<(), XmlError> {
        if self.stack.len() >= self.config.max_depth {
            return Err(self
                .error(
                    Some(node.name()),
                    ValidationErrorKind::DepthExceeded,
                    format!("nesting exceeds {} levels", self.config.max_depth),
                )
                .into());
        }
        let content = self.registry.content_of(node)?;
        let frame_content = match content.kind() {
            NodeKind::Leaf(leaf_type) => FrameContent::Leaf {
                leaf_type: leaf_type.clone(),
                text: String::new(),
            },
            NodeKind::Element { .. } | NodeKind::Reference(_) => FrameContent::Element {
                model: content,
                index: 0,
                count: 0,
                children: Vec::new(),
            },
        };
        self.stack.push(Frame {
            name: node.name().to_owned(),
            content: frame_content,
        });
        self.elements += 1;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), XmlError> {
        if let Some(Frame {
            content: FrameContent::Leaf { text: buf, .. },
            ..
        }) = self.stack.last_mut()
        {
            buf.push_str(text);
            return Ok(());
        }
        if is_xml_whitespace(text) {
            return Ok(());
        }
        let err = if self.stack.is_empty() {
            self.error(
                None,
                ValidationErrorKind::MalformedXml,
                "text outside the root element",
            )
        } else {
            self.error(
                None,
                ValidationErrorKind::UnexpectedText,
                format!("structural element contains text {:?}", truncate(text)),
            )
        };
        Err(err.into())
    }

    fn end(&mut self) -> Result<(), XmlError> {
        let Some(frame) = self.stack.pop() else {
            return Err(self
                .error(None, ValidationErrorKind::MalformedXml, "unmatched end tag")
                .into());
        };

        let record = match frame.content {
            FrameContent::Leaf { leaf_type, text } => {
                let value = self.parse_leaf(&frame.name, &leaf_type, text)?;
                Record::leaf(frame.name, value)
            }
            FrameContent::Element {
                model,
                index,
                count,
                children,
            } => {
                if let Some(missing) = first_unmet(&model, index, count) {
                    return Err(self
                        .error(
                            Some(&frame.name),
                            ValidationErrorKind::MissingElement,
                            format!(
                                "required element <{}> not found in <{}>",
                                missing.name(),
                                frame.name
                            ),
                        )
                        .into());
                }
                Record::element(frame.name, children)
            }
        };

        match self.stack.last_mut() {
            Some(Frame {
                content: FrameContent::Element { children, .. },
                ..
            }) => children.push(record),
            // Leaf frames never hold child frames.
            Some(_) => {}
            None => self.result = Some(record),
        }
        Ok(())
    }

    fn parse_leaf(
        &self,
        name: &str,
        leaf_type: &LeafType,
        text: String,
    ) -> Result<LeafValue, XmlError> {
        if let LeafType::Enum(enum_name) = leaf_type {
            let allowed = self.registry.resolve_enum(enum_name)?;
            return match allowed.canonical(&text) {
                Some(token) => Ok(LeafValue::Enum(token.to_owned())),
                None => Err(self
                    .error(
                        Some(name),
                        ValidationErrorKind::InvalidEnumValue,
                        format!(
                            "{:?} is not a valid {enum_name}, expected one of: {}",
                            truncate(&text),
                            allowed.values().join(", ")
                        ),
                    )
                    .into()),
            };
        }
        if let LeafType::String = leaf_type {
            return Ok(LeafValue::String(text));
        }
        parse_scalar(&text, leaf_type).ok_or_else(|| {
            self.error(
                Some(name),
                ValidationErrorKind::TypeMismatch,
                format!("expected {leaf_type}, found {:?}", truncate(&text)),
            )
            .into()
        })
    }

    fn finish(&mut self) -> Result<Record, XmlError> {
        if let Some(open) = self.stack.last() {
            return Err(self
                .error(
                    None,
                    ValidationErrorKind::MalformedXml,
                    format!("document ended inside <{}>", open.name),
                )
                .into());
        }
        if self.skip_depth > 0 {
            return Err(self
                .error(
                    None,
                    ValidationErrorKind::MalformedXml,
                    "document ended inside a skipped element",
                )
                .into());
        }
        self.result.take().ok_or_else(|| {
            self.error(
                None,
                ValidationErrorKind::MalformedXml,
                "document has no root element",
            )
            .into()
        })
    }
}

/// Names acceptable as the next start tag, in schema order.
fn expected_names(children: &[Arc<SchemaNode>], index: usize, count: usize) -> Vec<&str> {
    let mut names = Vec::new();
    let mut seen = count;
    for child in children.iter().skip(index) {
        if seen == 0 || child.occurrence().is_repeatable() {
            names.push(child.name());
        }
        if seen == 0 && child.occurrence().is_required() {
            break;
        }
        seen = 0;
    }
    names
}

/// First required child at or after `index` that has not been matched.
fn first_unmet(model: &SchemaNode, index: usize, count: usize) -> Option<&Arc<SchemaNode>> {
    model
        .children()
        .iter()
        .enumerate()
        .skip(index)
        .find(|(i, child)| child.occurrence().is_required() && !(*i == index && count > 0))
        .map(|(_, child)| child)
}

fn truncate(text: &str) -> &str {
    const LIMIT: usize = 64;
    match text.char_indices().nth(LIMIT) {
        Some((at, _)) => &text[..at],
        None => text,
    }
}
