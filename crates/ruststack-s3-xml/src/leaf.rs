//! Leaf text codecs.
//!
//! Parsers here are strict: they accept exactly the lexical forms the encoder
//! produces (plus fractional-second variants of `dateTime`), so a decoded
//! value re-encodes to the same token.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use ruststack_s3_schema::LeafType;

use crate::record::LeafValue;

/// Parse an `xsd:int`: optional `-`, then ASCII digits, within `i32`.
#[must_use]
pub fn parse_int(s: &str) -> Option<i32> {
    if is_decimal(s) { s.parse().ok() } else { None }
}

/// Parse an `xsd:long`: optional `-`, then ASCII digits, within `i64`.
#[must_use]
pub fn parse_long(s: &str) -> Option<i64> {
    if is_decimal(s) { s.parse().ok() } else { None }
}

/// Parse an `xsd:boolean`; only lowercase `true` and `false` are accepted.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse a UTC timestamp of the form `YYYY-MM-DDTHH:MM:SS[.f]Z`.
///
/// The fraction, when present, has one to nine digits. Offsets other than
/// `Z` are rejected.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    const SHAPE: &[u8; 19] = b"dddd-dd-ddTdd:dd:dd";

    let bytes = s.as_bytes();
    let (last, body) = bytes.split_last()?;
    if *last != b'Z' || body.len() < SHAPE.len() {
        return None;
    }
    let (head, fraction) = body.split_at(SHAPE.len());
    let head_ok = head
        .iter()
        .zip(SHAPE)
        .all(|(c, p)| if *p == b'd' { c.is_ascii_digit() } else { c == p });
    if !head_ok {
        return None;
    }
    if let Some((dot, digits)) = fraction.split_first() {
        if *dot != b'.' || digits.is_empty() || digits.len() > 9 {
            return None;
        }
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Why `dt` has no exact `YYYY-MM-DDTHH:MM:SS.mmmZ` form, if it lacks one.
pub(crate) fn datetime_unwritable(dt: &DateTime<Utc>) -> Option<&'static str> {
    if !(0..=9999).contains(&dt.year()) {
        Some("year outside 0000-9999")
    } else if dt.timestamp_subsec_nanos() % 1_000_000 != 0 {
        Some("precision finer than milliseconds")
    } else {
        None
    }
}

/// Parse leaf text for every type except enumerations, which need the
/// registry and are handled by the decoder.
pub(crate) fn parse_scalar(text: &str, leaf_type: &LeafType) -> Option<LeafValue> {
    match leaf_type {
        LeafType::String => Some(LeafValue::String(text.to_owned())),
        LeafType::Int => parse_int(text).map(LeafValue::Int),
        LeafType::Long => parse_long(text).map(LeafValue::Long),
        LeafType::Boolean => parse_bool(text).map(LeafValue::Bool),
        LeafType::DateTime => parse_datetime(text).map(LeafValue::DateTime),
        LeafType::Enum(_) => None,
    }
}

/// Whether `value` is the variant `leaf_type` expects.
pub(crate) fn value_matches(value: &LeafValue, leaf_type: &LeafType) -> bool {
    matches!(
        (value, leaf_type),
        (LeafValue::String(_), LeafType::String)
            | (LeafValue::Int(_), LeafType::Int)
            | (LeafValue::Long(_), LeafType::Long)
            | (LeafValue::Bool(_), LeafType::Boolean)
            | (LeafValue::DateTime(_), LeafType::DateTime)
            | (LeafValue::Enum(_), LeafType::Enum(_))
    )
}

/// Text form of a leaf value, before any XML escaping.
pub(crate) fn format_value(value: &LeafValue) -> Cow<'_, str> {
    match value {
        LeafValue::String(s) | LeafValue::Enum(s) => Cow::Borrowed(s),
        LeafValue::Int(v) => Cow::Owned(v.to_string()),
        LeafValue::Long(v) => Cow::Owned(v.to_string()),
        LeafValue::Bool(v) => Cow::Borrowed(if *v { "true" } else { "false" }),
        LeafValue::DateTime(dt) => Cow::Owned(format_datetime(dt)),
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
