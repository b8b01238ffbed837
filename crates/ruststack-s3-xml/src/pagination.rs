//! Marker-based pagination over decoded listing records.
//!
//! A truncated `ListMultipartUploadsResult` echoes the key and upload id to
//! resume from in `NextKeyMarker` / `NextUploadIdMarker`; a truncated
//! `ListPartsResult` carries `NextPartNumberMarker`. The helpers here turn a
//! decoded record into the parameters of the follow-up request.
//!
//! A record that passed schema validation can still be logically
//! inconsistent, for example truncated without a next marker. Those cases are
//! reported as [`PaginationError`], never as a validation failure.

use crate::record::{LeafValue, Record};

/// Logical pagination inconsistencies in an otherwise valid listing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The listing is truncated but lacks the marker needed to continue.
    #[error("listing is truncated but {0} is absent")]
    MissingContinuation(&'static str),

    /// The record carries no `IsTruncated` field.
    #[error("<{0}> is not a paginated listing")]
    NotAListing(String),

    /// A pagination field holds an unexpected value type.
    #[error("{field} must be {expected}, found {found}")]
    TypeMismatch {
        /// Field name.
        field: &'static str,
        /// Expected value type.
        expected: &'static str,
        /// Actual value type.
        found: &'static str,
    },
}

/// Marker pair for the next `ListMultipartUploads` request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationParams {
    /// Value for the `key-marker` query parameter.
    pub key_marker: String,
    /// Value for the `upload-id-marker` query parameter.
    pub upload_id_marker: String,
}

impl ContinuationParams {
    /// Render as a URL query string.
    ///
    /// ```
    /// use ruststack_s3_xml::ContinuationParams;
    ///
    /// let params = ContinuationParams {
    ///     key_marker: "photos/a b.jpg".to_owned(),
    ///     upload_id_marker: "u123".to_owned(),
    /// };
    /// assert_eq!(
    ///     params.to_query_string(),
    ///     "key-marker=photos%2Fa+b.jpg&upload-id-marker=u123"
    /// );
    /// ```
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("key-marker", &self.key_marker)
            .append_pair("upload-id-marker", &self.upload_id_marker)
            .finish()
    }
}

/// Marker for the next `ListParts` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartsContinuation {
    /// Value for the `part-number-marker` query parameter.
    pub part_number_marker: i32,
}

impl PartsContinuation {
    /// Render as a URL query string.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("part-number-marker", &self.part_number_marker.to_string())
            .finish()
    }
}

/// Pagination fields of a decoded `ListMultipartUploadsResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    /// Whether more results follow.
    pub is_truncated: bool,
    /// Key marker the listing started after.
    pub key_marker: Option<String>,
    /// Upload id marker the listing started after.
    pub upload_id_marker: Option<String>,
    /// Key to resume from.
    pub next_key_marker: Option<String>,
    /// Upload id to resume from.
    pub next_upload_id_marker: Option<String>,
    /// Page size requested.
    pub max_uploads: Option<i32>,
    /// Number of `Upload` entries in this page.
    pub upload_count: usize,
    /// Number of `CommonPrefixes` entries in this page.
    pub common_prefix_count: usize,
}

impl PaginationState {
    /// Read the pagination fields of `record`.
    ///
    /// # Errors
    ///
    /// `NotAListing` without `IsTruncated`, `TypeMismatch` if a field has the
    /// wrong value type.
    pub fn from_record(record: &Record) -> Result<Self, PaginationError> {
        Ok(Self {
            is_truncated: is_truncated(record)?,
            key_marker: string_field(record, "KeyMarker")?,
            upload_id_marker: string_field(record, "UploadIdMarker")?,
            next_key_marker: string_field(record, "NextKeyMarker")?,
            next_upload_id_marker: string_field(record, "NextUploadIdMarker")?,
            max_uploads: int_field(record, "MaxUploads")?,
            upload_count: record.children_named("Upload").count(),
            common_prefix_count: record.children_named("CommonPrefixes").count(),
        })
    }

    /// Parameters of the next request, or `None` once the listing is complete.
    ///
    /// An empty next marker counts as absent: resuming from it would restart
    /// the listing.
    ///
    /// # Errors
    ///
    /// `MissingContinuation` when truncated without both next markers.
    pub fn continuation(&self) -> Result<Option<ContinuationParams>, PaginationError> {
        if !self.is_truncated {
            return Ok(None);
        }
        let key_marker = non_empty(self.next_key_marker.as_deref())
            .ok_or(PaginationError::MissingContinuation("NextKeyMarker"))?;
        let upload_id_marker = non_empty(self.next_upload_id_marker.as_deref())
            .ok_or(PaginationError::MissingContinuation("NextUploadIdMarker"))?;
        Ok(Some(ContinuationParams {
            key_marker: key_marker.to_owned(),
            upload_id_marker: upload_id_marker.to_owned(),
        }))
    }
}

/// Continuation parameters for a decoded `ListMultipartUploadsResult`.
///
/// Returns `None` when `IsTruncated` is `false`, whatever the marker fields
/// hold.
///
/// # Errors
///
/// See [`PaginationState::from_record`] and
/// [`PaginationState::continuation`].
pub fn next_request(record: &Record) -> Result<Option<ContinuationParams>, PaginationError> {
    PaginationState::from_record(record)?.continuation()
}

/// Continuation marker for a decoded `ListPartsResult`.
///
/// # Errors
///
/// `NotAListing` without `IsTruncated`, `MissingContinuation` when truncated
/// without `NextPartNumberMarker`, `TypeMismatch` for wrongly typed fields.
pub fn next_parts_request(record: &Record) -> Result<Option<PartsContinuation>, PaginationError> {
    if !is_truncated(record)? {
        return Ok(None);
    }
    let part_number_marker = int_field(record, "NextPartNumberMarker")?
        .ok_or(PaginationError::MissingContinuation("NextPartNumberMarker"))?;
    Ok(Some(PartsContinuation { part_number_marker }))
}

fn non_empty(marker: Option<&str>) -> Option<&str> {
    marker.filter(|m| !m.is_empty())
}

fn is_truncated(record: &Record) -> Result<bool, PaginationError> {
    match record.leaf_of("IsTruncated") {
        Some(LeafValue::Bool(b)) => Ok(*b),
        Some(other) => Err(PaginationError::TypeMismatch {
            field: "IsTruncated",
            expected: "boolean",
            found: other.type_name(),
        }),
        None => Err(PaginationError::NotAListing(record.name().to_owned())),
    }
}

fn string_field(record: &Record, field: &'static str) -> Result<Option<String>, PaginationError> {
    match record.leaf_of(field) {
        Some(LeafValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(PaginationError::TypeMismatch {
            field,
            expected: "string",
            found: other.type_name(),
        }),
        None => Ok(None),
    }
}

fn int_field(record: &Record, field: &'static str) -> Result<Option<i32>, PaginationError> {
    match record.leaf_of(field) {
        Some(LeafValue::Int(v)) => Ok(Some(*v)),
        Some(other) => Err(PaginationError::TypeMismatch {
            field,
            expected: "int",
            found: other.type_name(),
        }),
        None => Ok(None),
    }
}
