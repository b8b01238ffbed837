//! Validation failures and S3 error bodies.

#[cfg(test)]
mod tests {
    use ruststack_s3_schema::builtin::{ERROR, LIST_MULTIPART_UPLOADS_RESULT};
    use ruststack_s3_xml::{CodecConfig, UnknownElementPolicy, ValidationErrorKind, XmlError};

    use crate::{Page, UploadStore, s3_codec, s3_codec_with};

    const REQUIRED: [&str; 7] = [
        "Bucket",
        "KeyMarker",
        "UploadIdMarker",
        "NextKeyMarker",
        "NextUploadIdMarker",
        "MaxUploads",
        "IsTruncated",
    ];

    /// Every `ListMultipartUploadsResult` header child in schema order, with
    /// whether it is optional.
    const HEADER: [(&str, &str, bool); 10] = [
        ("Bucket", "<Bucket>v</Bucket>", false),
        ("KeyMarker", "<KeyMarker>v</KeyMarker>", false),
        ("UploadIdMarker", "<UploadIdMarker>v</UploadIdMarker>", false),
        ("NextKeyMarker", "<NextKeyMarker>v</NextKeyMarker>", false),
        ("NextUploadIdMarker", "<NextUploadIdMarker>v</NextUploadIdMarker>", false),
        ("Delimiter", "<Delimiter>/</Delimiter>", true),
        ("Prefix", "<Prefix>photos/</Prefix>", true),
        ("MaxUploads", "<MaxUploads>10</MaxUploads>", false),
        ("EncodingType", "<EncodingType>url</EncodingType>", true),
        ("IsTruncated", "<IsTruncated>false</IsTruncated>", false),
    ];

    fn listing_without(skip: &str, with_optionals: bool) -> String {
        let body: String = HEADER
            .iter()
            .filter(|(name, _, optional)| *name != skip && (with_optionals || !optional))
            .map(|(_, xml, _)| *xml)
            .collect();
        format!("<ListMultipartUploadsResult>{body}</ListMultipartUploadsResult>")
    }

    fn minimal_listing_without(skip: &str) -> String {
        listing_without(skip, false)
    }

    fn validation_kind(err: &XmlError) -> Option<ValidationErrorKind> {
        err.as_validation().map(|v| v.kind())
    }

    #[test]
    fn test_should_name_each_missing_required_child() {
        let codec = s3_codec();
        for missing in REQUIRED {
            let xml = minimal_listing_without(missing);
            let err = codec
                .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
                .unwrap_err();
            let err = err.as_validation().unwrap();
            assert_eq!(err.kind(), ValidationErrorKind::MissingElement, "{missing}");
            assert!(
                err.detail().contains(&format!("<{missing}>")),
                "{missing}: {}",
                err.detail()
            );
        }
    }

    #[test]
    fn test_should_name_missing_child_with_optionals_present() {
        let codec = s3_codec();
        assert!(codec
            .decode(listing_without("", true).as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .is_ok());
        for missing in REQUIRED {
            let xml = listing_without(missing, true);
            let err = codec
                .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
                .unwrap_err();
            let err = err.as_validation().unwrap();
            assert_eq!(err.kind(), ValidationErrorKind::MissingElement, "{missing}");
            assert!(
                err.detail().contains(&format!("<{missing}>")),
                "{missing}: {}",
                err.detail()
            );
        }
    }

    #[test]
    fn test_should_reject_misplaced_optional_child() {
        let codec = s3_codec();
        let xml = minimal_listing_without("").replace(
            "<ListMultipartUploadsResult>",
            "<ListMultipartUploadsResult><Delimiter>/</Delimiter>",
        );
        let err = codec
            .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        assert_eq!(
            validation_kind(&err),
            Some(ValidationErrorKind::MissingElement)
        );
        assert!(err.to_string().contains("<Bucket>"));
    }

    #[test]
    fn test_should_report_type_mismatch_path_for_max_uploads() {
        let codec = s3_codec();
        let xml = minimal_listing_without("").replace("<MaxUploads>10</MaxUploads>", "<MaxUploads>abc</MaxUploads>");
        let err = codec
            .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.kind(), ValidationErrorKind::TypeMismatch);
        assert_eq!(err.path(), ["ListMultipartUploadsResult", "MaxUploads"]);
        assert_eq!(
            err.to_string(),
            "type mismatch at /ListMultipartUploadsResult/MaxUploads: expected int, found \"abc\""
        );
    }

    #[test]
    fn test_should_list_valid_storage_classes_for_frozen() {
        let codec = s3_codec();
        let store = UploadStore::with_uploads("photos", 1);
        let xml = store.list(&codec, None, 10);
        let tampered = std::str::from_utf8(&xml)
            .unwrap()
            .replace("<StorageClass>STANDARD</StorageClass>", "<StorageClass>FROZEN</StorageClass>");

        let err = codec
            .decode(tampered.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.kind(), ValidationErrorKind::InvalidEnumValue);
        for class in ["STANDARD", "STANDARD_IA", "GLACIER", "DEEP_ARCHIVE", "INTELLIGENT_TIERING"] {
            assert!(err.detail().contains(class), "{class} missing from {}", err.detail());
        }
    }

    #[test]
    fn test_should_skip_newer_fields_only_when_configured() {
        let store = UploadStore::with_uploads("photos", 2);
        let strict = s3_codec();
        let xml = store.list(&strict, None, 10);
        let with_checksum = std::str::from_utf8(&xml).unwrap().replace(
            "<StorageClass>",
            "<ChecksumAlgorithm>CRC32</ChecksumAlgorithm><StorageClass>",
        );

        let err = strict
            .decode(with_checksum.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        assert_eq!(
            validation_kind(&err),
            Some(ValidationErrorKind::UnexpectedElement)
        );
        assert_eq!(
            err.as_validation().unwrap().path(),
            ["ListMultipartUploadsResult", "Upload", "ChecksumAlgorithm"]
        );

        let lenient = s3_codec_with(
            CodecConfig::builder()
                .unknown_elements(UnknownElementPolicy::Skip)
                .build(),
        );
        let record = lenient
            .decode(with_checksum.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap();
        assert_eq!(
            record,
            strict.decode(&xml, LIST_MULTIPART_UPLOADS_RESULT).unwrap()
        );
    }

    #[test]
    fn test_should_render_error_body_for_invalid_request() {
        let codec = s3_codec();
        let err = codec
            .decode(b"<ListMultipartUploadsResult><Bucket>", LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        assert_eq!(validation_kind(&err), Some(ValidationErrorKind::MalformedXml));

        let body = codec.error_document(&err, Some("/photos?uploads"), "4442587FB7D0A2F9");
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>MalformedXML</Code>"));
        assert!(text.contains("<Resource>/photos?uploads</Resource>"));
        assert!(text.ends_with("<RequestId>4442587FB7D0A2F9</RequestId></Error>"));

        let decoded = codec.decode(&body, ERROR).unwrap();
        assert_eq!(decoded.text_of("Message"), Some(err.to_string().as_str()));
    }

    #[test]
    fn test_should_reject_encoding_of_nonconforming_page() {
        let codec = s3_codec();
        let mut record = Page {
            bucket: "photos".to_owned(),
            max_uploads: 1,
            ..Page::default()
        }
        .into_record();
        let children: Vec<_> = record
            .children()
            .iter()
            .filter(|c| c.name() != "IsTruncated")
            .cloned()
            .collect();
        record = ruststack_s3_xml::Record::element(LIST_MULTIPART_UPLOADS_RESULT, children);

        let err = codec
            .encode(&record, LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap_err();
        assert!(matches!(err, XmlError::Encoding(_)));
        assert!(err.to_string().starts_with("schema mismatch at /ListMultipartUploadsResult"));
        assert_eq!(err.s3_error_code(), "InternalError");
    }
}
