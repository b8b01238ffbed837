//! Schema documents loaded from disk next to the built-in definitions.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use ruststack_s3_schema::builtin::register_s3_schemas;
    use ruststack_s3_schema::{SchemaDocument, SchemaError, SchemaRegistry};
    use ruststack_s3_xml::{CodecConfig, LeafValue, ValidationErrorKind, XmlCodec, XmlError};

    const INVENTORY: &str = r#"{
      "definitions": [
        { "name": "Visibility", "enum": ["private", "public"] },
        { "name": "Folder", "element": {
            "name": "Folder",
            "children": [
              { "name": "Name", "type": "string" },
              { "name": "Visibility", "type": "enum", "enum": "Visibility", "occurrence": "optional" },
              { "name": "Owner", "ref": "CanonicalUser", "occurrence": "optional" },
              { "name": "Folder", "ref": "Folder", "occurrence": "zeroOrMore" },
              { "name": "File", "ref": "File", "occurrence": "zeroOrMore" }
            ] } },
        { "name": "File", "element": {
            "name": "File",
            "children": [
              { "name": "Name", "type": "string" },
              { "name": "Size", "type": "long" },
              { "name": "Parent", "ref": "Folder", "occurrence": "optional" }
            ] } }
      ]
    }"#;

    fn inventory_codec(config: CodecConfig) -> XmlCodec {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INVENTORY.as_bytes()).unwrap();

        let registry = SchemaRegistry::new();
        register_s3_schemas(&registry).unwrap();
        let added = SchemaDocument::from_path(file.path())
            .unwrap()
            .register_into(&registry)
            .unwrap();
        assert_eq!(added, 3);
        XmlCodec::new(Arc::new(registry), config)
    }

    #[test]
    fn test_should_decode_recursive_and_mutual_references() {
        let codec = inventory_codec(CodecConfig::default());
        let xml = b"<Folder><Name>root</Name><Visibility>private</Visibility>\
            <Owner><ID>o1</ID></Owner>\
            <Folder><Name>docs</Name>\
              <File><Name>a.txt</Name><Size>12</Size>\
                <Parent><Name>docs</Name></Parent></File>\
            </Folder>\
            <File><Name>b.txt</Name><Size>7</Size></File>\
        </Folder>";

        let record = codec.decode(xml, "Folder").unwrap();
        assert_eq!(
            record.leaf_of("Visibility"),
            Some(&LeafValue::enumeration("private"))
        );
        let docs = record.child("Folder").unwrap();
        let file = docs.child("File").unwrap();
        assert_eq!(file.leaf_of("Size"), Some(&LeafValue::Long(12)));
        assert_eq!(
            file.child("Parent").and_then(|p| p.text_of("Name")),
            Some("docs")
        );

        let encoded = codec.encode(&record, "Folder").unwrap();
        assert_eq!(codec.decode(&encoded, "Folder").unwrap(), record);
    }

    #[test]
    fn test_should_bound_recursive_documents_by_depth() {
        let codec = inventory_codec(CodecConfig::builder().max_depth(4).build());
        let mut xml = String::new();
        for i in 0..4 {
            xml.push_str(&format!("<Folder><Name>level{i}</Name>"));
        }
        xml.push_str(&"</Folder>".repeat(4));

        let err = codec.decode(xml.as_bytes(), "Folder").unwrap_err();
        assert_eq!(
            err.as_validation().map(|v| v.kind()),
            Some(ValidationErrorKind::DepthExceeded)
        );
    }

    #[test]
    fn test_should_validate_enum_from_document() {
        let codec = inventory_codec(CodecConfig::default());
        let err = codec
            .decode(
                b"<Folder><Name>x</Name><Visibility>hidden</Visibility></Folder>",
                "Folder",
            )
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.kind(), ValidationErrorKind::InvalidEnumValue);
        assert!(err.detail().contains("private, public"));
    }

    #[test]
    fn test_should_reject_document_redefining_builtin() {
        let registry = SchemaRegistry::new();
        register_s3_schemas(&registry).unwrap();
        let doc = SchemaDocument::from_json(
            r#"{"definitions": [{"name": "Error", "element": {"name": "Error", "children": []}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            doc.register_into(&registry),
            Err(SchemaError::DuplicateSchema(name)) if name == "Error"
        ));
    }

    #[test]
    fn test_should_reject_malformed_documents() {
        assert!(matches!(
            SchemaDocument::from_json(r#"{"definitions": [{"name": "X", "colour": "red"}]}"#),
            Err(SchemaError::Json(_))
        ));

        let registry = SchemaRegistry::new();
        let both = SchemaDocument::from_json(
            r#"{"definitions": [{"name": "X", "enum": ["a"],
                "element": {"name": "X", "type": "string"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            both.register_into(&registry),
            Err(SchemaError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_should_report_dangling_reference_as_schema_error() {
        let registry = SchemaRegistry::new();
        SchemaDocument::from_json(
            r#"{"definitions": [{"name": "Box", "element": {"name": "Box", "children": [
                {"name": "Item", "ref": "Missing", "occurrence": "zeroOrMore"}
            ]}}]}"#,
        )
        .unwrap()
        .register_into(&registry)
        .unwrap();
        let codec = XmlCodec::new(Arc::new(registry), CodecConfig::default());

        assert!(codec.decode(b"<Box/>", "Box").is_ok());
        let err = codec.decode(b"<Box><Item/></Box>", "Box").unwrap_err();
        assert!(matches!(&err, XmlError::Schema(SchemaError::UnknownSchema(name)) if name == "Missing"));
        assert_eq!(err.s3_error_code(), "InternalError");
    }
}
