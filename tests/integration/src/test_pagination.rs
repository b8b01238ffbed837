//! Marker-based pagination integration tests.

#[cfg(test)]
mod tests {
    use ruststack_s3_schema::builtin::{LIST_MULTIPART_UPLOADS_RESULT, LIST_PARTS_RESULT};
    use ruststack_s3_xml::{
        ContinuationParams, PaginationError, PaginationState, Record, next_parts_request,
        next_request,
    };

    use crate::{UploadStore, s3_codec};

    /// List every upload by following continuation markers.
    fn list_all(store: &UploadStore, page_size: usize) -> (Vec<String>, usize) {
        let codec = s3_codec();
        let mut keys = Vec::new();
        let mut pages = 0;
        let mut marker: Option<ContinuationParams> = None;
        loop {
            let xml = store.list(&codec, marker.as_ref(), page_size);
            let record = codec.decode(&xml, LIST_MULTIPART_UPLOADS_RESULT).unwrap();
            pages += 1;
            keys.extend(
                record
                    .children_named("Upload")
                    .filter_map(|u| u.text_of("Key"))
                    .map(str::to_owned),
            );
            match next_request(&record).unwrap() {
                Some(next) => marker = Some(next),
                None => break,
            }
            assert!(pages <= 100, "pagination did not terminate");
        }
        (keys, pages)
    }

    #[test]
    fn test_should_list_all_uploads_across_pages() {
        let store = UploadStore::with_uploads("photos", 7);
        let (keys, pages) = list_all(&store, 3);
        assert_eq!(keys, store.keys());
        assert_eq!(pages, 3);
    }

    #[test]
    fn test_should_stop_when_last_page_is_exactly_full() {
        let store = UploadStore::with_uploads("photos", 6);
        let (keys, pages) = list_all(&store, 3);
        assert_eq!(keys.len(), 6);
        assert_eq!(pages, 2);
    }

    #[test]
    fn test_should_handle_empty_bucket() {
        let store = UploadStore::with_uploads("empty", 0);
        let (keys, pages) = list_all(&store, 10);
        assert!(keys.is_empty());
        assert_eq!(pages, 1);
    }

    #[test]
    fn test_should_derive_state_and_query_string_from_decoded_page() {
        let codec = s3_codec();
        let store = UploadStore::with_uploads("photos", 5);
        let xml = store.list(&codec, None, 2);
        let record = codec.decode(&xml, LIST_MULTIPART_UPLOADS_RESULT).unwrap();

        let state = PaginationState::from_record(&record).unwrap();
        assert!(state.is_truncated);
        assert_eq!(state.upload_count, 2);
        assert_eq!(state.max_uploads, Some(2));
        assert_eq!(state.next_key_marker.as_deref(), Some("object-001"));

        let next = state.continuation().unwrap().unwrap();
        assert_eq!(
            next.to_query_string(),
            "key-marker=object-001&upload-id-marker=upload-1"
        );
    }

    #[test]
    fn test_should_ignore_markers_on_final_page() {
        let codec = s3_codec();
        let xml = r"<ListMultipartUploadsResult>
            <Bucket>photos</Bucket><KeyMarker/><UploadIdMarker/>
            <NextKeyMarker>b.txt</NextKeyMarker><NextUploadIdMarker>u123</NextUploadIdMarker>
            <MaxUploads>1000</MaxUploads><IsTruncated>false</IsTruncated>
        </ListMultipartUploadsResult>";
        let record = codec
            .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap();
        assert_eq!(next_request(&record).unwrap(), None);
    }

    #[test]
    fn test_should_return_decoded_marker_pair() {
        let codec = s3_codec();
        let xml = r"<ListMultipartUploadsResult>
            <Bucket>photos</Bucket><KeyMarker/><UploadIdMarker/>
            <NextKeyMarker>b.txt</NextKeyMarker><NextUploadIdMarker>u123</NextUploadIdMarker>
            <MaxUploads>1</MaxUploads><IsTruncated>true</IsTruncated>
        </ListMultipartUploadsResult>";
        let record = codec
            .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap();
        assert_eq!(
            next_request(&record).unwrap(),
            Some(ContinuationParams {
                key_marker: "b.txt".to_owned(),
                upload_id_marker: "u123".to_owned(),
            })
        );
    }

    #[test]
    fn test_should_distinguish_inconsistent_pagination_from_invalid_xml() {
        let truncated_without_markers = Record::element(
            LIST_MULTIPART_UPLOADS_RESULT,
            [
                Record::leaf("Bucket", "photos"),
                Record::leaf("IsTruncated", true),
            ],
        );
        assert_eq!(
            next_request(&truncated_without_markers).unwrap_err(),
            PaginationError::MissingContinuation("NextKeyMarker")
        );
    }

    #[test]
    fn test_should_refuse_to_resume_from_empty_markers() {
        let codec = s3_codec();
        let xml = r"<ListMultipartUploadsResult>
            <Bucket>photos</Bucket><KeyMarker/><UploadIdMarker/>
            <NextKeyMarker/><NextUploadIdMarker/>
            <MaxUploads>1</MaxUploads><IsTruncated>true</IsTruncated>
        </ListMultipartUploadsResult>";
        let record = codec
            .decode(xml.as_bytes(), LIST_MULTIPART_UPLOADS_RESULT)
            .unwrap();
        assert_eq!(
            next_request(&record).unwrap_err(),
            PaginationError::MissingContinuation("NextKeyMarker")
        );
    }

    #[test]
    fn test_should_follow_part_number_marker() {
        let codec = s3_codec();
        let xml = r"<ListPartsResult>
            <Bucket>photos</Bucket><Key>movie.mp4</Key><UploadId>u-1</UploadId>
            <Initiator><ID>i</ID></Initiator><Owner><ID>o</ID></Owner>
            <StorageClass>STANDARD</StorageClass>
            <PartNumberMarker>0</PartNumberMarker><NextPartNumberMarker>2</NextPartNumberMarker>
            <MaxParts>2</MaxParts><IsTruncated>true</IsTruncated>
            <Part><PartNumber>1</PartNumber><LastModified>2024-01-01T00:00:00.000Z</LastModified>
              <ETag>&quot;a&quot;</ETag><Size>5242880</Size></Part>
            <Part><PartNumber>2</PartNumber><LastModified>2024-01-01T00:01:00.000Z</LastModified>
              <ETag>&quot;b&quot;</ETag><Size>5242880</Size></Part>
        </ListPartsResult>";
        let record = codec.decode(xml.as_bytes(), LIST_PARTS_RESULT).unwrap();
        let next = next_parts_request(&record).unwrap().unwrap();
        assert_eq!(next.part_number_marker, 2);
        assert_eq!(
            record.child("Part").and_then(|p| p.text_of("ETag")),
            Some("\"a\"")
        );
    }
}
