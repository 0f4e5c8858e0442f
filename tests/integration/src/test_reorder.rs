//! Out-of-order upload and download checks against a live endpoint.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use partcheck_core::{DigitPattern, FileSource, ReorderScenario, SessionConfig};
    use tracing::info;

    use crate::{
        cleanup_bucket, create_test_bucket, object_store, pending_upload_count, s3_client,
        session_config,
    };

    const PART_SIZE: u64 = 5 * 1024 * 1024;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reassemble_parts_uploaded_out_of_order() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "reorder").await;
        let config = SessionConfig::builder().bucket(bucket.as_str()).build();

        let report = ReorderScenario::default()
            .run(object_store(&client), config, &DigitPattern)
            .await
            .unwrap_or_else(|e| panic!("reorder scenario: {e}"));
        info!(upload_id = %report.upload_id, etag = %report.completed.etag, "scenario passed");

        assert_eq!(
            report.first_bytes,
            [(1, b'1'), (3, b'3'), (2, b'2'), (4, b'4')]
        );
        assert_eq!(report.manifest.part_numbers(), [1, 2, 3, 4]);
        assert_eq!(Some(report.completed.etag), report.manifest.expected_etag());

        let whole = client
            .get_object()
            .bucket(&bucket)
            .key("seq001")
            .send()
            .await
            .expect("get whole object");
        let expected_len = i64::try_from(4 * (PART_SIZE + 1)).expect("length fits i64");
        assert_eq!(whole.content_length(), Some(expected_len));
        assert_eq!(pending_upload_count(&client, &bucket).await, 0);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reassemble_file_with_short_last_part() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "file").await;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let mut data = Vec::new();
        for digit in [b'a', b'b'] {
            data.extend(std::iter::repeat_n(digit, usize::try_from(PART_SIZE).expect("fits")));
        }
        data.extend_from_slice(b"tail");
        file.write_all(&data).expect("write temp file");

        let source = FileSource::new(file.path());
        let total_parts = source.part_count(PART_SIZE).expect("part count");
        assert_eq!(total_parts, 3);

        let scenario = ReorderScenario::builder()
            .upload_order(vec![3, 1, 2])
            .download_order(vec![2, 3, 1])
            .build();
        let report = scenario
            .run(
                object_store(&client),
                session_config(&bucket, "file.bin", total_parts, PART_SIZE),
                &source,
            )
            .await
            .unwrap_or_else(|e| panic!("file scenario: {e}"));

        assert_eq!(report.first_bytes, [(2, b'b'), (3, b't'), (1, b'a')]);
        assert_eq!(report.manifest.total_size(), data.len() as u64);

        cleanup_bucket(&client, &bucket).await;
    }
}
