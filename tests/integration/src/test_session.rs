//! Upload session lifecycle against a live endpoint.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use partcheck_core::{DigitPattern, SessionState, StoreError, UploadError, UploadSession};

    use crate::{
        cleanup_bucket, create_test_bucket, object_store, pending_upload_count, s3_client,
        session_config,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_to_complete_with_missing_parts() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "missing").await;

        let session = UploadSession::open(
            object_store(&client),
            session_config(&bucket, "partial.bin", 3, 1024),
        )
        .await
        .expect("open session");
        session
            .upload_from(&DigitPattern, 2)
            .await
            .expect("upload part 2");

        let err = session.complete().await.expect_err("complete should fail");
        assert!(matches!(
            err,
            UploadError::IncompleteUpload { ref missing } if missing == &[1, 3]
        ));
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(pending_upload_count(&client, &bucket).await, 1);

        session.abort().await.expect("abort");
        assert_eq!(session.state(), SessionState::Aborted);
        assert_eq!(pending_upload_count(&client, &bucket).await, 0);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_keep_last_write_of_a_part() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "overwrite").await;

        let session = UploadSession::open(
            object_store(&client),
            session_config(&bucket, "overwrite.bin", 1, 16),
        )
        .await
        .expect("open session");
        session
            .upload_part(1, Bytes::from_static(b"first"))
            .await
            .expect("first upload");
        let etag = session
            .upload_part(1, Bytes::from_static(b"second"))
            .await
            .expect("second upload");

        let manifest = session.complete().await.expect("complete");
        assert_eq!(manifest.parts()[0].etag, etag);

        let body = session.fetch_part(1).await.expect("fetch part 1");
        assert_eq!(&body[..], b"second");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_upload_as_transport_failure() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "gone").await;
        let store = object_store(&client);

        let session = UploadSession::open(store, session_config(&bucket, "gone.bin", 1, 16))
            .await
            .expect("open session");
        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("gone.bin")
            .upload_id(session.session_id())
            .send()
            .await
            .expect("abort behind the session's back");

        let err = session
            .upload_from(&DigitPattern, 1)
            .await
            .expect_err("upload into an aborted upload should fail");
        assert!(matches!(
            err,
            UploadError::TransportFailure {
                source: StoreError::NoSuchUpload { .. },
                ..
            }
        ));
        assert_eq!(session.state(), SessionState::Open);
        assert!(!session.tracker().all_uploaded());

        cleanup_bucket(&client, &bucket).await;
    }
}
