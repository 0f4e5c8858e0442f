//! Multipart upload session.
//!
//! An [`UploadSession`] owns one remote multipart upload from initiation to
//! completion or abort.
//!
//! ```text
//!          upload_part (any order, repeatable)
//!            +----+
//!            v    |
//! open --> Open --+--> complete --> Completing --> Completed --> fetch_part
//!            |                          |
//!            +--------> abort <---------+
//!                         |
//!                         v
//!                      Aborted
//! ```
//!
//! Session methods take `&self`, so parts may be uploaded concurrently from
//! several tasks. State checks and tracker writes happen under the session's
//! state lock; no lock is held across a store call.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembler::{Manifest, assemble};
use crate::config::SessionConfig;
use crate::error::{UploadError, UploadResult};
use crate::producer::PartSource;
use crate::store::{CompletedUpload, ObjectStore};
use crate::tracker::PartTracker;

/// Lifecycle state of an [`UploadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Accepting part uploads.
    Open,
    /// The finalize call is in flight, or failed and awaits an abort.
    Completing,
    /// The object has been assembled; parts can be fetched.
    Completed,
    /// The upload was discarded. Terminal.
    Aborted,
}

impl SessionState {
    /// Lowercase name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completing => "completing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single multipart upload against an [`ObjectStore`].
pub struct UploadSession {
    store: Arc<dyn ObjectStore>,
    config: SessionConfig,
    /// Upload ID returned by the store at initiation.
    upload_id: String,
    tracker: PartTracker,
    state: Mutex<SessionState>,
    completed: Mutex<Option<CompletedUpload>>,
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("upload_id", &self.upload_id)
            .field("bucket", &self.config.bucket)
            .field("key", &self.config.key)
            .field("state", &*self.state.lock())
            .field("uploaded", &self.tracker.uploaded_count())
            .field("total_parts", &self.tracker.total_parts())
            .finish_non_exhaustive()
    }
}

impl UploadSession {
    /// Validate `config` and initiate a multipart upload.
    pub async fn open(store: Arc<dyn ObjectStore>, config: SessionConfig) -> UploadResult<Self> {
        config.validate()?;

        let upload_id = store
            .initiate_multipart_upload(&config.bucket, &config.key)
            .await
            .map_err(|e| UploadError::transport("initiate_multipart_upload", e))?;

        info!(
            bucket = %config.bucket,
            key = %config.key,
            upload_id = %upload_id,
            total_parts = config.total_parts,
            "opened upload session"
        );

        Ok(Self {
            store,
            tracker: PartTracker::new(config.total_parts),
            config,
            upload_id,
            state: Mutex::new(SessionState::Open),
            completed: Mutex::new(None),
        })
    }

    /// The session identifier (the store's upload ID).
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.upload_id
    }

    /// The configuration this session was opened with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Per-part upload state.
    #[must_use]
    pub fn tracker(&self) -> &PartTracker {
        &self.tracker
    }

    /// The finalize result, once the session is [`SessionState::Completed`].
    #[must_use]
    pub fn completed_upload(&self) -> Option<CompletedUpload> {
        self.completed.lock().clone()
    }

    /// Upload `data` as part `part_number` and return the store's ETag.
    ///
    /// Parts may arrive in any order. Uploading a part again replaces the
    /// earlier record.
    pub async fn upload_part(&self, part_number: u32, data: Bytes) -> UploadResult<String> {
        check_state(self.state(), "upload_part", &[SessionState::Open])?;
        self.tracker.check_part_number(part_number)?;

        let size = data.len() as u64;
        let etag = self
            .store
            .upload_part(
                &self.config.bucket,
                &self.config.key,
                &self.upload_id,
                part_number,
                data,
            )
            .await
            .map_err(|e| UploadError::transport("upload_part", e))?;

        {
            let state = self.state.lock();
            check_state(*state, "upload_part", &[SessionState::Open])?;
            self.tracker.record_upload(part_number, etag.clone(), size)?;
        }

        debug!(
            bucket = %self.config.bucket,
            key = %self.config.key,
            upload_id = %self.upload_id,
            part_number,
            size,
            etag = %etag,
            "upload_part completed"
        );
        Ok(etag)
    }

    /// Produce part `part_number` from `source` with the configured part size
    /// and upload it.
    pub async fn upload_from(
        &self,
        source: &dyn PartSource,
        part_number: u32,
    ) -> UploadResult<String> {
        check_state(self.state(), "upload_part", &[SessionState::Open])?;
        self.tracker.check_part_number(part_number)?;
        let data = source.produce(part_number, self.config.part_size)?;
        self.upload_part(part_number, data).await
    }

    /// Finalize the upload and return its manifest.
    ///
    /// If parts are missing the session stays [`SessionState::Open`]. If the
    /// store rejects the finalize call the session stays
    /// [`SessionState::Completing`] and can only be aborted.
    pub async fn complete(&self) -> UploadResult<Manifest> {
        let manifest = {
            let mut state = self.state.lock();
            check_state(*state, "complete", &[SessionState::Open])?;
            let manifest = assemble(&self.tracker)?;
            *state = SessionState::Completing;
            manifest
        };

        let result = self
            .store
            .complete_multipart_upload(
                &self.config.bucket,
                &self.config.key,
                &self.upload_id,
                &manifest,
            )
            .await;

        let completed = match result {
            Ok(completed) => completed,
            Err(e) => {
                warn!(
                    upload_id = %self.upload_id,
                    error = %e,
                    "complete_multipart_upload failed, session left completing"
                );
                return Err(UploadError::transport("complete_multipart_upload", e));
            }
        };

        {
            let mut state = self.state.lock();
            check_state(*state, "complete", &[SessionState::Completing])?;
            *state = SessionState::Completed;
        }

        info!(
            bucket = %completed.bucket,
            key = %completed.key,
            upload_id = %self.upload_id,
            etag = %completed.etag,
            parts = manifest.len(),
            size = manifest.total_size(),
            "completed upload session"
        );
        *self.completed.lock() = Some(completed);
        Ok(manifest)
    }

    /// Discard the upload and release its remote parts.
    ///
    /// The session becomes [`SessionState::Aborted`] even if the store call
    /// fails; the failure is still returned.
    pub async fn abort(&self) -> UploadResult<()> {
        let previous = {
            let mut state = self.state.lock();
            check_state(
                *state,
                "abort",
                &[SessionState::Open, SessionState::Completing],
            )?;
            std::mem::replace(&mut *state, SessionState::Aborted)
        };

        self.store
            .abort_multipart_upload(&self.config.bucket, &self.config.key, &self.upload_id)
            .await
            .map_err(|e| UploadError::transport("abort_multipart_upload", e))?;

        info!(
            upload_id = %self.upload_id,
            previous = %previous,
            uploaded = self.tracker.uploaded_count(),
            "aborted upload session"
        );
        Ok(())
    }

    /// Download part `part_number` of the completed object.
    pub async fn fetch_part(&self, part_number: u32) -> UploadResult<Bytes> {
        check_state(self.state(), "fetch_part", &[SessionState::Completed])?;
        self.tracker.check_part_number(part_number)?;

        let body = self
            .store
            .get_object_part(&self.config.bucket, &self.config.key, part_number)
            .await
            .map_err(|e| UploadError::transport("get_object_part", e))?;

        debug!(
            bucket = %self.config.bucket,
            key = %self.config.key,
            part_number,
            size = body.len(),
            "fetch_part completed"
        );
        Ok(body)
    }
}

fn check_state(
    state: SessionState,
    operation: &'static str,
    allowed: &[SessionState],
) -> UploadResult<()> {
    if allowed.contains(&state) {
        Ok(())
    } else {
        Err(UploadError::InvalidState { operation, state })
    }
}
