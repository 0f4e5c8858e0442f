//! Out-of-order upload and download check.
//!
//! [`ReorderScenario`] uploads every part in one order, completes the upload,
//! then downloads the parts in another order and compares each body with what
//! the source produces for that part. A store passes when it reassembles
//! parts by part number rather than by arrival.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::assembler::Manifest;
use crate::config::SessionConfig;
use crate::error::{UploadError, UploadResult};
use crate::producer::PartSource;
use crate::session::{SessionState, UploadSession};
use crate::store::{CompletedUpload, ObjectStore};

/// Upload and download orders for a reorder check.
///
/// The defaults upload four parts as `[2, 3, 4, 1]` and download them as
/// `[1, 3, 2, 4]`.
///
/// # Examples
///
/// ```
/// use partcheck_core::ReorderScenario;
///
/// let scenario = ReorderScenario::default();
/// assert!(scenario.validate(4).is_ok());
/// assert!(scenario.validate(5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ReorderScenario {
    /// Order in which parts are uploaded.
    #[builder(default = vec![2, 3, 4, 1])]
    pub upload_order: Vec<u32>,

    /// Order in which parts are fetched back after completion.
    #[builder(default = vec![1, 3, 2, 4])]
    pub download_order: Vec<u32>,
}

impl Default for ReorderScenario {
    fn default() -> Self {
        Self {
            upload_order: vec![2, 3, 4, 1],
            download_order: vec![1, 3, 2, 4],
        }
    }
}

/// Outcome of a successful [`ReorderScenario::run`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    /// Upload ID of the session.
    pub upload_id: String,
    /// The manifest sent with the finalize call.
    pub manifest: Manifest,
    /// The store's finalize result.
    pub completed: CompletedUpload,
    /// `(part_number, first byte)` of each fetched part, in download order.
    pub first_bytes: Vec<(u32, u8)>,
}

impl ReorderScenario {
    /// Check that both orders are permutations of `1..=total_parts`.
    pub fn validate(&self, total_parts: u32) -> UploadResult<()> {
        check_permutation("upload_order", &self.upload_order, total_parts)?;
        check_permutation("download_order", &self.download_order, total_parts)
    }

    /// Run the check against `store`.
    ///
    /// If a step fails before the upload is finalized, the session is aborted
    /// and the original error returned.
    pub async fn run(
        &self,
        store: Arc<dyn ObjectStore>,
        config: SessionConfig,
        source: &dyn PartSource,
    ) -> UploadResult<ScenarioReport> {
        self.validate(config.total_parts)?;
        let part_size = config.part_size;

        let session = UploadSession::open(store, config).await?;
        info!(
            upload_id = %session.session_id(),
            upload_order = ?self.upload_order,
            "uploading parts"
        );

        let manifest = match self.upload_all(&session, source).await {
            Ok(manifest) => manifest,
            Err(e) => {
                abort_after_failure(&session, &e).await;
                return Err(e);
            }
        };

        let mut first_bytes = Vec::with_capacity(self.download_order.len());
        for &part_number in &self.download_order {
            let body = session.fetch_part(part_number).await?;
            let expected = source.produce(part_number, part_size)?;
            if body != expected {
                warn!(
                    part_number,
                    fetched = body.len(),
                    expected = expected.len(),
                    "fetched part differs from produced part"
                );
                return Err(UploadError::ContentMismatch { part_number });
            }
            let first = body.first().copied().unwrap_or_default();
            info!(part_number, first_byte = %char::from(first), "verified part");
            first_bytes.push((part_number, first));
        }

        let completed = session.completed_upload().ok_or(UploadError::InvalidState {
            operation: "report",
            state: session.state(),
        })?;

        Ok(ScenarioReport {
            upload_id: session.session_id().to_owned(),
            manifest,
            completed,
            first_bytes,
        })
    }

    async fn upload_all(
        &self,
        session: &UploadSession,
        source: &dyn PartSource,
    ) -> UploadResult<Manifest> {
        for &part_number in &self.upload_order {
            session.upload_from(source, part_number).await?;
        }
        session.complete().await
    }
}

async fn abort_after_failure(session: &UploadSession, cause: &UploadError) {
    if !matches!(
        session.state(),
        SessionState::Open | SessionState::Completing
    ) {
        return;
    }
    warn!(upload_id = %session.session_id(), error = %cause, "aborting failed upload");
    if let Err(e) = session.abort().await {
        warn!(upload_id = %session.session_id(), error = %e, "abort after failure also failed");
    }
}

fn check_permutation(name: &str, order: &[u32], total_parts: u32) -> UploadResult<()> {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    if sorted.iter().copied().eq(1..=total_parts) {
        Ok(())
    } else {
        Err(UploadError::InvalidConfig(format!(
            "{name} {order:?} is not a permutation of 1..={total_parts}"
        )))
    }
}
