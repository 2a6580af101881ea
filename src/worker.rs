//! Background worker performing backend requests for the UI.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    api::Backend,
    error::ApiError,
    flow::PendingSelection,
    models::{ComparisonResult, UploadReceipt, UploadRecord, ValidationResult},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// POST the selected file.
    Upload(PendingSelection),
    /// Reload the uploads table.
    RefreshUploads,
    /// Look up both versions of a unique key.
    Compare(String),
    /// Validate the most recent upload, optionally against expected keys.
    ValidateLatest { expected_keys: Vec<String> },
    /// Probe `/health` once.
    CheckHealth,
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// Outcome of an `Upload` command.
    UploadFinished(Result<UploadReceipt, ApiError>),
    /// Fresh uploads snapshot.
    UploadsLoaded(Vec<UploadRecord>),
    /// Uploads refresh failed; not worth a blocking notice.
    RefreshFailed(String),
    /// Comparison lookup finished; `None` means nothing to compare.
    ComparisonLoaded {
        unique_key: String,
        result: Option<ComparisonResult>,
    },
    /// Validation of the latest upload finished.
    ValidationLoaded {
        upload: UploadRecord,
        result: ValidationResult,
    },
    /// Informational message for the status bar.
    Log(String),
    /// Message for a blocking notice.
    Notice(String),
}

/// Worker loop: every command runs in its own task so a slow upload never
/// holds back the periodic refresh.
pub async fn run<B: Backend>(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    backend: B,
) {
    // One backend shared by every command task.
    let backend = Arc::new(backend);
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        let backend = Arc::clone(&backend);
        let tx = tx.clone();
        tokio::spawn(async move {
            // The UI may already be gone at shutdown; drop the event then.
            if let Some(ev) = handle(cmd, backend.as_ref()).await {
                let _ = tx.send(ev).await;
            }
        });
    }
    tracing::info!("worker stopped");
}

/// Execute one command and produce the event to report, if any.
async fn handle<B: Backend>(cmd: WorkerCmd, backend: &B) -> Option<WorkerEvent> {
    match cmd {
        WorkerCmd::Upload(file) => {
            tracing::info!("upload request: {}", file.path.display());
            Some(WorkerEvent::UploadFinished(backend.upload(&file).await))
        }

        // Refresh failures stay out of the notice queue.
        WorkerCmd::RefreshUploads => match backend.list_uploads().await {
            Ok(uploads) => {
                tracing::debug!("uploads refreshed: {}", uploads.len());
                Some(WorkerEvent::UploadsLoaded(uploads))
            }
            Err(e) => {
                tracing::warn!("uploads refresh failed: {e}");
                Some(WorkerEvent::RefreshFailed(e.to_string()))
            }
        },

        WorkerCmd::Compare(unique_key) => {
            tracing::info!("compare: {unique_key}");
            match backend.compare(&unique_key).await {
                Ok(result) => Some(WorkerEvent::ComparisonLoaded { unique_key, result }),
                Err(e) => {
                    tracing::error!("compare failed: {unique_key}: {e}");
                    Some(WorkerEvent::Notice(format!("Error comparing records: {e}")))
                }
            }
        }

        WorkerCmd::ValidateLatest { expected_keys } => {
            // Validation always targets the newest upload in the list.
            match validate_latest(backend, &expected_keys).await {
                Ok(Some((upload, result))) => {
                    Some(WorkerEvent::ValidationLoaded { upload, result })
                }
                Ok(None) => Some(WorkerEvent::Notice("No uploads found".into())),
                Err(e) => {
                    tracing::error!("validation failed: {e}");
                    Some(WorkerEvent::Notice(format!("Validation error: {e}")))
                }
            }
        }

        // Startup health check; the result only reaches the status bar.
        WorkerCmd::CheckHealth => match backend.health().await {
            Ok(h) => Some(WorkerEvent::Log(format!(
                "backend {}: {}",
                h.status,
                h.service.as_deref().unwrap_or("unknown service")
            ))),
            Err(e) => {
                tracing::warn!("health check failed: {e}");
                Some(WorkerEvent::Log(format!("backend unreachable: {e}")))
            }
        },
    }
}

/// Validate the first entry of the uploads list; `None` when there is none.
async fn validate_latest<B: Backend>(
    backend: &B,
    expected_keys: &[String],
) -> Result<Option<(UploadRecord, ValidationResult)>, ApiError> {
    let uploads = backend.list_uploads().await?;
    let Some(latest) = uploads.into_iter().next() else {
        return Ok(None);
    };
    tracing::info!("validate upload {} ({})", latest.id, latest.file_name);
    let result = backend.validate(latest.id, expected_keys).await?;
    Ok(Some((latest, result)))
}
