use thiserror::Error;
use uuid::Uuid;

use facetrace_core::ExtractionError;
use facetrace_store::StoreError;

/// Caller-facing error taxonomy.
///
/// Per-detection failures never surface here — they are logged and the
/// detection is skipped. An error from `ingest` means the whole image was
/// aborted; errors from queries propagate as-is.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity not found or inactive: {0}")]
    NotFound(Uuid),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("engine thread exited")]
    ChannelClosed,
}
