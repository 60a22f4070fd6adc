//! Typed errors for the harvester library.

use hh_client::HhError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors that abort a harvest stage.
///
/// Failures on pages after the first and on individual detail requests are
/// not errors; they are recorded as [`crate::FetchFailure`] and the stage
/// keeps going.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Descriptor violates the API bounds
    #[error("invalid query: {0}")]
    InvalidQuery(#[source] HhError),

    /// Page 0 failed, so the total page count is unknown
    #[error("first page failed: {0}")]
    FirstPage(#[source] HhError),

    /// Snapshot file could not be read or written
    #[error("snapshot I/O error at {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot contents could not be (de)serialized
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet export could not be rendered
    #[error("spreadsheet export error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Published snapshot could not be fetched
    #[error("failed to fetch published snapshot: {0}")]
    RemoteSnapshot(#[source] HhError),

    /// Scheduler could not be created or started
    #[error("scheduler error: {0}")]
    Schedule(String),
}

impl HarvestError {
    pub(crate) fn snapshot_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarvestError::Snapshot {
            path: path.into(),
            source,
        }
    }
}
