//! Completeness accounting shared by the harvest stages.

use hh_client::HhError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many units of a stage succeeded out of how many were attempted.
///
/// Units are pages for the listing pass and records for the detail pass.
/// Displays as `succeeded/total`, e.g. `2/3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    pub succeeded: usize,
    pub total: usize,
}

impl Completeness {
    pub fn new(succeeded: usize, total: usize) -> Self {
        Self { succeeded, total }
    }

    /// Every attempted unit succeeded.
    pub fn full(total: usize) -> Self {
        Self::new(total, total)
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total
    }

    pub fn failed(&self) -> usize {
        self.total.saturating_sub(self.succeeded)
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, DNS or timeout fault
    Transport,
    /// Non-2xx response
    Rejected,
    /// Success status with an unreadable body
    Decode,
    /// Request was never sent
    Invalid,
}

impl From<&HhError> for FailureKind {
    fn from(err: &HhError) -> Self {
        match err {
            HhError::Transport(_) => FailureKind::Transport,
            HhError::Api { .. } => FailureKind::Rejected,
            HhError::Decode(_) => FailureKind::Decode,
            HhError::InvalidQuery { .. } | HhError::InvalidEndpoint { .. } => FailureKind::Invalid,
        }
    }
}

/// A page or record that was attempted and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl FetchFailure {
    pub fn page(page: u32, err: &HhError) -> Self {
        Self {
            page: Some(page),
            id: None,
            kind: err.into(),
            status: err.status(),
            message: err.to_string(),
        }
    }

    pub fn detail(id: impl Into<String>, err: &HhError) -> Self {
        Self {
            page: None,
            id: Some(id.into()),
            kind: err.into(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}
