//! Snapshot store.
//!
//! One JSON file per snapshot kind under a data directory. Every save
//! replaces the previous file for that kind; nothing is merged or versioned.
//! Files are UTF-8, pretty-printed with four-space indentation, and keep
//! non-ASCII text unescaped.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::outcome::{Completeness, FetchFailure};
use crate::source::RemoteSnapshots;

/// What a snapshot holds. Each kind maps to one fixed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Listing summaries
    Summaries,
    /// Full vacancy records
    Details,
    /// Cleaned description texts. Only the downstream text pipeline writes
    /// this kind; the harvester reserves its file name so both sides agree.
    Preprocessed,
    /// Key-skill frequency report
    KeySkills,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Summaries => "vacancies.json",
            SnapshotKind::Details => "vacancies_full.json",
            SnapshotKind::Preprocessed => "preprocessed.json",
            SnapshotKind::KeySkills => "key_skills.json",
        }
    }

    /// Spreadsheet the kind is also exported to, if any.
    pub fn spreadsheet_name(&self) -> Option<&'static str> {
        match self {
            SnapshotKind::Summaries => Some("vacancy_list.xlsx"),
            SnapshotKind::Details => Some("full_vacancies.xlsx"),
            SnapshotKind::Preprocessed | SnapshotKind::KeySkills => None,
        }
    }
}

/// A persisted, timestamped collection with its completeness record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    /// Cache key of the query that produced the items, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_key: Option<String>,
    pub completeness: Completeness,
    #[serde(default)]
    pub failures: Vec<FetchFailure>,
    pub items: Vec<T>,
}

impl<T> Snapshot<T> {
    /// A snapshot marked complete over its own items.
    pub fn new(kind: SnapshotKind, items: Vec<T>) -> Self {
        Self {
            kind,
            created_at: Utc::now(),
            query_key: None,
            completeness: Completeness::full(items.len()),
            failures: Vec::new(),
            items,
        }
    }

    pub fn with_query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = Some(key.into());
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = completeness;
        self
    }

    pub fn with_failures(mut self, failures: Vec<FetchFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.completeness.is_complete()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shapes a published snapshot may come in.
#[derive(Deserialize)]
#[serde(untagged)]
enum Published<T> {
    Snapshot(Snapshot<T>),
    Items(Vec<T>),
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Write `snapshot`, replacing any previous file of the same kind.
    ///
    /// The JSON goes to a uniquely named temp file in the same directory and
    /// is renamed into place, so readers never observe a half-written
    /// snapshot and concurrent writers never share a temp file. The last
    /// rename wins.
    pub async fn save<T: Serialize>(&self, snapshot: &Snapshot<T>) -> Result<PathBuf> {
        let path = self.path_for(snapshot.kind);
        let body = to_pretty_json(snapshot)?;
        let path = self.write_atomic(path, body).await?;

        info!(
            path = %path.display(),
            items = snapshot.items.len(),
            completeness = %snapshot.completeness,
            "Snapshot saved"
        );
        Ok(path)
    }

    /// Export the items of `snapshot` to the kind's spreadsheet, replacing
    /// any previous one. Kinds without a spreadsheet are skipped.
    pub async fn export_spreadsheet<T: Serialize>(
        &self,
        snapshot: &Snapshot<T>,
    ) -> Result<Option<PathBuf>> {
        let Some(name) = snapshot.kind.spreadsheet_name() else {
            return Ok(None);
        };

        let body = crate::export::workbook_bytes(&snapshot.items)?;
        let path = self.write_atomic(self.dir.join(name), body).await?;
        info!(path = %path.display(), rows = snapshot.items.len(), "Spreadsheet exported");
        Ok(Some(path))
    }

    /// Read the snapshot of `kind` back from disk.
    pub async fn load<T: DeserializeOwned>(&self, kind: SnapshotKind) -> Result<Snapshot<T>> {
        let path = self.path_for(kind);
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| HarvestError::snapshot_io(&path, e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Read only the items of the snapshot of `kind`.
    pub async fn load_items<T: DeserializeOwned>(&self, kind: SnapshotKind) -> Result<Vec<T>> {
        Ok(self.load::<T>(kind).await?.items)
    }

    /// Fetch a previously published snapshot instead of harvesting, and keep
    /// a local copy under `kind`.
    ///
    /// The published document may be a bare JSON array of records or a full
    /// snapshot envelope; either way the result has the same shape as what
    /// [`SnapshotStore::save`] writes.
    pub async fn load_cached<T, R>(
        &self,
        remote: &R,
        reference: &str,
        kind: SnapshotKind,
    ) -> Result<Snapshot<T>>
    where
        T: Serialize + DeserializeOwned,
        R: RemoteSnapshots + ?Sized,
    {
        info!(reference, ?kind, "Loading published snapshot");
        let document = remote
            .fetch_snapshot(reference)
            .await
            .map_err(HarvestError::RemoteSnapshot)?;

        let snapshot = match serde_json::from_value::<Published<T>>(document)? {
            Published::Snapshot(mut snapshot) => {
                snapshot.kind = kind;
                snapshot
            }
            Published::Items(items) => Snapshot::new(kind, items),
        };

        self.save(&snapshot).await?;
        Ok(snapshot)
    }

    /// Replace `path` with `body` via a temp file in the store directory.
    pub(crate) async fn write_atomic(&self, path: PathBuf, body: Vec<u8>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| HarvestError::snapshot_io(&self.dir, e))?;

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let mut tmp =
                NamedTempFile::new_in(&dir).map_err(|e| HarvestError::snapshot_io(&dir, e))?;
            tmp.write_all(&body)
                .map_err(|e| HarvestError::snapshot_io(tmp.path(), e))?;
            tmp.persist(&path)
                .map_err(|e| HarvestError::snapshot_io(&path, e.error))?;
            Ok(path)
        })
        .await
        .map_err(|e| HarvestError::snapshot_io(&self.dir, std::io::Error::other(e)))?
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    value.serialize(&mut serializer)?;
    body.push(b'\n');
    Ok(body)
}
