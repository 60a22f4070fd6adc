//! Run orchestrator.
//!
//! One harvest end to end: list summaries, save and export them, obtain
//! details either by enrichment or from the published snapshot, save and
//! export those, then write the key-skill report. Files are only written at
//! these completion points.
//!
//! Runs on one `Harvester` never overlap: `run_once` waits for the previous
//! run, and a scheduled job that fires while a run is in progress is skipped.
//!
//! The orchestrator has no notion of time; recurring runs come from
//! [`crate::scheduler`] through [`Harvester::job`].

use futures::future::BoxFuture;
use hh_client::{VacancyDetail, VacancyQuery, VacancySummary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::enrich::{Enricher, DEFAULT_DETAIL_DELAY};
use crate::error::Result;
use crate::pagination::harvest_all;
use crate::skills::{count_key_skills, SkillCount};
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotStore};
use crate::source::{RemoteSnapshots, VacancySource};

/// Explicit per-harvester settings.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    /// Directory snapshots are written to
    pub data_dir: PathBuf,
    /// Reference of the published detail snapshot used when bypassing enrichment
    pub cache_reference: String,
    /// Pause between detail requests
    pub detail_delay: Duration,
}

impl HarvestSettings {
    pub fn new(data_dir: impl Into<PathBuf>, cache_reference: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_reference: cache_reference.into(),
            detail_delay: DEFAULT_DETAIL_DELAY,
        }
    }

    pub fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }
}

impl From<&Config> for HarvestSettings {
    fn from(config: &Config) -> Self {
        Self::new(config.data_dir.clone(), config.cache_url.clone())
            .with_detail_delay(config.detail_delay)
    }
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summaries: Snapshot<VacancySummary>,
    pub details: Snapshot<VacancyDetail>,
    pub skills: Vec<SkillCount>,
    /// Repeated listing ids dropped before enrichment
    pub duplicates: usize,
}

pub struct Harvester<S> {
    source: Arc<S>,
    store: SnapshotStore,
    enricher: Enricher,
    cache_reference: String,
    running: Mutex<()>,
}

impl<S> Harvester<S>
where
    S: VacancySource + RemoteSnapshots + 'static,
{
    pub fn new(source: S, settings: HarvestSettings) -> Self {
        Self::with_shared_source(Arc::new(source), settings)
    }

    pub fn with_shared_source(source: Arc<S>, settings: HarvestSettings) -> Self {
        Self {
            source,
            store: SnapshotStore::new(settings.data_dir),
            enricher: Enricher::new(settings.detail_delay),
            cache_reference: settings.cache_reference,
            running: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Harvest `query` once and persist every stage.
    ///
    /// With `use_cache` the detail pass is replaced by the published snapshot.
    /// Fails only if page 0 fails or a snapshot or spreadsheet cannot be
    /// written; later-page and detail failures are recorded in the snapshots.
    pub async fn run_once(&self, query: &VacancyQuery, use_cache: bool) -> Result<RunReport> {
        let _running = self.running.lock().await;
        self.run_exclusive(query, use_cache).await
    }

    async fn run_exclusive(&self, query: &VacancyQuery, use_cache: bool) -> Result<RunReport> {
        let query_key = query.cache_key();
        info!(text = query.text(), query_key = %query_key, use_cache, "Harvest starting");

        let mut harvest = harvest_all(self.source.as_ref(), query).await?;
        let duplicates = harvest.dedup_by_id();
        if duplicates > 0 {
            info!(duplicates, "Dropped repeated listing ids");
        }

        let summaries = Snapshot::new(SnapshotKind::Summaries, harvest.items)
            .with_query_key(&query_key)
            .with_completeness(harvest.completeness)
            .with_failures(harvest.failures);
        self.store.save(&summaries).await?;
        self.store.export_spreadsheet(&summaries).await?;

        let details = if use_cache {
            self.store
                .load_cached(
                    self.source.as_ref(),
                    &self.cache_reference,
                    SnapshotKind::Details,
                )
                .await?
        } else {
            let enrichment = self
                .enricher
                .collect(self.source.as_ref(), summaries.items.clone())
                .await;
            let details = Snapshot::new(SnapshotKind::Details, enrichment.details)
                .with_query_key(&query_key)
                .with_completeness(enrichment.completeness)
                .with_failures(enrichment.failures);
            self.store.save(&details).await?;
            details
        };
        self.store.export_spreadsheet(&details).await?;

        let skills = count_key_skills(&details.items);
        let report = Snapshot::new(SnapshotKind::KeySkills, skills.clone());
        let report = match &details.query_key {
            Some(key) => report.with_query_key(key),
            None => report,
        };
        self.store.save(&report).await?;

        info!(
            summaries = summaries.len(),
            pages = %summaries.completeness,
            details = details.len(),
            records = %details.completeness,
            "Harvest finished"
        );

        Ok(RunReport {
            summaries,
            details,
            skills,
            duplicates,
        })
    }

    /// Zero-argument job for a scheduler. Errors are logged, never propagated.
    ///
    /// A tick that arrives while another run holds this harvester is skipped.
    pub fn job(
        self: Arc<Self>,
        query: VacancyQuery,
        use_cache: bool,
    ) -> impl Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static {
        move || -> BoxFuture<'static, ()> {
            let harvester = Arc::clone(&self);
            let query = query.clone();
            Box::pin(async move {
                let Ok(_running) = harvester.running.try_lock() else {
                    warn!("Previous harvest still running, skipping this tick");
                    return;
                };
                match harvester.run_exclusive(&query, use_cache).await {
                    Ok(report) => info!(
                        details = report.details.len(),
                        complete = report.details.is_complete(),
                        "Scheduled harvest done"
                    ),
                    Err(e) => error!("Scheduled harvest failed: {}", e),
                }
            })
        }
    }
}
