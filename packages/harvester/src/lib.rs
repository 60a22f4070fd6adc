//! Paginated vacancy harvester.
//!
//! Lists every vacancy matching a query, persists the listing, fetches the
//! full record of each vacancy at a fixed pace, persists those too, and
//! reports key-skill frequencies. Requests are strictly sequential and
//! snapshots are only written at stage boundaries, so a run can be
//! interrupted between any two requests without leaving a torn file.
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvester::{HarvestSettings, Harvester};
//! use hh_client::{HhClient, VacancyQuery};
//!
//! let client = HhClient::new(hh_client::DEFAULT_ENDPOINT)?;
//! let harvester = Harvester::new(client, HarvestSettings::new("data", cache_url));
//!
//! let report = harvester.run_once(&VacancyQuery::default(), false).await?;
//! println!("{} vacancies, pages {}", report.details.len(), report.summaries.completeness);
//! ```
//!
//! # Modules
//!
//! - [`pagination`] - Walks every listing page of a query
//! - [`enrich`] - Rate-limited lazy detail fetching
//! - [`snapshot`] - JSON snapshot persistence and the published-snapshot path
//! - [`export`] - Spreadsheet rendering of summary and detail snapshots
//! - [`orchestrator`] - One end-to-end run and the scheduler job
//! - [`scheduler`] - Cron-driven recurring runs
//! - [`testing`] - Mock source for tests

pub mod config;
pub mod enrich;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod outcome;
pub mod pagination;
pub mod scheduler;
pub mod skills;
pub mod snapshot;
pub mod source;
pub mod testing;

pub use config::Config;
pub use enrich::{Enriched, Enricher, Enrichment};
pub use error::{HarvestError, Result};
pub use orchestrator::{HarvestSettings, Harvester, RunReport};
pub use outcome::{Completeness, FailureKind, FetchFailure};
pub use pagination::{harvest_all, Harvest};
pub use scheduler::start_scheduler;
pub use skills::{count_key_skills, SkillCount};
pub use snapshot::{Snapshot, SnapshotKind, SnapshotStore};
pub use source::{RemoteSnapshots, VacancySource};
