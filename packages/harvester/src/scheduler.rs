//! Recurring harvests using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (daily, HARVEST_SCHEDULE)
//!     │
//!     └─► Harvester::job()
//!             └─► run_once(query, use_cache)
//!                     └─► vacancies.json, vacancies_full.json, key_skills.json
//! ```
//!
//! Missed runs and clock drift are the scheduler's concern; a run that fails
//! is logged and the next tick starts a fresh harvest.

use hh_client::VacancyQuery;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{HarvestError, Result};
use crate::orchestrator::Harvester;
use crate::source::{RemoteSnapshots, VacancySource};

/// Register the harvest job on `cron` and start the scheduler.
pub async fn start_scheduler<S>(
    harvester: Arc<Harvester<S>>,
    query: VacancyQuery,
    use_cache: bool,
    cron: &str,
) -> Result<JobScheduler>
where
    S: VacancySource + RemoteSnapshots + 'static,
{
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| HarvestError::Schedule(e.to_string()))?;

    let run = harvester.job(query, use_cache);
    let job = Job::new_async(cron, move |_uuid, _lock| run())
        .map_err(|e| HarvestError::Schedule(format!("invalid schedule '{}': {}", cron, e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| HarvestError::Schedule(e.to_string()))?;
    scheduler
        .start()
        .await
        .map_err(|e| HarvestError::Schedule(e.to_string()))?;

    tracing::info!(cron, "Harvest scheduler started");
    Ok(scheduler)
}
