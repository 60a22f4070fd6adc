//! Detail enricher.
//!
//! Turns listing summaries into full records, one request per id with a
//! fixed pause between requests. The pause keeps the harvester below the
//! remote abuse-detection threshold; it is not a retry backoff and failed
//! ids are never retried.

use async_stream::stream;
use futures::{pin_mut, Stream, StreamExt};
use hh_client::{VacancyDetail, VacancySummary};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::outcome::{Completeness, FetchFailure};
use crate::source::VacancySource;

/// Default pause between detail requests.
pub const DEFAULT_DETAIL_DELAY: Duration = Duration::from_millis(200);

/// One step of an enrichment pass.
#[derive(Debug, Clone)]
pub enum Enriched {
    Detail(VacancyDetail),
    Failed(FetchFailure),
}

/// Everything an enrichment pass produced.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub details: Vec<VacancyDetail>,
    pub failures: Vec<FetchFailure>,
    /// Records fetched out of summaries attempted.
    pub completeness: Completeness,
}

#[derive(Debug, Clone)]
pub struct Enricher {
    delay: Duration,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(DEFAULT_DETAIL_DELAY)
    }
}

impl Enricher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Lazily fetch the full record of every summary, in order.
    ///
    /// The stream owns `summaries` and yields exactly one item per summary.
    /// Dropping it stops the pass between two requests; there is no way to
    /// resume, a new pass starts from the first summary.
    pub fn enrich<'a, S>(
        &self,
        source: &'a S,
        summaries: Vec<VacancySummary>,
    ) -> impl Stream<Item = Enriched> + Send + 'a
    where
        S: VacancySource + ?Sized + 'a,
    {
        let delay = self.delay;
        stream! {
            let total = summaries.len();
            for (index, summary) in summaries.into_iter().enumerate() {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                match source.fetch_detail(&summary.id).await {
                    Ok(detail) => {
                        debug!(id = %summary.id, progress = index + 1, total, "Detail fetched");
                        yield Enriched::Detail(detail);
                    }
                    Err(e) => {
                        warn!(id = %summary.id, error = %e, "Detail failed, continuing");
                        yield Enriched::Failed(FetchFailure::detail(summary.id, &e));
                    }
                }
            }
        }
    }

    /// Drive [`Enricher::enrich`] to the end and gather the results.
    pub async fn collect<S>(&self, source: &S, summaries: Vec<VacancySummary>) -> Enrichment
    where
        S: VacancySource + ?Sized,
    {
        let total = summaries.len();
        info!(total, delay_ms = self.delay.as_millis() as u64, "Starting enrichment");

        let stream = self.enrich(source, summaries);
        pin_mut!(stream);

        let mut details = Vec::with_capacity(total);
        let mut failures = Vec::new();
        while let Some(step) = stream.next().await {
            match step {
                Enriched::Detail(detail) => details.push(detail),
                Enriched::Failed(failure) => failures.push(failure),
            }
        }

        let completeness = Completeness::new(details.len(), total);
        info!(records = %completeness, "Enrichment finished");

        Enrichment {
            details,
            failures,
            completeness,
        }
    }
}
