//! Pagination driver.
//!
//! Reads the total page count from page 0 and walks the remaining pages one
//! at a time, in order. The listing API has no documented support for
//! parallel paging, so requests are never overlapped.

use hh_client::{VacancyQuery, VacancySummary};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};
use crate::outcome::{Completeness, FetchFailure};
use crate::source::VacancySource;

/// Result of walking every page of one query.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// Items of every successful page, in page order.
    pub items: Vec<VacancySummary>,
    /// Pages succeeded out of the total declared by page 0.
    pub completeness: Completeness,
    /// Pages that failed and were skipped.
    pub failures: Vec<FetchFailure>,
}

impl Harvest {
    /// Drop repeated ids, keeping the first occurrence. Returns how many
    /// items were removed.
    ///
    /// Listings shift while paging, so the same vacancy can show up on two
    /// adjacent pages.
    pub fn dedup_by_id(&mut self) -> usize {
        let before = self.items.len();
        let mut seen = HashSet::with_capacity(before);
        self.items.retain(|item| seen.insert(item.id.clone()));
        before - self.items.len()
    }
}

/// Fetch every page of `query`.
///
/// A failure on page 0 aborts with [`HarvestError::FirstPage`] and no further
/// requests. A failure on any later page is logged, recorded in
/// [`Harvest::failures`] and skipped.
pub async fn harvest_all<S>(source: &S, query: &VacancyQuery) -> Result<Harvest>
where
    S: VacancySource + ?Sized,
{
    query.validate().map_err(HarvestError::InvalidQuery)?;

    let first = source.fetch_page(query, 0).await.map_err(|e| {
        warn!(error = %e, "First page failed, aborting harvest");
        HarvestError::FirstPage(e)
    })?;

    // An empty result still cost one request.
    let total = first.pages.max(1);
    info!(pages = total, found = first.found, text = query.text(), "Starting pagination");

    let mut items = first.items;
    let mut failures = Vec::new();
    let mut succeeded = 1usize;

    for page in 1..total {
        match source.fetch_page(query, page).await {
            Ok(result) => {
                if result.pages != first.pages {
                    debug!(
                        page,
                        declared = result.pages,
                        expected = first.pages,
                        "Page count drifted; keeping first page's total"
                    );
                }
                debug!(page, items = result.items.len(), "Page fetched");
                items.extend(result.items);
                succeeded += 1;
            }
            Err(e) => {
                warn!(page, error = %e, "Page failed, continuing");
                failures.push(FetchFailure::page(page, &e));
            }
        }
    }

    let completeness = Completeness::new(succeeded, total as usize);
    info!(
        items = items.len(),
        pages = %completeness,
        "Pagination finished"
    );

    Ok(Harvest {
        items,
        completeness,
        failures,
    })
}
