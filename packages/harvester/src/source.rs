//! Remote collaborators the harvester talks to.
//!
//! [`VacancySource`] is the page/detail fetcher the driver and enricher run
//! against; [`RemoteSnapshots`] serves previously published snapshots for the
//! cache-bypass path. Both are implemented for [`HhClient`] and for
//! [`crate::testing::MockSource`].

use async_trait::async_trait;
use hh_client::{HhClient, HhError, VacancyDetail, VacancyPage, VacancyQuery};
use serde_json::Value;

/// Fetches listing pages and single records.
#[async_trait]
pub trait VacancySource: Send + Sync {
    /// Fetch one listing page. `page` is zero-based.
    async fn fetch_page(&self, query: &VacancyQuery, page: u32) -> Result<VacancyPage, HhError>;

    /// Fetch the full record for one id.
    async fn fetch_detail(&self, id: &str) -> Result<VacancyDetail, HhError>;
}

/// Fetches a published snapshot document by reference (usually a URL).
#[async_trait]
pub trait RemoteSnapshots: Send + Sync {
    async fn fetch_snapshot(&self, reference: &str) -> Result<Value, HhError>;
}

#[async_trait]
impl VacancySource for HhClient {
    async fn fetch_page(&self, query: &VacancyQuery, page: u32) -> Result<VacancyPage, HhError> {
        HhClient::fetch_page(self, query, page).await
    }

    async fn fetch_detail(&self, id: &str) -> Result<VacancyDetail, HhError> {
        self.fetch_vacancy(id).await
    }
}

#[async_trait]
impl RemoteSnapshots for HhClient {
    async fn fetch_snapshot(&self, reference: &str) -> Result<Value, HhError> {
        self.fetch_json(reference).await
    }
}
