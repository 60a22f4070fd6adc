//! Pure HeadHunter vacancies REST client.
//!
//! A minimal client for the public `api.hh.ru/vacancies` endpoint. Fetches
//! one listing page at a time, single vacancy records, and arbitrary
//! published JSON documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use hh_client::{HhClient, VacancyQuery};
//!
//! let client = HhClient::new(hh_client::DEFAULT_ENDPOINT)?;
//! let query = VacancyQuery::builder().text("python").build();
//!
//! let page = client.fetch_page(&query, 0).await?;
//! println!("{} pages, {} found", page.pages, page.found);
//! ```

pub mod error;
pub mod types;

pub use error::{HhError, Result};
pub use types::{
    Employment, Experience, KeySkill, Schedule, VacancyDetail, VacancyPage, VacancyQuery,
    VacancySummary, MAX_PERIOD_DAYS, MAX_PER_PAGE,
};

use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Public vacancies endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.hh.ru/vacancies";

const DEFAULT_USER_AGENT: &str = "vacancy-harvester/0.1";

pub struct HhClient {
    client: reqwest::Client,
    endpoint: Url,
    user_agent: String,
}

impl HhClient {
    /// Create a client for the given listing endpoint.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/')).map_err(|_| {
            HhError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
            }
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(HhError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
            });
        }

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the `HH-User-Agent` header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch one listing page.
    ///
    /// The descriptor is serialized on every call. Non-2xx answers come back
    /// as [`HhError::Api`] with the raw body.
    pub async fn fetch_page(&self, query: &VacancyQuery, page: u32) -> Result<VacancyPage> {
        query.validate()?;

        tracing::debug!(page, text = query.text(), "Fetching vacancy page");
        self.get_json(self.endpoint.clone(), &query.to_params(page))
            .await
    }

    /// Fetch the full record for one vacancy.
    pub async fn fetch_vacancy(&self, id: &str) -> Result<VacancyDetail> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| HhError::InvalidEndpoint {
                endpoint: self.endpoint.to_string(),
            })?
            .push(id);

        tracing::debug!(id, "Fetching vacancy detail");
        self.get_json(url, &[]).await
    }

    /// Fetch an arbitrary JSON document, e.g. a previously published snapshot.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let url = Url::parse(url).map_err(|_| HhError::InvalidEndpoint {
            endpoint: url.to_string(),
        })?;
        self.get_json(url, &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .header("HH-User-Agent", &self.user_agent)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HhError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
