//! Testing utilities including a mock vacancy source.
//!
//! Useful for exercising the harvester without touching the network.

use async_trait::async_trait;
use hh_client::{HhError, VacancyDetail, VacancyPage, VacancyQuery, VacancySummary};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::source::{RemoteSnapshots, VacancySource};

/// Builds the error a failing page or record answers with.
type ErrorFactory = Arc<dyn Fn() -> HhError + Send + Sync>;

/// A mock [`VacancySource`] with predefined pages and records.
///
/// Unknown detail ids resolve to a generated record, so a listing built with
/// [`MockSource::with_listing`] can be enriched without further setup.
#[derive(Default, Clone)]
pub struct MockSource {
    /// Predefined listing pages by index
    pages: Arc<RwLock<HashMap<u32, VacancyPage>>>,

    /// Pages that answer with an error
    fail_pages: Arc<RwLock<HashMap<u32, ErrorFactory>>>,

    /// Predefined detail records by id
    details: Arc<RwLock<HashMap<String, VacancyDetail>>>,

    /// Ids that answer with an error
    fail_details: Arc<RwLock<HashMap<String, ErrorFactory>>>,

    /// Published snapshot documents by reference
    published: Arc<RwLock<HashMap<String, Value>>>,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockSourceCall>>>,
}

/// Record of a call made to the mock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSourceCall {
    Page { page: u32 },
    Detail { id: String },
    Snapshot { reference: String },
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate `pages` pages of `per_page` items each. Ids are sequential
    /// across pages starting at 1.
    pub fn with_listing(self, pages: u32, per_page: usize) -> Self {
        let mut next_id = 1usize;
        let mut store = self.pages.write().unwrap();
        for page in 0..pages.max(1) {
            let count = if pages == 0 { 0 } else { per_page };
            let items = (0..count)
                .map(|_| {
                    let summary = VacancySummary::new(next_id.to_string())
                        .with_name(format!("Vacancy {}", next_id));
                    next_id += 1;
                    summary
                })
                .collect();
            store.insert(
                page,
                VacancyPage {
                    items,
                    pages,
                    page,
                    per_page: per_page as u32,
                    found: (pages as u64) * (per_page as u64),
                },
            );
        }
        drop(store);
        self
    }

    /// Add or replace one listing page.
    pub fn with_page(self, page: u32, result: VacancyPage) -> Self {
        self.pages.write().unwrap().insert(page, result);
        self
    }

    /// Make a listing page answer with `status`.
    pub fn fail_page(self, page: u32, status: u16) -> Self {
        self.fail_page_with(page, move || Self::rejection(status))
    }

    /// Make a listing page fail with whatever `error` builds, e.g. a
    /// transport or decode error.
    pub fn fail_page_with<F>(self, page: u32, error: F) -> Self
    where
        F: Fn() -> HhError + Send + Sync + 'static,
    {
        self.fail_pages.write().unwrap().insert(page, Arc::new(error));
        self
    }

    /// Add a predefined detail record.
    pub fn with_detail(self, detail: VacancyDetail) -> Self {
        self.details
            .write()
            .unwrap()
            .insert(detail.id.clone(), detail);
        self
    }

    /// Make a detail request answer with `status`.
    pub fn fail_detail(self, id: impl Into<String>, status: u16) -> Self {
        self.fail_detail_with(id, move || Self::rejection(status))
    }

    /// Make a detail request fail with whatever `error` builds.
    pub fn fail_detail_with<F>(self, id: impl Into<String>, error: F) -> Self
    where
        F: Fn() -> HhError + Send + Sync + 'static,
    {
        self.fail_details
            .write()
            .unwrap()
            .insert(id.into(), Arc::new(error));
        self
    }

    /// Serve `document` for `reference` via [`RemoteSnapshots`].
    pub fn with_published(self, reference: impl Into<String>, document: Value) -> Self {
        self.published
            .write()
            .unwrap()
            .insert(reference.into(), document);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockSourceCall> {
        self.calls.read().unwrap().clone()
    }

    /// Listing pages requested, in order.
    pub fn page_calls(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockSourceCall::Page { page } => Some(page),
                _ => None,
            })
            .collect()
    }

    /// Detail ids requested, in order.
    pub fn detail_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockSourceCall::Detail { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    fn rejection(status: u16) -> HhError {
        HhError::Api {
            status,
            message: format!("mock status {}", status),
        }
    }
}

#[async_trait]
impl VacancySource for MockSource {
    async fn fetch_page(&self, _query: &VacancyQuery, page: u32) -> Result<VacancyPage, HhError> {
        self.calls
            .write()
            .unwrap()
            .push(MockSourceCall::Page { page });

        if let Some(error) = self.fail_pages.read().unwrap().get(&page) {
            return Err(error());
        }

        self.pages
            .read()
            .unwrap()
            .get(&page)
            .cloned()
            .ok_or_else(|| Self::rejection(404))
    }

    async fn fetch_detail(&self, id: &str) -> Result<VacancyDetail, HhError> {
        self.calls
            .write()
            .unwrap()
            .push(MockSourceCall::Detail { id: id.to_string() });

        if let Some(error) = self.fail_details.read().unwrap().get(id) {
            return Err(error());
        }

        let detail = self
            .details
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| VacancyDetail::new(id).with_name(format!("Vacancy {}", id)));
        Ok(detail)
    }
}

#[async_trait]
impl RemoteSnapshots for MockSource {
    async fn fetch_snapshot(&self, reference: &str) -> Result<Value, HhError> {
        self.calls.write().unwrap().push(MockSourceCall::Snapshot {
            reference: reference.to_string(),
        });

        self.published
            .read()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| Self::rejection(404))
    }
}
