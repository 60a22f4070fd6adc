//! Integration tests for the harvest workflow.
//!
//! Runs the pagination driver, enricher, snapshot store and orchestrator
//! against `MockSource` and a temporary data directory.

use harvester::testing::{MockSource, MockSourceCall};
use harvester::{
    harvest_all, Completeness, Enricher, FailureKind, HarvestError, HarvestSettings, Harvester,
    Snapshot, SnapshotKind, SnapshotStore,
};
use hh_client::{HhClient, HhError, VacancyDetail, VacancyPage, VacancyQuery, VacancySummary};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

const CACHE_URL: &str = "https://example.test/published/vacancies_full.json";

fn python_query() -> VacancyQuery {
    VacancyQuery::builder().text("python").per_page(100).build()
}

fn settings(dir: &TempDir) -> HarvestSettings {
    HarvestSettings::new(dir.path(), CACHE_URL).with_detail_delay(Duration::ZERO)
}

fn ids(items: &[VacancySummary]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

/// A client-side fault that never reached the server.
fn transport_error() -> HhError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .unwrap_err();
    HhError::Transport(err)
}

/// A 200 response whose body is not the expected JSON.
fn decode_error() -> HhError {
    HhError::Decode(serde_json::from_str::<serde_json::Value>("<html>").unwrap_err())
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_issues_one_request_per_declared_page_in_order() {
    let source = MockSource::new().with_listing(4, 3);

    let harvest = harvest_all(&source, &python_query()).await.unwrap();

    assert_eq!(source.page_calls(), vec![0, 1, 2, 3]);
    assert_eq!(harvest.items.len(), 12);
    let expected: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
    assert_eq!(ids(&harvest.items), expected);
    assert_eq!(harvest.completeness, Completeness::full(4));
    assert!(harvest.failures.is_empty());
}

#[tokio::test]
async fn test_first_page_failure_aborts_without_further_requests() {
    let source = MockSource::new().with_listing(5, 10).fail_page(0, 503);

    let err = harvest_all(&source, &python_query()).await.unwrap_err();

    match err {
        HarvestError::FirstPage(inner) => assert_eq!(inner.status(), Some(503)),
        other => panic!("expected FirstPage, got {:?}", other),
    }
    assert_eq!(source.page_calls(), vec![0]);
}

#[tokio::test]
async fn test_first_page_transport_failure_aborts() {
    let source = MockSource::new()
        .with_listing(3, 10)
        .fail_page_with(0, transport_error);

    let err = harvest_all(&source, &python_query()).await.unwrap_err();

    match err {
        HarvestError::FirstPage(inner) => assert!(inner.is_transport()),
        other => panic!("expected FirstPage, got {:?}", other),
    }
    assert_eq!(source.page_calls(), vec![0]);
}

#[tokio::test]
async fn test_later_page_failures_record_their_kind() {
    let source = MockSource::new()
        .with_listing(4, 1)
        .fail_page_with(1, transport_error)
        .fail_page_with(2, decode_error);

    let harvest = harvest_all(&source, &python_query()).await.unwrap();

    assert_eq!(source.page_calls(), vec![0, 1, 2, 3]);
    assert_eq!(ids(&harvest.items), vec!["1", "4"]);
    assert_eq!(harvest.completeness, Completeness::new(2, 4));

    let kinds: Vec<_> = harvest.failures.iter().map(|f| (f.page, f.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (Some(1), FailureKind::Transport),
            (Some(2), FailureKind::Decode)
        ]
    );
    assert!(harvest.failures.iter().all(|f| f.status.is_none()));
}

#[tokio::test]
async fn test_garbage_page_body_over_http_is_recorded_as_decode() {
    let server = MockServer::start().await;
    let page = |index: u32, ids: &[&str]| {
        json!({
            "items": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "pages": 3,
            "page": index,
            "per_page": 100,
            "found": 3
        })
    };

    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0, &["a"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vacancies"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(2, &["c"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HhClient::new(&format!("{}/vacancies", server.uri())).unwrap();
    let harvest = harvest_all(&client, &python_query()).await.unwrap();

    assert_eq!(ids(&harvest.items), vec!["a", "c"]);
    assert_eq!(harvest.completeness.to_string(), "2/3");
    assert_eq!(harvest.failures[0].page, Some(1));
    assert_eq!(harvest.failures[0].kind, FailureKind::Decode);
}

#[tokio::test]
async fn test_middle_page_failure_does_not_stop_later_pages() {
    let source = MockSource::new().with_listing(5, 2).fail_page(2, 502);

    let harvest = harvest_all(&source, &python_query()).await.unwrap();

    assert_eq!(source.page_calls(), vec![0, 1, 2, 3, 4]);
    assert_eq!(ids(&harvest.items), vec!["1", "2", "3", "4", "7", "8", "9", "10"]);
    assert_eq!(harvest.completeness, Completeness::new(4, 5));
    assert_eq!(harvest.failures.len(), 1);
    assert_eq!(harvest.failures[0].page, Some(2));
    assert_eq!(harvest.failures[0].kind, FailureKind::Rejected);
    assert_eq!(harvest.failures[0].status, Some(502));
}

#[tokio::test]
async fn test_python_query_with_failing_last_page() {
    let source = MockSource::new().with_listing(3, 100).fail_page(2, 500);

    let harvest = harvest_all(&source, &python_query()).await.unwrap();

    assert_eq!(harvest.items.len(), 200);
    assert_eq!(harvest.completeness.to_string(), "2/3");
    assert!(!harvest.completeness.is_complete());
}

#[tokio::test]
async fn test_total_comes_from_first_page_only() {
    // Later pages claim a different total; the driver keeps the first one.
    let source = MockSource::new()
        .with_listing(2, 1)
        .with_page(
            1,
            VacancyPage {
                items: vec![VacancySummary::new("late")],
                pages: 9,
                page: 1,
                per_page: 1,
                found: 9,
            },
        );

    let harvest = harvest_all(&source, &python_query()).await.unwrap();

    assert_eq!(source.page_calls(), vec![0, 1]);
    assert_eq!(ids(&harvest.items), vec!["1", "late"]);
}

// =============================================================================
// Enrichment
// =============================================================================

#[tokio::test]
async fn test_enrich_requests_every_id_exactly_once_despite_failures() {
    let source = MockSource::new()
        .fail_detail("2", 404)
        .fail_detail("4", 500);
    let summaries: Vec<VacancySummary> = (1..=5)
        .map(|i| VacancySummary::new(i.to_string()))
        .collect();

    let enrichment = Enricher::new(Duration::ZERO)
        .collect(&source, summaries)
        .await;

    assert_eq!(source.detail_calls(), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(enrichment.details.len(), 3);
    assert_eq!(enrichment.completeness, Completeness::new(3, 5));

    let failed: Vec<_> = enrichment
        .failures
        .iter()
        .filter_map(|f| f.id.clone())
        .collect();
    assert_eq!(failed, vec!["2", "4"]);
}

#[tokio::test]
async fn test_enrich_records_transport_and_decode_failures() {
    let source = MockSource::new()
        .fail_detail_with("2", transport_error)
        .fail_detail_with("3", decode_error);
    let summaries: Vec<VacancySummary> = (1..=3)
        .map(|i| VacancySummary::new(i.to_string()))
        .collect();

    let enrichment = Enricher::new(Duration::ZERO)
        .collect(&source, summaries)
        .await;

    assert_eq!(source.detail_calls(), vec!["1", "2", "3"]);
    assert_eq!(enrichment.completeness, Completeness::new(1, 3));
    let kinds: Vec<_> = enrichment
        .failures
        .iter()
        .map(|f| (f.id.clone().unwrap(), f.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("2".to_string(), FailureKind::Transport),
            ("3".to_string(), FailureKind::Decode)
        ]
    );
}

// =============================================================================
// Snapshot store
// =============================================================================

#[tokio::test]
async fn test_save_then_load_round_trips_in_order() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let details = vec![
        VacancyDetail::new("3")
            .with_name("Аналитик данных")
            .with_description("<p>SQL, pandas</p>")
            .with_skill("SQL"),
        VacancyDetail::new("1").with_name("Backend developer"),
        VacancyDetail::new("2"),
    ];
    let snapshot = Snapshot::new(SnapshotKind::Details, details.clone())
        .with_query_key(python_query().cache_key())
        .with_completeness(Completeness::new(3, 4));

    store.save(&snapshot).await.unwrap();
    let loaded: Snapshot<VacancyDetail> = store.load(SnapshotKind::Details).await.unwrap();

    assert_eq!(loaded.items, details);
    assert_eq!(loaded.completeness, Completeness::new(3, 4));
    assert_eq!(loaded.query_key, snapshot.query_key);
}

#[tokio::test]
async fn test_save_overwrites_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let first = Snapshot::new(
        SnapshotKind::Summaries,
        vec![VacancySummary::new("1"), VacancySummary::new("2")],
    );
    let second = Snapshot::new(SnapshotKind::Summaries, vec![VacancySummary::new("9")]);

    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    let items: Vec<VacancySummary> = store.load_items(SnapshotKind::Summaries).await.unwrap();
    assert_eq!(ids(&items), vec!["9"]);
}

#[tokio::test]
async fn test_load_cached_accepts_bare_array_and_keeps_local_copy() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let source = MockSource::new().with_published(
        CACHE_URL,
        json!([
            {"id": "10", "name": "Data engineer", "key_skills": [{"name": "Spark"}]},
            {"id": "11", "key_skills": []}
        ]),
    );

    let cached: Snapshot<VacancyDetail> = store
        .load_cached(&source, CACHE_URL, SnapshotKind::Details)
        .await
        .unwrap();

    assert_eq!(cached.len(), 2);
    assert_eq!(cached.kind, SnapshotKind::Details);
    assert!(cached.is_complete());

    let on_disk: Snapshot<VacancyDetail> = store.load(SnapshotKind::Details).await.unwrap();
    assert_eq!(on_disk.items, cached.items);
}

#[tokio::test]
async fn test_load_cached_accepts_envelope() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());

    let published = Snapshot::new(SnapshotKind::Details, vec![VacancyDetail::new("7")])
        .with_completeness(Completeness::new(1, 2));
    let source =
        MockSource::new().with_published(CACHE_URL, serde_json::to_value(&published).unwrap());

    let cached: Snapshot<VacancyDetail> = store
        .load_cached(&source, CACHE_URL, SnapshotKind::Details)
        .await
        .unwrap();

    assert_eq!(cached.items[0].id, "7");
    assert_eq!(cached.completeness, Completeness::new(1, 2));
}

#[tokio::test]
async fn test_load_cached_local_copy_keeps_explicit_nulls() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let source = MockSource::new().with_published(
        CACHE_URL,
        json!([{"id": "12", "name": null, "description": null, "key_skills": []}]),
    );

    store
        .load_cached::<VacancyDetail, _>(&source, CACHE_URL, SnapshotKind::Details)
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(store.path_for(SnapshotKind::Details)).unwrap())
            .unwrap();
    let record = raw["items"][0].as_object().unwrap();
    assert!(record["name"].is_null());
    assert!(record.contains_key("description"));
}

#[tokio::test]
async fn test_load_cached_missing_reference_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let source = MockSource::new();

    let err = store
        .load_cached::<VacancyDetail, _>(&source, CACHE_URL, SnapshotKind::Details)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::RemoteSnapshot(_)));
    assert!(!store.path_for(SnapshotKind::Details).exists());
}

// =============================================================================
// Orchestrator
// =============================================================================

#[tokio::test]
async fn test_run_once_enriches_and_persists_every_stage() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new()
        .with_listing(2, 2)
        .with_detail(VacancyDetail::new("1").with_skill("Python").with_skill("SQL"))
        .with_detail(VacancyDetail::new("2").with_skill("Python"))
        .fail_detail("4", 500);
    let harvester = Harvester::new(source.clone(), settings(&dir));

    let report = harvester.run_once(&python_query(), false).await.unwrap();

    assert_eq!(report.summaries.len(), 4);
    assert!(report.summaries.is_complete());
    assert_eq!(report.details.len(), 3);
    assert_eq!(report.details.completeness.to_string(), "3/4");
    assert_eq!(report.details.failures[0].id.as_deref(), Some("4"));
    assert_eq!(report.skills[0].name, "Python");
    assert_eq!(report.skills[0].count, 2);

    let store = harvester.store();
    let summaries: Snapshot<VacancySummary> = store.load(SnapshotKind::Summaries).await.unwrap();
    let details: Snapshot<VacancyDetail> = store.load(SnapshotKind::Details).await.unwrap();
    assert_eq!(summaries.items, report.summaries.items);
    assert_eq!(details.items, report.details.items);
    assert_eq!(details.query_key, Some(python_query().cache_key()));
    assert!(store.path_for(SnapshotKind::KeySkills).exists());

    assert_eq!(source.detail_calls(), vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_run_once_exports_spreadsheets() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new().with_listing(1, 2);
    let harvester = Harvester::new(source, settings(&dir));

    harvester.run_once(&python_query(), false).await.unwrap();

    for name in ["vacancy_list.xlsx", "full_vacancies.xlsx"] {
        let bytes = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(&bytes[..2], b"PK", "{} is not an xlsx container", name);
    }
    assert!(!dir.path().join("key_skills.xlsx").exists());
}

#[tokio::test]
async fn test_concurrent_runs_are_serialized() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new().with_listing(2, 3);
    let harvester = Harvester::new(source.clone(), settings(&dir));
    let query = python_query();

    let (first, second) = tokio::join!(
        harvester.run_once(&query, false),
        harvester.run_once(&query, false)
    );
    first.unwrap();
    second.unwrap();

    // The second run starts only after the first has finished.
    assert_eq!(source.page_calls(), vec![0, 1, 0, 1]);
    let details: Vec<VacancyDetail> = harvester
        .store()
        .load_items(SnapshotKind::Details)
        .await
        .unwrap();
    assert_eq!(details.len(), 6);
}

#[tokio::test]
async fn test_run_once_with_cache_skips_detail_requests() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new()
        .with_listing(3, 5)
        .with_published(CACHE_URL, json!([{"id": "500", "key_skills": [{"name": "Go"}]}]));
    let harvester = Harvester::new(source.clone(), settings(&dir));

    let report = harvester.run_once(&python_query(), true).await.unwrap();

    assert_eq!(report.summaries.len(), 15);
    assert_eq!(report.details.items[0].id, "500");
    assert!(source.detail_calls().is_empty());
    assert!(source.calls().contains(&MockSourceCall::Snapshot {
        reference: CACHE_URL.to_string()
    }));
    assert_eq!(report.skills[0].name, "Go");
}

#[tokio::test]
async fn test_run_once_drops_repeated_ids_before_enrichment() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new()
        .with_listing(2, 2)
        .with_page(
            1,
            VacancyPage {
                items: vec![VacancySummary::new("2"), VacancySummary::new("3")],
                pages: 2,
                page: 1,
                per_page: 2,
                found: 4,
            },
        );
    let harvester = Harvester::new(source.clone(), settings(&dir));

    let report = harvester.run_once(&python_query(), false).await.unwrap();

    assert_eq!(report.duplicates, 1);
    assert_eq!(ids(&report.summaries.items), vec!["1", "2", "3"]);
    assert_eq!(source.detail_calls(), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_failed_first_page_leaves_previous_snapshots_untouched() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path());
    let previous = Snapshot::new(SnapshotKind::Summaries, vec![VacancySummary::new("old")]);
    store.save(&previous).await.unwrap();

    let source = MockSource::new().with_listing(3, 1).fail_page(0, 500);
    let harvester = Harvester::new(source.clone(), settings(&dir));

    let err = harvester.run_once(&python_query(), false).await.unwrap_err();
    assert!(matches!(err, HarvestError::FirstPage(_)));

    let items: Vec<VacancySummary> = store.load_items(SnapshotKind::Summaries).await.unwrap();
    assert_eq!(ids(&items), vec!["old"]);
    assert!(!store.path_for(SnapshotKind::Details).exists());
    assert!(source.detail_calls().is_empty());
}

#[tokio::test]
async fn test_job_is_a_zero_argument_harvest() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new().with_listing(1, 3);
    let harvester = Arc::new(Harvester::new(source.clone(), settings(&dir)));

    let job = Arc::clone(&harvester).job(python_query(), false);
    job().await;
    job().await;

    // Two full runs, each overwriting the same snapshots.
    assert_eq!(source.page_calls(), vec![0, 0]);
    assert_eq!(source.detail_calls().len(), 6);
    let details: Vec<VacancyDetail> = harvester
        .store()
        .load_items(SnapshotKind::Details)
        .await
        .unwrap();
    assert_eq!(details.len(), 3);
}

#[tokio::test]
async fn test_job_skips_tick_while_a_run_is_in_progress() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new().with_listing(1, 3);
    let settings = HarvestSettings::new(dir.path(), CACHE_URL)
        .with_detail_delay(Duration::from_millis(100));
    let harvester = Arc::new(Harvester::new(source.clone(), settings));

    let job = Arc::clone(&harvester).job(python_query(), false);
    let running = tokio::spawn(job());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Fires mid-enrichment and returns without touching the source.
    job().await;
    running.await.unwrap();

    assert_eq!(source.page_calls(), vec![0]);
    assert_eq!(source.detail_calls().len(), 3);
}

#[tokio::test]
async fn test_job_swallows_errors() {
    let dir = TempDir::new().unwrap();
    let source = MockSource::new().fail_page(0, 500);
    let harvester = Arc::new(Harvester::new(source.clone(), settings(&dir)));

    let job = harvester.job(python_query(), false);
    job().await;

    assert_eq!(source.page_calls(), vec![0]);
}
