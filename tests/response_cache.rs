use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use tasmik::cache::{
    CACHE_KEY_HEADER, CACHE_STATUS_HEADER, CacheConfig, CacheState, ManualClock, MemoryStore,
    ResponseStore, StoreError, StoredResponse, UnavailableStore,
};
use tasmik::domain::entities::ParticipantRecord;
use tasmik::domain::types::{AssessmentStatus, Gender};
use tasmik::infra::http::{AppState, build_router};
use tasmik::infra::memory::MemoryDirectory;

/// Delegates to an in-memory store while recording every write key, so
/// tests can assert which requests were (never) stored.
struct SpyStore {
    inner: MemoryStore,
    puts: Mutex<Vec<String>>,
}

impl SpyStore {
    fn new() -> Self {
        Self::with_inner(MemoryStore::new())
    }

    fn with_inner(inner: MemoryStore) -> Self {
        Self {
            inner,
            puts: Mutex::new(Vec::new()),
        }
    }

    fn put_keys(&self) -> Vec<String> {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ResponseStore for SpyStore {
    async fn get(&self, key: &str) -> Result<Option<StoredResponse>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        response: StoredResponse,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.puts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(key.to_string());
        self.inner.put(key, response, ttl).await
    }
}

fn participant(name: &str, status: AssessmentStatus) -> ParticipantRecord {
    let now = OffsetDateTime::now_utc();
    ParticipantRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        gender: Gender::Male,
        status,
        assessor_id: None,
        regency_id: Uuid::new_v4(),
        juz_memorized: 10,
        created_at: now,
        updated_at: now,
    }
}

fn build_state(store: Arc<dyn ResponseStore>, config: CacheConfig) -> (Router, Arc<MemoryDirectory>) {
    let directory = Arc::new(MemoryDirectory::with_demo_regions());
    directory.insert_participant(participant("Aisyah", AssessmentStatus::Sudah));
    directory.insert_participant(participant("Bilal", AssessmentStatus::Belum));

    let state = AppState {
        participants: directory.clone(),
        assessors: directory.clone(),
        regions: directory.clone(),
        cache: CacheState { config, store },
    };
    (build_router(state), directory)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// The write-back is fire-and-forget; give the spawned task a chance to
/// land before asserting on store contents.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn miss_then_hit_serves_identical_payload_without_rerunning_the_handler() {
    let spy = Arc::new(SpyStore::new());
    let (router, directory) = build_state(spy.clone(), CacheConfig::default());

    let first = router
        .clone()
        .oneshot(get("/participants"))
        .await
        .expect("first response");
    assert_eq!(first.headers()[CACHE_STATUS_HEADER], "MISS");
    assert_eq!(first.headers()[CACHE_KEY_HEADER], "quran:participants:v1");
    let first_page = body_json(first).await;
    assert_eq!(first_page["total"], 2);

    settle().await;
    assert_eq!(spy.put_keys(), vec!["quran:participants:v1".to_string()]);

    // Mutate the underlying data: a HIT must still serve the stored
    // payload, proving the handler did not run again.
    directory.insert_participant(participant("Fatimah", AssessmentStatus::Sudah));

    let second = router
        .oneshot(get("/participants"))
        .await
        .expect("second response");
    assert_eq!(second.headers()[CACHE_STATUS_HEADER], "HIT");
    let second_page = body_json(second).await;
    assert_eq!(second_page, first_page);
}

#[tokio::test]
async fn excluded_workflow_paths_are_never_stored() {
    let spy = Arc::new(SpyStore::new());
    let (router, _) = build_state(spy.clone(), CacheConfig::default());

    for _ in 0..3 {
        let unassessed = router
            .clone()
            .oneshot(get("/participants/unassessed"))
            .await
            .expect("response");
        assert_eq!(unassessed.headers()[CACHE_STATUS_HEADER], "DISABLED");

        let ready = router
            .clone()
            .oneshot(get("/participants/ready"))
            .await
            .expect("response");
        assert_eq!(ready.headers()[CACHE_STATUS_HEADER], "DISABLED");
    }

    settle().await;
    assert!(spy.put_keys().is_empty());
}

#[tokio::test]
async fn volatile_status_value_is_excluded_while_plain_list_is_cached() {
    let spy = Arc::new(SpyStore::new());
    let (router, _) = build_state(spy.clone(), CacheConfig::default());

    let volatile = router
        .clone()
        .oneshot(get("/participants?status=BELUM"))
        .await
        .expect("volatile response");
    assert_eq!(volatile.headers()[CACHE_STATUS_HEADER], "DISABLED");

    let plain = router
        .clone()
        .oneshot(get("/participants"))
        .await
        .expect("plain response");
    assert_eq!(plain.headers()[CACHE_STATUS_HEADER], "MISS");

    let done = router
        .oneshot(get("/participants?status=SUDAH"))
        .await
        .expect("done response");
    assert_eq!(done.headers()[CACHE_STATUS_HEADER], "MISS");

    settle().await;
    let keys = spy.put_keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|key| !key.contains("BELUM")));
}

#[tokio::test]
async fn mutating_requests_bypass_the_cache() {
    let spy = Arc::new(SpyStore::new());
    let (router, directory) = build_state(spy.clone(), CacheConfig::default());

    let regency = tasmik::application::sources::RegionSource::regencies(
        directory.as_ref(),
        &tasmik::application::query::QueryDescriptor {
            filters: Vec::new(),
            pages: tasmik::application::query::PageSelection::All,
            sort: tasmik::application::query::Sort {
                field: "code".to_string(),
                direction: tasmik::application::query::SortDirection::Asc,
            },
        },
    )
    .await
    .expect("regencies")
    .items
    .remove(0);

    let request = Request::builder()
        .method("POST")
        .uri("/participants")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "name": "Umar",
                "gender": "male",
                "regency_id": regency.id,
            })
            .to_string(),
        ))
        .expect("request");

    let response = router.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "DISABLED");

    settle().await;
    assert!(spy.put_keys().is_empty());
}

#[tokio::test]
async fn entry_expires_after_ttl_and_misses_again() {
    let clock = Arc::new(ManualClock::new());
    let spy = Arc::new(SpyStore::with_inner(MemoryStore::with_clock(clock.clone())));
    let config = CacheConfig {
        default_ttl_seconds: 1,
        ..Default::default()
    };
    let (router, _) = build_state(spy.clone(), config);

    let first = router
        .clone()
        .oneshot(get("/participants"))
        .await
        .expect("first response");
    assert_eq!(first.headers()[CACHE_STATUS_HEADER], "MISS");
    settle().await;

    let hit = router
        .clone()
        .oneshot(get("/participants"))
        .await
        .expect("hit response");
    assert_eq!(hit.headers()[CACHE_STATUS_HEADER], "HIT");

    clock.advance(Duration::from_secs(2));

    let after_expiry = router
        .oneshot(get("/participants"))
        .await
        .expect("post-expiry response");
    assert_eq!(after_expiry.headers()[CACHE_STATUS_HEADER], "MISS");
}

#[tokio::test]
async fn reordered_query_parameters_share_one_key() {
    let spy = Arc::new(SpyStore::new());
    let (router, _) = build_state(spy.clone(), CacheConfig::default());

    let first = router
        .clone()
        .oneshot(get("/participants?limit=5&page=1"))
        .await
        .expect("first response");
    assert_eq!(first.headers()[CACHE_STATUS_HEADER], "MISS");
    settle().await;

    let reordered = router
        .oneshot(get("/participants?page=1&limit=5"))
        .await
        .expect("reordered response");
    assert_eq!(reordered.headers()[CACHE_STATUS_HEADER], "HIT");
    assert_eq!(
        reordered.headers()[CACHE_KEY_HEADER],
        first.headers()[CACHE_KEY_HEADER]
    );
}

#[tokio::test]
async fn kill_switch_makes_the_subsystem_inert() {
    let spy = Arc::new(SpyStore::new());
    let config = CacheConfig {
        enabled: false,
        ..Default::default()
    };
    let (router, _) = build_state(spy.clone(), config);

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(get("/participants"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], "DISABLED");
        assert!(!response.headers().contains_key(CACHE_KEY_HEADER));
    }

    settle().await;
    assert!(spy.put_keys().is_empty());
}

#[tokio::test]
async fn unreachable_backend_never_fails_the_read() {
    let (router, _) = build_state(Arc::new(UnavailableStore), CacheConfig::default());

    let response = router
        .oneshot(get("/participants"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "DISABLED");

    let page = body_json(response).await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn caller_identity_scopes_participant_keys() {
    let spy = Arc::new(SpyStore::new());
    let (router, _) = build_state(spy.clone(), CacheConfig::default());

    let scoped = Request::builder()
        .uri("/participants")
        .header("x-caller-id", "42")
        .body(Body::empty())
        .expect("request");
    let response = router.clone().oneshot(scoped).await.expect("response");
    assert_eq!(
        response.headers()[CACHE_KEY_HEADER],
        "quran:participants:user:42:v1"
    );
    settle().await;

    // A different caller misses; the same caller hits.
    let other = Request::builder()
        .uri("/participants")
        .header("x-caller-id", "7")
        .body(Body::empty())
        .expect("request");
    let response = router.clone().oneshot(other).await.expect("response");
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");

    let same = Request::builder()
        .uri("/participants")
        .header("x-caller-id", "42")
        .body(Body::empty())
        .expect("request");
    let response = router.oneshot(same).await.expect("response");
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "HIT");
}

#[tokio::test]
async fn reference_data_is_cached_under_its_own_namespace_path() {
    let spy = Arc::new(SpyStore::new());
    let (router, _) = build_state(spy.clone(), CacheConfig::default());

    let response = router
        .clone()
        .oneshot(get("/regions/provinces"))
        .await
        .expect("response");
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");
    assert_eq!(
        response.headers()[CACHE_KEY_HEADER],
        "quran:regions:provinces:v1"
    );
    settle().await;

    let hit = router
        .oneshot(get("/regions/provinces"))
        .await
        .expect("hit response");
    assert_eq!(hit.headers()[CACHE_STATUS_HEADER], "HIT");
}
