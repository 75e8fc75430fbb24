//! Integration tests for the collection fetch lifecycle.
//!
//! Exercises the engine against a real database with scripted search and
//! download providers:
//! - Placeholder rows exist before any download resolves
//! - Exactly-once completion under concurrent download finishes
//! - Cancellation and teardown races
//! - Bulk and selected deletion audit contracts
//! - Refresh pagination policy

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::watch;

use waypoint_core::types::{Coordinate, FetchState};
use waypoint_db::models::update::UpdateKind;
use waypoint_db::repositories::{PhotoRepo, PinRepo, UpdateRepo};
use waypoint_db::models::pin::CreatePin;
use waypoint_engine::{EngineError, FetchOutcome, ImageFetcher, PhotoSearch, SyncEngine};
use waypoint_events::{ChangeBus, ChangeEvent};
use waypoint_flickr::{DownloadError, PhotoDescriptor, SearchError};
use waypoint_store::ImageStore;

// ---------------------------------------------------------------------------
// Scripted providers
// ---------------------------------------------------------------------------

/// Search stub returning the same descriptor list (or failure) every call.
struct FixedSearch {
    descriptors: Vec<PhotoDescriptor>,
    fail: bool,
}

impl FixedSearch {
    fn returning(descriptors: Vec<PhotoDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            descriptors,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            descriptors: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl PhotoSearch for FixedSearch {
    async fn search(
        &self,
        _coordinate: Coordinate,
        _page: i64,
    ) -> Result<Vec<PhotoDescriptor>, SearchError> {
        if self.fail {
            return Err(SearchError::Http(500));
        }
        Ok(self.descriptors.clone())
    }
}

/// Download stub that succeeds immediately with fixed bytes.
struct InstantFetcher;

#[async_trait]
impl ImageFetcher for InstantFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
        Ok(vec![0xAB, 0xCD, 0xEF])
    }
}

/// Download stub that always fails.
struct FailingFetcher;

#[async_trait]
impl ImageFetcher for FailingFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
        Err(DownloadError::Http(404))
    }
}

/// Download stub that parks every request until the gate opens.
struct GatedFetcher {
    open: watch::Receiver<bool>,
}

fn gated_fetcher() -> (watch::Sender<bool>, Arc<GatedFetcher>) {
    let (tx, rx) = watch::channel(false);
    (tx, Arc::new(GatedFetcher { open: rx }))
}

#[async_trait]
impl ImageFetcher for GatedFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
        let mut open = self.open.clone();
        open.wait_for(|o| *o)
            .await
            .map_err(|_| DownloadError::NoData)?;
        Ok(vec![0x42; 8])
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    engine: Arc<SyncEngine>,
    store: Arc<ImageStore>,
    bus: Arc<ChangeBus>,
    _cache_dir: tempfile::TempDir,
}

async fn harness(
    pool: &SqlitePool,
    search: Arc<dyn PhotoSearch>,
    fetcher: Arc<dyn ImageFetcher>,
) -> Harness {
    let cache_dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(ImageStore::open(cache_dir.path()).await.expect("open store"));
    let bus = Arc::new(ChangeBus::default());
    let engine = SyncEngine::new(
        pool.clone(),
        search,
        fetcher,
        Arc::clone(&store),
        Arc::clone(&bus),
    );

    Harness {
        engine,
        store,
        bus,
        _cache_dir: cache_dir,
    }
}

fn descriptor(n: u32) -> PhotoDescriptor {
    PhotoDescriptor {
        id: format!("photo-{n}"),
        owner: "owner@N00".to_string(),
        secret: format!("secret-{n}"),
        server: "65535".to_string(),
        farm: 66,
        title: format!("Photo {n}"),
    }
}

fn descriptors(count: u32) -> Vec<PhotoDescriptor> {
    (1..=count).map(descriptor).collect()
}

async fn create_pin(pool: &SqlitePool, latitude: f64, longitude: f64) -> i64 {
    PinRepo::create(
        pool,
        &CreatePin {
            latitude,
            longitude,
            page: None,
        },
    )
    .await
    .expect("create pin")
    .id
}

async fn wait_until_settled(engine: &Arc<SyncEngine>, pin_id: i64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if engine.fetch_state(pin_id).await == FetchState::Settled {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("collection did not settle in time");
}

// ---------------------------------------------------------------------------
// Search outcomes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_search_settles_without_entities(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    let outcome = h.engine.start_fetch(pin_id, 1).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Empty);
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Settled);
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 0);
    assert!(UpdateRepo::list(&pool).await.unwrap().is_empty());

    let pin = PinRepo::find_by_id(&pool, pin_id).await.unwrap().unwrap();
    assert_eq!(pin.original_photo_count, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn search_failure_returns_to_idle(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::failing(), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    let result = h.engine.start_fetch(pin_id, 1).await;

    assert_matches!(result, Err(EngineError::Search(_)));
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Idle);
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 0);
    assert!(UpdateRepo::list(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_page_is_rejected(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    assert_matches!(
        h.engine.start_fetch(pin_id, 0).await,
        Err(EngineError::Core(_))
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn fetch_for_missing_pin_is_rejected(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;

    assert_matches!(
        h.engine.start_fetch(9999, 1).await,
        Err(EngineError::PinNotFound(9999))
    );
}

// ---------------------------------------------------------------------------
// Placeholder invariant and completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn placeholders_exist_before_any_download_resolves(pool: SqlitePool) {
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), fetcher).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    let outcome = h.engine.start_fetch(pin_id, 1).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Started { photo_count: 3 });

    // Downloads are parked at the gate: the full placeholder set must
    // already be visible, none of it loaded.
    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    assert_eq!(photos.len(), 3);
    assert!(photos.iter().all(|p| !p.image_loaded));
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Downloading);

    let pin = PinRepo::find_by_id(&pool, pin_id).await.unwrap().unwrap();
    assert_eq!(pin.original_photo_count, 3);

    gate.send(true).unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    assert!(photos.iter().all(|p| p.image_loaded));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn concurrent_completions_record_exactly_one_image_creation(pool: SqlitePool) {
    // All downloads resolve at once when the gate opens, so the final
    // completions race each other into the settle check.
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(21)), fetcher).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    gate.send(true).unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        1
    );
    let history = UpdateRepo::list(&pool).await.unwrap();
    let settled = history
        .iter()
        .find(|u| u.kind == UpdateKind::ImageCreation)
        .expect("image creation update");
    assert_eq!(settled.number_of_items, 21);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn full_scenario_records_audit_with_coordinates(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::PhotoCreation).await.unwrap(),
        1
    );
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        1
    );

    let history = UpdateRepo::list(&pool).await.unwrap();
    let settled = history
        .iter()
        .find(|u| u.kind == UpdateKind::ImageCreation)
        .expect("image creation update");
    assert_eq!(settled.number_of_items, 3);
    assert_eq!(settled.latitude, 37.0);
    assert_eq!(settled.longitude, -122.0);

    // Every image landed in the cache under its derived key.
    for photo in PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap() {
        assert!(h.store.get(&photo.image_key).await.is_some());
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_downloads_leave_collection_unsettled(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(2)), Arc::new(FailingFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // No retry: the photos stay unloaded and the collection never settles
    // on its own. A manual refresh is the recovery path.
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Downloading);
    assert_eq!(PhotoRepo::count_unloaded(&pool, pin_id).await.unwrap(), 2);
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn change_feed_reports_the_full_lifecycle(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;
    let mut rx = h.bus.subscribe();

    h.engine.start_fetch(pin_id, 1).await.unwrap();

    let mut inserted = 0;
    let mut updated = 0;
    let mut states = Vec::new();
    let mut loaded_count = None;

    // CollectionLoaded is the last event of a successful load; consume the
    // feed until it arrives.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await.expect("change feed closed") {
                ChangeEvent::PhotoInserted { .. } => inserted += 1,
                ChangeEvent::PhotoUpdated { .. } => updated += 1,
                ChangeEvent::PinStateChanged { state, .. } => states.push(state),
                ChangeEvent::CollectionLoaded { photo_count, .. } => {
                    loaded_count = Some(photo_count);
                    break;
                }
                ChangeEvent::PhotoRemoved { .. } => {}
            }
        }
    })
    .await
    .expect("collection did not finish loading in time");

    assert_eq!(inserted, 3);
    assert_eq!(updated, 3);
    assert_eq!(loaded_count, Some(3));
    assert_eq!(
        states,
        vec![
            FetchState::Searching,
            FetchState::Downloading,
            FetchState::Settled,
        ]
    );
}

// ---------------------------------------------------------------------------
// Concurrency guards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn second_fetch_while_in_flight_is_rejected(pool: SqlitePool) {
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(2)), fetcher).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();

    assert_matches!(
        h.engine.start_fetch(pin_id, 2).await,
        Err(EngineError::AlreadyInFlight(id)) if id == pin_id
    );
    assert_matches!(
        h.engine.refresh(pin_id).await,
        Err(EngineError::AlreadyInFlight(id)) if id == pin_id
    );

    gate.send(true).unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    // Settled is not in flight: a new fetch is allowed again.
    let outcome = h.engine.start_fetch(pin_id, 2).await.unwrap();
    assert_matches!(outcome, FetchOutcome::Started { photo_count: 2 });
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_before_downloads_resolve_leaves_rows_untouched(pool: SqlitePool) {
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), fetcher).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();

    assert!(h.engine.cancel_fetch(pin_id).await);
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Idle);

    // Releasing the parked downloads after cancellation must not mutate
    // photo rows or settle anything.
    gate.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    assert_eq!(photos.len(), 3);
    assert!(photos.iter().all(|p| !p.image_loaded));
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cancel_without_active_fetch_reports_false(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    assert!(!h.engine.cancel_fetch(pin_id).await);

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    // Settled is not cancellable either.
    assert!(!h.engine.cancel_fetch(pin_id).await);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn teardown_mid_download_ignores_late_completions(pool: SqlitePool) {
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), fetcher).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();

    // Tear the collection down while every download is still parked.
    let removed = h.engine.remove_photos(pin_id).await.unwrap();
    assert_eq!(removed, 3);

    gate.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // The late completions found detached rows: nothing was re-created,
    // nothing settled.
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 0);
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        0
    );
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageDeletion).await.unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_pin_mid_fetch_cancels_and_cascades(pool: SqlitePool) {
    let (gate, fetcher) = gated_fetcher();
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), fetcher).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    h.engine.delete_pin(pin_id).await.unwrap();

    gate.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(PinRepo::find_by_id(&pool, pin_id).await.unwrap().is_none());
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 0);
    assert_eq!(h.engine.fetch_state(pin_id).await, FetchState::Idle);
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        0
    );
}

// ---------------------------------------------------------------------------
// Removal audit contracts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn remove_photos_evicts_and_audits_once(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(5)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 37.0, -122.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    for photo in &photos {
        assert!(h.store.get(&photo.image_key).await.is_some());
    }

    let removed = h.engine.remove_photos(pin_id).await.unwrap();
    assert_eq!(removed, 5);

    for photo in &photos {
        assert!(h.store.get(&photo.image_key).await.is_none());
    }
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 0);

    let history = UpdateRepo::list(&pool).await.unwrap();
    let deletions: Vec<_> = history
        .iter()
        .filter(|u| u.kind == UpdateKind::ImageDeletion)
        .collect();
    assert_eq!(deletions.len(), 1);
    assert_eq!(deletions[0].number_of_items, 5);

    // A second pass over the now-empty pin audits nothing.
    assert_eq!(h.engine.remove_photos(pin_id).await.unwrap(), 0);
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageDeletion).await.unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn selected_deletion_audits_the_batch(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(4)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    let selection: Vec<_> = photos.iter().take(2).map(|p| p.id).collect();

    let removed = h.engine.delete_photos(pin_id, &selection).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 2);

    let history = UpdateRepo::list(&pool).await.unwrap();
    let deletion = history
        .iter()
        .find(|u| u.kind == UpdateKind::ImageDeletion)
        .expect("deletion update");
    assert_eq!(deletion.number_of_items, 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn single_photo_deletion_still_audits(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    let removed = h.engine.delete_photos(pin_id, &[photos[0].id]).await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageDeletion).await.unwrap(),
        1
    );
}

// ---------------------------------------------------------------------------
// Refresh pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_advances_cursor_after_a_full_page(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    // The previous search filled the page, so the provider may have more.
    PinRepo::set_page(&pool, pin_id, 2).await.unwrap();
    PinRepo::set_original_photo_count(&pool, pin_id, 21).await.unwrap();

    h.engine.refresh(pin_id).await.unwrap();

    let pin = PinRepo::find_by_id(&pool, pin_id).await.unwrap().unwrap();
    assert_eq!(pin.page, 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_resets_cursor_after_a_short_page(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(Vec::new()), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    PinRepo::set_page(&pool, pin_id, 6).await.unwrap();
    PinRepo::set_original_photo_count(&pool, pin_id, 5).await.unwrap();

    h.engine.refresh(pin_id).await.unwrap();

    let pin = PinRepo::find_by_id(&pool, pin_id).await.unwrap().unwrap();
    assert_eq!(pin.page, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_replaces_the_photo_set(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 1.0, 2.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;
    let old_ids: Vec<_> = PhotoRepo::list_for_pin(&pool, pin_id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    h.engine.refresh(pin_id).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let new_photos = PhotoRepo::list_for_pin(&pool, pin_id).await.unwrap();
    assert_eq!(new_photos.len(), 3);
    assert!(new_photos.iter().all(|p| !old_ids.contains(&p.id)));

    // One deletion for the old set, two full loads recorded in total.
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageDeletion).await.unwrap(),
        1
    );
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        2
    );
}

// ---------------------------------------------------------------------------
// Pin facade operations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn add_pin_fetches_the_first_page(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;

    let (pin, outcome) = h.engine.add_pin(Coordinate::new(37.0, -122.0)).await.unwrap();

    assert_eq!(pin.page, 1);
    assert_eq!(outcome, FetchOutcome::Started { photo_count: 3 });
    wait_until_settled(&h.engine, pin.id).await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn move_pin_refetches_at_the_new_coordinate(pool: SqlitePool) {
    let h = harness(&pool, FixedSearch::returning(descriptors(3)), Arc::new(InstantFetcher)).await;
    let pin_id = create_pin(&pool, 10.0, 10.0).await;

    h.engine.start_fetch(pin_id, 1).await.unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    h.engine
        .move_pin(pin_id, Coordinate::new(20.0, 20.0))
        .await
        .unwrap();
    wait_until_settled(&h.engine, pin_id).await;

    let pin = PinRepo::find_by_id(&pool, pin_id).await.unwrap().unwrap();
    assert_eq!(pin.latitude, 20.0);
    assert_eq!(pin.longitude, 20.0);
    assert_eq!(pin.page, 1);
    assert_eq!(PhotoRepo::count_for_pin(&pool, pin_id).await.unwrap(), 3);

    // The old set was audited away, both loads were audited in.
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageDeletion).await.unwrap(),
        1
    );
    assert_eq!(
        UpdateRepo::count_by_kind(&pool, UpdateKind::ImageCreation).await.unwrap(),
        2
    );
}
