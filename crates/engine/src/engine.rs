//! The collection fetch orchestrator.
//!
//! [`SyncEngine`] owns the per-pin fetch lifecycle
//! (`Idle -> Searching -> Downloading -> Settled`), enforcing at most one
//! in-flight fetch per pin. A master [`CancellationToken`] with per-pin
//! child tokens makes cancellation cooperative: in-flight network calls
//! are raced against the token, and write-side guards ignore completions
//! that arrive for a pin whose fetch is no longer the active one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use waypoint_core::image_key::derive_image_key;
use waypoint_core::paging::{next_page, validate_page, FIRST_PAGE};
use waypoint_core::types::{Coordinate, DbId, FetchState};
use waypoint_db::models::photo::{CreatePhoto, Photo};
use waypoint_db::models::pin::{CreatePin, Pin};
use waypoint_db::models::update::{CreateUpdate, UpdateKind};
use waypoint_db::repositories::{PhotoRepo, PinRepo, UpdateRepo};
use waypoint_db::DbPool;
use waypoint_events::{ChangeBus, ChangeEvent};
use waypoint_flickr::{image_url, ImageSize};
use waypoint_store::ImageStore;

use crate::error::EngineError;
use crate::provider::{ImageFetcher, PhotoSearch};

// ---------------------------------------------------------------------------
// FetchOutcome / FetchHandle
// ---------------------------------------------------------------------------

/// What a successful [`SyncEngine::start_fetch`] resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The search returned nothing; the collection settled empty.
    Empty,
    /// Downloads were fanned out for this many new photos.
    Started { photo_count: usize },
    /// The fetch was cancelled while the search was in flight.
    Cancelled,
}

/// Registry entry for one pin's fetch.
struct FetchHandle {
    /// Identity of this fetch. Stale tasks carry the id they were spawned
    /// with and may only mutate the entry while it still matches.
    fetch_id: u64,
    state: FetchState,
    /// Per-pin cancellation token (child of the engine's master token).
    cancel: CancellationToken,
}

impl FetchHandle {
    fn in_flight(&self) -> bool {
        matches!(self.state, FetchState::Searching | FetchState::Downloading)
    }
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

/// Orchestrates pin photo collections end to end.
///
/// Created once via [`SyncEngine::new`]; the returned `Arc` is cheap to
/// clone into download tasks and UI handles.
pub struct SyncEngine {
    pool: DbPool,
    search: Arc<dyn PhotoSearch>,
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<ImageStore>,
    bus: Arc<ChangeBus>,
    /// Active fetch registry, keyed by pin. An absent entry means `Idle`.
    fetches: RwLock<HashMap<DbId, FetchHandle>>,
    /// Source of per-fetch identities.
    fetch_seq: AtomicU64,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

impl SyncEngine {
    /// Build an engine over its injected collaborators.
    pub fn new(
        pool: DbPool,
        search: Arc<dyn PhotoSearch>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<ImageStore>,
        bus: Arc<ChangeBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            search,
            fetcher,
            store,
            bus,
            fetches: RwLock::new(HashMap::new()),
            fetch_seq: AtomicU64::new(1),
            cancel: CancellationToken::new(),
        })
    }

    /// Current fetch state for a pin. Pins without a registered fetch are
    /// [`FetchState::Idle`].
    pub async fn fetch_state(&self, pin_id: DbId) -> FetchState {
        self.fetches
            .read()
            .await
            .get(&pin_id)
            .map(|h| h.state)
            .unwrap_or(FetchState::Idle)
    }

    /// Whether the pin has an active search or download collection.
    pub async fn is_in_flight(&self, pin_id: DbId) -> bool {
        self.fetches
            .read()
            .await
            .get(&pin_id)
            .is_some_and(FetchHandle::in_flight)
    }

    // -----------------------------------------------------------------------
    // Fetch lifecycle
    // -----------------------------------------------------------------------

    /// Fetch one page of photos for `pin_id` and fan out image downloads.
    ///
    /// Placeholder rows for the whole page exist before any download
    /// starts, so readers always observe the full collection count with
    /// images still loading.
    pub async fn start_fetch(
        self: &Arc<Self>,
        pin_id: DbId,
        page: i64,
    ) -> Result<FetchOutcome, EngineError> {
        validate_page(page)?;

        let pin = PinRepo::find_by_id(&self.pool, pin_id)
            .await?
            .ok_or(EngineError::PinNotFound(pin_id))?;

        // Register the fetch, enforcing at most one in flight per pin.
        let fetch_id = self.fetch_seq.fetch_add(1, Ordering::Relaxed);
        let cancel = {
            let mut fetches = self.fetches.write().await;
            if fetches.get(&pin_id).is_some_and(FetchHandle::in_flight) {
                return Err(EngineError::AlreadyInFlight(pin_id));
            }
            let token = self.cancel.child_token();
            fetches.insert(
                pin_id,
                FetchHandle {
                    fetch_id,
                    state: FetchState::Searching,
                    cancel: token.clone(),
                },
            );
            token
        };
        self.bus.publish(ChangeEvent::PinStateChanged {
            pin_id,
            state: FetchState::Searching,
        });

        let result = self.run_fetch(pin, fetch_id, page, &cancel).await;
        if result.is_err() {
            // The pin returns to Idle; the caller may retry.
            self.clear_fetch(pin_id, fetch_id).await;
        }
        result
    }

    /// Body of a fetch, from search to download fan-out.
    async fn run_fetch(
        self: &Arc<Self>,
        pin: Pin,
        fetch_id: u64,
        page: i64,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, EngineError> {
        let pin_id = pin.id;

        PinRepo::set_page(&self.pool, pin_id, page).await?;

        let searched = tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.search.search(pin.coordinate(), page) => Some(result),
        };

        let descriptors = match searched {
            // cancel_fetch already removed the registry entry.
            None => return Ok(FetchOutcome::Cancelled),
            Some(Err(e)) => {
                tracing::warn!(pin_id, page, error = %e, "Photo search failed");
                return Err(e.into());
            }
            Some(Ok(descriptors)) => descriptors,
        };

        // The search may have resolved just as the fetch was cancelled.
        if cancel.is_cancelled() {
            return Ok(FetchOutcome::Cancelled);
        }

        PinRepo::set_original_photo_count(&self.pool, pin_id, descriptors.len() as i64).await?;

        if descriptors.is_empty() {
            self.transition(pin_id, fetch_id, FetchState::Settled).await;
            self.bus.publish(ChangeEvent::CollectionLoaded {
                pin_id,
                photo_count: 0,
            });
            tracing::info!(pin_id, page, "Search returned no photos, collection settled empty");
            return Ok(FetchOutcome::Empty);
        }

        let now = chrono::Utc::now();
        let inputs: Vec<CreatePhoto> = descriptors
            .iter()
            .map(|d| CreatePhoto {
                flickr_id: d.id.clone(),
                owner: d.owner.clone(),
                secret: d.secret.clone(),
                server: d.server.clone(),
                farm: d.farm,
                title: d.title.clone(),
                image_key: derive_image_key(now, &d.id, &d.secret),
            })
            .collect();

        let photos = PhotoRepo::create_batch(&self.pool, pin_id, &inputs).await?;

        UpdateRepo::create(
            &self.pool,
            &CreateUpdate {
                kind: UpdateKind::PhotoCreation,
                description: "Photo(s) Created".to_string(),
                number_of_items: photos.len() as i64,
                latitude: pin.latitude,
                longitude: pin.longitude,
            },
        )
        .await?;

        for photo in &photos {
            self.bus.publish(ChangeEvent::PhotoInserted {
                pin_id,
                photo_id: photo.id,
            });
        }

        self.transition(pin_id, fetch_id, FetchState::Downloading).await;
        tracing::info!(
            pin_id,
            page,
            photo_count = photos.len(),
            "Search complete, downloads fanned out",
        );

        let photo_count = photos.len();
        for photo in photos {
            let engine = Arc::clone(self);
            let token = cancel.clone();
            tokio::spawn(async move {
                engine.download_photo(pin_id, fetch_id, photo, token).await;
            });
        }

        Ok(FetchOutcome::Started { photo_count })
    }

    /// One fan-out download task: fetch bytes, cache them, flip the row's
    /// loaded flag, then run the collection-completion check.
    async fn download_photo(
        self: Arc<Self>,
        pin_id: DbId,
        fetch_id: u64,
        photo: Photo,
        cancel: CancellationToken,
    ) {
        let url = image_url(
            photo.farm,
            &photo.server,
            &photo.flickr_id,
            &photo.secret,
            ImageSize::LargeSquare,
        );

        let fetched = tokio::select! {
            _ = cancel.cancelled() => return,
            result = self.fetcher.fetch(&url) => result,
        };

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                // No retry: the photo stays unloaded until a manual refresh.
                tracing::warn!(pin_id, photo_id = photo.id, error = %e, "Image download failed");
                return;
            }
        };

        // Cache writes are best-effort; a failed disk write is logged and
        // the photo still counts as loaded.
        if let Err(e) = self.store.put(&photo.image_key, Some(bytes)).await {
            tracing::error!(
                photo_id = photo.id,
                key = %photo.image_key,
                error = %e,
                "Image cache write failed",
            );
        }

        if cancel.is_cancelled() {
            return;
        }

        // Stale-completion guard: the row may have been detached or deleted
        // while the download was in flight.
        match PhotoRepo::mark_image_loaded(&self.pool, photo.id, pin_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(pin_id, photo_id = photo.id, "Completion for a detached photo ignored");
                return;
            }
            Err(e) => {
                tracing::error!(photo_id = photo.id, error = %e, "Failed to persist loaded flag");
                return;
            }
        }

        self.bus.publish(ChangeEvent::PhotoUpdated {
            pin_id,
            photo_id: photo.id,
        });

        if let Err(e) = self.try_settle(pin_id, fetch_id).await {
            tracing::error!(pin_id, error = %e, "Collection completion check failed");
        }
    }

    /// Check whether every photo of `pin_id` is loaded and, exactly once,
    /// settle the collection.
    ///
    /// Serialized through the registry write lock: concurrent download
    /// completions run this one at a time, and only the caller that
    /// observes the Downloading -> zero-unloaded transition records the
    /// audit row. The fetch id keeps completions from a superseded fetch
    /// out of a newer one's lifecycle.
    async fn try_settle(&self, pin_id: DbId, fetch_id: u64) -> Result<(), sqlx::Error> {
        let mut fetches = self.fetches.write().await;

        let downloading = matches!(
            fetches.get(&pin_id),
            Some(handle) if handle.fetch_id == fetch_id && handle.state == FetchState::Downloading
        );
        if !downloading {
            return Ok(());
        }

        let unloaded = PhotoRepo::count_unloaded(&self.pool, pin_id).await?;
        if unloaded > 0 {
            return Ok(());
        }

        // The pin may have been deleted while downloads were in flight.
        let Some(pin) = PinRepo::find_by_id(&self.pool, pin_id).await? else {
            fetches.remove(&pin_id);
            return Ok(());
        };

        // Zero rows means the collection was torn down mid-download; there
        // is nothing to settle and no audit row to record.
        let photo_count = PhotoRepo::count_for_pin(&self.pool, pin_id).await?;
        if photo_count == 0 {
            fetches.remove(&pin_id);
            return Ok(());
        }

        UpdateRepo::create(
            &self.pool,
            &CreateUpdate {
                kind: UpdateKind::ImageCreation,
                description: "Image(s) Created".to_string(),
                number_of_items: photo_count,
                latitude: pin.latitude,
                longitude: pin.longitude,
            },
        )
        .await?;

        if let Some(handle) = fetches.get_mut(&pin_id) {
            handle.state = FetchState::Settled;
        }
        drop(fetches);

        tracing::info!(pin_id, photo_count, "Collection fully loaded");
        self.bus.publish(ChangeEvent::PinStateChanged {
            pin_id,
            state: FetchState::Settled,
        });
        self.bus.publish(ChangeEvent::CollectionLoaded {
            pin_id,
            photo_count,
        });

        Ok(())
    }

    /// Cancel a pin's in-flight search or downloads.
    ///
    /// Returns `true` when something was cancelled. Already-cached bytes
    /// are kept; the caller decides whether to also evict.
    pub async fn cancel_fetch(&self, pin_id: DbId) -> bool {
        {
            let mut fetches = self.fetches.write().await;
            if !fetches.get(&pin_id).is_some_and(FetchHandle::in_flight) {
                return false;
            }
            if let Some(handle) = fetches.remove(&pin_id) {
                handle.cancel.cancel();
            }
        }

        tracing::info!(pin_id, "Fetch cancelled");
        self.bus.publish(ChangeEvent::PinStateChanged {
            pin_id,
            state: FetchState::Idle,
        });
        true
    }

    /// Replace the pin's photo set with the next page of results.
    ///
    /// A full previous page advances the cursor (the provider may have
    /// more); a short one resets to the first page.
    pub async fn refresh(self: &Arc<Self>, pin_id: DbId) -> Result<FetchOutcome, EngineError> {
        if self.is_in_flight(pin_id).await {
            return Err(EngineError::AlreadyInFlight(pin_id));
        }

        let pin = PinRepo::find_by_id(&self.pool, pin_id)
            .await?
            .ok_or(EngineError::PinNotFound(pin_id))?;
        let next = next_page(pin.page, pin.original_photo_count);

        self.remove_photos(pin_id).await?;
        self.start_fetch(pin_id, next).await
    }

    // -----------------------------------------------------------------------
    // Pin management
    // -----------------------------------------------------------------------

    /// Drop a new pin and immediately fetch its first page of photos.
    pub async fn add_pin(
        self: &Arc<Self>,
        coordinate: Coordinate,
    ) -> Result<(Pin, FetchOutcome), EngineError> {
        let pin = PinRepo::create(
            &self.pool,
            &CreatePin {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
                page: None,
            },
        )
        .await?;

        tracing::info!(pin_id = pin.id, latitude = pin.latitude, longitude = pin.longitude, "Pin added");

        let outcome = self.start_fetch(pin.id, FIRST_PAGE).await?;
        Ok((pin, outcome))
    }

    /// Move a pin to a new coordinate: cancel in-flight work, drop the old
    /// photo set, update the natural key, and fetch page 1 at the new spot.
    pub async fn move_pin(
        self: &Arc<Self>,
        pin_id: DbId,
        coordinate: Coordinate,
    ) -> Result<FetchOutcome, EngineError> {
        self.cancel_fetch(pin_id).await;
        self.remove_photos(pin_id).await?;

        if !PinRepo::set_coordinate(&self.pool, pin_id, coordinate).await? {
            return Err(EngineError::PinNotFound(pin_id));
        }

        tracing::info!(
            pin_id,
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            "Pin moved",
        );
        self.start_fetch(pin_id, FIRST_PAGE).await
    }

    /// Delete a pin and everything it owns.
    ///
    /// Cancels any in-flight fetch first so late download completions find
    /// nothing to mutate.
    pub async fn delete_pin(&self, pin_id: DbId) -> Result<(), EngineError> {
        self.cancel_fetch(pin_id).await;
        self.remove_photos(pin_id).await?;
        PinRepo::delete(&self.pool, pin_id).await?;
        self.fetches.write().await.remove(&pin_id);

        tracing::info!(pin_id, "Pin deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Photo removal
    // -----------------------------------------------------------------------

    /// Remove every photo belonging to `pin_id`: evict cached bytes,
    /// detach, delete the row. Records one image-deletion audit row when
    /// anything was removed.
    pub async fn remove_photos(&self, pin_id: DbId) -> Result<usize, EngineError> {
        let pin = PinRepo::find_by_id(&self.pool, pin_id)
            .await?
            .ok_or(EngineError::PinNotFound(pin_id))?;

        let photos = PhotoRepo::list_for_pin(&self.pool, pin_id).await?;
        let removed = self.delete_photo_rows(pin_id, &photos).await?;

        if removed > 0 {
            self.record_deletion(&pin, removed).await?;
        }
        Ok(removed)
    }

    /// Delete an explicit selection of a pin's photos.
    ///
    /// Same eviction contract as [`remove_photos`](Self::remove_photos),
    /// and the audit row is recorded for the batch even when it holds a
    /// single photo.
    pub async fn delete_photos(
        &self,
        pin_id: DbId,
        photo_ids: &[DbId],
    ) -> Result<usize, EngineError> {
        let pin = PinRepo::find_by_id(&self.pool, pin_id)
            .await?
            .ok_or(EngineError::PinNotFound(pin_id))?;

        let mut selected = Vec::with_capacity(photo_ids.len());
        for id in photo_ids {
            if let Some(photo) = PhotoRepo::find_by_id(&self.pool, *id).await? {
                if photo.pin_id == Some(pin_id) {
                    selected.push(photo);
                }
            }
        }

        let removed = self.delete_photo_rows(pin_id, &selected).await?;
        if removed > 0 {
            self.record_deletion(&pin, removed).await?;
        }
        Ok(removed)
    }

    /// Shared eviction path for bulk and selected deletion.
    ///
    /// Each photo is evicted from the cache, detached from its pin, and
    /// only then deleted, so a late download completion observes a
    /// detached row instead of mutating a reassigned one.
    async fn delete_photo_rows(
        &self,
        pin_id: DbId,
        photos: &[Photo],
    ) -> Result<usize, EngineError> {
        let mut removed = 0;
        for photo in photos {
            if let Err(e) = self.store.delete(&photo.image_key).await {
                tracing::warn!(
                    photo_id = photo.id,
                    key = %photo.image_key,
                    error = %e,
                    "Cache eviction failed",
                );
            }

            PhotoRepo::detach(&self.pool, photo.id).await?;
            if PhotoRepo::delete(&self.pool, photo.id).await? {
                removed += 1;
                self.bus.publish(ChangeEvent::PhotoRemoved {
                    pin_id,
                    photo_id: photo.id,
                });
            }
        }
        Ok(removed)
    }

    /// Record the audit row for a completed bulk deletion.
    async fn record_deletion(&self, pin: &Pin, removed: usize) -> Result<(), EngineError> {
        UpdateRepo::create(
            &self.pool,
            &CreateUpdate {
                kind: UpdateKind::ImageDeletion,
                description: "Image(s) Deleted".to_string(),
                number_of_items: removed as i64,
                latitude: pin.latitude,
                longitude: pin.longitude,
            },
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Registry helpers / shutdown
    // -----------------------------------------------------------------------

    /// Update a registered fetch's state and notify subscribers.
    ///
    /// No-ops when the entry no longer belongs to this fetch (cancelled
    /// and possibly superseded by a newer one).
    async fn transition(&self, pin_id: DbId, fetch_id: u64, state: FetchState) {
        {
            let mut fetches = self.fetches.write().await;
            match fetches.get_mut(&pin_id) {
                Some(handle) if handle.fetch_id == fetch_id => handle.state = state,
                _ => return,
            }
        }
        self.bus.publish(ChangeEvent::PinStateChanged { pin_id, state });
    }

    /// Drop this fetch's registry entry, returning the pin to `Idle`.
    async fn clear_fetch(&self, pin_id: DbId, fetch_id: u64) {
        let removed = {
            let mut fetches = self.fetches.write().await;
            match fetches.get(&pin_id) {
                Some(handle) if handle.fetch_id == fetch_id => {
                    fetches.remove(&pin_id);
                    true
                }
                _ => false,
            }
        };
        if removed {
            self.bus.publish(ChangeEvent::PinStateChanged {
                pin_id,
                state: FetchState::Idle,
            });
        }
    }

    /// Cancel every in-flight fetch. Used on application shutdown.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.fetches.write().await.clear();
        tracing::info!("Sync engine shut down");
    }
}
