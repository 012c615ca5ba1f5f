use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{Location, NewLocation, NewReview, Review};
use crate::seed;
use crate::storage::{decode_slot, KeyValueStore};

/// Slot names in the persisted key-value store.
const LOCATIONS_SLOT: &str = "locations";
const REVIEWS_SLOT: &str = "reviews";

/// How many reviews `recent_reviews` returns.
const RECENT_REVIEWS_LIMIT: usize = 10;

/// Placeholder identity stamped on reviews in this build. Review authorship
/// moves to the profile store once accounts are wired through.
const CURRENT_USER_ID: &str = "1";
const CURRENT_USER_NAME: &str = "Current User";

/// Store lifecycle. The transition is one-way: `load` moves the store to
/// `Ready` whether it adopted persisted data or fell back to seed data,
/// and nothing moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Loading,
    Ready,
}

/// In-memory location and review collections, written through to a
/// persisted key-value store on every mutation.
///
/// Mutations are transactional against in-memory state: the updated
/// collections are serialized and persisted first, and installed in memory
/// only once every write has succeeded. A failed persist leaves the
/// in-memory state exactly as it was and the error propagates to the
/// caller (both mutations share this policy).
///
/// Single in-process writer assumption: the store is `&mut self` for
/// mutations and relies on the caller not to interleave them.
pub struct LocationStore<S: KeyValueStore> {
    store: S,
    state: StoreState,
    locations: Vec<Location>,
    reviews: Vec<Review>,
}

impl<S: KeyValueStore> LocationStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: StoreState::Loading,
            locations: Vec::new(),
            reviews: Vec::new(),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == StoreState::Ready
    }

    /// Load both slots from the persisted store, falling back to seed data
    /// per slot when a value is absent or fails validation. Rejected slots
    /// are purged so the next write starts clean.
    ///
    /// Never fails: any storage error is absorbed with the seed fallback so
    /// downstream code always observes well-formed collections. Idempotent
    /// when no mutation happens in between.
    pub async fn load(&mut self) {
        self.locations = self.load_slot(LOCATIONS_SLOT, seed::locations).await;
        self.reviews = self.load_slot(REVIEWS_SLOT, seed::reviews).await;
        self.state = StoreState::Ready;
    }

    async fn load_slot<T: DeserializeOwned>(&self, key: &str, fallback: fn() -> Vec<T>) -> Vec<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(slot = key, error = %e, "Failed to read persisted slot, using seed data");
                self.purge_slot(key).await;
                return fallback();
            }
        };

        let Some(raw) = raw else {
            debug!(slot = key, "No persisted value, using seed data");
            return fallback();
        };

        match decode_slot::<Vec<T>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(slot = key, error = %e, "Discarding invalid persisted slot");
                self.purge_slot(key).await;
                fallback()
            }
        }
    }

    /// Best-effort removal of a rejected slot. A failure here only means
    /// the same value gets rejected again on the next load.
    async fn purge_slot(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            debug!(slot = key, error = %e, "Failed to purge rejected slot");
        }
    }

    // ===== Queries =====

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Case-insensitive substring search over name, address, and category.
    /// A blank query returns the full collection; relative order is always
    /// preserved.
    pub fn search(&self, query: &str) -> Vec<&Location> {
        let query = query.trim();
        if query.is_empty() {
            return self.locations.iter().collect();
        }

        self.locations
            .iter()
            .filter(|l| {
                contains_ignore_case(&l.name, query)
                    || contains_ignore_case(&l.address, query)
                    || contains_ignore_case(&l.category, query)
            })
            .collect()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn reviews_for(&self, location_id: &str) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.location_id == location_id)
            .collect()
    }

    /// The 10 most recent reviews across all locations, newest first.
    ///
    /// `created_at` is compared as a parsed timestamp, so mixed ISO-8601
    /// offsets order correctly; unparseable stamps sort last. Equal
    /// timestamps tie-break on collection position (most-recent-first
    /// insertion order), an explicit secondary key rather than a sort
    /// stability accident.
    pub fn recent_reviews(&self) -> Vec<&Review> {
        let mut indexed: Vec<(usize, &Review)> = self.reviews.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            let ta = a.created_at_parsed().map(|t| t.timestamp_millis());
            let tb = b.created_at_parsed().map(|t| t.timestamp_millis());
            // None < Some, so comparing b-to-a sorts newest first and
            // pushes unparseable stamps to the end.
            tb.cmp(&ta).then(ia.cmp(ib))
        });
        indexed
            .into_iter()
            .take(RECENT_REVIEWS_LIMIT)
            .map(|(_, r)| r)
            .collect()
    }

    // ===== Mutations =====

    /// Create a review and recompute the affected location's aggregate.
    ///
    /// The review is prepended (most-recent-first convention) and the
    /// location's `average_rating`/`total_reviews` are recomputed from the
    /// full set of reviews matching its id. A `location_id` that matches no
    /// location is tolerated: the review is stored and simply never
    /// surfaces in any aggregate.
    ///
    /// Rating range (1-5) is caller-side validation; out-of-range values
    /// are aggregated as-is.
    pub async fn add_review(&mut self, new: NewReview) -> Result<Review> {
        let review = Review {
            id: self.fresh_id(),
            location_id: new.location_id.clone(),
            user_id: CURRENT_USER_ID.to_string(),
            user_name: CURRENT_USER_NAME.to_string(),
            user_avatar: None,
            rating: new.rating,
            text: new.text,
            images: new.images,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut reviews = Vec::with_capacity(self.reviews.len() + 1);
        reviews.push(review.clone());
        reviews.extend(self.reviews.iter().cloned());

        let matching: Vec<&Review> = reviews
            .iter()
            .filter(|r| r.location_id == new.location_id)
            .collect();
        let average_rating =
            matching.iter().map(|r| r.rating as f64).sum::<f64>() / matching.len() as f64;
        let total_reviews = matching.len() as u32;

        let locations: Vec<Location> = self
            .locations
            .iter()
            .map(|l| {
                if l.id == new.location_id {
                    let mut updated = l.clone();
                    updated.average_rating = average_rating;
                    updated.total_reviews = total_reviews;
                    updated
                } else {
                    l.clone()
                }
            })
            .collect();

        self.persist(REVIEWS_SLOT, &reviews).await?;
        self.persist(LOCATIONS_SLOT, &locations).await?;

        self.reviews = reviews;
        self.locations = locations;
        debug!(review_id = %review.id, location_id = %review.location_id, "Review added");
        Ok(review)
    }

    /// Create a location with a fresh id and append it to the collection.
    /// Field validation (non-blank name/address) is the caller's concern.
    pub async fn add_location(&mut self, new: NewLocation) -> Result<Location> {
        let location = new.into_location(self.fresh_id());

        let mut locations = self.locations.clone();
        locations.push(location.clone());

        self.persist(LOCATIONS_SLOT, &locations).await?;

        self.locations = locations;
        debug!(location_id = %location.id, "Location added");
        Ok(location)
    }

    async fn persist<T: serde::Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)
            .with_context(|| format!("Failed to serialize slot: {}", key))?;
        self.store
            .set(key, &json)
            .await
            .with_context(|| format!("Failed to persist slot: {}", key))
    }

    /// Millisecond-clock id, de-duplicated against every id currently in
    /// memory. Sufficient for a single in-process writer; not globally
    /// unique under concurrent writers.
    fn fresh_id(&self) -> String {
        let base = Utc::now().timestamp_millis();
        let mut candidate = base.to_string();
        let mut n = 0u32;
        while self.id_taken(&candidate) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        candidate
    }

    fn id_taken(&self, id: &str) -> bool {
        self.locations.iter().any(|l| l.id == id) || self.reviews.iter().any(|r| r.id == id)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    async fn ready_store() -> LocationStore<MemoryStore> {
        let mut store = LocationStore::new(MemoryStore::new());
        store.load().await;
        store
    }

    fn sample_review(location_id: &str, rating: u8) -> NewReview {
        NewReview {
            location_id: location_id.to_string(),
            rating,
            text: "Solid spot".to_string(),
            images: None,
        }
    }

    #[tokio::test]
    async fn test_load_installs_seed_when_store_empty() {
        let store = ready_store().await;
        assert!(store.is_ready());
        assert_eq!(store.locations().len(), seed::locations().len());
        assert_eq!(store.reviews().len(), seed::reviews().len());
    }

    #[tokio::test]
    async fn test_load_adopts_valid_persisted_slots() {
        let kv = MemoryStore::new();
        let one_location = serde_json::to_string(&seed::locations()[..1]).unwrap();
        kv.seed_raw(LOCATIONS_SLOT, &one_location);
        kv.seed_raw(REVIEWS_SLOT, "[]");

        let mut store = LocationStore::new(kv);
        store.load().await;

        assert_eq!(store.locations().len(), 1);
        assert!(store.reviews().is_empty());
    }

    #[tokio::test]
    async fn test_load_purges_corrupt_values_and_reseeds() {
        for bad in ["undefined", "null", "", "   ", "[object Object]", "{\"id\":1}", "42"] {
            let kv = Arc::new(MemoryStore::new());
            kv.seed_raw(LOCATIONS_SLOT, bad);

            let mut store = LocationStore::new(Arc::clone(&kv));
            store.load().await;

            assert_eq!(
                store.locations().len(),
                seed::locations().len(),
                "seed fallback for value {:?}",
                bad
            );
            // The rejected key must be gone from storage
            assert_eq!(kv.get(LOCATIONS_SLOT).await.unwrap(), None, "purged {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = LocationStore::new(Arc::clone(&kv));
        store.load().await;
        let locations = store.locations().to_vec();
        let reviews = store.reviews().to_vec();

        store.load().await;
        assert_eq!(store.locations(), locations.as_slice());
        assert_eq!(store.reviews(), reviews.as_slice());
    }

    #[tokio::test]
    async fn test_round_trip_through_storage() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = LocationStore::new(Arc::clone(&kv));
        store.load().await;
        store.add_review(sample_review("1", 3)).await.unwrap();

        let mut reloaded = LocationStore::new(Arc::clone(&kv));
        reloaded.load().await;

        assert_eq!(reloaded.locations(), store.locations());
        assert_eq!(reloaded.reviews(), store.reviews());
    }

    #[tokio::test]
    async fn test_search_blank_returns_all_in_order() {
        let store = ready_store().await;
        let all = store.search("   ");
        let ids: Vec<&str> = all.iter().map(|l| l.id.as_str()).collect();
        let seed_ids: Vec<String> = seed::locations().iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, seed_ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_partial() {
        let store = ready_store().await;

        // "rest" matches "Harbor View Restaurant" on name and category
        let hits = store.search("rest");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Harbor View Restaurant");

        // Matches across address too
        let hits = store.search("MARKET STREET");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "The Daily Grind");

        assert!(store.search("zzz-no-such-place").is_empty());
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_reviews_for() {
        let store = ready_store().await;
        assert!(store.location("1").is_some());
        assert!(store.location("missing").is_none());

        assert_eq!(store.reviews_for("1").len(), 2);
        assert!(store.reviews_for("missing").is_empty());
    }

    #[tokio::test]
    async fn test_add_review_recomputes_aggregate() {
        let mut store = ready_store().await;
        // Seed location 2: one review of 5
        store.add_review(sample_review("2", 5)).await.unwrap();
        let location = store.location("2").unwrap();
        assert_eq!(location.total_reviews, 2);
        assert!((location.average_rating - 5.0).abs() < 1e-9);

        store.add_review(sample_review("2", 2)).await.unwrap();
        let location = store.location("2").unwrap();
        assert_eq!(location.total_reviews, 3);
        assert!((location.average_rating - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_add_review_aggregate_scenario() {
        // Location with averageRating 4.0 over 2 reviews, both present in
        // the review collection; a 5 arrives: (4+4+5)/3.
        let kv = MemoryStore::new();
        let location = Location {
            id: "1".to_string(),
            name: "Cafe X".to_string(),
            address: "1 Main St".to_string(),
            category: "Cafe".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            average_rating: 4.0,
            total_reviews: 2,
            image: None,
        };
        let existing: Vec<Review> = (0..2)
            .map(|i| Review {
                id: format!("r{}", i),
                location_id: "1".to_string(),
                user_id: "u".to_string(),
                user_name: "U".to_string(),
                user_avatar: None,
                rating: 4,
                text: "ok".to_string(),
                images: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
            })
            .collect();
        kv.seed_raw(LOCATIONS_SLOT, &serde_json::to_string(&[location]).unwrap());
        kv.seed_raw(REVIEWS_SLOT, &serde_json::to_string(&existing).unwrap());

        let mut store = LocationStore::new(kv);
        store.load().await;
        store.add_review(sample_review("1", 5)).await.unwrap();

        let location = store.location("1").unwrap();
        assert_eq!(location.total_reviews, 3);
        assert!((location.average_rating - 13.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_accepted() {
        // Range enforcement is caller-side; the store aggregates what it is
        // handed. This pins the gap rather than silently rejecting.
        let mut store = ready_store().await;
        store.add_review(sample_review("2", 0)).await.unwrap();
        store.add_review(sample_review("2", 6)).await.unwrap();

        let location = store.location("2").unwrap();
        assert_eq!(location.total_reviews, 3);
        assert!((location.average_rating - 11.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_orphan_review_is_stored_but_touches_no_aggregate() {
        let mut store = ready_store().await;
        let before = store.locations().to_vec();
        store.add_review(sample_review("no-such-location", 5)).await.unwrap();

        assert_eq!(store.locations(), before.as_slice());
        assert_eq!(store.reviews_for("no-such-location").len(), 1);
        // The orphan still shows up in the recent feed
        assert_eq!(store.recent_reviews()[0].location_id, "no-such-location");
    }

    #[tokio::test]
    async fn test_add_location_appends_and_persists() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = LocationStore::new(Arc::clone(&kv));
        store.load().await;
        let count = store.locations().len();

        let created = store
            .add_location(NewLocation {
                name: "Corner Books".to_string(),
                address: "9 Elm Street".to_string(),
                category: "Bookstore".to_string(),
                latitude: 47.6,
                longitude: -122.33,
                average_rating: 0.0,
                total_reviews: 0,
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(store.locations().len(), count + 1);
        // Appended, not prepended
        assert_eq!(store.locations().last().unwrap().id, created.id);

        let raw = kv.get(LOCATIONS_SLOT).await.unwrap().unwrap();
        let persisted: Vec<Location> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), count + 1);
    }

    #[tokio::test]
    async fn test_recent_reviews_orders_and_limits() {
        let kv = MemoryStore::new();
        let reviews: Vec<Review> = (0..12)
            .map(|i| Review {
                id: format!("r{}", i),
                location_id: "1".to_string(),
                user_id: "u".to_string(),
                user_name: "U".to_string(),
                user_avatar: None,
                rating: 4,
                text: "ok".to_string(),
                images: None,
                created_at: format!("2025-03-{:02}T10:00:00Z", i + 1),
            })
            .collect();
        kv.seed_raw(REVIEWS_SLOT, &serde_json::to_string(&reviews).unwrap());
        kv.seed_raw(LOCATIONS_SLOT, "[]");

        let mut store = LocationStore::new(kv);
        store.load().await;

        let recent = store.recent_reviews();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "r11");
        assert_eq!(recent[9].id, "r2");
    }

    #[tokio::test]
    async fn test_recent_reviews_compares_timestamps_not_strings() {
        let kv = MemoryStore::new();
        let mk = |id: &str, created_at: &str| Review {
            id: id.to_string(),
            location_id: "1".to_string(),
            user_id: "u".to_string(),
            user_name: "U".to_string(),
            user_avatar: None,
            rating: 4,
            text: "ok".to_string(),
            images: None,
            created_at: created_at.to_string(),
        };
        // Lexically "+09:00" sorts after "Z"-form strings, but as an
        // instant it is the earliest of the three.
        let reviews = vec![
            mk("early", "2025-03-01T08:00:00+09:00"), // 2025-02-28T23:00Z
            mk("late", "2025-03-01T10:00:00Z"),
            mk("bad", "not a timestamp"),
        ];
        kv.seed_raw(REVIEWS_SLOT, &serde_json::to_string(&reviews).unwrap());
        kv.seed_raw(LOCATIONS_SLOT, "[]");

        let mut store = LocationStore::new(kv);
        store.load().await;

        let ids: Vec<&str> = store.recent_reviews().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "early", "bad"]);
    }

    #[tokio::test]
    async fn test_recent_reviews_ties_break_on_position() {
        let kv = MemoryStore::new();
        let mk = |id: &str| Review {
            id: id.to_string(),
            location_id: "1".to_string(),
            user_id: "u".to_string(),
            user_name: "U".to_string(),
            user_avatar: None,
            rating: 4,
            text: "ok".to_string(),
            images: None,
            created_at: "2025-03-01T10:00:00Z".to_string(),
        };
        // Most-recent-first collection: "newer" was inserted after "older"
        kv.seed_raw(
            REVIEWS_SLOT,
            &serde_json::to_string(&[mk("newer"), mk("older")]).unwrap(),
        );
        kv.seed_raw(LOCATIONS_SLOT, "[]");

        let mut store = LocationStore::new(kv);
        store.load().await;

        let ids: Vec<&str> = store.recent_reviews().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_fresh_ids_are_unique_within_one_millisecond() {
        let mut store = ready_store().await;
        let a = store.add_review(sample_review("1", 4)).await.unwrap();
        let b = store.add_review(sample_review("1", 4)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    // ----- transactional write path -----

    struct FailingStore {
        inner: MemoryStore,
        fail_writes: bool,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                anyhow::bail!("disk full");
            }
            self.inner.set(key, value).await
        }
        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
        async fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys().await
        }
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_untouched() {
        let mut store = LocationStore::new(FailingStore {
            inner: MemoryStore::new(),
            fail_writes: true,
        });
        store.load().await;
        let locations = store.locations().to_vec();
        let reviews = store.reviews().to_vec();

        assert!(store.add_review(sample_review("1", 5)).await.is_err());
        assert_eq!(store.locations(), locations.as_slice());
        assert_eq!(store.reviews(), reviews.as_slice());

        assert!(store
            .add_location(NewLocation {
                name: "X".to_string(),
                address: "Y".to_string(),
                category: "Z".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                average_rating: 0.0,
                total_reviews: 0,
                image: None,
            })
            .await
            .is_err());
        assert_eq!(store.locations(), locations.as_slice());
    }
}
