use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::error::{ApiError, ApiResult};
use crate::models::Listing;

/// Resource name plus page number; `page` is `None` for unpaginated lookups.
///
/// `owner` is the bearer token the listing was fetched with. The backend
/// decides what each token may read, so listings are never shared between
/// owners.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CollectionKey {
    pub resource: &'static str,
    pub page: Option<u32>,
    owner: Option<Arc<str>>,
}

impl CollectionKey {
    pub fn page(resource: &'static str, page: u32) -> Self {
        Self {
            resource,
            page: Some(page.max(1)),
            owner: None,
        }
    }

    pub fn all(resource: &'static str) -> Self {
        Self {
            resource,
            page: None,
            owner: None,
        }
    }

    pub fn owned_by(mut self, token: Option<&str>) -> Self {
        self.owner = token.map(Arc::from);
        self
    }

    fn is_owned_by(&self, token: &str) -> bool {
        self.owner.as_deref() == Some(token)
    }
}

// Tokens stay out of logs.
impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{}@{}", self.resource, page),
            None => write!(f, "{}@all", self.resource),
        }
    }
}

impl fmt::Debug for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// What a read of one key produced: the latest good listing (if any) and the
/// error of the latest fetch (if it failed).
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub listing: Option<Arc<Listing<T>>>,
    pub error: Option<ApiError>,
}

impl<T> Snapshot<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.listing.is_some()
    }
}

impl<T> From<ApiResult<Listing<T>>> for Snapshot<T> {
    fn from(result: ApiResult<Listing<T>>) -> Self {
        match result {
            Ok(listing) => Snapshot {
                listing: Some(Arc::new(listing)),
                error: None,
            },
            Err(error) => Snapshot {
                listing: None,
                error: Some(error),
            },
        }
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, ApiResult<Arc<Listing<T>>>>>;

struct Entry<T> {
    listing: Option<Arc<Listing<T>>>,
    error: Option<ApiError>,
    stale: bool,
    generation: u64,
    in_flight: Option<(u64, SharedFetch<T>)>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            listing: None,
            error: None,
            stale: true,
            generation: 0,
            in_flight: None,
        }
    }
}

impl<T> Entry<T> {
    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            listing: self.listing.clone(),
            error: self.error.clone(),
        }
    }
}

/// Keyed fetch cache for one resource.
///
/// * fresh keys are served without a network call;
/// * concurrent reads of a key share one in-flight fetch;
/// * invalidation is lazy: keys are marked stale and the next read refetches;
/// * a fetch superseded by a later one never overwrites the entry.
///
/// The lock is never held across an await.
pub struct CollectionCache<T> {
    resource: &'static str,
    entries: Mutex<HashMap<CollectionKey, Entry<T>>>,
    // Monotonic across keys; a recreated key never reuses a generation.
    generations: AtomicU64,
}

impl<T> CollectionCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            entries: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CollectionKey, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load<F, Fut>(&self, key: CollectionKey, fetch: F) -> Snapshot<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Listing<T>>> + Send + 'static,
    {
        let (generation, pending) = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();

            if let Some((generation, pending)) = &entry.in_flight {
                log::debug!("Joining in-flight fetch of {}", key);
                (*generation, pending.clone())
            } else if !entry.stale && entry.listing.is_some() {
                return entry.snapshot();
            } else {
                let generation = self.next_generation();
                entry.generation = generation;
                log::debug!("Fetching {} (generation {})", key, generation);
                let pending: SharedFetch<T> = fetch().map(|r| r.map(Arc::new)).boxed().shared();
                entry.in_flight = Some((generation, pending.clone()));
                (generation, pending)
            }
        };

        let result = pending.await;

        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(&key) else {
            // Evicted while the fetch was running.
            return match result {
                Ok(listing) => Snapshot {
                    listing: Some(listing),
                    error: None,
                },
                Err(error) => Snapshot {
                    listing: None,
                    error: Some(error),
                },
            };
        };
        if entry.generation != generation {
            log::debug!(
                "Discarding response for {} (generation {}, latest {})",
                key,
                generation,
                entry.generation
            );
            return entry.snapshot();
        }
        if matches!(&entry.in_flight, Some((g, _)) if *g == generation) {
            entry.in_flight = None;
        }
        match result {
            Ok(listing) => {
                entry.listing = Some(listing);
                entry.error = None;
                entry.stale = false;
            }
            Err(error) => {
                log::warn!("Fetching {} failed: {}", key, error);
                entry.error = Some(error);
            }
        }
        entry.snapshot()
    }

    /// Last committed state of a key without fetching.
    pub fn peek(&self, key: &CollectionKey) -> Option<Snapshot<T>> {
        self.entries().get(key).map(Entry::snapshot)
    }

    /// Drops one key, e.g. a page past the end of the collection.
    pub fn evict(&self, key: &CollectionKey) {
        if self.entries().remove(key).is_some() {
            log::debug!("Evicted {}", key);
        }
    }

    /// Drops every key fetched with `token`.
    pub fn forget_owner(&self, token: &str) {
        self.entries().retain(|key, _| !key.is_owned_by(token));
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks every key of the resource stale and forgets in-flight fetches so
    /// that their responses are discarded. Calling it repeatedly is the same
    /// as calling it once.
    pub fn invalidate_resource(&self) {
        let mut entries = self.entries();
        for (key, entry) in entries.iter_mut() {
            if entry.in_flight.take().is_some() {
                entry.generation = self.next_generation();
            }
            entry.stale = true;
            log::debug!("Invalidated {}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn listing(items: &[&str]) -> Listing<String> {
        Listing::new(items.iter().map(|s| s.to_string()).collect(), None)
    }

    #[tokio::test]
    async fn fresh_entries_are_served_from_cache() {
        let cache = CollectionCache::new("brands");
        let calls = AtomicUsize::new(0);
        let key = CollectionKey::all("brands");

        for _ in 0..3 {
            let snapshot = cache
                .load(key.clone(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(listing(&["a"])) }
                })
                .await;
            assert!(snapshot.is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_last_listing() {
        let cache = CollectionCache::new("brands");
        let key = CollectionKey::page("brands", 1);

        cache.load(key.clone(), || async { Ok(listing(&["a", "b"])) }).await;
        cache.invalidate_resource();
        let snapshot = cache
            .load(key, || async { Err(ApiError::Transport("down".to_string())) })
            .await;

        assert_eq!(snapshot.listing.unwrap().items, vec!["a", "b"]);
        assert!(matches!(snapshot.error, Some(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn response_of_invalidated_fetch_is_discarded() {
        let cache = Arc::new(CollectionCache::new("orders"));
        let key = CollectionKey::page("orders", 1);
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .load(key, || async move {
                        let _ = wait.await;
                        Ok(listing(&["before"]))
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        while cache.peek(&key).is_none() {
            tokio::task::yield_now().await;
        }

        cache.invalidate_resource();
        let fresh = cache
            .load(key.clone(), || async { Ok(listing(&["after"])) })
            .await;
        assert_eq!(fresh.listing.unwrap().items, vec!["after"]);

        release.send(()).unwrap();
        slow.await.unwrap();
        let latest = cache.peek(&key).unwrap();
        assert_eq!(latest.listing.unwrap().items, vec!["after"]);
    }

    #[tokio::test]
    async fn listings_are_not_shared_between_tokens() {
        let cache = CollectionCache::new("users");
        let admin = CollectionKey::page("users", 1).owned_by(Some("admin-tok"));
        let other = CollectionKey::page("users", 1).owned_by(Some("user-tok"));

        cache.load(admin.clone(), || async { Ok(listing(&["secret"])) }).await;
        let denied = cache
            .load(other.clone(), || async {
                Err(ApiError::Status {
                    status: 403,
                    message: "Forbidden".to_string(),
                })
            })
            .await;

        assert!(denied.listing.is_none());
        assert!(cache.peek(&admin).is_some_and(|s| s.is_ok()));

        cache.forget_owner("admin-tok");
        assert!(cache.peek(&admin).is_none());
        assert!(cache.peek(&other).is_some());
    }

    #[tokio::test]
    async fn evict_drops_one_key() {
        let cache = CollectionCache::new("brands");
        let key = CollectionKey::page("brands", 9);
        cache.load(key.clone(), || async { Ok(listing(&[])) }).await;
        assert_eq!(cache.len(), 1);

        cache.evict(&key);
        assert!(cache.is_empty());
    }
}
