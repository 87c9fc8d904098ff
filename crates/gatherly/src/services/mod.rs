//! Resource services: the cached, coalesced read paths and the invalidating
//! write paths for each entity kind.
//!
//! Reads go cache store, then coordinator, then executor, and populate the
//! store on success. Writes go straight to the executor and invalidate only
//! after the backend confirmed them.

mod announcements;
mod events;
mod guests;

pub use announcements::AnnouncementService;
pub use events::EventService;
pub use guests::GuestService;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use gatherly_core::service::{ApiRequest, ErrorCode, RequestExecutor, ServiceError, ServiceResult};

use crate::cache::CacheStore;
use crate::coordinator::{Abandoned, RequestCoordinator};

/// The outcome of a coalesced fetch, tagged with the ticket taken when the
/// fetch started.
#[derive(Clone)]
pub(crate) struct Fetched<V> {
    pub result: ServiceResult<V>,
    ticket: Option<Arc<FetchTicket>>,
}

/// What an invalidation covered.
enum Scope {
    Key(String),
    Prefix(String),
    Matching(Box<dyn Fn(&str) -> bool + Send + Sync>),
    All,
}

impl Scope {
    fn covers(&self, key: &str) -> bool {
        match self {
            Scope::Key(invalidated) => invalidated == key,
            Scope::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Scope::Matching(predicate) => predicate(key),
            Scope::All => true,
        }
    }
}

/// Invalidations recorded while fetches are outstanding.
///
/// `started` counts fetches by the invalidation counter at their start; the
/// log keeps only invalidations newer than the oldest outstanding fetch.
#[derive(Default)]
struct Invalidations {
    counter: u64,
    started: BTreeMap<u64, usize>,
    log: Vec<(u64, Scope)>,
}

impl Invalidations {
    fn begin(&mut self) -> u64 {
        *self.started.entry(self.counter).or_default() += 1;
        self.counter
    }

    fn end(&mut self, started_at: u64) {
        if let Some(count) = self.started.get_mut(&started_at) {
            *count -= 1;
            if *count == 0 {
                self.started.remove(&started_at);
            }
        }
        match self.started.keys().next() {
            Some(&oldest) => self.log.retain(|(at, _)| *at > oldest),
            None => self.log.clear(),
        }
    }

    fn record(&mut self, scope: Scope) {
        self.counter += 1;
        if !self.started.is_empty() {
            self.log.push((self.counter, scope));
        }
    }

    /// Returns true if `key` was invalidated after a fetch started at `started_at`.
    fn superseded(&self, key: &str, started_at: u64) -> bool {
        self.log
            .iter()
            .any(|(at, scope)| *at > started_at && scope.covers(key))
    }
}

type SharedInvalidations = Arc<Mutex<Invalidations>>;

fn lock_invalidations(invalidations: &Mutex<Invalidations>) -> MutexGuard<'_, Invalidations> {
    invalidations.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks one outstanding fetch. Shared by every waiter of that fetch and
/// released when the last of them drops its result.
struct FetchTicket {
    invalidations: SharedInvalidations,
    started_at: u64,
}

impl FetchTicket {
    fn issue(invalidations: &SharedInvalidations) -> Arc<Self> {
        let started_at = lock_invalidations(invalidations).begin();
        Arc::new(Self {
            invalidations: Arc::clone(invalidations),
            started_at,
        })
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        lock_invalidations(&self.invalidations).end(self.started_at);
    }
}

/// A service's cache store together with its in-flight map.
///
/// An invalidation removes matching entries from the store and detaches
/// matching in-flight fetches, so later reads start fresh requests. A fetch
/// that started before an invalidation covering its key still answers its
/// callers but is not written back.
pub(crate) struct ResourceCache<V> {
    store: CacheStore<String, V>,
    coordinator: RequestCoordinator<Fetched<V>>,
    invalidations: SharedInvalidations,
}

impl<V> ResourceCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: CacheStore::new(max_entries),
            coordinator: RequestCoordinator::new(),
            invalidations: SharedInvalidations::default(),
        }
    }

    /// Returns the live cached value for `key`.
    pub fn cached(&self, key: &str) -> Option<V> {
        self.store.get(&key.to_string())
    }

    /// Serves `key` from the cache, or fetches it through the coordinator.
    pub async fn read_through<F, Fut>(
        &self,
        key: String,
        ttl: Duration,
        abandoned_code: ErrorCode,
        producer: F,
    ) -> ServiceResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<V>> + Send + 'static,
    {
        if let Some(value) = self.cached(&key) {
            tracing::trace!(%key, "Cache hit");
            return ServiceResult::success(value);
        }
        self.fetch(key, ttl, abandoned_code, producer).await.result
    }

    /// Fetches `key` through the coordinator, skipping the cache lookup, and
    /// stores a successful result.
    ///
    /// Every waiter stores the success it receives. The write is idempotent
    /// and keeps the cache populated even if the caller that started the
    /// fetch has gone away.
    pub async fn fetch<F, Fut>(
        &self,
        key: String,
        ttl: Duration,
        abandoned_code: ErrorCode,
        producer: F,
    ) -> Fetched<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ServiceResult<V>> + Send + 'static,
    {
        tracing::trace!(%key, "Cache miss");

        let fetched = self
            .coordinator
            .coordinate(&key, || {
                let ticket = FetchTicket::issue(&self.invalidations);
                let work = producer();
                async move {
                    Fetched {
                        result: work.await,
                        ticket: Some(ticket),
                    }
                }
            })
            .await;

        match fetched {
            Ok(fetched) => {
                if let Some(value) = fetched.result.data() {
                    self.store_fetched(&fetched, key, value.clone(), ttl);
                }
                fetched
            }
            Err(Abandoned) => {
                tracing::warn!(%key, code = %abandoned_code, "Fetch abandoned");
                Fetched {
                    result: ServiceResult::failure(abandoned_code, "Request was abandoned"),
                    ticket: None,
                }
            }
        }
    }

    /// Stores `value` unless `key` was invalidated after `fetched` began.
    pub fn store_fetched(
        &self,
        fetched: &Fetched<V>,
        key: String,
        value: V,
        ttl: Duration,
    ) -> bool {
        let Some(ticket) = &fetched.ticket else {
            return false;
        };
        let invalidations = lock_invalidations(&self.invalidations);
        if invalidations.superseded(&key, ticket.started_at) {
            tracing::debug!(%key, "Discarding result of a fetch that overlapped an invalidation");
            return false;
        }
        self.store.set(key, value, ttl);
        true
    }

    pub fn invalidate_key(&self, key: &str) {
        {
            let mut invalidations = lock_invalidations(&self.invalidations);
            invalidations.record(Scope::Key(key.to_string()));
            if self.store.delete_key(&key.to_string()) {
                tracing::debug!(key, "Invalidated cache key");
            }
        }
        self.coordinator.forget(key);
    }

    pub fn invalidate_prefix(&self, prefix: &str) {
        {
            let mut invalidations = lock_invalidations(&self.invalidations);
            invalidations.record(Scope::Prefix(prefix.to_string()));
            let removed = self.store.delete_by_prefix(prefix);
            tracing::debug!(prefix, removed, "Invalidated cache prefix");
        }
        self.coordinator.forget_where(|key| key.starts_with(prefix));
    }

    /// Removes stored entries matching `stored` and detaches fetches whose
    /// key matches `pending`.
    ///
    /// A pending fetch has no value yet, so `pending` must match every key
    /// that `stored` could match once the value arrives.
    pub fn invalidate_where<P>(&self, pending: P, stored: impl Fn(&String, &V) -> bool)
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let pending = Arc::new(pending);
        {
            let mut invalidations = lock_invalidations(&self.invalidations);
            let logged = Arc::clone(&pending);
            let covers: Box<dyn Fn(&str) -> bool + Send + Sync> =
                Box::new(move |key: &str| (*logged)(key));
            invalidations.record(Scope::Matching(covers));
            let removed = self.store.delete_where(stored);
            tracing::debug!(removed, "Invalidated matching cache entries");
        }
        self.coordinator.forget_where(|key| (*pending)(key));
    }

    pub fn clear(&self) {
        {
            let mut invalidations = lock_invalidations(&self.invalidations);
            invalidations.record(Scope::All);
            self.store.clear_all();
        }
        self.coordinator.forget_where(|_| true);
        tracing::debug!("Cleared cache");
    }

    #[cfg(test)]
    pub fn store(&self) -> &CacheStore<String, V> {
        &self.store
    }

    #[cfg(test)]
    pub fn coordinator(&self) -> &RequestCoordinator<Fetched<V>> {
        &self.coordinator
    }
}

/// Builds the future that executes `request` and decodes its payload.
///
/// The future owns everything it touches so the coordinator can run it as a
/// detached task.
pub(crate) fn load<T>(
    executor: &Arc<dyn RequestExecutor>,
    request: ApiRequest,
) -> impl Future<Output = ServiceResult<T>> + Send + 'static
where
    T: DeserializeOwned,
{
    let executor = Arc::clone(executor);
    async move { executor.execute(request).await.decode::<T>() }
}

/// Executes a request whose response payload is irrelevant.
pub(crate) async fn execute_unit(
    executor: &Arc<dyn RequestExecutor>,
    request: ApiRequest,
) -> ServiceResult<()> {
    executor
        .execute(request)
        .await
        .decode::<IgnoredAny>()
        .map(|_| ())
}

/// Attaches a JSON body, reporting an encoding failure under `code`.
pub(crate) fn with_body<B>(
    request: ApiRequest,
    body: &B,
    code: ErrorCode,
) -> Result<ApiRequest, ServiceError>
where
    B: Serialize + ?Sized,
{
    request
        .with_json(body)
        .map_err(|err| ServiceError::new(code, format!("Failed to encode request: {}", err)))
}

/// Logs a failed mutation. Nothing is invalidated after a failure.
pub(crate) fn log_failure<T>(operation: &str, result: &ServiceResult<T>) {
    if let Some(error) = result.error() {
        tracing::warn!(operation, code = %error.code, error = %error.message, "Mutation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ResourceCache<String> {
        ResourceCache::new(100)
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_read_through_stores_success() {
        let cache = cache();

        let result = cache
            .read_through("event:evt-1".to_string(), TTL, ErrorCode::FetchEventError, || async {
                ServiceResult::success("payload".to_string())
            })
            .await;

        assert_eq!(result.data().map(String::as_str), Some("payload"));
        assert_eq!(cache.cached("event:evt-1").as_deref(), Some("payload"));
    }

    #[tokio::test]
    async fn test_read_through_does_not_store_failure() {
        let cache = cache();

        let result = cache
            .read_through("event:evt-1".to_string(), TTL, ErrorCode::FetchEventError, || async {
                ServiceResult::failure(ErrorCode::Timeout, "Request timed out")
            })
            .await;

        assert_eq!(result.error_code(), Some(&ErrorCode::Timeout));
        assert!(cache.cached("event:evt-1").is_none());
        assert_eq!(cache.coordinator().in_flight_count(), 0);
    }

    fn explode() -> ServiceResult<String> {
        panic!("producer failed")
    }

    #[tokio::test]
    async fn test_abandoned_fetch_maps_to_entity_code() {
        let cache = cache();

        let result = cache
            .read_through("event:evt-1".to_string(), TTL, ErrorCode::FetchEventError, || async {
                explode()
            })
            .await;

        assert_eq!(result.error_code(), Some(&ErrorCode::FetchEventError));
        assert!(cache.cached("event:evt-1").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_overlapping_invalidation_is_not_stored() {
        let cache = Arc::new(cache());

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .read_through("event:evt-1".to_string(), TTL, ErrorCode::FetchEventError, || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        ServiceResult::success("before update".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate_key("event:evt-1");

        let result = reader.await.unwrap();

        assert_eq!(result.data().map(String::as_str), Some("before update"));
        assert!(cache.cached("event:evt-1").is_none());
    }

    fn slow(payload: &'static str) -> impl Future<Output = ServiceResult<String>> + Send {
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            ServiceResult::success(payload.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_clear_starts_fresh_fetch() {
        let cache = Arc::new(cache());

        let early = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .read_through("my-events".to_string(), TTL, ErrorCode::FetchEventError, || {
                        slow("previous user")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.clear();
        assert_eq!(cache.coordinator().in_flight_count(), 0);

        let fresh = cache
            .read_through("my-events".to_string(), TTL, ErrorCode::FetchEventError, || {
                slow("next user")
            })
            .await;

        assert_eq!(fresh.data().map(String::as_str), Some("next user"));
        assert_eq!(
            early.await.unwrap().data().map(String::as_str),
            Some("previous user")
        );
        assert_eq!(cache.cached("my-events").as_deref(), Some("next user"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_invalidation_keeps_fetch() {
        let cache = Arc::new(cache());

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let key = "guests:event:evt-1".to_string();
                cache
                    .read_through(key, TTL, ErrorCode::FetchGuestsError, || {
                        slow("guests")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate_key("guests:event:evt-2");
        cache.invalidate_prefix("guest:event:evt-2:user:");
        cache.invalidate_where(|key| key == "my-events", |key, _| key == "my-events");

        assert!(reader.await.unwrap().is_success());
        assert_eq!(cache.cached("guests:event:evt-1").as_deref(), Some("guests"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_invalidation_discards_pending_fetch() {
        let cache = Arc::new(cache());

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let key = "event:code:ABC123".to_string();
                cache
                    .read_through(key, TTL, ErrorCode::FetchEventError, || {
                        slow("stale")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate_where(|key| key.starts_with("event:code:"), |_, _| false);

        assert!(!cache.coordinator().is_in_flight("event:code:ABC123"));
        assert!(reader.await.unwrap().is_success());
        assert!(cache.cached("event:code:ABC123").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_log_is_dropped_once_fetches_finish() {
        let cache = Arc::new(cache());

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .read_through("event:evt-1".to_string(), TTL, ErrorCode::FetchEventError, || {
                        slow("payload")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate_key("event:evt-2");
        assert_eq!(lock_invalidations(&cache.invalidations).log.len(), 1);

        reader.await.unwrap();
        cache.invalidate_key("event:evt-3");

        let invalidations = lock_invalidations(&cache.invalidations);
        assert!(invalidations.log.is_empty());
        assert!(invalidations.started.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = cache();
        cache.store().set("events:admin:a".to_string(), "a".to_string(), TTL);
        cache.store().set("events:public:a".to_string(), "b".to_string(), TTL);

        cache.invalidate_prefix("events:admin:");

        assert!(cache.cached("events:admin:a").is_none());
        assert!(cache.cached("events:public:a").is_some());
    }
}
