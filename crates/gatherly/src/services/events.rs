//! Cached access to events.

use std::sync::Arc;

use gatherly_core::cache::{
    event_code_key, event_key, happening_now_key, managed_events_key, public_events_key,
    CachePolicy, EVENT_CODE_PREFIX, MANAGED_EVENTS_PREFIX,
};
use gatherly_core::models::{CreateEventInput, Event, ListEventsQuery, UpdateEventInput};
use gatherly_core::service::{ApiRequest, ErrorCode, RequestExecutor, ServiceResult};

use super::{execute_unit, load, log_failure, with_body, Fetched, ResourceCache};

/// What the event cache holds under a key.
#[derive(Debug, Clone)]
enum EventRecord {
    Single(Event),
    Listing(Vec<Event>),
}

impl EventRecord {
    fn into_single(self) -> ServiceResult<Event> {
        match self {
            Self::Single(event) => ServiceResult::success(event),
            Self::Listing(_) => {
                ServiceResult::failure(ErrorCode::FetchEventError, "Unexpected cached listing")
            }
        }
    }

    fn into_listing(self) -> ServiceResult<Vec<Event>> {
        match self {
            Self::Listing(events) => ServiceResult::success(events),
            Self::Single(_) => {
                ServiceResult::failure(ErrorCode::FetchEventError, "Unexpected cached event")
            }
        }
    }

    fn is_event(&self, event_id: &str) -> bool {
        matches!(self, Self::Single(event) if event.id == event_id)
    }
}

/// Reads and writes events.
///
/// Detail and by-code lookups, public listings, "happening now" and the
/// events managed by the signed-in user are cached. Public and "happening
/// now" listings are never invalidated by mutations; their short lifetimes
/// bound how long they can lag.
pub struct EventService {
    executor: Arc<dyn RequestExecutor>,
    cache: ResourceCache<EventRecord>,
    policy: CachePolicy,
}

impl EventService {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        policy: CachePolicy,
        max_entries: usize,
    ) -> Self {
        Self {
            executor,
            cache: ResourceCache::new(max_entries),
            policy,
        }
    }

    pub async fn get_by_id(&self, event_id: &str) -> ServiceResult<Event> {
        let request = ApiRequest::get(["events", event_id]);
        let fetch = load::<Event>(&self.executor, request);

        self.cache
            .read_through(
                event_key(event_id),
                self.policy.event_ttl,
                ErrorCode::FetchEventError,
                move || async move { fetch.await.map(EventRecord::Single) },
            )
            .await
            .and_then(EventRecord::into_single)
    }

    /// Looks an event up by its short code.
    ///
    /// A fetched event is also stored under its id, so a following
    /// [`get_by_id`](Self::get_by_id) is served from the cache.
    pub async fn get_by_code(&self, code: &str) -> ServiceResult<Event> {
        let key = event_code_key(code);
        if let Some(record) = self.cache.cached(&key) {
            tracing::trace!(%key, "Cache hit");
            return record.into_single();
        }

        let request = ApiRequest::get(["events", "code", code]);
        let fetch = load::<Event>(&self.executor, request);
        let fetched = self
            .cache
            .fetch(key, self.policy.event_ttl, ErrorCode::FetchEventError, move || {
                async move { fetch.await.map(EventRecord::Single) }
            })
            .await;

        self.populate_by_id(&fetched);
        fetched.result.and_then(EventRecord::into_single)
    }

    /// Stores an event fetched by code under its id as well.
    fn populate_by_id(&self, fetched: &Fetched<EventRecord>) {
        if let Some(EventRecord::Single(event)) = fetched.result.data() {
            self.cache.store_fetched(
                fetched,
                event_key(&event.id),
                EventRecord::Single(event.clone()),
                self.policy.event_ttl,
            );
        }
    }

    pub async fn list_public(&self, query: &ListEventsQuery) -> ServiceResult<Vec<Event>> {
        let request = ApiRequest::get(["events"]).with_query(query.pairs());
        self.read_listing(public_events_key(query), request, self.policy.event_listing_ttl)
            .await
    }

    pub async fn list_happening_now(&self, query: &ListEventsQuery) -> ServiceResult<Vec<Event>> {
        let request = ApiRequest::get(["events", "happening-now"]).with_query(query.pairs());
        self.read_listing(happening_now_key(query), request, self.policy.happening_now_ttl)
            .await
    }

    /// Events hosted or co-hosted by the signed-in user.
    pub async fn list_managed(&self, query: &ListEventsQuery) -> ServiceResult<Vec<Event>> {
        let request = ApiRequest::get(["me", "hosted-events"])
            .with_query(query.pairs())
            .authenticated();
        self.read_listing(managed_events_key(query), request, self.policy.event_listing_ttl)
            .await
    }

    async fn read_listing(
        &self,
        key: String,
        request: ApiRequest,
        ttl: std::time::Duration,
    ) -> ServiceResult<Vec<Event>> {
        let fetch = load::<Vec<Event>>(&self.executor, request);
        self.cache
            .read_through(key, ttl, ErrorCode::FetchEventError, move || async move {
                fetch.await.map(EventRecord::Listing)
            })
            .await
            .and_then(EventRecord::into_listing)
    }

    pub async fn create(&self, input: &CreateEventInput) -> ServiceResult<Event> {
        let request = match with_body(
            ApiRequest::post(["events"]).authenticated(),
            input,
            ErrorCode::CreateEventError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self.executor.execute(request).await.decode::<Event>();
        log_failure("create_event", &result);

        if let Some(event) = result.data() {
            self.invalidate_event(&event.id);
            self.cache.invalidate_key(&event_code_key(&event.code));
            self.cache.invalidate_prefix(MANAGED_EVENTS_PREFIX);
            tracing::debug!(event_id = %event.id, code = %event.code, "Event created");
        }
        result
    }

    /// Applies a partial update.
    ///
    /// Both the code the event had before the update and the code it has
    /// afterwards are invalidated.
    pub async fn update(&self, event_id: &str, input: &UpdateEventInput) -> ServiceResult<Event> {
        let request = match with_body(
            ApiRequest::put(["events", event_id]).authenticated(),
            input,
            ErrorCode::UpdateEventError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self.executor.execute(request).await.decode::<Event>();
        log_failure("update_event", &result);

        if let Some(event) = result.data() {
            self.invalidate_event(event_id);
            self.cache.invalidate_key(&event_code_key(&event.code));
            self.cache.invalidate_prefix(MANAGED_EVENTS_PREFIX);
            tracing::debug!(%event_id, code = %event.code, "Event updated");
        }
        result
    }

    pub async fn delete(&self, event_id: &str) -> ServiceResult<()> {
        let request = ApiRequest::delete(["events", event_id]).authenticated();

        let result = execute_unit(&self.executor, request).await;
        log_failure("delete_event", &result);

        if result.is_success() {
            self.invalidate_event(event_id);
            self.cache.invalidate_prefix(MANAGED_EVENTS_PREFIX);
            tracing::debug!(%event_id, "Event deleted");
        }
        result
    }

    /// Drops cached data for one event, or the whole event cache.
    pub fn clear_cache(&self, event_id: Option<&str>) {
        match event_id {
            Some(event_id) => self.invalidate_event(event_id),
            None => self.cache.clear(),
        }
    }

    /// Removes the detail entry and every by-code entry that resolves to
    /// `event_id`.
    fn invalidate_event(&self, event_id: &str) {
        let detail_key = event_key(event_id);
        let pending_key = detail_key.clone();
        // A by-code fetch still in flight may resolve to this event.
        self.cache.invalidate_where(
            move |key| key == pending_key || key.starts_with(EVENT_CODE_PREFIX),
            |key, record| *key == detail_key || record.is_event(event_id),
        );
    }
}
