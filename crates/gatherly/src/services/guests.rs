//! Cached access to guest lists and memberships.

use std::sync::Arc;

use gatherly_core::cache::{
    event_guests_key, membership_key, membership_prefix, CachePolicy, MY_EVENTS_KEY,
};
use gatherly_core::models::{
    Event, GuestMembership, JoinEventInput, LeaveEventInput, UpdateMembershipInput,
};
use gatherly_core::service::{ApiRequest, ErrorCode, RequestExecutor, ServiceResult};

use super::{execute_unit, load, log_failure, with_body, ResourceCache};

#[derive(Debug, Clone)]
enum GuestRecord {
    Guests(Vec<GuestMembership>),
    JoinedEvents(Vec<Event>),
    Membership(GuestMembership),
}

fn unexpected<T>() -> ServiceResult<T> {
    ServiceResult::failure(ErrorCode::FetchGuestsError, "Unexpected cached record")
}

/// Reads and writes guest memberships.
///
/// Every membership change drops the event's guest list, the signed-in
/// user's joined events and the membership itself. Event listings owned by
/// [`EventService`](super::EventService) are left alone.
pub struct GuestService {
    executor: Arc<dyn RequestExecutor>,
    cache: ResourceCache<GuestRecord>,
    policy: CachePolicy,
}

impl GuestService {
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

    pub async fn list_event_guests(&self, event_id: &str) -> ServiceResult<Vec<GuestMembership>> {
        let request = ApiRequest::get(["events", event_id, "guests"]).authenticated();
        let fetch = load::<Vec<GuestMembership>>(&self.executor, request);

        self.cache
            .read_through(
                event_guests_key(event_id),
                self.policy.guests_ttl,
                ErrorCode::FetchGuestsError,
                move || async move { fetch.await.map(GuestRecord::Guests) },
            )
            .await
            .and_then(|record| match record {
                GuestRecord::Guests(guests) => ServiceResult::success(guests),
                _ => unexpected(),
            })
    }

    /// Events the signed-in user has joined.
    pub async fn list_my_events(&self) -> ServiceResult<Vec<Event>> {
        let request = ApiRequest::get(["me", "events"]).authenticated();
        let fetch = load::<Vec<Event>>(&self.executor, request);

        self.cache
            .read_through(
                MY_EVENTS_KEY.to_string(),
                self.policy.guests_ttl,
                ErrorCode::FetchGuestsError,
                move || async move { fetch.await.map(GuestRecord::JoinedEvents) },
            )
            .await
            .and_then(|record| match record {
                GuestRecord::JoinedEvents(events) => ServiceResult::success(events),
                _ => unexpected(),
            })
    }

    pub async fn get_membership(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> ServiceResult<GuestMembership> {
        let request = ApiRequest::get(["events", event_id, "guests", user_id]).authenticated();
        let fetch = load::<GuestMembership>(&self.executor, request);

        self.cache
            .read_through(
                membership_key(event_id, user_id),
                self.policy.guests_ttl,
                ErrorCode::FetchGuestsError,
                move || async move { fetch.await.map(GuestRecord::Membership) },
            )
            .await
            .and_then(|record| match record {
                GuestRecord::Membership(membership) => ServiceResult::success(membership),
                _ => unexpected(),
            })
    }

    pub async fn join(&self, input: &JoinEventInput) -> ServiceResult<GuestMembership> {
        let request = match with_body(
            ApiRequest::post(["events", input.event_id.as_str(), "guests"]).authenticated(),
            input,
            ErrorCode::JoinEventError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self
            .executor
            .execute(request)
            .await
            .decode::<GuestMembership>();
        log_failure("join_event", &result);

        if result.is_success() {
            self.invalidate_membership(&input.event_id, &input.user_id);
            tracing::debug!(event_id = %input.event_id, user_id = %input.user_id, "Joined event");
        }
        result
    }

    pub async fn leave(&self, input: &LeaveEventInput) -> ServiceResult<()> {
        let request = ApiRequest::delete([
            "events",
            input.event_id.as_str(),
            "guests",
            input.user_id.as_str(),
        ])
        .authenticated();

        let result = execute_unit(&self.executor, request).await;
        log_failure("leave_event", &result);

        if result.is_success() {
            self.invalidate_membership(&input.event_id, &input.user_id);
            tracing::debug!(event_id = %input.event_id, user_id = %input.user_id, "Left event");
        }
        result
    }

    /// Changes a guest's RSVP status or role.
    pub async fn update_membership(
        &self,
        event_id: &str,
        user_id: &str,
        input: &UpdateMembershipInput,
    ) -> ServiceResult<GuestMembership> {
        let request = match with_body(
            ApiRequest::patch(["events", event_id, "guests", user_id]).authenticated(),
            input,
            ErrorCode::UpdateMembershipError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self
            .executor
            .execute(request)
            .await
            .decode::<GuestMembership>();
        log_failure("update_membership", &result);

        if result.is_success() {
            self.invalidate_membership(event_id, user_id);
            tracing::debug!(%event_id, %user_id, "Membership updated");
        }
        result
    }

    /// Drops the guest list and memberships of one event, or everything.
    pub fn clear_cache(&self, event_id: Option<&str>) {
        match event_id {
            Some(event_id) => {
                self.cache.invalidate_key(&event_guests_key(event_id));
                self.cache.invalidate_prefix(&membership_prefix(event_id));
            }
            None => self.cache.clear(),
        }
    }

    fn invalidate_membership(&self, event_id: &str, user_id: &str) {
        self.cache.invalidate_key(&event_guests_key(event_id));
        self.cache.invalidate_key(MY_EVENTS_KEY);
        self.cache.invalidate_key(&membership_key(event_id, user_id));
    }
}
