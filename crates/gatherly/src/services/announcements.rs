use std::sync::Arc;

use gatherly_core::cache::{
    announcement_key, event_announcements_key, event_announcements_prefix, CachePolicy,
    ANNOUNCEMENTS_NAMESPACE, ANNOUNCEMENT_PREFIX,
};
use gatherly_core::models::{
    Announcement, CreateAnnouncementInput, ListAnnouncementsQuery, UpdateAnnouncementInput,
};
use gatherly_core::service::{ApiRequest, ErrorCode, RequestExecutor, ServiceResult};

use super::{execute_unit, load, log_failure, with_body, ResourceCache};

#[derive(Debug, Clone)]
enum AnnouncementRecord {
    Listing(Vec<Announcement>),
    Single(Announcement),
}

impl AnnouncementRecord {
    fn belongs_to(&self, event_id: &str) -> bool {
        matches!(self, Self::Single(announcement) if announcement.event_id == event_id)
    }
}

/// Reads and writes event announcements.
pub struct AnnouncementService {
    executor: Arc<dyn RequestExecutor>,
    cache: ResourceCache<AnnouncementRecord>,
    policy: CachePolicy,
}

impl AnnouncementService {
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

    pub async fn list_for_event(
        &self,
        event_id: &str,
        query: &ListAnnouncementsQuery,
    ) -> ServiceResult<Vec<Announcement>> {
        let request = ApiRequest::get(["events", event_id, "announcements"])
            .with_query(query.pairs())
            .authenticated();
        let fetch = load::<Vec<Announcement>>(&self.executor, request);

        self.cache
            .read_through(
                event_announcements_key(event_id, query),
                self.policy.announcements_ttl,
                ErrorCode::FetchAnnouncementsError,
                move || async move { fetch.await.map(AnnouncementRecord::Listing) },
            )
            .await
            .and_then(|record| match record {
                AnnouncementRecord::Listing(announcements) => ServiceResult::success(announcements),
                AnnouncementRecord::Single(_) => ServiceResult::failure(
                    ErrorCode::FetchAnnouncementsError,
                    "Unexpected cached announcement",
                ),
            })
    }

    pub async fn get_by_id(&self, announcement_id: &str) -> ServiceResult<Announcement> {
        let request = ApiRequest::get(["announcements", announcement_id]).authenticated();
        let fetch = load::<Announcement>(&self.executor, request);

        self.cache
            .read_through(
                announcement_key(announcement_id),
                self.policy.announcement_ttl,
                ErrorCode::FetchAnnouncementsError,
                move || async move { fetch.await.map(AnnouncementRecord::Single) },
            )
            .await
            .and_then(|record| match record {
                AnnouncementRecord::Single(announcement) => ServiceResult::success(announcement),
                AnnouncementRecord::Listing(_) => ServiceResult::failure(
                    ErrorCode::FetchAnnouncementsError,
                    "Unexpected cached listing",
                ),
            })
    }

    pub async fn create(&self, input: &CreateAnnouncementInput) -> ServiceResult<Announcement> {
        let request = match with_body(
            ApiRequest::post(["events", input.event_id.as_str(), "announcements"]).authenticated(),
            input,
            ErrorCode::CreateAnnouncementError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self.executor.execute(request).await.decode::<Announcement>();
        log_failure("create_announcement", &result);

        if result.is_success() {
            self.cache
                .invalidate_prefix(&event_announcements_prefix(&input.event_id));
            tracing::debug!(event_id = %input.event_id, "Announcement created");
        }
        result
    }

    pub async fn update(
        &self,
        announcement_id: &str,
        input: &UpdateAnnouncementInput,
    ) -> ServiceResult<Announcement> {
        let request = match with_body(
            ApiRequest::put(["announcements", announcement_id]).authenticated(),
            input,
            ErrorCode::UpdateAnnouncementError,
        ) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        let result = self.executor.execute(request).await.decode::<Announcement>();
        log_failure("update_announcement", &result);

        if let Some(announcement) = result.data() {
            self.cache.invalidate_key(&announcement_key(announcement_id));
            self.cache
                .invalidate_prefix(&event_announcements_prefix(&announcement.event_id));
            tracing::debug!(
                %announcement_id,
                event_id = %announcement.event_id,
                "Announcement updated"
            );
        }
        result
    }

    /// Deletes an announcement.
    ///
    /// Listings of its event are dropped when the event is known from a cached
    /// copy of the announcement; otherwise every announcement listing is.
    pub async fn delete(&self, announcement_id: &str) -> ServiceResult<()> {
        let event_id = match self.cache.cached(&announcement_key(announcement_id)) {
            Some(AnnouncementRecord::Single(announcement)) => Some(announcement.event_id),
            _ => None,
        };
        let request = ApiRequest::delete(["announcements", announcement_id]).authenticated();

        let result = execute_unit(&self.executor, request).await;
        log_failure("delete_announcement", &result);

        if result.is_success() {
            self.cache.invalidate_key(&announcement_key(announcement_id));
            match &event_id {
                Some(event_id) => self
                    .cache
                    .invalidate_prefix(&event_announcements_prefix(event_id)),
                None => self.cache.invalidate_prefix(ANNOUNCEMENTS_NAMESPACE),
            }
            tracing::debug!(%announcement_id, ?event_id, "Announcement deleted");
        }
        result
    }

    /// Drops the cached announcements of one event, or everything.
    pub fn clear_cache(&self, event_id: Option<&str>) {
        match event_id {
            Some(event_id) => {
                let prefix = event_announcements_prefix(event_id);
                let pending_prefix = prefix.clone();
                self.cache.invalidate_where(
                    move |key| {
                        key.starts_with(&pending_prefix) || key.starts_with(ANNOUNCEMENT_PREFIX)
                    },
                    |key, record| key.starts_with(&prefix) || record.belongs_to(event_id),
                );
            }
            None => self.cache.clear(),
        }
    }
}
