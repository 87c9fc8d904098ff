use url::form_urlencoded;

use crate::models::{ListAnnouncementsQuery, ListEventsQuery};

/// Prefix shared by every public event listing page.
pub const PUBLIC_EVENTS_PREFIX: &str = "events:public:";

/// Prefix shared by every "happening now" listing page.
pub const HAPPENING_NOW_PREFIX: &str = "events:happening-now:";

/// Prefix shared by every listing of events managed by the signed-in user.
pub const MANAGED_EVENTS_PREFIX: &str = "events:admin:";

/// Cache key for the events the signed-in user joined.
pub const MY_EVENTS_KEY: &str = "my-events";

/// Prefix shared by every by-code event key.
pub const EVENT_CODE_PREFIX: &str = "event:code:";

/// Prefix shared by every single-announcement key.
pub const ANNOUNCEMENT_PREFIX: &str = "announcement:";

/// Namespace of every announcement listing key.
pub const ANNOUNCEMENTS_NAMESPACE: &str = "announcements:";

/// Returns the cache key for a single event.
pub fn event_key(event_id: &str) -> String {
    format!("event:{}", event_id)
}

/// Returns the cache key for an event looked up by its short code.
pub fn event_code_key(code: &str) -> String {
    format!("{}{}", EVENT_CODE_PREFIX, code)
}

/// Returns the cache key for one page of public events.
pub fn public_events_key(query: &ListEventsQuery) -> String {
    format!("{}{}", PUBLIC_EVENTS_PREFIX, canonical_query(&query.pairs()))
}

/// Returns the cache key for one page of events happening now.
pub fn happening_now_key(query: &ListEventsQuery) -> String {
    format!("{}{}", HAPPENING_NOW_PREFIX, canonical_query(&query.pairs()))
}

/// Returns the cache key for one page of managed events.
pub fn managed_events_key(query: &ListEventsQuery) -> String {
    format!("{}{}", MANAGED_EVENTS_PREFIX, canonical_query(&query.pairs()))
}

/// Returns the cache key for the guest list of an event.
pub fn event_guests_key(event_id: &str) -> String {
    format!("guests:event:{}", event_id)
}

/// Returns the cache key for a single membership.
pub fn membership_key(event_id: &str, user_id: &str) -> String {
    format!("{}{}", membership_prefix(event_id), user_id)
}

/// Returns the prefix matching every single-membership key of an event.
pub fn membership_prefix(event_id: &str) -> String {
    format!("guest:event:{}:user:", event_id)
}

/// Returns the prefix matching every announcement listing page of an event.
pub fn event_announcements_prefix(event_id: &str) -> String {
    format!("{}event:{}:", ANNOUNCEMENTS_NAMESPACE, event_id)
}

/// Returns the cache key for one page of an event's announcements.
pub fn event_announcements_key(event_id: &str, query: &ListAnnouncementsQuery) -> String {
    format!(
        "{}{}",
        event_announcements_prefix(event_id),
        canonical_query(&query.pairs())
    )
}

/// Returns the cache key for a single announcement.
pub fn announcement_key(announcement_id: &str) -> String {
    format!("{}{}", ANNOUNCEMENT_PREFIX, announcement_id)
}

/// Serializes query pairs into a stable, form-urlencoded discriminator.
///
/// The caller decides the order; query types emit `limit` and `offset`
/// first, then filters sorted by name.
///
/// # Examples
///
/// ```
/// use gatherly_core::cache::canonical_query;
///
/// let pairs = vec![
///     ("limit".to_string(), "20".to_string()),
///     ("city".to_string(), "São Paulo".to_string()),
/// ];
/// assert_eq!(canonical_query(&pairs), "limit=20&city=S%C3%A3o+Paulo");
/// ```
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
