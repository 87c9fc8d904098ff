mod keys;
mod policy;

pub use keys::{
    announcement_key, canonical_query, event_announcements_key, event_announcements_prefix,
    event_code_key, event_guests_key, event_key, happening_now_key, managed_events_key,
    membership_key, membership_prefix, public_events_key, ANNOUNCEMENTS_NAMESPACE,
    ANNOUNCEMENT_PREFIX, EVENT_CODE_PREFIX, HAPPENING_NOW_PREFIX, MANAGED_EVENTS_PREFIX,
    MY_EVENTS_KEY, PUBLIC_EVENTS_PREFIX,
};
pub use policy::CachePolicy;
