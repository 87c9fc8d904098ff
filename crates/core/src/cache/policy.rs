use std::time::Duration;

/// Time-to-live for each class of cached resource.
///
/// Volatile listings ("happening now", announcements) live shorter than
/// event detail so that listings which are never invalidated explicitly
/// still converge quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Single events, by id or by short code.
    pub event_ttl: Duration,
    /// Public and managed event listings.
    pub event_listing_ttl: Duration,
    pub happening_now_ttl: Duration,
    /// Guest listings, "my events" and single memberships.
    pub guests_ttl: Duration,
    pub announcements_ttl: Duration,
    /// Single announcements.
    pub announcement_ttl: Duration,
}

impl CachePolicy {
    pub const DEFAULT_EVENT_TTL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_HAPPENING_NOW_TTL: Duration = Duration::from_secs(60);
    pub const DEFAULT_GUESTS_TTL: Duration = Duration::from_secs(2 * 60);
    pub const DEFAULT_ANNOUNCEMENTS_TTL: Duration = Duration::from_secs(60);
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            event_ttl: Self::DEFAULT_EVENT_TTL,
            event_listing_ttl: Self::DEFAULT_EVENT_TTL,
            happening_now_ttl: Self::DEFAULT_HAPPENING_NOW_TTL,
            guests_ttl: Self::DEFAULT_GUESTS_TTL,
            announcements_ttl: Self::DEFAULT_ANNOUNCEMENTS_TTL,
            announcement_ttl: Self::DEFAULT_EVENT_TTL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();

        assert_eq!(policy.event_ttl, Duration::from_secs(300));
        assert_eq!(policy.happening_now_ttl, Duration::from_secs(60));
        assert_eq!(policy.guests_ttl, Duration::from_secs(120));
        assert_eq!(policy.announcements_ttl, Duration::from_secs(60));
        assert!(policy.happening_now_ttl < policy.event_listing_ttl);
    }
}
