use std::{env, time::Duration};

use gatherly_core::cache::CachePolicy;

/// Data layer configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend API root (default: "http://localhost:3000/api")
    pub api_url: String,
    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
    /// Maximum number of entries per service cache (default: 10,000)
    pub cache_max_entries: usize,
    /// Single event TTL in seconds (default: 300)
    pub event_ttl_seconds: u64,
    /// Public and managed event listing TTL in seconds (default: 300)
    pub event_listing_ttl_seconds: u64,
    /// "Happening now" listing TTL in seconds (default: 60)
    pub happening_now_ttl_seconds: u64,
    /// Guest list and membership TTL in seconds (default: 120)
    pub guests_ttl_seconds: u64,
    /// Announcement listing TTL in seconds (default: 60)
    pub announcements_ttl_seconds: u64,
    /// Single announcement TTL in seconds (default: 300)
    pub announcement_ttl_seconds: u64,
}

impl Config {
    pub const DEFAULT_API_URL: &'static str = "http://localhost:3000/api";

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GATHERLY_API_URL` - Backend API root (default: "http://localhost:3000/api")
    /// - `REQUEST_TIMEOUT_SECONDS` - Request timeout (default: 30)
    /// - `CACHE_MAX_ENTRIES` - Maximum entries per cache (default: 10,000)
    /// - `EVENT_TTL_SECONDS` - Single event TTL (default: 300)
    /// - `EVENT_LISTING_TTL_SECONDS` - Event listing TTL (default: 300)
    /// - `HAPPENING_NOW_TTL_SECONDS` - "Happening now" TTL (default: 60)
    /// - `GUESTS_TTL_SECONDS` - Guest list TTL (default: 120)
    /// - `ANNOUNCEMENTS_TTL_SECONDS` - Announcement listing TTL (default: 60)
    /// - `ANNOUNCEMENT_TTL_SECONDS` - Single announcement TTL (default: 300)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            api_url: lookup("GATHERLY_API_URL")
                .unwrap_or_else(|| Self::DEFAULT_API_URL.to_string()),
            request_timeout_seconds: number("REQUEST_TIMEOUT_SECONDS", 30),
            cache_max_entries: lookup("CACHE_MAX_ENTRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(10_000),
            event_ttl_seconds: number("EVENT_TTL_SECONDS", 300),
            event_listing_ttl_seconds: number("EVENT_LISTING_TTL_SECONDS", 300),
            happening_now_ttl_seconds: number("HAPPENING_NOW_TTL_SECONDS", 60),
            guests_ttl_seconds: number("GUESTS_TTL_SECONDS", 120),
            announcements_ttl_seconds: number("ANNOUNCEMENTS_TTL_SECONDS", 60),
            announcement_ttl_seconds: number("ANNOUNCEMENT_TTL_SECONDS", 300),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the per-resource TTLs.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            event_ttl: Duration::from_secs(self.event_ttl_seconds),
            event_listing_ttl: Duration::from_secs(self.event_listing_ttl_seconds),
            happening_now_ttl: Duration::from_secs(self.happening_now_ttl_seconds),
            guests_ttl: Duration::from_secs(self.guests_ttl_seconds),
            announcements_ttl: Duration::from_secs(self.announcements_ttl_seconds),
            announcement_ttl: Duration::from_secs(self.announcement_ttl_seconds),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
