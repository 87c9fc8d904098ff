//! Composition root for the data layer.
//!
//! One [`DataLayer`] is built per application. It creates exactly one service
//! per entity kind, all sharing the same executor, and is the only place that
//! can reset them together.

use std::sync::Arc;

use gatherly_core::cache::CachePolicy;
use gatherly_core::service::{CredentialProvider, RequestExecutor};

use crate::config::Config;
use crate::error::Result;
use crate::executor::{HttpExecutor, SessionCredentials};
use crate::services::{AnnouncementService, EventService, GuestService};

/// Shared handle to every resource service.
///
/// Cloning is cheap; clones share the same caches.
#[derive(Clone)]
pub struct DataLayer {
    events: Arc<EventService>,
    guests: Arc<GuestService>,
    announcements: Arc<AnnouncementService>,
    session: Option<Arc<SessionCredentials>>,
}

impl DataLayer {
    /// Builds the services on top of an existing executor.
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        policy: CachePolicy,
        max_entries: usize,
    ) -> Self {
        Self {
            events: Arc::new(EventService::new(
                Arc::clone(&executor),
                policy,
                max_entries,
            )),
            guests: Arc::new(GuestService::new(
                Arc::clone(&executor),
                policy,
                max_entries,
            )),
            announcements: Arc::new(AnnouncementService::new(executor, policy, max_entries)),
            session: None,
        }
    }

    /// Builds an HTTP-backed data layer from configuration.
    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let executor = HttpExecutor::new(&config.api_url, config.request_timeout(), credentials)?;
        tracing::debug!(
            api_url = %executor.base_url(),
            timeout_secs = config.request_timeout_seconds,
            "Data layer configured"
        );
        Ok(Self::new(
            Arc::new(executor),
            config.cache_policy(),
            config.cache_max_entries,
        ))
    }

    /// Builds an HTTP-backed data layer whose token lives in `session`.
    ///
    /// [`sign_out`](Self::sign_out) clears the session along with the caches.
    pub fn with_session(config: &Config, session: Arc<SessionCredentials>) -> Result<Self> {
        let mut layer = Self::from_config(config, session.clone())?;
        layer.session = Some(session);
        Ok(layer)
    }

    pub fn events(&self) -> &EventService {
        &self.events
    }

    pub fn guests(&self) -> &GuestService {
        &self.guests
    }

    pub fn announcements(&self) -> &AnnouncementService {
        &self.announcements
    }

    /// Drops every cached entry of every service.
    pub fn clear_all(&self) {
        self.events.clear_cache(None);
        self.guests.clear_cache(None);
        self.announcements.clear_cache(None);
        tracing::debug!("All caches cleared");
    }

    /// Forgets everything tied to the signed-in user.
    pub fn sign_out(&self) {
        if let Some(session) = &self.session {
            session.clear();
        }
        self.clear_all();
        tracing::info!("Signed out");
    }
}
