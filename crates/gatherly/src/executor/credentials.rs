//! Bearer token sources.

use std::sync::RwLock;

use async_trait::async_trait;

use gatherly_core::service::CredentialProvider;

/// Never supplies a token. Authenticated requests go out without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialProvider for NoCredentials {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// A token fixed at construction, e.g. from a CLI flag.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// The token of the current session, replaced on sign-in and cleared on
/// sign-out.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    token: RwLock<Option<String>>,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut current = self.token.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(token.into());
    }

    pub fn clear(&self) {
        let mut current = self.token.write().unwrap_or_else(|e| e.into_inner());
        *current = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

#[async_trait]
impl CredentialProvider for SessionCredentials {
    async fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        assert_eq!(StaticToken::new("abc").token().await.as_deref(), Some("abc"));
        assert_eq!(NoCredentials.token().await, None);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let session = SessionCredentials::new();
        assert_eq!(session.token().await, None);

        session.set_token("first");
        session.set_token("second");
        assert_eq!(session.token().await.as_deref(), Some("second"));
        assert!(session.is_signed_in());

        session.clear();
        assert_eq!(session.token().await, None);
        assert!(!session.is_signed_in());
    }
}
