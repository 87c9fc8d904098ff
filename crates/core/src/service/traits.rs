use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, ServiceResult};

/// Issues one backend request and normalizes every outcome into a result.
///
/// Implementations must never panic or surface transport errors any other
/// way: timeouts, network failures and non-2xx statuses all come back as
/// [`ServiceResult::Failure`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Executes the request and returns the raw (undecoded) payload.
    async fn execute(&self, request: ApiRequest) -> ServiceResult<Value>;
}

/// Supplies the bearer token for authenticated requests.
///
/// `None` is not an error: the `Authorization` header is simply omitted.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}
