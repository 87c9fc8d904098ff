//! reqwest-backed [`RequestExecutor`].
//!
//! Every outcome is folded into a `ServiceResult`:
//!
//! - the whole round trip (sending and reading the body) is bounded by the
//!   executor timeout; on expiry the transport future is dropped and the
//!   result is `TIMEOUT`
//! - any other transport failure is `NETWORK_ERROR`
//! - a non-2xx response keeps the server's `message` and `error` when the
//!   body carries them, and falls back to `"Request failed"` and `HTTP_<status>`
//! - a 2xx response is the server's envelope, unchanged

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use gatherly_core::service::{
    ApiRequest, CredentialProvider, Envelope, ErrorCode, Method, RequestExecutor, ServiceError,
    ServiceResult,
};

use crate::error::{Result, SetupError};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Executes [`ApiRequest`]s against the backend over HTTP.
///
/// Stateless across calls apart from the connection pool.
pub struct HttpExecutor {
    client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpExecutor {
    /// Creates an executor for the API rooted at `base_url`,
    /// e.g. `https://api.gatherly.app/v1`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|source| SetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(SetupError::UnsupportedBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends the request's segments to the base path, percent-encoding
    /// each one, and adds the query string.
    fn url_for(&self, request: &ApiRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&request.segments);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        url
    }

    async fn send(&self, request: ApiRequest, request_id: Uuid) -> ServiceResult<Value> {
        let mut builder = self
            .client
            .request(http_method(request.method), self.url_for(&request))
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if request.requires_auth {
            if let Some(token) = self.credentials.token().await {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let round_trip = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(self.timeout, round_trip).await {
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Request timed out");
                ServiceResult::Failure(ServiceError::timeout())
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Request failed");
                ServiceResult::Failure(ServiceError::network(err))
            }
            Ok(Ok((status, body))) => {
                tracing::debug!(
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Response received"
                );
                interpret(status, &body)
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: ApiRequest) -> ServiceResult<Value> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = %request.method,
            path = %request.path(),
            %request_id,
        );
        self.send(request, request_id).instrument(span).await
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// The fields of an error body that are worth keeping.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Maps a completed HTTP exchange to a result.
fn interpret(status: StatusCode, body: &[u8]) -> ServiceResult<Value> {
    if status.is_success() {
        // 204 and friends: nothing to decode.
        if body.iter().all(u8::is_ascii_whitespace) {
            return ServiceResult::success(Value::Null);
        }
        return match serde_json::from_slice::<Envelope<Value>>(body) {
            Ok(envelope) => envelope.into_service_result(),
            Err(err) => {
                tracing::warn!(
                    status = status.as_u16(),
                    error = %err,
                    "Response is not an envelope"
                );
                ServiceResult::Failure(ServiceError::invalid_response(err))
            }
        };
    }

    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = parsed
        .error
        .as_deref()
        .map(ErrorCode::parse)
        .unwrap_or(ErrorCode::Http(status.as_u16()));
    let message = parsed
        .message
        .unwrap_or_else(|| "Request failed".to_string());

    tracing::warn!(status = status.as_u16(), %code, "Request rejected");
    ServiceResult::failure(code, message)
}
