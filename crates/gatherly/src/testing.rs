//! Scripted executor for service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use gatherly_core::service::{ApiRequest, ErrorCode, Method, RequestExecutor, ServiceResult};

#[derive(Clone)]
enum Reply {
    Result(ServiceResult<Value>),
    Panic,
}

/// Returns scripted results keyed by method and path, and records every call.
///
/// The reply is chosen when the call arrives, then delivered after the
/// route's delay. Unscripted routes answer `HTTP_404`.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    replies: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
    route_delays: Mutex<HashMap<(Method, String), Duration>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls to this route sleep for `delay`, overriding the default delay.
    pub fn delay_on(&self, method: Method, path: &str, delay: Duration) {
        self.route_delays
            .lock()
            .unwrap()
            .insert((method, path.to_string()), delay);
    }

    pub fn respond(&self, method: Method, path: &str, result: ServiceResult<Value>) {
        self.replies
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Reply::Result(result));
    }

    pub fn respond_data(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, ServiceResult::success(data));
    }

    pub fn panic_on(&self, method: Method, path: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Reply::Panic);
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<ApiRequest> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && request.path() == path)
            .count()
    }
}

#[async_trait]
impl RequestExecutor for FakeExecutor {
    async fn execute(&self, request: ApiRequest) -> ServiceResult<Value> {
        let route = (request.method, request.path());
        self.calls.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().get(&route).cloned();
        let delay = self
            .route_delays
            .lock()
            .unwrap()
            .get(&route)
            .copied()
            .or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Result(result)) => result,
            Some(Reply::Panic) => panic!("scripted panic for {} {}", route.0, route.1),
            None => ServiceResult::failure(ErrorCode::Http(404), "Request failed"),
        }
    }
}
