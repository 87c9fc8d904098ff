use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::{ErrorCode, ServiceError};

/// Uniform outcome of every service operation.
///
/// Serializes to the backend's envelope shape:
/// `{"success": bool, "data": .., "message": .., "error": ..}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResult<T> {
    Success { data: T, message: Option<String> },
    Failure(ServiceError),
}

impl<T> ServiceResult<T> {
    pub fn success(data: T) -> Self {
        Self::Success {
            data,
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self::Success {
            data,
            message: Some(message.into()),
        }
    }

    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure(ServiceError::new(code, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Human-readable message, present on every failure and on some successes.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Failure(error) => Some(&error.message),
        }
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error),
        }
    }

    pub fn error_code(&self) -> Option<&ErrorCode> {
        self.error().map(|error| &error.code)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResult<U> {
        match self {
            Self::Success { data, message } => ServiceResult::Success {
                data: f(data),
                message,
            },
            Self::Failure(error) => ServiceResult::Failure(error),
        }
    }

    /// Chains a fallible step. A success without its own message keeps the
    /// message of `self`.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> ServiceResult<U>) -> ServiceResult<U> {
        match self {
            Self::Success { data, message } => match f(data) {
                ServiceResult::Success {
                    data,
                    message: None,
                } => ServiceResult::Success { data, message },
                other => other,
            },
            Self::Failure(error) => ServiceResult::Failure(error),
        }
    }

    pub fn into_result(self) -> Result<T, ServiceError> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure(error) => Err(error),
        }
    }
}

impl ServiceResult<Value> {
    /// Decodes the raw payload into a typed record.
    ///
    /// A missing `data` field decodes from `null`, so `()` and `Option<_>`
    /// targets accept empty successes.
    pub fn decode<T: DeserializeOwned>(self) -> ServiceResult<T> {
        self.and_then(|data| match serde_json::from_value(data) {
            Ok(decoded) => ServiceResult::success(decoded),
            Err(err) => ServiceResult::Failure(ServiceError::invalid_response(err)),
        })
    }
}

impl<T> From<ServiceError> for ServiceResult<T> {
    fn from(error: ServiceError) -> Self {
        Self::Failure(error)
    }
}

impl<T> From<Result<T, ServiceError>> for ServiceResult<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Wire shape of a [`ServiceResult`] as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope<Value> {
    /// Converts a parsed envelope into a result without reinterpreting it.
    ///
    /// A `success: false` envelope without a message or code gets the
    /// generic `"Request failed"` message and [`ErrorCode::Server`] code.
    pub fn into_service_result(self) -> ServiceResult<Value> {
        if self.success {
            ServiceResult::Success {
                data: self.data.unwrap_or(Value::Null),
                message: self.message,
            }
        } else {
            let code = self
                .error
                .as_deref()
                .map(ErrorCode::parse)
                .unwrap_or_else(|| ErrorCode::Server("REQUEST_FAILED".to_string()));
            ServiceResult::failure(
                code,
                self.message
                    .unwrap_or_else(|| "Request failed".to_string()),
            )
        }
    }
}

impl<T: Serialize> Serialize for ServiceResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Success { data, message } => Envelope {
                success: true,
                data: Some(data),
                message: message.clone(),
                error: None,
            },
            Self::Failure(error) => Envelope {
                success: false,
                data: None,
                message: Some(error.message.clone()),
                error: Some(error.code.to_string()),
            },
        };
        envelope.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_and_then_keeps_message() {
        let result = ServiceResult::success_with_message(2, "ok").and_then(|n| {
            ServiceResult::success(n * 2)
        });
        assert_eq!(result.data(), Some(&4));
        assert_eq!(result.message(), Some("ok"));
    }

    #[test]
    fn test_and_then_short_circuits_failure() {
        let result: ServiceResult<i32> = ServiceResult::failure(ErrorCode::Timeout, "slow");
        let chained = result.and_then(|_| -> ServiceResult<i32> { unreachable!() });
        assert_eq!(chained.error_code(), Some(&ErrorCode::Timeout));
    }

    #[test]
    fn test_decode_typed_payload() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: String,
        }

        let raw = ServiceResult::success(json!({"id": "evt-1"}));
        let item = raw.decode::<Item>();
        assert_eq!(
            item.into_data(),
            Some(Item {
                id: "evt-1".to_string()
            })
        );
    }

    #[test]
    fn test_decode_mismatch_is_invalid_response() {
        let raw = ServiceResult::success(json!({"unexpected": true}));
        let decoded = raw.decode::<Vec<String>>();
        assert_eq!(decoded.error_code(), Some(&ErrorCode::InvalidResponse));
    }

    #[test]
    fn test_decode_null_into_unit() {
        let raw = ServiceResult::success(Value::Null);
        assert!(raw.decode::<()>().is_success());
    }

    #[test]
    fn test_envelope_success_passthrough() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "success": true,
            "data": {"id": "evt-1"},
            "message": "Fetched"
        }))
        .unwrap();

        let result = envelope.into_service_result();
        assert_eq!(result.data(), Some(&json!({"id": "evt-1"})));
        assert_eq!(result.message(), Some("Fetched"));
    }

    #[test]
    fn test_envelope_failure_defaults() {
        let envelope: Envelope<Value> =
            serde_json::from_value(json!({"success": false})).unwrap();

        let result = envelope.into_service_result();
        assert!(!result.is_success());
        assert_eq!(result.message(), Some("Request failed"));
    }

    #[test]
    fn test_serialize_failure_envelope() {
        let result: ServiceResult<()> = ServiceResult::Failure(ServiceError::timeout());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "success": false,
                "message": "Request timed out",
                "error": "TIMEOUT"
            })
        );
    }

    #[test]
    fn test_into_result() {
        let ok: ServiceResult<u8> = ServiceResult::success(1);
        assert_eq!(ok.into_result(), Ok(1));

        let err: ServiceResult<u8> = ServiceError::network("refused").into();
        assert_eq!(
            err.into_result().unwrap_err().code,
            ErrorCode::NetworkError
        );
    }
}
