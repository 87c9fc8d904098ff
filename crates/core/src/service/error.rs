use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Machine-readable failure code carried by a failed [`ServiceResult`](super::ServiceResult).
///
/// On the wire every code is a string: `TIMEOUT`, `NETWORK_ERROR`, `HTTP_404`,
/// `FETCH_EVENT_ERROR`, and so on. Codes the client does not know are kept
/// verbatim in [`ErrorCode::Server`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request did not complete within the executor's timeout.
    Timeout,
    /// Transport failure: DNS, refused connection, TLS, reset.
    NetworkError,
    /// Non-2xx response without a server-supplied code.
    Http(u16),
    /// A 2xx response whose body is not a valid envelope or payload.
    InvalidResponse,
    FetchEventError,
    CreateEventError,
    UpdateEventError,
    DeleteEventError,
    FetchGuestsError,
    JoinEventError,
    LeaveEventError,
    UpdateMembershipError,
    FetchAnnouncementsError,
    CreateAnnouncementError,
    UpdateAnnouncementError,
    DeleteAnnouncementError,
    /// Any other code reported by the server.
    Server(String),
}

impl ErrorCode {
    /// Parses a wire code. Unknown codes become [`ErrorCode::Server`].
    pub fn parse(code: &str) -> Self {
        match code {
            "TIMEOUT" => Self::Timeout,
            "NETWORK_ERROR" => Self::NetworkError,
            "INVALID_RESPONSE" => Self::InvalidResponse,
            "FETCH_EVENT_ERROR" => Self::FetchEventError,
            "CREATE_EVENT_ERROR" => Self::CreateEventError,
            "UPDATE_EVENT_ERROR" => Self::UpdateEventError,
            "DELETE_EVENT_ERROR" => Self::DeleteEventError,
            "FETCH_GUESTS_ERROR" => Self::FetchGuestsError,
            "JOIN_EVENT_ERROR" => Self::JoinEventError,
            "LEAVE_EVENT_ERROR" => Self::LeaveEventError,
            "UPDATE_MEMBERSHIP_ERROR" => Self::UpdateMembershipError,
            "FETCH_ANNOUNCEMENTS_ERROR" => Self::FetchAnnouncementsError,
            "CREATE_ANNOUNCEMENT_ERROR" => Self::CreateAnnouncementError,
            "UPDATE_ANNOUNCEMENT_ERROR" => Self::UpdateAnnouncementError,
            "DELETE_ANNOUNCEMENT_ERROR" => Self::DeleteAnnouncementError,
            other => match other
                .strip_prefix("HTTP_")
                .and_then(|status| status.parse::<u16>().ok())
            {
                Some(status) => Self::Http(status),
                None => Self::Server(other.to_string()),
            },
        }
    }

    /// Returns the wire representation of this code.
    pub fn as_wire(&self) -> Cow<'static, str> {
        let code = match self {
            Self::Timeout => "TIMEOUT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::FetchEventError => "FETCH_EVENT_ERROR",
            Self::CreateEventError => "CREATE_EVENT_ERROR",
            Self::UpdateEventError => "UPDATE_EVENT_ERROR",
            Self::DeleteEventError => "DELETE_EVENT_ERROR",
            Self::FetchGuestsError => "FETCH_GUESTS_ERROR",
            Self::JoinEventError => "JOIN_EVENT_ERROR",
            Self::LeaveEventError => "LEAVE_EVENT_ERROR",
            Self::UpdateMembershipError => "UPDATE_MEMBERSHIP_ERROR",
            Self::FetchAnnouncementsError => "FETCH_ANNOUNCEMENTS_ERROR",
            Self::CreateAnnouncementError => "CREATE_ANNOUNCEMENT_ERROR",
            Self::UpdateAnnouncementError => "UPDATE_ANNOUNCEMENT_ERROR",
            Self::DeleteAnnouncementError => "DELETE_ANNOUNCEMENT_ERROR",
            Self::Http(status) => return Cow::Owned(format!("HTTP_{}", status)),
            Self::Server(code) => return Cow::Owned(code.clone()),
        };
        Cow::Borrowed(code)
    }

    /// Returns true for failures produced by the transport rather than the server.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_wire())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

/// A failed service call: a code for programs and a message for people.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct ServiceError {
    pub code: ErrorCode,
    /// The only field intended for direct display.
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, "Request timed out")
    }

    pub fn network(detail: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NetworkError, format!("Network error: {}", detail))
    }

    pub fn invalid_response(detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidResponse,
            format!("Invalid response: {}", detail),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_codes() {
        assert_eq!(ErrorCode::parse("TIMEOUT"), ErrorCode::Timeout);
        assert_eq!(ErrorCode::parse("NETWORK_ERROR"), ErrorCode::NetworkError);
        assert_eq!(
            ErrorCode::parse("JOIN_EVENT_ERROR"),
            ErrorCode::JoinEventError
        );
    }

    #[test]
    fn test_parse_http_status() {
        assert_eq!(ErrorCode::parse("HTTP_404"), ErrorCode::Http(404));
        assert_eq!(ErrorCode::Http(503).to_string(), "HTTP_503");
    }

    #[test]
    fn test_parse_unknown_code_is_kept() {
        let code = ErrorCode::parse("EVENT_FULL");
        assert_eq!(code, ErrorCode::Server("EVENT_FULL".to_string()));
        assert_eq!(code.to_string(), "EVENT_FULL");
    }

    #[test]
    fn test_malformed_http_code_is_server_code() {
        assert_eq!(
            ErrorCode::parse("HTTP_abc"),
            ErrorCode::Server("HTTP_abc".to_string())
        );
    }

    #[test]
    fn test_error_code_serde() {
        let json = serde_json::to_string(&ErrorCode::CreateEventError).unwrap();
        assert_eq!(json, "\"CREATE_EVENT_ERROR\"");

        let code: ErrorCode = serde_json::from_str("\"HTTP_500\"").unwrap();
        assert_eq!(code, ErrorCode::Http(500));
    }

    #[test]
    fn test_service_error_display() {
        let error = ServiceError::timeout();
        assert_eq!(error.to_string(), "Request timed out (TIMEOUT)");
        assert!(error.code.is_transport());
    }
}
