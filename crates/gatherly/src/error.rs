//! Errors raised while assembling the data layer.
//!
//! Once built, nothing in the layer returns these: service calls report
//! every failure through `ServiceResult`.

use thiserror::Error;

/// Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, SetupError>;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Invalid API base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("API base URL {0:?} cannot carry a path")]
    UnsupportedBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SetupError::UnsupportedBaseUrl("mailto:team@example.com".to_string());
        assert_eq!(
            err.to_string(),
            "API base URL \"mailto:team@example.com\" cannot carry a path"
        );
    }
}
