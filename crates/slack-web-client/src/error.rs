//! Slack Web API error types.

use std::time::Duration;
use thiserror::Error;

/// Slack client error type.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Slack answered `"ok": false` with an error code.
    #[error("Slack API {method} failed: {code}")]
    Api {
        method: String,
        code: String,
        /// Scope Slack reported as missing, if any.
        needed: Option<String>,
    },

    /// HTTP 429 from Slack.
    #[error("Rate limited by Slack")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-success HTTP status other than 429.
    #[error("Unexpected HTTP status {status} ({body_summary})")]
    Status { status: u16, body_summary: String },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable: {0}")]
    Network(String),
}

impl SlackError {
    /// Returns true if this error is transient and the call can be retried.
    ///
    /// Transient errors include:
    /// - Rate limiting
    /// - Network unavailable
    /// - Connection errors and timeouts
    /// - 5xx status codes
    pub fn is_transient(&self) -> bool {
        match self {
            SlackError::RateLimited { .. } => true,
            SlackError::Network(_) => true,
            SlackError::Status { status, .. } => *status >= 500,
            SlackError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }

    /// The Slack error code for `"ok": false` responses.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            SlackError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Suggested wait before retrying a rate-limited call.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SlackError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias using SlackError.
pub type SlackResult<T> = Result<T, SlackError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str) -> SlackError {
        SlackError::Api {
            method: "conversations.list".to_string(),
            code: code.to_string(),
            needed: None,
        }
    }

    #[test]
    fn test_api_error_display_contains_code() {
        assert_eq!(
            api("missing_scope").to_string(),
            "Slack API conversations.list failed: missing_scope"
        );
    }

    #[test]
    fn test_is_transient_rate_limited() {
        let err = SlackError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_is_transient_server_status() {
        let err = SlackError::Status {
            status: 503,
            body_summary: "len=0".to_string(),
        };
        assert!(err.is_transient());

        let err = SlackError::Status {
            status: 404,
            body_summary: "len=0".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_is_not_transient_api_error() {
        assert!(!api("invalid_auth").is_transient());
        assert_eq!(api("invalid_auth").api_error_code(), Some("invalid_auth"));
        assert_eq!(SlackError::Network("down".into()).api_error_code(), None);
    }
}
