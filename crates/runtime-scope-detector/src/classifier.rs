//! Deciding whether a probe error means "scope not granted".

use slack_web_client::SlackError;

/// Slack error codes that mean the credential lacks the probed scope.
pub const PERMISSION_DENIED_CODES: &[&str] = &[
    "missing_scope",
    "not_allowed",
    "not_allowed_token_type",
    "access_denied",
    "no_permission",
];

/// Fragments matched against the rendered error when no structured code is
/// available.
const PERMISSION_DENIED_FRAGMENTS: &[&str] = &["missing_scope", "not_allowed", "access_denied"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    PermissionDenied,
    Other,
}

/// Classifies probe failures.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, error: &SlackError) -> ErrorClass;
}

/// Default classifier for Slack Web API errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlackErrorClassifier;

impl ErrorClassifier for SlackErrorClassifier {
    fn classify(&self, error: &SlackError) -> ErrorClass {
        if let Some(code) = error.api_error_code() {
            if PERMISSION_DENIED_CODES.contains(&code) {
                return ErrorClass::PermissionDenied;
            }
        }

        let rendered = error.to_string();
        if PERMISSION_DENIED_FRAGMENTS
            .iter()
            .any(|fragment| rendered.contains(fragment))
        {
            ErrorClass::PermissionDenied
        } else {
            ErrorClass::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api(code: &str) -> SlackError {
        SlackError::Api {
            method: "conversations.list".into(),
            code: code.into(),
            needed: None,
        }
    }

    #[test]
    fn structured_codes_are_denials() {
        for code in PERMISSION_DENIED_CODES {
            assert_eq!(
                SlackErrorClassifier.classify(&api(code)),
                ErrorClass::PermissionDenied,
                "{code}"
            );
        }
    }

    #[test]
    fn rendered_text_fallback() {
        let err = SlackError::Network("proxy said access_denied".into());
        assert_eq!(SlackErrorClassifier.classify(&err), ErrorClass::PermissionDenied);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(SlackErrorClassifier.classify(&api("invalid_auth")), ErrorClass::Other);
        assert_eq!(
            SlackErrorClassifier.classify(&SlackError::RateLimited {
                retry_after: Some(Duration::from_secs(1))
            }),
            ErrorClass::Other
        );
        assert_eq!(
            SlackErrorClassifier.classify(&SlackError::Network("connection reset".into())),
            ErrorClass::Other
        );
    }
}
