//! Startup credential errors.

use thiserror::Error;

/// Fatal credential errors. The process cannot continue after either.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential material at all.
    #[error(
        "No Slack credentials found: set SLACK_MCP_XOXP_TOKEN, SLACK_MCP_XOXB_TOKEN, \
         or both SLACK_MCP_XOXC_TOKEN and SLACK_MCP_XOXD_TOKEN"
    )]
    NoCredential,

    /// Exactly one half of the session pair was supplied.
    #[error("Incomplete session credentials: {present} is set but {missing} is missing")]
    IncompletePair {
        present: &'static str,
        missing: &'static str,
    },
}

/// Result type alias using CredentialError.
pub type CredentialResult<T> = Result<T, CredentialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_incomplete_pair_names_both_variables() {
        let err = CredentialError::IncompletePair {
            present: "SLACK_MCP_XOXC_TOKEN",
            missing: "SLACK_MCP_XOXD_TOKEN",
        };
        let message = err.to_string();
        assert!(message.contains("SLACK_MCP_XOXC_TOKEN is set"));
        assert!(message.contains("SLACK_MCP_XOXD_TOKEN is missing"));
    }

    #[test]
    fn display_no_credential_lists_options() {
        assert!(CredentialError::NoCredential
            .to_string()
            .contains("SLACK_MCP_XOXP_TOKEN"));
    }
}
