//! Directory error types.

use crate::DirectoryKind;
use slack_web_client::SlackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Reference not found even after a refresh.
    #[error("Reference not found: {0}")]
    NotFound(String),

    /// The credential lacks the scopes needed to list this directory.
    #[error("The {0} directory is unavailable for this credential")]
    Unavailable(DirectoryKind),

    /// A concurrent refresh this caller waited on failed.
    #[error("Refresh of the {kind} directory failed: {message}")]
    RefreshFailed { kind: DirectoryKind, message: String },

    /// Listing failed.
    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),
}

/// Result type alias using DirectoryError.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
