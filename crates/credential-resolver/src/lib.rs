//! Credential selection for the Slack bridge.
//!
//! The operator supplies one of three mutually exclusive credential forms
//! through the environment:
//!
//! | Kind | Variables | Priority |
//! |------|-----------|----------|
//! | User OAuth token | `SLACK_MCP_XOXP_TOKEN` | highest |
//! | Bot OAuth token | `SLACK_MCP_XOXB_TOKEN` | |
//! | Browser session pair | `SLACK_MCP_XOXC_TOKEN` + `SLACK_MCP_XOXD_TOKEN` | lowest |
//!
//! [`resolve`] picks exactly one of them. It performs no network calls.

mod credential;
mod error;
mod resolver;

pub use credential::{Credential, CredentialKind};
pub use error::{CredentialError, CredentialResult};
pub use resolver::{
    resolve, CredentialSources, BOT_TOKEN_ENV, SESSION_COOKIE_ENV, SESSION_TOKEN_ENV,
    USER_TOKEN_ENV,
};
