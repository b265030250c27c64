//! Priority-ordered credential resolution.

use crate::{Credential, CredentialError, CredentialResult};
use tracing::{info, warn};

pub const USER_TOKEN_ENV: &str = "SLACK_MCP_XOXP_TOKEN";
pub const BOT_TOKEN_ENV: &str = "SLACK_MCP_XOXB_TOKEN";
pub const SESSION_TOKEN_ENV: &str = "SLACK_MCP_XOXC_TOKEN";
pub const SESSION_COOKIE_ENV: &str = "SLACK_MCP_XOXD_TOKEN";

/// Raw credential material as supplied by the operator.
///
/// Blank values are normalized to `None` on construction.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct CredentialSources {
    pub user_token: Option<String>,
    pub bot_token: Option<String>,
    pub session_token: Option<String>,
    pub session_cookie: Option<String>,
}

impl std::fmt::Debug for CredentialSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSources")
            .field("user_token", &self.user_token.is_some())
            .field("bot_token", &self.bot_token.is_some())
            .field("session_token", &self.session_token.is_some())
            .field("session_cookie", &self.session_cookie.is_some())
            .finish()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl CredentialSources {
    /// Read the four `SLACK_MCP_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the four variables through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            user_token: normalize(lookup(USER_TOKEN_ENV)),
            bot_token: normalize(lookup(BOT_TOKEN_ENV)),
            session_token: normalize(lookup(SESSION_TOKEN_ENV)),
            session_cookie: normalize(lookup(SESSION_COOKIE_ENV)),
        }
    }

    fn partial_pair(&self) -> Option<CredentialError> {
        match (&self.session_token, &self.session_cookie) {
            (Some(_), None) => Some(CredentialError::IncompletePair {
                present: SESSION_TOKEN_ENV,
                missing: SESSION_COOKIE_ENV,
            }),
            (None, Some(_)) => Some(CredentialError::IncompletePair {
                present: SESSION_COOKIE_ENV,
                missing: SESSION_TOKEN_ENV,
            }),
            _ => None,
        }
    }
}

/// Select exactly one credential: user token, then bot token, then session
/// pair.
///
/// A partial session pair is only fatal when no token outranks it; otherwise
/// it is reported with a warning and ignored.
pub fn resolve(sources: &CredentialSources) -> CredentialResult<Credential> {
    let normalized = CredentialSources {
        user_token: normalize(sources.user_token.clone()),
        bot_token: normalize(sources.bot_token.clone()),
        session_token: normalize(sources.session_token.clone()),
        session_cookie: normalize(sources.session_cookie.clone()),
    };

    let partial = normalized.partial_pair();

    let credential = if let Some(token) = normalized.user_token {
        Credential::user(token)
    } else if let Some(token) = normalized.bot_token {
        Credential::bot(token)
    } else if let Some(err) = partial {
        return Err(err);
    } else if let (Some(token), Some(cookie)) = (normalized.session_token, normalized.session_cookie)
    {
        Credential::session_pair(token, cookie)
    } else {
        return Err(CredentialError::NoCredential);
    };

    if let Some(CredentialError::IncompletePair { present, missing }) = partial {
        warn!(
            present,
            missing,
            selected = %credential.kind(),
            "Ignoring incomplete session credentials"
        );
    }

    info!(kind = %credential.kind(), "Slack credential selected");
    Ok(credential)
}
