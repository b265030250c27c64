//! The single credential selected for the process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication mode of a resolved credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// User-scoped OAuth token (`xoxp-…`).
    User,
    /// Bot-scoped OAuth token (`xoxb-…`).
    Bot,
    /// Browser session token (`xoxc-…`) plus its `d` cookie (`xoxd-…`).
    SessionPair,
}

impl CredentialKind {
    /// Every kind, highest priority first.
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::User,
        CredentialKind::Bot,
        CredentialKind::SessionPair,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
            Self::SessionPair => "session_pair",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret material. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum CredentialSecret {
    /// A single OAuth token.
    Token(String),
    /// Session token and cookie that only authenticate together.
    SessionPair { token: String, cookie: String },
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::SessionPair { .. } => f.write_str("SessionPair(<redacted>)"),
        }
    }
}

/// A resolved credential: kind plus secret material.
///
/// A session pair always carries both halves; [`crate::resolve`] refuses to
/// build one otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    kind: CredentialKind,
    secret: CredentialSecret,
}

impl Credential {
    pub fn user(token: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::User,
            secret: CredentialSecret::Token(token.into()),
        }
    }

    pub fn bot(token: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::Bot,
            secret: CredentialSecret::Token(token.into()),
        }
    }

    pub fn session_pair(token: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            kind: CredentialKind::SessionPair,
            secret: CredentialSecret::SessionPair {
                token: token.into(),
                cookie: cookie.into(),
            },
        }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match &self.secret {
            CredentialSecret::Token(token) => format!("Bearer {}", token),
            CredentialSecret::SessionPair { token, .. } => format!("Bearer {}", token),
        }
    }

    /// Value for the `Cookie` header. Only session pairs carry one.
    ///
    /// The cookie is sent as-is; operators paste it already URL-encoded
    /// from the browser.
    pub fn cookie_header(&self) -> Option<String> {
        match &self.secret {
            CredentialSecret::Token(_) => None,
            CredentialSecret::SessionPair { cookie, .. } => Some(format!("d={}", cookie)),
        }
    }
}
