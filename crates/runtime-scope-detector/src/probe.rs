//! Single-scope probe calls.

use crate::{ErrorClass, ErrorClassifier, Scope};
use slack_web_client::{
    ConversationType, ConversationsRequest, SearchRequest, SlackApi, SlackResult, UsersRequest,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Query used for the `search:read` probe.
const SEARCH_PROBE_QUERY: &str = "test";

/// The Slack call that exercises a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// `conversations.list?types=<type>&limit=1`
    Conversations(ConversationType),
    /// `users.list?limit=1`
    Users,
    /// `search.messages?query=test&count=1`
    Search,
}

impl ProbeKind {
    /// `None` for scopes that are derived (history) or never detected (write).
    pub fn for_scope(scope: Scope) -> Option<ProbeKind> {
        match scope {
            Scope::ChannelsRead => Some(Self::Conversations(ConversationType::PublicChannel)),
            Scope::GroupsRead => Some(Self::Conversations(ConversationType::PrivateChannel)),
            Scope::ImRead => Some(Self::Conversations(ConversationType::Im)),
            Scope::MpimRead => Some(Self::Conversations(ConversationType::Mpim)),
            Scope::UsersRead => Some(Self::Users),
            Scope::SearchRead => Some(Self::Search),
            _ => None,
        }
    }
}

/// How a probe ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Granted,
    /// Slack reported a permission error.
    Denied(String),
    /// Some other error. The scope is assumed present.
    Inconclusive(String),
    /// Cancelled before the call completed.
    Cancelled,
    /// The scope has no probe.
    NotProbed,
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Granted | Self::Inconclusive(_))
    }
}

/// Issues the minimal call for one scope and classifies the answer.
#[derive(Clone)]
pub struct CapabilityProbe {
    api: Arc<dyn SlackApi>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl CapabilityProbe {
    pub fn new(api: Arc<dyn SlackApi>, classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self { api, classifier }
    }

    /// `true` when the scope should be treated as granted.
    pub async fn probe(&self, scope: Scope, cancel: &CancellationToken) -> bool {
        self.probe_outcome(scope, cancel).await.is_available()
    }

    pub async fn probe_outcome(&self, scope: Scope, cancel: &CancellationToken) -> ProbeOutcome {
        let Some(kind) = ProbeKind::for_scope(scope) else {
            return ProbeOutcome::NotProbed;
        };
        if cancel.is_cancelled() {
            return ProbeOutcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
            result = self.call(kind) => result,
        };

        match result {
            Ok(()) => ProbeOutcome::Granted,
            Err(err) => match self.classifier.classify(&err) {
                ErrorClass::PermissionDenied => ProbeOutcome::Denied(err.to_string()),
                ErrorClass::Other => {
                    debug!(scope = %scope, error = %err, "Probe failed for a non-permission reason");
                    ProbeOutcome::Inconclusive(err.to_string())
                }
            },
        }
    }

    async fn call(&self, kind: ProbeKind) -> SlackResult<()> {
        match kind {
            ProbeKind::Conversations(conversation_type) => {
                let request = ConversationsRequest::new(vec![conversation_type], 1);
                self.api.list_conversations(&request).await.map(|_| ())
            }
            ProbeKind::Users => self.api.list_users(&UsersRequest::new(1)).await.map(|_| ()),
            ProbeKind::Search => self
                .api
                .search_messages(&SearchRequest::new(SEARCH_PROBE_QUERY, 1))
                .await
                .map(|_| ()),
        }
    }
}
