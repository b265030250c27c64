//! The static table of bridge operations and what each one needs.

use credential_resolver::CredentialKind;
use runtime_scope_detector::Scope;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    ConversationsHistory,
    ConversationsReplies,
    ConversationsAddMessage,
    ConversationsSearchMessages,
    ChannelsList,
    UsersList,
    MessagesWithAttachments,
    GetAttachmentDetails,
    GetAttachmentContent,
}

impl OperationId {
    /// Tool name advertised to the agent.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConversationsHistory => "conversations_history",
            Self::ConversationsReplies => "conversations_replies",
            Self::ConversationsAddMessage => "conversations_add_message",
            Self::ConversationsSearchMessages => "conversations_search_messages",
            Self::ChannelsList => "channels_list",
            Self::UsersList => "users_list",
            Self::MessagesWithAttachments => "messages_with_attachments",
            Self::GetAttachmentDetails => "get_attachment_details",
            Self::GetAttachmentContent => "get_attachment_content",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope condition for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// History on at least one conversation type.
    AnyHistory,
    /// Read on at least one conversation type.
    AnyRead,
    /// One specific scope.
    Scope(Scope),
}

/// One row of [`OPERATIONS`].
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub id: OperationId,
    pub requirement: Requirement,
    /// Credential kinds that may use the operation at all.
    pub credential_kinds: &'static [CredentialKind],
    /// Also needs the operator's explicit opt-in.
    pub requires_opt_in: bool,
    pub description: &'static str,
}

const ALL_KINDS: &[CredentialKind] = &CredentialKind::ALL;
const NON_BOT_KINDS: &[CredentialKind] = &[CredentialKind::User, CredentialKind::SessionPair];

pub static OPERATIONS: &[OperationSpec] = &[
    OperationSpec {
        id: OperationId::ConversationsHistory,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "Get messages from a channel or DM",
    },
    OperationSpec {
        id: OperationId::ConversationsReplies,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "Get a thread of replies",
    },
    OperationSpec {
        id: OperationId::ConversationsAddMessage,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: true,
        description: "Post a message to a channel or DM",
    },
    OperationSpec {
        id: OperationId::ConversationsSearchMessages,
        requirement: Requirement::Scope(Scope::SearchRead),
        credential_kinds: NON_BOT_KINDS,
        requires_opt_in: false,
        description: "Search messages across the workspace",
    },
    OperationSpec {
        id: OperationId::ChannelsList,
        requirement: Requirement::AnyRead,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "List channels the credential can see",
    },
    OperationSpec {
        id: OperationId::UsersList,
        requirement: Requirement::Scope(Scope::UsersRead),
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "List workspace users",
    },
    OperationSpec {
        id: OperationId::MessagesWithAttachments,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "List messages that carry file attachments",
    },
    OperationSpec {
        id: OperationId::GetAttachmentDetails,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "Get attachment metadata",
    },
    OperationSpec {
        id: OperationId::GetAttachmentContent,
        requirement: Requirement::AnyHistory,
        credential_kinds: ALL_KINDS,
        requires_opt_in: false,
        description: "Download attachment content",
    },
];

/// Table row for an operation.
pub fn spec_for(id: OperationId) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|spec| spec.id == id)
}
