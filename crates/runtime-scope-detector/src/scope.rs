//! The closed set of Slack OAuth scopes the bridge knows about.

use serde::{Deserialize, Serialize};
use slack_web_client::ConversationType;
use std::fmt;

/// A Slack OAuth scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "channels:read")]
    ChannelsRead,
    #[serde(rename = "channels:history")]
    ChannelsHistory,
    #[serde(rename = "groups:read")]
    GroupsRead,
    #[serde(rename = "groups:history")]
    GroupsHistory,
    #[serde(rename = "im:read")]
    ImRead,
    #[serde(rename = "im:history")]
    ImHistory,
    #[serde(rename = "im:write")]
    ImWrite,
    #[serde(rename = "mpim:read")]
    MpimRead,
    #[serde(rename = "mpim:history")]
    MpimHistory,
    #[serde(rename = "mpim:write")]
    MpimWrite,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "chat:write")]
    ChatWrite,
    #[serde(rename = "search:read")]
    SearchRead,
}

impl Scope {
    pub const ALL: [Scope; 13] = [
        Scope::ChannelsRead,
        Scope::ChannelsHistory,
        Scope::GroupsRead,
        Scope::GroupsHistory,
        Scope::ImRead,
        Scope::ImHistory,
        Scope::ImWrite,
        Scope::MpimRead,
        Scope::MpimHistory,
        Scope::MpimWrite,
        Scope::UsersRead,
        Scope::ChatWrite,
        Scope::SearchRead,
    ];

    /// Scopes with a dedicated probe call.
    pub const PROBED: [Scope; 6] = [
        Scope::ChannelsRead,
        Scope::GroupsRead,
        Scope::ImRead,
        Scope::MpimRead,
        Scope::UsersRead,
        Scope::SearchRead,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChannelsRead => "channels:read",
            Self::ChannelsHistory => "channels:history",
            Self::GroupsRead => "groups:read",
            Self::GroupsHistory => "groups:history",
            Self::ImRead => "im:read",
            Self::ImHistory => "im:history",
            Self::ImWrite => "im:write",
            Self::MpimRead => "mpim:read",
            Self::MpimHistory => "mpim:history",
            Self::MpimWrite => "mpim:write",
            Self::UsersRead => "users:read",
            Self::ChatWrite => "chat:write",
            Self::SearchRead => "search:read",
        }
    }

    /// Read scope gating listing of a conversation type.
    pub fn read_for(conversation_type: ConversationType) -> Scope {
        match conversation_type {
            ConversationType::PublicChannel => Scope::ChannelsRead,
            ConversationType::PrivateChannel => Scope::GroupsRead,
            ConversationType::Im => Scope::ImRead,
            ConversationType::Mpim => Scope::MpimRead,
        }
    }

    /// History scope gating message reads of a conversation type.
    pub fn history_for(conversation_type: ConversationType) -> Scope {
        match conversation_type {
            ConversationType::PublicChannel => Scope::ChannelsHistory,
            ConversationType::PrivateChannel => Scope::GroupsHistory,
            ConversationType::Im => Scope::ImHistory,
            ConversationType::Mpim => Scope::MpimHistory,
        }
    }

    pub fn is_read(self) -> bool {
        matches!(
            self,
            Self::ChannelsRead | Self::GroupsRead | Self::ImRead | Self::MpimRead
        )
    }

    pub fn is_history(self) -> bool {
        matches!(
            self,
            Self::ChannelsHistory | Self::GroupsHistory | Self::ImHistory | Self::MpimHistory
        )
    }

    pub fn is_write(self) -> bool {
        matches!(self, Self::ImWrite | Self::MpimWrite | Self::ChatWrite)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
