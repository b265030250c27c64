//! Wire types for the Slack methods the bridge calls.

use crate::{SlackError, SlackResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slack conversation kinds, in the order Slack documents them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    PublicChannel,
    PrivateChannel,
    Im,
    Mpim,
}

impl ConversationType {
    pub const ALL: [ConversationType; 4] = [
        ConversationType::PublicChannel,
        ConversationType::PrivateChannel,
        ConversationType::Im,
        ConversationType::Mpim,
    ];

    /// Value used in the `types` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicChannel => "public_channel",
            Self::PrivateChannel => "private_channel",
            Self::Im => "im",
            Self::Mpim => "mpim",
        }
    }
}

impl fmt::Display for ConversationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public_channel" => Ok(Self::PublicChannel),
            "private_channel" => Ok(Self::PrivateChannel),
            "im" => Ok(Self::Im),
            "mpim" => Ok(Self::Mpim),
            other => Err(format!("unknown conversation type: {}", other)),
        }
    }
}

/// A conversation object as returned by `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// Absent for IMs.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_channel: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub is_private: bool,
    /// Counterpart user ID, IMs only.
    #[serde(default)]
    pub user: Option<String>,
}

impl Conversation {
    /// Classify by Slack's `is_*` flags. Group DMs also carry `is_private`,
    /// so they are checked first.
    pub fn conversation_type(&self) -> ConversationType {
        if self.is_im {
            ConversationType::Im
        } else if self.is_mpim {
            ConversationType::Mpim
        } else if self.is_private || self.is_group {
            ConversationType::PrivateChannel
        } else {
            ConversationType::PublicChannel
        }
    }

    pub fn public_channel(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            is_channel: true,
            ..Self::blank()
        }
    }

    pub fn private_channel(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            is_channel: true,
            is_private: true,
            ..Self::blank()
        }
    }

    pub fn im(id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_im: true,
            user: Some(user.into()),
            ..Self::blank()
        }
    }

    pub fn mpim(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            is_group: true,
            is_mpim: true,
            is_private: true,
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            name: None,
            is_channel: false,
            is_group: false,
            is_im: false,
            is_mpim: false,
            is_private: false,
            user: None,
        }
    }
}

/// A member object as returned by `users.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

impl SlackUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            real_name: None,
            deleted: false,
            is_bot: false,
        }
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the listing is exhausted.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|cursor| !cursor.is_empty()),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Parameters for `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationsRequest {
    pub types: Vec<ConversationType>,
    pub limit: u32,
    pub cursor: Option<String>,
    pub exclude_archived: bool,
}

impl ConversationsRequest {
    pub fn new(types: Vec<ConversationType>, limit: u32) -> Self {
        Self {
            types,
            limit,
            cursor: None,
            exclude_archived: true,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Comma-joined `types` parameter.
    pub fn types_param(&self) -> String {
        self.types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parameters for `users.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersRequest {
    pub limit: u32,
    pub cursor: Option<String>,
}

impl UsersRequest {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }
}

/// Parameters for `search.messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub count: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, count: u32) -> Self {
        Self {
            query: query.into(),
            count,
        }
    }
}

/// The part of a `search.messages` response the bridge cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchSummary {
    pub total: u64,
}

// Response envelopes. Slack wraps every payload in `{"ok": bool, ...}`.

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    #[serde(default)]
    channels: Vec<Conversation>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    #[serde(default)]
    members: Vec<SlackUser>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMessages {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    messages: Option<SearchMessages>,
}

/// Turn an `"ok": false` envelope into [`SlackError::Api`].
pub(crate) fn check_envelope(
    method: &str,
    body: serde_json::Value,
) -> SlackResult<serde_json::Value> {
    let ok = body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if ok {
        return Ok(body);
    }

    let code = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown_error")
        .to_string();
    let needed = body
        .get("needed")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Err(SlackError::Api {
        method: method.to_string(),
        code,
        needed,
    })
}

pub(crate) fn parse_conversations_page(body: serde_json::Value) -> SlackResult<Page<Conversation>> {
    let response: ConversationsListResponse = serde_json::from_value(body)?;
    let cursor = response.response_metadata.map(|m| m.next_cursor);
    Ok(Page::new(response.channels, cursor))
}

pub(crate) fn parse_users_page(body: serde_json::Value) -> SlackResult<Page<SlackUser>> {
    let response: UsersListResponse = serde_json::from_value(body)?;
    let cursor = response.response_metadata.map(|m| m.next_cursor);
    Ok(Page::new(response.members, cursor))
}

pub(crate) fn parse_search_summary(body: serde_json::Value) -> SlackResult<SearchSummary> {
    let response: SearchResponse = serde_json::from_value(body)?;
    Ok(SearchSummary {
        total: response.messages.unwrap_or_default().total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_conversations_by_flags() {
        assert_eq!(
            Conversation::public_channel("C1", "general").conversation_type(),
            ConversationType::PublicChannel
        );
        assert_eq!(
            Conversation::private_channel("G1", "secret").conversation_type(),
            ConversationType::PrivateChannel
        );
        assert_eq!(
            Conversation::im("D1", "U1").conversation_type(),
            ConversationType::Im
        );
        assert_eq!(
            Conversation::mpim("G2", "mpdm-a--b--c-1").conversation_type(),
            ConversationType::Mpim
        );
    }

    #[test]
    fn types_param_joins_in_request_order() {
        let request = ConversationsRequest::new(
            vec![ConversationType::Im, ConversationType::PublicChannel],
            1,
        );
        assert_eq!(request.types_param(), "im,public_channel");
        assert!("bogus".parse::<ConversationType>().is_err());
        assert_eq!("mpim".parse::<ConversationType>(), Ok(ConversationType::Mpim));
    }

    #[test]
    fn empty_cursor_means_last_page() {
        let page: Page<u8> = Page::new(vec![1], Some(String::new()));
        assert!(page.is_last());
        let page: Page<u8> = Page::new(vec![1], Some("dXNlcjpVMDYxTkZUVDI=".into()));
        assert!(!page.is_last());
    }

    #[test]
    fn check_envelope_maps_error_codes() {
        let err = check_envelope(
            "users.list",
            json!({"ok": false, "error": "missing_scope", "needed": "users:read"}),
        )
        .unwrap_err();

        match err {
            SlackError::Api {
                method,
                code,
                needed,
            } => {
                assert_eq!(method, "users.list");
                assert_eq!(code, "missing_scope");
                assert_eq!(needed.as_deref(), Some("users:read"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(check_envelope("users.list", json!({"ok": true})).is_ok());
        assert!(check_envelope("users.list", json!({})).is_err());
    }

    #[test]
    fn parses_conversations_page() {
        let body = json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "is_channel": true},
                {"id": "D1", "is_im": true, "user": "U9"}
            ],
            "response_metadata": {"next_cursor": "abc"}
        });

        let page = parse_conversations_page(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].user.as_deref(), Some("U9"));
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn parses_users_page_without_metadata() {
        let body = json!({
            "ok": true,
            "members": [{"id": "U1", "name": "alice", "real_name": "Alice"}]
        });

        let page = parse_users_page(body).unwrap();
        assert_eq!(page.items[0].name, "alice");
        assert!(page.is_last());
    }

    #[test]
    fn parses_search_total() {
        let body = json!({"ok": true, "messages": {"total": 42, "matches": []}});
        assert_eq!(parse_search_summary(body).unwrap().total, 42);
        assert_eq!(parse_search_summary(json!({"ok": true})).unwrap().total, 0);
    }
}
