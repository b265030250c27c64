//! Slack Web API client.
//!
//! Covers the three read-only methods the bridge needs before any tool runs:
//!
//! - `conversations.list` (scope probes and the conversation directory)
//! - `users.list` (scope probe and the user directory)
//! - `search.messages` (scope probe)
//!
//! Consumers depend on the [`SlackApi`] trait; [`SlackClient`] is the
//! reqwest-backed implementation. With the `test-support` feature,
//! [`testing::FakeSlackApi`] provides a scripted in-memory double.

mod api;
mod client;
mod error;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::SlackApi;
pub use client::{SlackClient, DEFAULT_REQUEST_TIMEOUT};
pub use error::{SlackError, SlackResult};
pub use types::{
    Conversation, ConversationType, ConversationsRequest, Page, SearchRequest, SearchSummary,
    SlackUser, UsersRequest,
};
