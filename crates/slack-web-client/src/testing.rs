//! Scripted in-memory [`SlackApi`] for tests.
//!
//! Listings paginate over the seeded data using the request `limit`, with the
//! cursor being the offset of the next item. Failures, latency, rate limiting
//! and hangs are opt-in through the builder methods.

use crate::{
    Conversation, ConversationType, ConversationsRequest, Page, SearchRequest, SearchSummary,
    SlackApi, SlackError, SlackResult, SlackUser, UsersRequest,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A failure the fake can reproduce on demand. `SlackError` is not `Clone`,
/// so the fake stores this recipe and builds a fresh error per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFailure {
    /// `"ok": false` with the given code.
    Api(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Transport failure.
    Network(String),
}

impl FakeFailure {
    pub fn api(code: impl Into<String>) -> Self {
        Self::Api(code.into())
    }

    pub fn missing_scope() -> Self {
        Self::api("missing_scope")
    }

    fn to_error(&self, method: &str) -> SlackError {
        match self {
            Self::Api(code) => SlackError::Api {
                method: method.to_string(),
                code: code.clone(),
                needed: None,
            },
            Self::Status(status) => SlackError::Status {
                status: *status,
                body_summary: "len=0".to_string(),
            },
            Self::Network(reason) => SlackError::Network(reason.clone()),
        }
    }
}

/// Scripted Slack API double.
#[derive(Default)]
pub struct FakeSlackApi {
    conversations: RwLock<Vec<Conversation>>,
    users: RwLock<Vec<SlackUser>>,
    conversation_failures: HashMap<ConversationType, FakeFailure>,
    users_failure: Option<FakeFailure>,
    search_failure: Option<FakeFailure>,
    latency: Option<Duration>,
    hang: bool,
    rate_limited_remaining: AtomicUsize,
    rate_limit_retry_after: Option<Duration>,
    conversations_calls: AtomicUsize,
    users_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FakeSlackApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversations(self, conversations: Vec<Conversation>) -> Self {
        *self.conversations.write() = conversations;
        self
    }

    pub fn with_users(self, users: Vec<SlackUser>) -> Self {
        *self.users.write() = users;
        self
    }

    /// Any `conversations.list` request that includes `conversation_type`
    /// fails with `failure`.
    pub fn fail_conversations(mut self, conversation_type: ConversationType, failure: FakeFailure) -> Self {
        self.conversation_failures.insert(conversation_type, failure);
        self
    }

    pub fn fail_users(mut self, failure: FakeFailure) -> Self {
        self.users_failure = Some(failure);
        self
    }

    pub fn fail_search(mut self, failure: FakeFailure) -> Self {
        self.search_failure = Some(failure);
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Never complete any call.
    pub fn hang_forever(mut self) -> Self {
        self.hang = true;
        self
    }

    /// The first `calls` listing calls answer HTTP 429.
    pub fn rate_limit_first(self, calls: usize, retry_after: Option<Duration>) -> Self {
        self.rate_limited_remaining.store(calls, Ordering::SeqCst);
        Self {
            rate_limit_retry_after: retry_after,
            ..self
        }
    }

    /// Add a conversation after construction, e.g. one created mid-test.
    pub fn push_conversation(&self, conversation: Conversation) {
        self.conversations.write().push(conversation);
    }

    pub fn push_user(&self, user: SlackUser) {
        self.users.write().push(user);
    }

    pub fn conversations_calls(&self) -> usize {
        self.conversations_calls.load(Ordering::SeqCst)
    }

    pub fn users_calls(&self) -> usize {
        self.users_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.conversations_calls() + self.users_calls() + self.search_calls()
    }

    async fn before_call(&self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_rate_limit(&self) -> Option<SlackError> {
        self.rate_limited_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .ok()
            .map(|_| SlackError::RateLimited {
                retry_after: self.rate_limit_retry_after,
            })
    }
}

fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, limit: u32) -> SlackResult<Page<T>> {
    let start = match cursor {
        Some(cursor) => cursor.parse::<usize>().map_err(|_| SlackError::Api {
            method: "fake".to_string(),
            code: "invalid_cursor".to_string(),
            needed: None,
        })?,
        None => 0,
    };
    let limit = (limit.max(1)) as usize;
    let end = (start + limit).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    let next_cursor = (end < items.len()).then(|| end.to_string());
    Ok(Page::new(slice, next_cursor))
}

#[async_trait]
impl SlackApi for FakeSlackApi {
    async fn list_conversations(
        &self,
        request: &ConversationsRequest,
    ) -> SlackResult<Page<Conversation>> {
        self.conversations_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await;

        if let Some(err) = self.take_rate_limit() {
            return Err(err);
        }
        for conversation_type in &request.types {
            if let Some(failure) = self.conversation_failures.get(conversation_type) {
                return Err(failure.to_error("conversations.list"));
            }
        }

        let matching: Vec<Conversation> = self
            .conversations
            .read()
            .iter()
            .filter(|c| request.types.contains(&c.conversation_type()))
            .cloned()
            .collect();
        paginate(&matching, request.cursor.as_deref(), request.limit)
    }

    async fn list_users(&self, request: &UsersRequest) -> SlackResult<Page<SlackUser>> {
        self.users_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await;

        if let Some(err) = self.take_rate_limit() {
            return Err(err);
        }
        if let Some(failure) = &self.users_failure {
            return Err(failure.to_error("users.list"));
        }

        let users = self.users.read().clone();
        paginate(&users, request.cursor.as_deref(), request.limit)
    }

    async fn search_messages(&self, _request: &SearchRequest) -> SlackResult<SearchSummary> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.before_call().await;

        if let Some(failure) = &self.search_failure {
            return Err(failure.to_error("search.messages"));
        }
        Ok(SearchSummary::default())
    }
}
