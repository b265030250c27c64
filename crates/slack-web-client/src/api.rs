use crate::{
    Conversation, ConversationsRequest, Page, SearchRequest, SearchSummary, SlackResult, SlackUser,
    UsersRequest,
};
use async_trait::async_trait;
use std::sync::Arc;

/// The Slack Web API surface used by probing and the directory cache.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `conversations.list`, one page.
    async fn list_conversations(
        &self,
        request: &ConversationsRequest,
    ) -> SlackResult<Page<Conversation>>;

    /// `users.list`, one page.
    async fn list_users(&self, request: &UsersRequest) -> SlackResult<Page<SlackUser>>;

    /// `search.messages`, summary only.
    async fn search_messages(&self, request: &SearchRequest) -> SlackResult<SearchSummary>;
}

#[async_trait]
impl<T: SlackApi + ?Sized> SlackApi for Arc<T> {
    async fn list_conversations(
        &self,
        request: &ConversationsRequest,
    ) -> SlackResult<Page<Conversation>> {
        (**self).list_conversations(request).await
    }

    async fn list_users(&self, request: &UsersRequest) -> SlackResult<Page<SlackUser>> {
        (**self).list_users(request).await
    }

    async fn search_messages(&self, request: &SearchRequest) -> SlackResult<SearchSummary> {
        (**self).search_messages(request).await
    }
}
