//! Refreshable reference directories.

use crate::{DirectoryEntry, DirectoryError, DirectoryKind, DirectoryResult, DirectorySnapshot, EntryKind};
use parking_lot::RwLock;
use runtime_scope_detector::{CapabilitySet, Scope};
use slack_web_client::{
    Conversation, ConversationType, ConversationsRequest, Page, SlackApi, SlackError, SlackResult,
    SlackUser, UsersRequest,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry behavior for rate-limited page fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Maximum number of retries per page.
    pub max_retries: u32,
    /// Initial delay when Slack sends no `Retry-After`, in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl RefreshPolicy {
    /// Delay before retry `attempt` (0-indexed). `Retry-After` wins over the
    /// exponential schedule; both are capped.
    pub fn delay_for_attempt(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = retry_after.unwrap_or_else(|| {
            Duration::from_millis(
                self.initial_delay_ms
                    .saturating_mul(2u64.saturating_pow(attempt)),
            )
        });
        delay.min(Duration::from_millis(self.max_delay_ms))
    }
}

/// Tunables for [`DirectoryCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// `limit` sent with each listing call.
    pub page_size: u32,
    pub refresh: RefreshPolicy,
}

struct Directory {
    current: RwLock<Arc<DirectorySnapshot>>,
    /// Completed refresh attempts, successful or not. Bumped after `publish`.
    attempts: AtomicU64,
    /// Held for the whole refresh. Guards the failure message of the last
    /// attempt, `None` when it succeeded.
    gate: tokio::sync::Mutex<Option<String>>,
}

impl Directory {
    fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(DirectorySnapshot::empty())),
            attempts: AtomicU64::new(0),
            gate: tokio::sync::Mutex::new(None),
        }
    }

    fn load(&self) -> Arc<DirectorySnapshot> {
        Arc::clone(&self.current.read())
    }

    fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    fn publish(&self, snapshot: Arc<DirectorySnapshot>) {
        *self.current.write() = snapshot;
    }
}

/// Maps `#channel` / `@user` references to Slack IDs.
///
/// Readers never block on a refresh: they clone the current `Arc` and work on
/// that. A refresh builds the next snapshot aside and swaps it in.
pub struct DirectoryCache {
    api: Arc<dyn SlackApi>,
    capabilities: Arc<CapabilitySet>,
    config: DirectoryConfig,
    conversations: Directory,
    users: Directory,
}

impl DirectoryCache {
    pub fn new(
        api: Arc<dyn SlackApi>,
        capabilities: Arc<CapabilitySet>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            api,
            capabilities,
            config,
            conversations: Directory::new(),
            users: Directory::new(),
        }
    }

    fn directory(&self, kind: DirectoryKind) -> &Directory {
        match kind {
            DirectoryKind::Conversations => &self.conversations,
            DirectoryKind::Users => &self.users,
        }
    }

    /// Whether the credential can list this directory at all.
    pub fn is_enabled(&self, kind: DirectoryKind) -> bool {
        match kind {
            DirectoryKind::Conversations => !self.capabilities.available_entity_types().is_empty(),
            DirectoryKind::Users => self.capabilities.has_permission(Scope::UsersRead),
        }
    }

    /// Current snapshot, possibly never loaded.
    pub fn snapshot(&self, kind: DirectoryKind) -> Arc<DirectorySnapshot> {
        self.directory(kind).load()
    }

    /// Resolve a conversation reference (`#name`, `@user`, `@mpdm-…` or ID).
    pub async fn resolve(&self, reference: &str) -> DirectoryResult<String> {
        self.resolve_in(DirectoryKind::Conversations, reference)
            .await
    }

    /// Resolve a user reference (`@name` or ID).
    pub async fn resolve_user(&self, reference: &str) -> DirectoryResult<String> {
        self.resolve_in(DirectoryKind::Users, reference).await
    }

    async fn resolve_in(&self, kind: DirectoryKind, reference: &str) -> DirectoryResult<String> {
        let reference = reference.trim();
        let not_found = || DirectoryError::NotFound(reference.to_string());
        if reference.is_empty() {
            return Err(not_found());
        }

        // Read the attempt count first so a refresh finishing in between is
        // shared rather than repeated.
        let attempt = self.directory(kind).attempts();
        let snapshot = self.snapshot(kind);
        if let Some(id) = snapshot.resolve(reference) {
            return Ok(id.to_string());
        }
        if !self.is_enabled(kind) {
            return Err(not_found());
        }

        debug!(directory = %kind, reference, "Directory miss, refreshing");
        match self.refresh_after(kind, attempt).await {
            Ok(fresh) => fresh
                .resolve(reference)
                .map(str::to_string)
                .ok_or_else(not_found),
            Err(err) => {
                warn!(directory = %kind, reference, error = %err, "Directory refresh failed during resolve");
                Err(not_found())
            }
        }
    }

    /// Reload a directory from Slack.
    ///
    /// Concurrent calls for the same kind share one reload, including its
    /// failure.
    pub async fn refresh(&self, kind: DirectoryKind) -> DirectoryResult<Arc<DirectorySnapshot>> {
        let seen = self.directory(kind).attempts();
        self.refresh_after(kind, seen).await
    }

    /// Reload unless an attempt finished after the caller observed `seen`
    /// completed attempts; in that case hand back its outcome.
    async fn refresh_after(
        &self,
        kind: DirectoryKind,
        seen: u64,
    ) -> DirectoryResult<Arc<DirectorySnapshot>> {
        match kind {
            DirectoryKind::Conversations => {
                self.swap_in(kind, seen, || self.load_conversations()).await
            }
            DirectoryKind::Users => self.swap_in(kind, seen, || self.load_users()).await,
        }
    }

    async fn swap_in<F, Fut>(
        &self,
        kind: DirectoryKind,
        seen: u64,
        load: F,
    ) -> DirectoryResult<Arc<DirectorySnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DirectoryResult<Vec<DirectoryEntry>>>,
    {
        if !self.is_enabled(kind) {
            return Err(DirectoryError::Unavailable(kind));
        }

        let directory = self.directory(kind);
        let mut last_failure = directory.gate.lock().await;

        let current = directory.load();
        if directory.attempts() > seen {
            return match last_failure.as_ref() {
                None => {
                    debug!(directory = %kind, generation = current.generation(), "Refresh already done by another caller");
                    Ok(current)
                }
                Some(message) => {
                    debug!(directory = %kind, error = %message, "Sharing failed refresh of another caller");
                    Err(DirectoryError::RefreshFailed {
                        kind,
                        message: message.clone(),
                    })
                }
            };
        }

        let outcome = match load().await {
            Ok(entries) => {
                let next = Arc::new(DirectorySnapshot::from_entries(
                    entries,
                    current.generation() + 1,
                ));
                directory.publish(Arc::clone(&next));
                *last_failure = None;

                info!(
                    directory = %kind,
                    entries = next.len(),
                    generation = next.generation(),
                    "Directory refreshed"
                );
                Ok(next)
            }
            Err(err) => {
                *last_failure = Some(err.to_string());
                Err(err)
            }
        };
        directory.attempts.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn load_conversations(&self) -> DirectoryResult<Vec<DirectoryEntry>> {
        let types = self.capabilities.available_entity_types();
        let base = ConversationsRequest::new(types, self.config.page_size);
        let api = Arc::clone(&self.api);

        let conversations = self
            .fetch_all("conversations.list", |cursor| {
                let api = Arc::clone(&api);
                let request = base.clone().with_cursor(cursor);
                async move { api.list_conversations(&request).await }
            })
            .await?;

        let users = self.users_for_im_names().await;
        Ok(conversations
            .into_iter()
            .map(|conversation| conversation_entry(conversation, &users))
            .collect())
    }

    async fn load_users(&self) -> DirectoryResult<Vec<DirectoryEntry>> {
        let base = UsersRequest::new(self.config.page_size);
        let api = Arc::clone(&self.api);

        let users = self
            .fetch_all("users.list", |cursor| {
                let api = Arc::clone(&api);
                let request = base.clone().with_cursor(cursor);
                async move { api.list_users(&request).await }
            })
            .await?;

        Ok(users.into_iter().map(user_entry).collect())
    }

    /// User snapshot used to name IM counterparts. Loads it on first use;
    /// failures fall back to raw user IDs.
    async fn users_for_im_names(&self) -> Arc<DirectorySnapshot> {
        let seen = self.users.attempts();
        let current = self.snapshot(DirectoryKind::Users);
        if current.is_loaded() || !self.is_enabled(DirectoryKind::Users) {
            return current;
        }
        let refreshed = self
            .swap_in(DirectoryKind::Users, seen, || self.load_users())
            .await;
        match refreshed {
            Ok(users) => users,
            Err(err) => {
                warn!(error = %err, "User directory unavailable, IMs will be named by user ID");
                current
            }
        }
    }

    /// Follow `next_cursor` until exhausted, retrying rate-limited pages.
    async fn fetch_all<T, F, Fut>(&self, method: &'static str, mut fetch: F) -> DirectoryResult<Vec<T>>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = SlackResult<Page<T>>>,
    {
        let policy = &self.config.refresh;
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut attempt = 0u32;
        let mut pages = 0u32;

        loop {
            match fetch(cursor.clone()).await {
                Ok(page) => {
                    attempt = 0;
                    pages += 1;
                    items.extend(page.items);
                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Err(SlackError::RateLimited { retry_after }) if attempt < policy.max_retries => {
                    let delay = policy.delay_for_attempt(attempt, retry_after);
                    warn!(
                        method,
                        attempt = attempt + 1,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited while paging, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        debug!(method, pages, items = items.len(), "Listing complete");
        Ok(items)
    }
}

fn conversation_entry(conversation: Conversation, users: &DirectorySnapshot) -> DirectoryEntry {
    let name = conversation.name.clone().unwrap_or_else(|| conversation.id.clone());
    match conversation.conversation_type() {
        ConversationType::PublicChannel => {
            DirectoryEntry::new(conversation.id, format!("#{}", name), EntryKind::PublicChannel)
        }
        ConversationType::PrivateChannel => {
            DirectoryEntry::new(conversation.id, format!("#{}", name), EntryKind::PrivateChannel)
        }
        ConversationType::Mpim => {
            DirectoryEntry::new(conversation.id, format!("@{}", name), EntryKind::Mpim)
        }
        ConversationType::Im => {
            let counterpart = conversation.user.as_deref().unwrap_or(&conversation.id);
            let reference = users
                .get_by_id(counterpart)
                .map(|user| user.reference.clone())
                .unwrap_or_else(|| format!("@{}", counterpart));
            DirectoryEntry::new(conversation.id, reference, EntryKind::Im)
        }
    }
}

fn user_entry(user: SlackUser) -> DirectoryEntry {
    DirectoryEntry::new(user.id, format!("@{}", user.name), EntryKind::User)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use slack_web_client::testing::{FakeFailure, FakeSlackApi};

    fn all_scopes() -> Arc<CapabilitySet> {
        Arc::new(CapabilitySet::from_available(&[
            Scope::ChannelsRead,
            Scope::GroupsRead,
            Scope::ImRead,
            Scope::MpimRead,
            Scope::UsersRead,
        ]))
    }

    fn fast_config(page_size: u32) -> DirectoryConfig {
        DirectoryConfig {
            page_size,
            refresh: RefreshPolicy {
                max_retries: 3,
                initial_delay_ms: 1,
                max_delay_ms: 5,
            },
        }
    }

    fn cache(api: FakeSlackApi, capabilities: Arc<CapabilitySet>, page_size: u32) -> (DirectoryCache, Arc<FakeSlackApi>) {
        let api = Arc::new(api);
        let cache = DirectoryCache::new(api.clone(), capabilities, fast_config(page_size));
        (cache, api)
    }

    #[test]
    fn delay_prefers_retry_after_and_caps() {
        let policy = RefreshPolicy::default();
        assert_eq!(policy.delay_for_attempt(0, None), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2, None), Duration::from_millis(2000));
        assert_eq!(
            policy.delay_for_attempt(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.delay_for_attempt(30, None),
            Duration::from_millis(policy.max_delay_ms)
        );
    }

    #[tokio::test]
    async fn refresh_walks_every_page() {
        let (cache, api) = cache(
            FakeSlackApi::new().with_conversations(vec![
                Conversation::public_channel("C1", "a"),
                Conversation::public_channel("C2", "b"),
                Conversation::public_channel("C3", "c"),
            ]),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            1,
        );

        let snapshot = cache.refresh(DirectoryKind::Conversations).await.unwrap();
        let ids: Vec<&str> = snapshot.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C3"]);
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(api.conversations_calls(), 3);

        for entry in snapshot.entries() {
            assert_eq!(snapshot.resolve(&entry.reference), Some(entry.id.as_str()));
        }
        assert_eq!(cache.resolve("#c").await.unwrap(), "C3");
        assert_eq!(api.conversations_calls(), 3);
    }

    #[tokio::test]
    async fn references_per_conversation_type() {
        let (cache, _) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![
                    Conversation::public_channel("C1", "general"),
                    Conversation::private_channel("G1", "secret"),
                    Conversation::im("D1", "U1"),
                    Conversation::im("D2", "U404"),
                    Conversation::mpim("G2", "mpdm-alice--bob-1"),
                ])
                .with_users(vec![SlackUser::new("U1", "alice")]),
            all_scopes(),
            100,
        );

        assert_eq!(cache.resolve("#general").await.unwrap(), "C1");
        assert_eq!(cache.resolve("#secret").await.unwrap(), "G1");
        assert_eq!(cache.resolve("@alice").await.unwrap(), "D1");
        assert_eq!(cache.resolve("@U404").await.unwrap(), "D2");
        assert_eq!(cache.resolve("@mpdm-alice--bob-1").await.unwrap(), "G2");
        assert_eq!(cache.resolve_user("@alice").await.unwrap(), "U1");
    }

    #[tokio::test]
    async fn im_falls_back_to_user_id_without_users_scope() {
        let (cache, api) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![Conversation::im("D1", "U1")])
                .with_users(vec![SlackUser::new("U1", "alice")]),
            Arc::new(CapabilitySet::from_available(&[Scope::ImRead])),
            100,
        );

        assert_eq!(cache.resolve("@U1").await.unwrap(), "D1");
        assert_eq!(api.users_calls(), 0);
        assert!(matches!(
            cache.refresh(DirectoryKind::Users).await,
            Err(DirectoryError::Unavailable(DirectoryKind::Users))
        ));
    }

    #[tokio::test]
    async fn present_bare_id_needs_no_refresh() {
        let (cache, api) = cache(
            FakeSlackApi::new().with_conversations(vec![Conversation::public_channel("C1", "general")]),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );
        cache.refresh(DirectoryKind::Conversations).await.unwrap();
        let calls = api.conversations_calls();

        assert_eq!(cache.resolve("C1").await.unwrap(), "C1");
        assert_eq!(api.conversations_calls(), calls);
    }

    #[tokio::test]
    async fn miss_refreshes_once_then_not_found() {
        let (cache, api) = cache(
            FakeSlackApi::new().with_conversations(vec![Conversation::public_channel("C1", "general")]),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );
        cache.refresh(DirectoryKind::Conversations).await.unwrap();
        let calls = api.conversations_calls();

        let err = cache.resolve("#unknown-channel").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(ref r) if r == "#unknown-channel"));
        assert_eq!(api.conversations_calls(), calls + 1);
    }

    #[tokio::test]
    async fn miss_picks_up_new_channel() {
        let (cache, api) = cache(
            FakeSlackApi::new().with_conversations(vec![Conversation::public_channel("C1", "general")]),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );
        cache.refresh(DirectoryKind::Conversations).await.unwrap();

        api.push_conversation(Conversation::public_channel("C2", "launch"));
        assert_eq!(cache.resolve("#launch").await.unwrap(), "C2");
        assert_eq!(cache.snapshot(DirectoryKind::Conversations).generation(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_refresh() {
        let (cache, api) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![Conversation::public_channel("C1", "general")])
                .with_latency(Duration::from_millis(20)),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );

        let results = join_all((0..8).map(|_| cache.resolve("#general"))).await;
        for result in results {
            assert_eq!(result.unwrap(), "C1");
        }
        assert_eq!(api.conversations_calls(), 1);
        assert_eq!(cache.snapshot(DirectoryKind::Conversations).generation(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_failed_refresh() {
        let (cache, api) = cache(
            FakeSlackApi::new()
                .fail_conversations(ConversationType::PublicChannel, FakeFailure::Status(500))
                .with_latency(Duration::from_millis(20)),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );

        let results = join_all((0..8).map(|_| cache.resolve("#general"))).await;
        for result in results {
            assert!(matches!(result, Err(DirectoryError::NotFound(ref r)) if r == "#general"));
        }
        assert_eq!(api.conversations_calls(), 1);
        assert!(!cache.snapshot(DirectoryKind::Conversations).is_loaded());

        // A later miss starts a fresh attempt.
        assert!(cache.resolve("#general").await.is_err());
        assert_eq!(api.conversations_calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_rate_limit_retries() {
        let (cache, api) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![Conversation::public_channel("C1", "a")])
                .rate_limit_first(1000, Some(Duration::from_millis(1))),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );

        let results =
            join_all((0..8).map(|_| cache.refresh(DirectoryKind::Conversations))).await;
        let mut rate_limited = 0;
        for result in results {
            match result {
                Err(DirectoryError::Slack(SlackError::RateLimited { .. })) => rate_limited += 1,
                Err(DirectoryError::RefreshFailed { kind, .. }) => {
                    assert_eq!(kind, DirectoryKind::Conversations)
                }
                other => panic!("unexpected outcome: {:?}", other.map(|s| s.len())),
            }
        }
        assert_eq!(rate_limited, 1);
        assert_eq!(api.conversations_calls(), 4);
    }

    #[tokio::test]
    async fn rate_limited_pages_are_retried_without_duplicates() {
        let (cache, api) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![
                    Conversation::public_channel("C1", "a"),
                    Conversation::public_channel("C2", "b"),
                ])
                .rate_limit_first(2, Some(Duration::from_millis(1))),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            1,
        );

        let snapshot = cache.refresh(DirectoryKind::Conversations).await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(api.conversations_calls(), 4);
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_is_an_error() {
        let (cache, _) = cache(
            FakeSlackApi::new()
                .with_conversations(vec![Conversation::public_channel("C1", "a")])
                .rate_limit_first(10, None),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            1,
        );

        let err = cache.refresh(DirectoryKind::Conversations).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Slack(SlackError::RateLimited { .. })));
        assert!(!cache.snapshot(DirectoryKind::Conversations).is_loaded());
    }

    #[tokio::test]
    async fn refresh_failure_during_resolve_is_not_found() {
        let (cache, _) = cache(
            FakeSlackApi::new().fail_conversations(
                ConversationType::PublicChannel,
                FakeFailure::Status(500),
            ),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );

        assert!(matches!(
            cache.resolve("#general").await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn no_conversation_scopes_means_unavailable() {
        let (cache, api) = cache(
            FakeSlackApi::new(),
            Arc::new(CapabilitySet::from_available(&[Scope::SearchRead])),
            100,
        );

        assert!(!cache.is_enabled(DirectoryKind::Conversations));
        assert!(matches!(
            cache.refresh(DirectoryKind::Conversations).await,
            Err(DirectoryError::Unavailable(DirectoryKind::Conversations))
        ));
        assert!(matches!(
            cache.resolve("#general").await,
            Err(DirectoryError::NotFound(_))
        ));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn listing_is_restricted_to_available_types() {
        let (cache, _) = cache(
            FakeSlackApi::new().with_conversations(vec![
                Conversation::public_channel("C1", "general"),
                Conversation::private_channel("G1", "secret"),
            ]),
            Arc::new(CapabilitySet::from_available(&[Scope::ChannelsRead])),
            100,
        );

        let snapshot = cache.refresh(DirectoryKind::Conversations).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(matches!(
            cache.resolve("#secret").await,
            Err(DirectoryError::NotFound(_))
        ));
    }
}
