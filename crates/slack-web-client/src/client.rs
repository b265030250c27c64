//! reqwest-backed [`SlackApi`] implementation.

use crate::types::{check_envelope, parse_conversations_page, parse_search_summary, parse_users_page};
use crate::{
    Conversation, ConversationsRequest, Page, SearchRequest, SearchSummary, SlackApi, SlackError,
    SlackResult, SlackUser, UsersRequest,
};
use async_trait::async_trait;
use credential_resolver::Credential;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, COOKIE, RETRY_AFTER};
use reqwest::StatusCode;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use url::Url;

/// Per-request timeout applied by [`SlackClient::new`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Slack Web API client bound to one credential.
#[derive(Clone)]
pub struct SlackClient {
    http_client: reqwest::Client,
    base_url: Url,
    credential: Credential,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("base_url", &self.base_url.as_str())
            .field("credential", &self.credential.kind())
            .finish()
    }
}

impl SlackClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Web API root, e.g. `https://slack.com/api`
    /// * `credential` - The credential chosen at startup
    pub fn new(base_url: Url, credential: Credential) -> SlackResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            credential,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Build the URL for a Web API method.
    fn method_url(&self, method: &str) -> SlackResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, method))?)
    }

    /// GET a Web API method and return the checked JSON envelope.
    async fn call(&self, method: &str, query: &[(&str, String)]) -> SlackResult<serde_json::Value> {
        let url = self.method_url(method)?;

        tracing::debug!(method, "Calling Slack Web API");

        let mut request = self
            .http_client
            .get(url)
            .query(query)
            .header(AUTHORIZATION, self.credential.authorization_header())
            .header(ACCEPT, "application/json");
        if let Some(cookie) = self.credential.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers());
            tracing::warn!(method, retry_after_secs = ?retry_after.map(|d| d.as_secs()), "Slack rate limit hit");
            return Err(SlackError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            tracing::error!(method, status = %status, body_summary = %body_summary, "Slack request failed");
            return Err(SlackError::Status {
                status: status.as_u16(),
                body_summary,
            });
        }

        let body: serde_json::Value = response.json().await?;
        check_envelope(method, body)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn list_conversations(
        &self,
        request: &ConversationsRequest,
    ) -> SlackResult<Page<Conversation>> {
        let mut query = vec![
            ("types", request.types_param()),
            ("limit", request.limit.to_string()),
            ("exclude_archived", request.exclude_archived.to_string()),
        ];
        if let Some(cursor) = &request.cursor {
            query.push(("cursor", cursor.clone()));
        }

        let body = self.call("conversations.list", &query).await?;
        parse_conversations_page(body)
    }

    async fn list_users(&self, request: &UsersRequest) -> SlackResult<Page<SlackUser>> {
        let mut query = vec![("limit", request.limit.to_string())];
        if let Some(cursor) = &request.cursor {
            query.push(("cursor", cursor.clone()));
        }

        let body = self.call("users.list", &query).await?;
        parse_users_page(body)
    }

    async fn search_messages(&self, request: &SearchRequest) -> SlackResult<SearchSummary> {
        let query = vec![
            ("query", request.query.clone()),
            ("count", request.count.to_string()),
        ];

        let body = self.call("search.messages", &query).await?;
        parse_search_summary(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client(base: &str) -> SlackClient {
        SlackClient::new(Url::parse(base).unwrap(), Credential::bot("xoxb-test")).unwrap()
    }

    #[test]
    fn method_url_keeps_api_path() {
        let hosted = client("https://slack.com/api");
        assert_eq!(
            hosted.method_url("conversations.list").unwrap().as_str(),
            "https://slack.com/api/conversations.list"
        );

        let local = client("http://127.0.0.1:9000/api/");
        assert_eq!(
            local.method_url("users.list").unwrap().as_str(),
            "http://127.0.0.1:9000/api/users.list"
        );
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn debug_does_not_leak_token() {
        let rendered = format!("{:?}", client("https://slack.com/api"));
        assert!(!rendered.contains("xoxb-test"));
        assert!(rendered.contains("Bot"));
    }

    #[test]
    fn summarize_hides_body() {
        let summary = summarize_response_body("{\"token\":\"xoxp-1\"}");
        assert!(summary.starts_with("len=18,"));
        assert!(!summary.contains("xoxp"));
    }
}
