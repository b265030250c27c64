//! Startup: credential → probes → capability set → directory and gate.

use super::{BridgeState, InitError};
use bridge_config_and_utils::{Config, Paths};
use credential_resolver::{Credential, CredentialKind};
use directory_cache::{DirectoryCache, DirectoryConfig, RefreshPolicy};
use runtime_scope_detector::{ScopeDetector, SlackErrorClassifier};
use slack_web_client::{SlackApi, SlackClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tool_gate::{GateOptions, ToolGate};
use tracing::info;

/// Build the bridge state against the real Slack Web API.
pub async fn build_state(
    config: Config,
    paths: Paths,
    credential: Credential,
    shutdown: CancellationToken,
) -> Result<BridgeState, InitError> {
    let kind = credential.kind();
    let base_url = config.api_base_url()?;
    info!(api_base_url = %base_url, credential = %kind, "Connecting to Slack");

    let client = SlackClient::new(base_url, credential)?;
    Ok(build_state_with_api(config, paths, kind, Arc::new(client), shutdown).await)
}

/// Build the bridge state on top of any [`SlackApi`].
///
/// Detection failures never surface here: unreachable probes leave their
/// scopes unavailable and the bridge starts with fewer tools.
pub async fn build_state_with_api(
    config: Config,
    paths: Paths,
    credential_kind: CredentialKind,
    api: Arc<dyn SlackApi>,
    shutdown: CancellationToken,
) -> BridgeState {
    let detector = ScopeDetector::new(Arc::clone(&api), Arc::new(SlackErrorClassifier))
        .with_timeout(config.detection_timeout())
        .with_cancellation(shutdown.child_token());
    let capabilities = detector.detect().await;

    let directory = DirectoryCache::new(
        Arc::clone(&api),
        Arc::clone(&capabilities),
        DirectoryConfig {
            page_size: config.directory_page_size,
            refresh: RefreshPolicy::default(),
        },
    );

    let tool_gate = ToolGate::new(
        &capabilities,
        credential_kind,
        GateOptions::from_raw(config.add_message_tool.as_deref()),
    );

    BridgeState {
        config: Arc::new(config),
        paths: Arc::new(paths),
        credential_kind,
        api,
        capabilities,
        directory: Arc::new(directory),
        tool_gate: Arc::new(tool_gate),
        shutdown,
    }
}
