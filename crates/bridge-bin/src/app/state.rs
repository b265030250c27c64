//! Bridge state definition.

use bridge_config_and_utils::{Config, Paths};
use credential_resolver::CredentialKind;
use directory_cache::DirectoryCache;
use runtime_scope_detector::CapabilitySet;
use slack_web_client::SlackApi;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tool_gate::ToolGate;

/// Shared bridge state handed to tool handlers.
///
/// Everything here is fixed after startup except the directory snapshots,
/// which `DirectoryCache` swaps internally.
#[derive(Clone)]
pub struct BridgeState {
    pub config: Arc<Config>,
    pub paths: Arc<Paths>,
    /// Kind of the credential chosen at startup. The secret itself stays
    /// inside the Slack client.
    pub credential_kind: CredentialKind,
    pub api: Arc<dyn SlackApi>,
    /// Published result of scope detection.
    pub capabilities: Arc<CapabilitySet>,
    pub directory: Arc<DirectoryCache>,
    pub tool_gate: Arc<ToolGate>,
    /// Cancelled on shutdown.
    pub shutdown: CancellationToken,
}
