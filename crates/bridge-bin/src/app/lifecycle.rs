//! Bridge lifecycle management.

use super::BridgeState;
use directory_cache::DirectoryKind;
use tracing::{info, warn};

/// Keep the bridge state alive for the agent transport until shutdown.
///
/// The conversation directory is warmed in the background so the first
/// `#channel` lookup does not pay for a full listing.
pub async fn run_bridge(state: BridgeState) {
    let enabled: Vec<&str> = state
        .tool_gate
        .enabled_operations()
        .iter()
        .map(|op| op.as_str())
        .collect();
    info!(
        credential = %state.credential_kind,
        tools = ?enabled,
        "Slack bridge ready"
    );

    if state.directory.is_enabled(DirectoryKind::Conversations) {
        let directory = state.directory.clone();
        tokio::spawn(async move {
            match directory.refresh(DirectoryKind::Conversations).await {
                Ok(snapshot) => info!(entries = snapshot.len(), "Conversation directory warmed"),
                Err(err) => warn!(error = %err, "Conversation directory warm-up failed"),
            }
        });
    }

    let shutdown = state.shutdown.clone();
    tokio::select! {
        _ = shutdown.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!(error = %err, "Failed to listen for shutdown signal");
            }
            shutdown.cancel();
        }
    }

    info!("Slack bridge stopped");
}
