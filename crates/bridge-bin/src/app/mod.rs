//! Bridge application wiring.

mod init;
mod lifecycle;
mod reports;
mod state;

pub use init::{build_state, build_state_with_api};
pub use lifecycle::run_bridge;
pub use reports::{ResolveReport, StatusReport, ToolReport, ToolsReport};
pub use state::BridgeState;

use bridge_config_and_utils::CoreError;
use slack_web_client::SlackError;
use thiserror::Error;

/// Startup failures after credentials have been resolved.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("Slack client error: {0}")]
    Slack(#[from] SlackError),
}
