//! Operator opt-in for posting messages.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Parsed `SLACK_MCP_ADD_MESSAGE_TOOL`.
///
/// - unset, empty or `false`: disabled
/// - `true` or `1`: every channel
/// - `C1,C2`: only those channels
/// - `!C1,!C2`: every channel except those
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "channels", rename_all = "snake_case")]
pub enum AddMessagePolicy {
    #[default]
    Disabled,
    AllChannels,
    Allow(BTreeSet<String>),
    Deny(BTreeSet<String>),
}

impl AddMessagePolicy {
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Self::Disabled,
            Some(raw) => raw,
        };

        match raw.to_ascii_lowercase().as_str() {
            "false" | "0" => return Self::Disabled,
            "true" | "1" => return Self::AllChannels,
            _ => {}
        }

        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();
        if entries.is_empty() {
            return Self::Disabled;
        }

        if entries.iter().all(|entry| entry.starts_with('!')) {
            return Self::Deny(
                entries
                    .iter()
                    .map(|entry| entry.trim_start_matches('!').to_string())
                    .filter(|entry| !entry.is_empty())
                    .collect(),
            );
        }

        let excluded = entries.iter().filter(|entry| entry.starts_with('!')).count();
        if excluded > 0 {
            warn!(excluded, "Mixed allow and deny entries in add-message policy, ignoring the `!` entries");
        }
        Self::Allow(
            entries
                .iter()
                .filter(|entry| !entry.starts_with('!'))
                .map(|entry| entry.to_string())
                .collect(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn is_channel_allowed(&self, channel_id: &str) -> bool {
        match self {
            Self::Disabled => false,
            Self::AllChannels => true,
            Self::Allow(channels) => channels.contains(channel_id),
            Self::Deny(channels) => !channels.contains(channel_id),
        }
    }
}
