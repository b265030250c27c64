//! Printable summaries of the bridge state.

use super::BridgeState;
use credential_resolver::CredentialKind;
use directory_cache::DirectoryKind;
use runtime_scope_detector::Scope;
use serde::Serialize;
use slack_web_client::ConversationType;
use std::fmt;
use tool_gate::{spec_for, AddMessagePolicy};

fn join<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Detected capabilities for `slack-bridge status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub credential: CredentialKind,
    pub available_scopes: Vec<Scope>,
    pub unavailable_scopes: Vec<Scope>,
    pub entity_types: Vec<ConversationType>,
}

impl StatusReport {
    pub fn from_state(state: &BridgeState) -> Self {
        Self {
            credential: state.credential_kind,
            available_scopes: state.capabilities.available_scopes(),
            unavailable_scopes: state.capabilities.unavailable_scopes(),
            entity_types: state.capabilities.available_entity_types(),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<14} {}", "Credential:", self.credential)?;
        writeln!(f, "{:<14} {}", "Available:", join(&self.available_scopes))?;
        writeln!(f, "{:<14} {}", "Unavailable:", join(&self.unavailable_scopes))?;
        write!(f, "{:<14} {}", "Entity types:", join(&self.entity_types))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    pub name: &'static str,
    pub description: &'static str,
}

/// Advertised tools for `slack-bridge tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsReport {
    pub tools: Vec<ToolReport>,
    pub add_message: AddMessagePolicy,
}

impl ToolsReport {
    pub fn from_state(state: &BridgeState) -> Self {
        let tools = state
            .tool_gate
            .enabled_operations()
            .iter()
            .filter_map(|op| spec_for(*op))
            .map(|spec| ToolReport {
                name: spec.id.as_str(),
                description: spec.description,
            })
            .collect();

        Self {
            tools,
            add_message: state.tool_gate.add_message_policy().clone(),
        }
    }
}

impl fmt::Display for ToolsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tools.is_empty() {
            return write!(f, "No tools available for this credential");
        }
        let mut first = true;
        for tool in &self.tools {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "  {:<32} {}", tool.name, tool.description)?;
        }
        Ok(())
    }
}

/// Result of `slack-bridge resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub reference: String,
    pub id: String,
    pub directory: DirectoryKind,
}

impl fmt::Display for ResolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.reference, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_lists_scopes() {
        let report = StatusReport {
            credential: CredentialKind::Bot,
            available_scopes: vec![Scope::ChannelsRead, Scope::ChannelsHistory],
            unavailable_scopes: vec![],
            entity_types: vec![ConversationType::PublicChannel],
        };
        let text = report.to_string();
        assert!(text.contains("bot"));
        assert!(text.contains("channels:read, channels:history"));
        assert!(text.contains("Unavailable:   (none)"));
        assert!(text.contains("public_channel"));
    }

    #[test]
    fn status_json_uses_scope_strings() {
        let report = StatusReport {
            credential: CredentialKind::SessionPair,
            available_scopes: vec![Scope::SearchRead],
            unavailable_scopes: vec![Scope::ChatWrite],
            entity_types: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["credential"], "session_pair");
        assert_eq!(json["available_scopes"][0], "search:read");
        assert_eq!(json["unavailable_scopes"][0], "chat:write");
    }

    #[test]
    fn empty_tools_report() {
        let report = ToolsReport {
            tools: vec![],
            add_message: AddMessagePolicy::Disabled,
        };
        assert_eq!(report.to_string(), "No tools available for this credential");
    }
}
