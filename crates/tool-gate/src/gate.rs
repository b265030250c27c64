//! Advertised-tool decision from capabilities, credential kind and opt-ins.

use crate::{AddMessagePolicy, OperationId, OperationSpec, Requirement, OPERATIONS};
use credential_resolver::CredentialKind;
use runtime_scope_detector::CapabilitySet;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Operator settings that affect gating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateOptions {
    pub add_message: AddMessagePolicy,
}

impl GateOptions {
    pub fn from_raw(add_message_tool: Option<&str>) -> Self {
        Self {
            add_message: AddMessagePolicy::parse(add_message_tool),
        }
    }
}

fn requirement_met(requirement: Requirement, capabilities: &CapabilitySet) -> bool {
    match requirement {
        Requirement::AnyHistory => capabilities.has_any_history_permission(),
        Requirement::AnyRead => capabilities.has_any_read_permission(),
        Requirement::Scope(scope) => capabilities.has_permission(scope),
    }
}

fn is_allowed(
    spec: &OperationSpec,
    capabilities: &CapabilitySet,
    kind: CredentialKind,
    options: &GateOptions,
) -> bool {
    spec.credential_kinds.contains(&kind)
        && requirement_met(spec.requirement, capabilities)
        && (!spec.requires_opt_in || options.add_message.is_enabled())
}

/// Operations to advertise for this credential.
pub fn enabled_operations(
    capabilities: &CapabilitySet,
    kind: CredentialKind,
    options: &GateOptions,
) -> BTreeSet<OperationId> {
    OPERATIONS
        .iter()
        .filter(|spec| is_allowed(spec, capabilities, kind, options))
        .map(|spec| spec.id)
        .collect()
}

/// Gating decision computed once at startup.
#[derive(Debug, Clone)]
pub struct ToolGate {
    enabled: BTreeSet<OperationId>,
    options: GateOptions,
}

impl ToolGate {
    pub fn new(capabilities: &CapabilitySet, kind: CredentialKind, options: GateOptions) -> Self {
        let enabled = enabled_operations(capabilities, kind, &options);

        for spec in OPERATIONS {
            if !enabled.contains(&spec.id) {
                debug!(operation = %spec.id, credential = %kind, "Operation not advertised");
            }
        }
        info!(
            credential = %kind,
            enabled = ?enabled.iter().map(|op| op.as_str()).collect::<Vec<_>>(),
            "Tool gate computed"
        );

        Self { enabled, options }
    }

    pub fn enabled_operations(&self) -> &BTreeSet<OperationId> {
        &self.enabled
    }

    pub fn is_enabled(&self, operation: OperationId) -> bool {
        self.enabled.contains(&operation)
    }

    pub fn add_message_policy(&self) -> &AddMessagePolicy {
        &self.options.add_message
    }

    /// Whether `conversations_add_message` may post into `channel_id`.
    pub fn is_channel_allowed(&self, channel_id: &str) -> bool {
        self.is_enabled(OperationId::ConversationsAddMessage)
            && self.options.add_message.is_channel_allowed(channel_id)
    }
}
