//! Immutable result of one detection round.

use crate::Scope;
use serde::Serialize;
use slack_web_client::ConversationType;
use std::collections::BTreeMap;

/// Availability of every known [`Scope`].
///
/// Built once per process and shared behind an `Arc`. There is no mutating
/// API; a scope missing from the input map is recorded unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    scopes: BTreeMap<Scope, bool>,
}

impl CapabilitySet {
    pub fn new(results: &BTreeMap<Scope, bool>) -> Self {
        let scopes = Scope::ALL
            .iter()
            .map(|scope| (*scope, results.get(scope).copied().unwrap_or(false)))
            .collect();
        Self { scopes }
    }

    /// Every scope unavailable.
    pub fn none() -> Self {
        Self::new(&BTreeMap::new())
    }

    /// Exactly the listed scopes available.
    pub fn from_available(available: &[Scope]) -> Self {
        let results = available.iter().map(|scope| (*scope, true)).collect();
        Self::new(&results)
    }

    pub fn has_permission(&self, scope: Scope) -> bool {
        self.scopes.get(&scope).copied().unwrap_or(false)
    }

    pub fn has_any_read_permission(&self) -> bool {
        ConversationType::ALL
            .iter()
            .any(|t| self.has_permission(Scope::read_for(*t)))
    }

    pub fn has_any_history_permission(&self) -> bool {
        ConversationType::ALL
            .iter()
            .any(|t| self.has_permission(Scope::history_for(*t)))
    }

    /// Conversation types whose read scope is available, in
    /// public, private, im, mpim order.
    pub fn available_entity_types(&self) -> Vec<ConversationType> {
        ConversationType::ALL
            .iter()
            .copied()
            .filter(|t| self.has_permission(Scope::read_for(*t)))
            .collect()
    }

    pub fn available_scopes(&self) -> Vec<Scope> {
        self.scopes
            .iter()
            .filter_map(|(scope, available)| available.then_some(*scope))
            .collect()
    }

    pub fn unavailable_scopes(&self) -> Vec<Scope> {
        self.scopes
            .iter()
            .filter_map(|(scope, available)| (!available).then_some(*scope))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Scope, bool)> + '_ {
        self.scopes.iter().map(|(scope, available)| (*scope, *available))
    }
}
