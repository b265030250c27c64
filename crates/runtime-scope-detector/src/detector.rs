//! One-shot concurrent scope detection.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──Start──► Detecting ──Complete──► Finalized
//! ```
//!
//! `Finalized` is terminal. Later calls to [`ScopeDetector::detect`] return
//! the published [`CapabilitySet`] without probing again.

use crate::{CapabilityProbe, CapabilitySet, ErrorClassifier, Scope};
use parking_lot::{Mutex, RwLock};
use rust_fsm::*;
use slack_web_client::{ConversationType, SlackApi};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub scope_detection_machine(Idle)

    Idle => {
        Start => Detecting
    },
    Detecting => {
        Complete => Finalized
    }
}

pub use scope_detection_machine::Input as DetectionInput;
pub use scope_detection_machine::State as DetectionState;
pub use scope_detection_machine::StateMachine as DetectionMachine;

/// Runs the probe round once and publishes the result.
pub struct ScopeDetector {
    probe: CapabilityProbe,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    lifecycle: tokio::sync::Mutex<DetectionMachine>,
    published: RwLock<Option<Arc<CapabilitySet>>>,
}

impl ScopeDetector {
    pub fn new(api: Arc<dyn SlackApi>, classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self {
            probe: CapabilityProbe::new(api, classifier),
            timeout: None,
            cancel: CancellationToken::new(),
            lifecycle: tokio::sync::Mutex::new(DetectionMachine::new()),
            published: RwLock::new(None),
        }
    }

    /// Bound the whole round. Probes still running when it elapses are
    /// recorded unavailable.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tie the round to an outer shutdown token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The published set, if detection has finished.
    pub fn capabilities(&self) -> Option<Arc<CapabilitySet>> {
        self.published.read().clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.published.read().is_some()
    }

    /// Detect once; every later call returns the same `Arc`.
    pub async fn detect(&self) -> Arc<CapabilitySet> {
        let mut machine = self.lifecycle.lock().await;
        if let Some(published) = self.capabilities() {
            return published;
        }

        if let Err(err) = machine.consume(&DetectionInput::Start) {
            warn!(state = ?machine.state(), error = ?err, "Unexpected detection state");
        }

        let results = self.run_round().await;
        let capabilities = Arc::new(CapabilitySet::new(&results));
        log_summary(&capabilities);

        *self.published.write() = Some(Arc::clone(&capabilities));
        if let Err(err) = machine.consume(&DetectionInput::Complete) {
            warn!(state = ?machine.state(), error = ?err, "Unexpected detection state");
        }

        capabilities
    }

    async fn run_round(&self) -> BTreeMap<Scope, bool> {
        info!(probes = Scope::PROBED.len(), "Starting scope detection");

        let aggregate: Arc<Mutex<BTreeMap<Scope, bool>>> = Arc::new(Mutex::new(
            Scope::PROBED.iter().map(|scope| (*scope, false)).collect(),
        ));
        let token = self.cancel.child_token();

        let mut tasks = JoinSet::new();
        for scope in Scope::PROBED {
            let probe = self.probe.clone();
            let aggregate = Arc::clone(&aggregate);
            let token = token.clone();
            tasks.spawn(async move {
                let available = probe.probe(scope, &token).await;
                aggregate.lock().insert(scope, available);
                scope
            });
        }

        let deadline = async {
            match self.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(scope)) => debug!(scope = %scope, "Probe finished"),
                    Some(Err(err)) => warn!(error = %err, "Probe task failed"),
                    None => break,
                },
                _ = &mut deadline, if !token.is_cancelled() => {
                    warn!(timeout_ms = ?self.timeout.map(|t| t.as_millis()), "Scope detection timed out, cancelling outstanding probes");
                    token.cancel();
                }
            }
        }

        let mut results = aggregate.lock().clone();
        infer_history(&mut results);
        results
    }
}

/// History is granted alongside read for each conversation type.
fn infer_history(results: &mut BTreeMap<Scope, bool>) {
    for conversation_type in ConversationType::ALL {
        let read = results
            .get(&Scope::read_for(conversation_type))
            .copied()
            .unwrap_or(false);
        results.insert(Scope::history_for(conversation_type), read);
    }
}

fn log_summary(capabilities: &CapabilitySet) {
    for (scope, available) in capabilities.iter() {
        if available {
            debug!(scope = %scope, "Scope available");
        } else {
            warn!(scope = %scope, "Scope unavailable");
        }
    }

    let available: Vec<&str> = capabilities
        .available_scopes()
        .iter()
        .map(|s| s.as_str())
        .collect();
    let unavailable: Vec<&str> = capabilities
        .unavailable_scopes()
        .iter()
        .map(|s| s.as_str())
        .collect();
    info!(
        available = ?available,
        unavailable = ?unavailable,
        "Scope detection complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlackErrorClassifier;
    use slack_web_client::testing::{FakeFailure, FakeSlackApi};

    fn detector(api: FakeSlackApi) -> (ScopeDetector, Arc<FakeSlackApi>) {
        let api = Arc::new(api);
        let detector = ScopeDetector::new(api.clone(), Arc::new(SlackErrorClassifier));
        (detector, api)
    }

    #[test]
    fn machine_starts_idle_and_finalizes() {
        let mut machine = DetectionMachine::new();
        assert_eq!(*machine.state(), DetectionState::Idle);

        machine.consume(&DetectionInput::Start).unwrap();
        assert_eq!(*machine.state(), DetectionState::Detecting);

        machine.consume(&DetectionInput::Complete).unwrap();
        assert_eq!(*machine.state(), DetectionState::Finalized);

        assert!(machine.consume(&DetectionInput::Start).is_err());
    }

    #[test]
    fn machine_cannot_complete_before_start() {
        let mut machine = DetectionMachine::new();
        assert!(machine.consume(&DetectionInput::Complete).is_err());
    }

    #[test]
    fn history_follows_read() {
        let mut results = BTreeMap::from([
            (Scope::ChannelsRead, true),
            (Scope::GroupsRead, false),
            (Scope::ImRead, true),
        ]);
        infer_history(&mut results);
        assert_eq!(results[&Scope::ChannelsHistory], true);
        assert_eq!(results[&Scope::GroupsHistory], false);
        assert_eq!(results[&Scope::ImHistory], true);
        assert_eq!(results[&Scope::MpimHistory], false);
    }

    #[tokio::test]
    async fn everything_granted() {
        let (detector, api) = detector(FakeSlackApi::new());
        let set = detector.detect().await;

        for scope in Scope::ALL {
            assert_eq!(set.has_permission(scope), !scope.is_write(), "{scope}");
        }
        assert_eq!(set.available_entity_types(), ConversationType::ALL.to_vec());
        assert_eq!(api.total_calls(), Scope::PROBED.len());
    }

    #[tokio::test]
    async fn denials_are_recorded_and_history_derived() {
        let (detector, _) = detector(
            FakeSlackApi::new()
                .fail_conversations(ConversationType::PrivateChannel, FakeFailure::missing_scope())
                .fail_conversations(ConversationType::Mpim, FakeFailure::api("not_allowed"))
                .fail_search(FakeFailure::api("not_allowed_token_type")),
        );
        let set = detector.detect().await;

        assert!(set.has_permission(Scope::ChannelsRead));
        assert!(set.has_permission(Scope::ChannelsHistory));
        assert!(!set.has_permission(Scope::GroupsRead));
        assert!(!set.has_permission(Scope::GroupsHistory));
        assert!(!set.has_permission(Scope::MpimHistory));
        assert!(!set.has_permission(Scope::SearchRead));
        assert_eq!(
            set.available_entity_types(),
            vec![ConversationType::PublicChannel, ConversationType::Im]
        );
    }

    #[tokio::test]
    async fn channel_only_grant() {
        let (detector, api) = detector(
            FakeSlackApi::new()
                .fail_conversations(ConversationType::Im, FakeFailure::missing_scope())
                .fail_conversations(ConversationType::Mpim, FakeFailure::missing_scope())
                .fail_users(FakeFailure::missing_scope())
                .fail_search(FakeFailure::missing_scope()),
        );
        let set = detector.detect().await;

        for scope in [
            Scope::ChannelsRead,
            Scope::ChannelsHistory,
            Scope::GroupsRead,
            Scope::GroupsHistory,
        ] {
            assert!(set.has_permission(scope), "{scope}");
        }
        for scope in [
            Scope::ImRead,
            Scope::ImHistory,
            Scope::ImWrite,
            Scope::MpimRead,
            Scope::MpimHistory,
            Scope::MpimWrite,
            Scope::UsersRead,
            Scope::SearchRead,
            Scope::ChatWrite,
        ] {
            assert!(!set.has_permission(scope), "{scope}");
        }
        assert_eq!(
            set.available_entity_types(),
            vec![ConversationType::PublicChannel, ConversationType::PrivateChannel]
        );
        assert_eq!(api.total_calls(), Scope::PROBED.len());
    }

    #[tokio::test]
    async fn non_permission_errors_count_as_available() {
        let (detector, _) = detector(
            FakeSlackApi::new()
                .fail_users(FakeFailure::Status(502))
                .fail_conversations(ConversationType::Im, FakeFailure::Network("reset".into())),
        );
        let set = detector.detect().await;
        assert!(set.has_permission(Scope::UsersRead));
        assert!(set.has_permission(Scope::ImRead));
        assert!(set.has_permission(Scope::ImHistory));
    }

    #[tokio::test]
    async fn detect_is_idempotent() {
        let (detector, api) = detector(FakeSlackApi::new());
        assert!(!detector.is_finalized());

        let first = detector.detect().await;
        let second = detector.detect().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(detector.is_finalized());
        assert_eq!(api.total_calls(), Scope::PROBED.len());
    }

    #[tokio::test]
    async fn concurrent_detect_calls_share_one_round() {
        let (detector, api) =
            detector(FakeSlackApi::new().with_latency(Duration::from_millis(20)));
        let detector = Arc::new(detector);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let detector = Arc::clone(&detector);
                tokio::spawn(async move { detector.detect().await })
            })
            .collect();

        let mut sets = Vec::new();
        for handle in handles {
            sets.push(handle.await.unwrap());
        }
        assert!(sets.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(api.total_calls(), Scope::PROBED.len());
    }

    #[tokio::test]
    async fn probes_run_concurrently() {
        let (detector, _) = detector(FakeSlackApi::new().with_latency(Duration::from_millis(200)));

        let started = std::time::Instant::now();
        detector.detect().await;
        assert!(started.elapsed() < Duration::from_millis(200 * Scope::PROBED.len() as u64));
    }

    #[tokio::test]
    async fn cancelled_before_start_is_all_unavailable() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (detector, _) = detector(FakeSlackApi::new());
        let detector = detector.with_cancellation(cancel);

        let set = detector.detect().await;
        assert!(set.available_scopes().is_empty());
    }

    #[tokio::test]
    async fn timeout_marks_outstanding_probes_unavailable() {
        let (detector, _) = detector(FakeSlackApi::new().hang_forever());
        let detector = detector.with_timeout(Some(Duration::from_millis(50)));

        let set = tokio::time::timeout(Duration::from_secs(5), detector.detect())
            .await
            .unwrap();
        assert!(set.available_scopes().is_empty());
        assert!(detector.is_finalized());
    }
}
