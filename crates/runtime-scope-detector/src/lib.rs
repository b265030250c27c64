//! Runtime detection of the OAuth scopes carried by the active credential.
//!
//! Slack offers no uniform "what can this token do" call, so each scope is
//! probed with the cheapest request it gates. A permission error marks the
//! scope unavailable; any other error leaves it available so that a flaky
//! network does not hide tools.

mod capability_set;
mod classifier;
mod detector;
mod probe;
mod scope;

pub use capability_set::CapabilitySet;
pub use classifier::{ErrorClass, ErrorClassifier, SlackErrorClassifier, PERMISSION_DENIED_CODES};
pub use detector::{
    scope_detection_machine, DetectionInput, DetectionMachine, DetectionState, ScopeDetector,
};
pub use probe::{CapabilityProbe, ProbeKind, ProbeOutcome};
pub use scope::Scope;
