//! Decides which bridge tools are advertised for the detected capabilities.
//!
//! The decision is made once from the published `CapabilitySet` and the
//! credential kind; afterwards every query is a plain read.

mod gate;
mod operations;
mod policy;

pub use gate::{enabled_operations, GateOptions, ToolGate};
pub use operations::{spec_for, OperationId, OperationSpec, Requirement, OPERATIONS};
pub use policy::AddMessagePolicy;
