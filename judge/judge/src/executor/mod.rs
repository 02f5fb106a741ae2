//! Execution strategies.
//!
//! Every strategy implements [`Executor`]: it receives an [`Invocation`] and
//! returns what the program printed, or the [`Fault`](crate::types::Fault) it
//! observed. Faults inside the submitted program are data, not errors; an
//! `Err` means the backend itself could not be driven.

pub mod interpreter;
#[cfg(feature = "sql")]
pub mod query;
pub mod remote;
#[cfg(feature = "javascript")]
pub mod script;

use crate::error::JudgeResult;
use crate::types::{ExecOutput, ExecutionStrategy, Invocation};
use async_trait::async_trait;
use std::time::Duration;

pub use interpreter::InterpreterExecutor;
#[cfg(feature = "sql")]
pub use query::QueryExecutor;
pub use remote::RemoteExecutor;
#[cfg(feature = "javascript")]
pub use script::{CapabilitySet, ScriptExecutor};

#[async_trait]
pub trait Executor: Send + Sync {
    fn strategy(&self) -> ExecutionStrategy;

    /// Extra wall time the harness grants on top of the time limit, for
    /// backends that enforce the run limit themselves but add compile or
    /// network time around it.
    fn deadline_allowance(&self) -> Duration {
        Duration::ZERO
    }

    async fn execute(&self, invocation: &Invocation) -> JudgeResult<ExecOutput>;
}

/// Entry point names tried, in order, after the requested one.
pub const CONVENTIONAL_ENTRY_POINTS: [&str; 3] = ["solution", "solve", "main"];

/// The requested entry point followed by the conventional names, deduplicated.
pub fn entry_point_candidates(requested: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    if let Some(name) = requested.map(str::trim).filter(|n| crate::synth::is_identifier(n)) {
        candidates.push(name.to_string());
    }
    for name in CONVENTIONAL_ENTRY_POINTS {
        if !candidates.iter().any(|c| c == name) {
            candidates.push(name.to_string());
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_candidates() {
        assert_eq!(
            entry_point_candidates(Some("twoSum")),
            vec!["twoSum", "solution", "solve", "main"]
        );
        assert_eq!(
            entry_point_candidates(Some("solve")),
            vec!["solve", "solution", "main"]
        );
        assert_eq!(
            entry_point_candidates(Some("not valid")),
            vec!["solution", "solve", "main"]
        );
        assert_eq!(entry_point_candidates(None).len(), 3);
    }
}
