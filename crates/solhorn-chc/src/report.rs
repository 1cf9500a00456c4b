//! Verification verdicts and the diagnostics interface.

use serde::{Deserialize, Serialize};
use solhorn_ast::{NodeId, SourceLocation};
use tracing::warn;

/// An `assert` call the checker proved or failed to prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationTarget {
    /// The `assert` call expression.
    pub call: NodeId,
    pub location: SourceLocation,
}

/// What the checker concluded about one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetVerdict {
    /// No execution violates the assertion.
    Safe,
    /// A violation is derivable.
    Unsafe,
    /// The solver gave up (or a portfolio disagreed).
    Unknown,
    /// The solver could not be invoked.
    SolverError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: VerificationTarget,
    pub verdict: TargetVerdict,
}

/// Per-contract analysis outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAnalysis {
    pub contract: NodeId,
    pub name: String,
    pub targets: Vec<TargetReport>,
}

impl ContractAnalysis {
    pub fn safe_targets(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets
            .iter()
            .filter(|t| t.verdict == TargetVerdict::Safe)
    }

    pub fn all_safe(&self) -> bool {
        self.targets
            .iter()
            .all(|t| t.verdict == TargetVerdict::Safe)
    }
}

/// Sink for user-facing diagnostics. The checker never decides exit codes
/// or formatting; the host does.
pub trait Reporter {
    fn warning(&mut self, location: SourceLocation, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub location: SourceLocation,
    pub message: String,
}

/// Collects warnings for later inspection; the default host reporter.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub warnings: Vec<Warning>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.warnings.iter().any(|w| w.message.contains(fragment))
    }
}

impl Reporter for CollectingReporter {
    fn warning(&mut self, location: SourceLocation, message: &str) {
        self.warnings.push(Warning {
            location,
            message: message.to_string(),
        });
    }
}

/// Forwards warnings to the `tracing` subscriber.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warning(&mut self, location: SourceLocation, message: &str) {
        warn!(%location, "{message}");
    }
}
