//! Constrained-Horn-Clause model checking of contract control flow.
//!
//! Each analyzed contract's CFG is encoded into a system of Horn clauses:
//! every block gets an uninterpreted predicate, every edge becomes a rule.
//! The entry block is the constructor, which flows into an artificial
//! `interface` block with in/out edges for every public function; an
//! inductive invariant of `interface → interface'` is a contract state
//! invariant. Each `assert` contributes a rule into a versioned `error`
//! relation, and one reachability query per assertion decides whether the
//! assertion is safe.
//!
//! The encoding is driven by [`ChcChecker`]; solvers hide behind
//! [`HornEngine`], with [`SpacerEngine`] talking to an external `z3`
//! process and [`PortfolioEngine`] reconciling two back-ends.

pub mod checker;
pub mod engine;
pub mod portfolio;
pub mod predicate;
pub mod report;
pub mod sorts;
pub mod spacer;

pub use checker::{ChcChecker, ChcError};
pub use engine::{CheckResult, HornEngine, RecordingEngine};
pub use portfolio::PortfolioEngine;
pub use predicate::{PredicateRegistry, PredicateSymbol};
pub use report::{
    CollectingReporter, ContractAnalysis, Reporter, TargetReport, TargetVerdict, TracingReporter,
    VerificationTarget, Warning,
};
pub use sorts::SortCatalogue;
pub use spacer::{SpacerConfig, SpacerEngine, SpacerError};
