//! solhorn: a Constrained-Horn-Clause model checker for contract
//! assertions.
//!
//! Given a type-checked source unit, solhorn encodes every deployable
//! contract's control flow into Horn clauses over uninterpreted block
//! predicates and asks a Spacer-style fixedpoint solver whether each
//! `assert` can reach the error relation. Loop invariants and contract
//! state invariants fall out of the solver's fixedpoint reasoning instead
//! of loop unrolling.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use solhorn::{analyze, AstFactory};
//!
//! let unit = build_unit(); // from your front end
//! let (analyses, warnings) = analyze(&unit)?;
//! for analysis in analyses {
//!     for target in analysis.targets {
//!         println!("{:?}: {:?}", target.target.location, target.verdict);
//!     }
//! }
//! ```
//!
//! The solver is abstracted behind [`HornEngine`]; [`SpacerEngine`] shells
//! out to `z3`, [`PortfolioEngine`] cross-checks two back-ends, and
//! [`RecordingEngine`] answers from a script for tests and dry runs.

pub use solhorn_ast as ast;
pub use solhorn_chc as chc;
pub use solhorn_smt as smt;

pub use solhorn_ast::{AstFactory, SourceUnit};
pub use solhorn_chc::{
    ChcChecker, CheckResult, CollectingReporter, ContractAnalysis, HornEngine, PortfolioEngine,
    RecordingEngine, Reporter, SpacerConfig, SpacerEngine, SpacerError, TargetVerdict, Warning,
};

/// Current version of solhorn.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Analyze a unit with the default Spacer back-end, collecting warnings.
pub fn analyze(unit: &SourceUnit) -> Result<(Vec<ContractAnalysis>, Vec<Warning>), SpacerError> {
    let mut engine = SpacerEngine::with_defaults()?;
    let mut reporter = CollectingReporter::new();
    let analyses = ChcChecker::new(&mut engine, &mut reporter).analyze(unit);
    Ok((analyses, reporter.warnings))
}

/// Analyze a unit against a caller-supplied engine and reporter.
pub fn analyze_with(
    engine: &mut dyn HornEngine,
    reporter: &mut dyn Reporter,
    unit: &SourceUnit,
) -> Vec<ContractAnalysis> {
    ChcChecker::new(engine, reporter).analyze(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
