//! The Horn engine abstraction.
//!
//! The traversal only ever talks to a [`HornEngine`]: it declares the
//! variables appearing in rules, registers every version of every block
//! relation, adds implication rules under stable names, and finally asks
//! reachability queries. Engines never return errors out-of-band; solver
//! trouble is folded into [`CheckResult::Error`] so one failing query never
//! aborts the analysis of other targets.

use serde::{Deserialize, Serialize};
use solhorn_smt::{Sort, SmtExpr};
use std::fmt;

/// Outcome of a reachability query.
///
/// `Satisfiable` means a derivation of the queried relation exists — for
/// an `error` query, the assertion can fail. `Unsatisfiable` proves the
/// relation unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckResult {
    Satisfiable,
    Unsatisfiable,
    Unknown,
    /// Portfolio back-ends disagreed; results may not be sound.
    Conflicting,
    /// The solver could not be invoked or produced garbage.
    Error,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckResult::Satisfiable => "sat",
            CheckResult::Unsatisfiable => "unsat",
            CheckResult::Unknown => "unknown",
            CheckResult::Conflicting => "conflicting",
            CheckResult::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A solver capable of incremental Horn-clause reasoning.
pub trait HornEngine {
    /// Declare a variable that may occur free in later rules. Free rule
    /// variables are universally quantified by the engine.
    fn declare_variable(&mut self, name: &str, sort: &Sort);

    /// Register one version of an uninterpreted relation. `sort` is the
    /// Boolean-valued function sort of the relation.
    fn register_relation(&mut self, name: &str, sort: &Sort);

    /// Add the Horn rule `rule` (an implication, or a bare application for
    /// facts) under a stable name.
    fn add_rule(&mut self, rule: &SmtExpr, name: &str);

    /// Ask whether `query` is derivable from the rules added so far.
    /// Returns the verdict and any raw model/output lines the back-end
    /// produced.
    fn query(&mut self, query: &SmtExpr) -> (CheckResult, Vec<String>);
}

/// A rule as seen by the [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRule {
    pub name: String,
    pub text: String,
}

/// An engine that records everything and answers queries from a script.
///
/// This is what the encoding tests run against: they assert on the emitted
/// relations and rule shapes without needing a solver on `PATH`.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub variables: Vec<(String, Sort)>,
    pub relations: Vec<(String, Sort)>,
    pub rules: Vec<RecordedRule>,
    pub queries: Vec<String>,
    scripted: Vec<CheckResult>,
    default_result: CheckResult,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            default_result: CheckResult::Unsatisfiable,
            ..Default::default()
        }
    }

    /// Engine whose queries all answer `result` unless scripted otherwise.
    pub fn answering(result: CheckResult) -> Self {
        Self {
            default_result: result,
            ..Default::default()
        }
    }

    /// Queue an answer for the next unanswered query; scripted answers are
    /// consumed in FIFO order before the default kicks in.
    pub fn script_result(&mut self, result: CheckResult) {
        self.scripted.push(result);
    }

    pub fn rule_named(&self, name: &str) -> Option<&RecordedRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.iter().any(|(n, _)| n == name)
    }
}

impl Default for CheckResult {
    fn default() -> Self {
        CheckResult::Unknown
    }
}

impl HornEngine for RecordingEngine {
    fn declare_variable(&mut self, name: &str, sort: &Sort) {
        self.variables.push((name.to_string(), sort.clone()));
    }

    fn register_relation(&mut self, name: &str, sort: &Sort) {
        self.relations.push((name.to_string(), sort.clone()));
    }

    fn add_rule(&mut self, rule: &SmtExpr, name: &str) {
        self.rules.push(RecordedRule {
            name: name.to_string(),
            text: rule.text.clone(),
        });
    }

    fn query(&mut self, query: &SmtExpr) -> (CheckResult, Vec<String>) {
        self.queries.push(query.text.clone());
        let result = if self.queries.len() <= self.scripted.len() {
            self.scripted[self.queries.len() - 1]
        } else {
            self.default_result
        };
        (result, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_engine_collects() {
        let mut engine = RecordingEngine::new();
        engine.declare_variable("x_0", &Sort::Int);
        engine.register_relation("block_1_0", &Sort::predicate(vec![Sort::Int]));
        let rule = SmtExpr::new("(=> true (block_1_0 x_0))", Sort::Bool);
        engine.add_rule(&rule, "entry_to_block");
        assert_eq!(engine.rule_names(), vec!["entry_to_block"]);
        assert!(engine.has_relation("block_1_0"));
        assert_eq!(
            engine.rule_named("entry_to_block").unwrap().text,
            "(=> true (block_1_0 x_0))"
        );
    }

    #[test]
    fn scripted_answers_then_default() {
        let mut engine = RecordingEngine::answering(CheckResult::Unknown);
        engine.script_result(CheckResult::Satisfiable);
        let q = SmtExpr::new("error_1", Sort::Bool);
        assert_eq!(engine.query(&q).0, CheckResult::Satisfiable);
        assert_eq!(engine.query(&q).0, CheckResult::Unknown);
        assert_eq!(engine.queries.len(), 2);
    }
}
