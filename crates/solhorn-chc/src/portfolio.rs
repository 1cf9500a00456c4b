//! Two-engine portfolio.
//!
//! Every declaration, relation and rule is mirrored into both back-ends;
//! queries run on both and the answers are reconciled. A definitive answer
//! beats `Unknown`, agreement wins outright, and a sat/unsat disagreement
//! is surfaced as [`CheckResult::Conflicting`] — the driver turns that
//! into a soundness warning.

use crate::engine::{CheckResult, HornEngine};
use solhorn_smt::{Sort, SmtExpr};
use tracing::{debug, warn};

pub struct PortfolioEngine<A, B> {
    primary: A,
    secondary: B,
}

impl<A: HornEngine, B: HornEngine> PortfolioEngine<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.primary, self.secondary)
    }

    fn reconcile(first: CheckResult, second: CheckResult) -> CheckResult {
        use CheckResult::*;
        match (first, second) {
            (a, b) if a == b => a,
            (Satisfiable, Unsatisfiable) | (Unsatisfiable, Satisfiable) => {
                warn!("portfolio back-ends disagree");
                Conflicting
            }
            (definitive @ (Satisfiable | Unsatisfiable), _)
            | (_, definitive @ (Satisfiable | Unsatisfiable)) => definitive,
            (Unknown, _) | (_, Unknown) => Unknown,
            _ => Error,
        }
    }
}

impl<A: HornEngine, B: HornEngine> HornEngine for PortfolioEngine<A, B> {
    fn declare_variable(&mut self, name: &str, sort: &Sort) {
        self.primary.declare_variable(name, sort);
        self.secondary.declare_variable(name, sort);
    }

    fn register_relation(&mut self, name: &str, sort: &Sort) {
        self.primary.register_relation(name, sort);
        self.secondary.register_relation(name, sort);
    }

    fn add_rule(&mut self, rule: &SmtExpr, name: &str) {
        self.primary.add_rule(rule, name);
        self.secondary.add_rule(rule, name);
    }

    fn query(&mut self, query: &SmtExpr) -> (CheckResult, Vec<String>) {
        let (first, first_model) = self.primary.query(query);
        let (second, second_model) = self.secondary.query(query);
        let combined = Self::reconcile(first, second);
        debug!(%first, %second, %combined, "portfolio query");
        let model = match combined {
            result if result == first => first_model,
            _ => second_model,
        };
        (combined, model)
    }
}
