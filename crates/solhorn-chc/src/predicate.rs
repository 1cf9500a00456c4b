//! Versioned block predicates and their registry.
//!
//! A block predicate is an uninterpreted Boolean relation over the
//! variables live in its block. Re-entering a block under a new state
//! snapshot does not create a new symbol; the existing one is re-indexed,
//! and the engine sees each index as a distinct relation.

use crate::engine::HornEngine;
use solhorn_ast::NodeId;
use solhorn_smt::term::sanitize_smt_identifier;
use solhorn_smt::{Sort, SmtExpr};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("no predicate registered for node {0}")]
    Missing(NodeId),
    #[error("predicate {name} applied to arguments of the wrong sort: expected {expected}, got {got}")]
    SortMismatch {
        name: String,
        expected: String,
        got: String,
    },
}

/// A named, versioned uninterpreted relation.
#[derive(Debug, Clone)]
pub struct PredicateSymbol {
    name: String,
    sort: Sort,
    index: usize,
}

impl PredicateSymbol {
    /// Create the symbol at index 0 and register that version with the
    /// engine.
    pub fn new(name: &str, sort: Sort, engine: &mut dyn HornEngine) -> Self {
        let symbol = Self {
            name: sanitize_smt_identifier(name),
            sort,
            index: 0,
        };
        engine.register_relation(&symbol.current_name(), &symbol.sort);
        symbol
    }

    /// SSA-qualified name of the current version.
    pub fn current_name(&self) -> String {
        self.name_at(self.index)
    }

    pub fn name_at(&self, index: usize) -> String {
        format!("{}_{}", self.name, index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Move to the next version and register it with the engine.
    pub fn increase_index(&mut self, engine: &mut dyn HornEngine) {
        self.index += 1;
        engine.register_relation(&self.current_name(), &self.sort);
    }

    /// Apply the current version to `args`, checking them against the
    /// declared domain.
    pub fn apply(&self, args: &[SmtExpr]) -> Result<SmtExpr, PredicateError> {
        self.apply_at(self.index, args)
    }

    /// Apply a specific version to `args`. Used for the error relation,
    /// whose old versions remain query targets, and for branch joins.
    pub fn apply_at(&self, index: usize, args: &[SmtExpr]) -> Result<SmtExpr, PredicateError> {
        let domain = self.sort.domain();
        let sorts_match = domain.len() == args.len()
            && domain.iter().zip(args.iter()).all(|(d, a)| *d == a.sort);
        if !sorts_match {
            let got: Vec<String> = args.iter().map(|a| a.sort.to_smt_string()).collect();
            let expected: Vec<String> = domain.iter().map(Sort::to_smt_string).collect();
            return Err(PredicateError::SortMismatch {
                name: self.current_name(),
                expected: expected.join(" "),
                got: got.join(" "),
            });
        }
        let name = self.name_at(index);
        let text = if args.is_empty() {
            name
        } else {
            let args: Vec<&str> = args.iter().map(|a| a.text.as_str()).collect();
            format!("({} {})", name, args.join(" "))
        };
        Ok(SmtExpr::new(text, Sort::Bool))
    }
}

/// Owner of all node-keyed block predicates of one contract analysis.
///
/// Predicates are keyed by the identity of the AST node that spawned the
/// block, which makes the reference structure a plain map even though the
/// emitted logic is cyclic.
#[derive(Debug, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<NodeId, PredicateSymbol>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all predicates; called between contracts.
    pub fn reset(&mut self) {
        self.predicates.clear();
    }

    pub fn contains(&self, key: NodeId) -> bool {
        self.predicates.contains_key(&key)
    }

    pub fn get(&self, key: NodeId) -> Result<&PredicateSymbol, PredicateError> {
        self.predicates.get(&key).ok_or(PredicateError::Missing(key))
    }

    /// Create a new predicate for `key`, registering version 0.
    pub fn fresh(&mut self, key: NodeId, sort: Sort, name: &str, engine: &mut dyn HornEngine) {
        let symbol = PredicateSymbol::new(name, sort, engine);
        self.predicates.insert(key, symbol);
    }

    /// Advance the predicate at `key` to a fresh version, registering it.
    /// Returns the new index.
    pub fn bump(
        &mut self,
        key: NodeId,
        engine: &mut dyn HornEngine,
    ) -> Result<usize, PredicateError> {
        let symbol = self
            .predicates
            .get_mut(&key)
            .ok_or(PredicateError::Missing(key))?;
        symbol.increase_index(engine);
        Ok(symbol.index())
    }

    /// `fresh` on first sight of `key`, `bump` afterwards. This is how
    /// function and body blocks are (re-)created.
    pub fn create_or_bump(
        &mut self,
        key: NodeId,
        sort: Sort,
        name: &str,
        engine: &mut dyn HornEngine,
    ) -> Result<usize, PredicateError> {
        if self.contains(key) {
            self.bump(key, engine)
        } else {
            self.fresh(key, sort, name, engine);
            Ok(0)
        }
    }

    /// Apply the current version of the predicate at `key`.
    pub fn apply(&self, key: NodeId, args: &[SmtExpr]) -> Result<SmtExpr, PredicateError> {
        self.get(key)?.apply(args)
    }

    /// Apply a pinned version of the predicate at `key`.
    pub fn apply_at(
        &self,
        key: NodeId,
        index: usize,
        args: &[SmtExpr],
    ) -> Result<SmtExpr, PredicateError> {
        self.get(key)?.apply_at(index, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingEngine;

    #[test]
    fn versions_are_distinct_relations() {
        let mut engine = RecordingEngine::new();
        let mut registry = PredicateRegistry::new();
        let key = NodeId(7);
        registry.fresh(key, Sort::predicate(vec![Sort::Int]), "block_7", &mut engine);
        assert_eq!(registry.get(key).unwrap().current_name(), "block_7_0");

        let idx = registry.bump(key, &mut engine).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(registry.get(key).unwrap().current_name(), "block_7_1");
        assert_eq!(engine.relation_names(), vec!["block_7_0", "block_7_1"]);
    }

    #[test]
    fn application_checks_sorts() {
        let mut engine = RecordingEngine::new();
        let symbol =
            PredicateSymbol::new("p", Sort::predicate(vec![Sort::Int, Sort::Bool]), &mut engine);

        let ok = symbol
            .apply(&[
                SmtExpr::new("x", Sort::Int),
                SmtExpr::new("b", Sort::Bool),
            ])
            .unwrap();
        assert_eq!(ok.text, "(p_0 x b)");
        assert_eq!(ok.sort, Sort::Bool);

        let err = symbol.apply(&[SmtExpr::new("b", Sort::Bool), SmtExpr::new("x", Sort::Int)]);
        assert!(matches!(err, Err(PredicateError::SortMismatch { .. })));

        let err = symbol.apply(&[SmtExpr::new("x", Sort::Int)]);
        assert!(matches!(err, Err(PredicateError::SortMismatch { .. })));
    }

    #[test]
    fn nullary_application_is_bare_name() {
        let mut engine = RecordingEngine::new();
        let mut symbol = PredicateSymbol::new("error", Sort::predicate(vec![]), &mut engine);
        assert_eq!(symbol.apply(&[]).unwrap().text, "error_0");
        symbol.increase_index(&mut engine);
        assert_eq!(symbol.apply(&[]).unwrap().text, "error_1");
        assert_eq!(symbol.apply_at(1, &[]).unwrap().text, "error_1");
    }

    #[test]
    fn create_or_bump_reuses_symbol() {
        let mut engine = RecordingEngine::new();
        let mut registry = PredicateRegistry::new();
        let key = NodeId(3);
        let sort = Sort::predicate(vec![]);
        assert_eq!(
            registry
                .create_or_bump(key, sort.clone(), "f_3", &mut engine)
                .unwrap(),
            0
        );
        assert_eq!(
            registry.create_or_bump(key, sort, "f_3", &mut engine).unwrap(),
            1
        );
    }

    #[test]
    fn names_are_sanitized() {
        let mut engine = RecordingEngine::new();
        let symbol = PredicateSymbol::new("interface_C.v2_9", Sort::predicate(vec![]), &mut engine);
        assert_eq!(symbol.current_name(), "interface_C_v2_9_0");
    }
}
