//! Sorts of the block predicates of one contract.

use solhorn_ast::{FunctionDefinition, NodeId, VariableDeclaration};
use solhorn_smt::Sort;
use std::collections::HashMap;

/// Builds and memoizes the predicate sorts of a contract analysis.
///
/// The interface relation ranges over the contract's state variables; a
/// function-entry relation extends that with parameters and returns; a
/// body relation further extends it with the function's locals.
#[derive(Debug, Default)]
pub struct SortCatalogue {
    state_sorts: Vec<Sort>,
    node_sorts: HashMap<NodeId, Sort>,
}

impl SortCatalogue {
    /// Catalogue for a contract with the given (inherited-inclusive) state
    /// variables. Function-typed state variables degrade to `Int` inside
    /// [`Sort::from_type`]; the Horn back-end cannot quantify over them.
    pub fn new(state_variables: &[VariableDeclaration]) -> Self {
        Self {
            state_sorts: state_variables
                .iter()
                .map(|v| Sort::from_type(&v.ty))
                .collect(),
            node_sorts: HashMap::new(),
        }
    }

    pub fn state_sorts(&self) -> &[Sort] {
        &self.state_sorts
    }

    /// `(state-sorts) → Bool`
    pub fn interface_sort(&self) -> Sort {
        Sort::predicate(self.state_sorts.clone())
    }

    /// `() → Bool`; the error relation carries no data.
    pub fn error_sort(&self) -> Sort {
        Sort::predicate(vec![])
    }

    /// Sort of the synthesized constructor block. A written constructor is
    /// encoded as a regular function and never asks for this.
    pub fn constructor_sort(&self) -> Sort {
        Sort::predicate(vec![])
    }

    /// `(state ++ params ++ returns) → Bool`, memoized per function.
    pub fn function_sort(&mut self, function: &FunctionDefinition) -> Sort {
        if let Some(sort) = self.node_sorts.get(&function.id) {
            return sort.clone();
        }
        let mut domain = self.state_sorts.clone();
        for var in function.parameters.iter().chain(&function.return_parameters) {
            domain.push(Sort::from_type(&var.ty));
        }
        let sort = Sort::predicate(domain);
        self.node_sorts.insert(function.id, sort.clone());
        sort
    }

    /// `(state ++ params ++ returns ++ locals) → Bool`, memoized per body.
    /// Every block inside the function body shares this sort.
    pub fn body_sort(&mut self, function: &FunctionDefinition) -> Sort {
        let key = function.body.as_ref().map(|b| b.id).unwrap_or(function.id);
        if let Some(sort) = self.node_sorts.get(&key) {
            return sort.clone();
        }
        let mut domain = self.function_sort(function).domain().to_vec();
        for local in function.local_variables() {
            domain.push(Sort::from_type(&local.ty));
        }
        let sort = Sort::predicate(domain);
        self.node_sorts.insert(key, sort.clone());
        sort
    }
}
