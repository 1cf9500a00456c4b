//! SSA bookkeeping and the scoped constraint store.
//!
//! The context owns one [`SymbolicVariable`] per declaration, a stack of
//! solver scopes mirroring the block structure being encoded, and the path
//! conditions pushed by expression-level branching. All constraint
//! accumulation in the crate goes through it.

use crate::sort::Sort;
use crate::term::{sanitize_smt_identifier, SmtExpr};
use solhorn_ast::{NodeId, TypeName, VariableDeclaration};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::trace;

/// Largest value of `uint256`.
const UINT256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";
/// Largest value of `address` (160 bits).
const ADDRESS_MAX: &str = "1461501637330902918203684832716283019655932542975";
/// Bounds of `int256`.
const INT256_MIN: &str =
    "-57896044618658097711785492504343953926634992332820282019728792003956564819968";
const INT256_MAX: &str =
    "57896044618658097711785492504343953926634992332820282019728792003956564819967";

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("no symbolic variable for declaration {0}")]
    UnknownVariable(NodeId),
    #[error("solver scope stack underflow")]
    ScopeUnderflow,
    #[error("path condition stack underflow")]
    PathConditionUnderflow,
    #[error("assignment target is not a variable or single index access")]
    UnsupportedAssignment,
    #[error("control-flow statement reached the expression encoder")]
    ControlFlowStatement,
}

/// A declaration's current SSA incarnation.
///
/// The unique name embeds the declaration's node id, so shadowing names in
/// different scopes (or different contracts) never collide; the SSA index
/// is appended on top of that.
#[derive(Debug, Clone)]
pub struct SymbolicVariable {
    unique_name: String,
    ty: TypeName,
    sort: Sort,
    index: usize,
}

impl SymbolicVariable {
    fn new(decl: &VariableDeclaration) -> Self {
        Self {
            unique_name: sanitize_smt_identifier(&format!("{}_{}", decl.name, decl.id)),
            ty: decl.ty.clone(),
            sort: Sort::from_type(&decl.ty),
            index: 0,
        }
    }

    /// SSA-qualified name of the current incarnation.
    pub fn current_name(&self) -> String {
        format!("{}_{}", self.unique_name, self.index)
    }

    pub fn current_value(&self) -> SmtExpr {
        SmtExpr::new(self.current_name(), self.sort.clone())
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn ty(&self) -> &TypeName {
        &self.ty
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn increase_index(&mut self) {
        self.index += 1;
    }
}

/// Range constraint of an integer-like type over `value`, if any.
fn range_constraint(value: &SmtExpr, ty: &TypeName) -> Option<SmtExpr> {
    let (min, max) = match ty {
        TypeName::Uint256 => (SmtExpr::int_lit("0"), SmtExpr::int_lit(UINT256_MAX)),
        TypeName::Address => (SmtExpr::int_lit("0"), SmtExpr::int_lit(ADDRESS_MAX)),
        TypeName::Int256 => (SmtExpr::int_lit(INT256_MIN), SmtExpr::int_lit(INT256_MAX)),
        _ => return None,
    };
    Some(min.le(value).and(&value.le(&max)))
}

#[derive(Debug, Default)]
pub struct EncodingContext {
    variables: BTreeMap<NodeId, SymbolicVariable>,
    /// Constraint scopes; the base scope is always present.
    scopes: Vec<Vec<SmtExpr>>,
    path_conditions: Vec<SmtExpr>,
    /// Variable incarnations not yet declared to the Horn engine. The
    /// control-flow layer drains these before emitting rules.
    pending_declarations: Vec<(String, Sort)>,
}

impl EncodingContext {
    pub fn new() -> Self {
        Self {
            variables: BTreeMap::new(),
            scopes: vec![Vec::new()],
            path_conditions: Vec::new(),
            pending_declarations: Vec::new(),
        }
    }

    /// Drop all per-contract state. Called between contracts.
    pub fn reset(&mut self) {
        self.variables.clear();
        self.scopes = vec![Vec::new()];
        self.path_conditions.clear();
        self.pending_declarations.clear();
    }

    // ---- variables ----

    pub fn has_variable(&self, decl: NodeId) -> bool {
        self.variables.contains_key(&decl)
    }

    /// Create the symbolic counterpart of `decl`. Existing state is
    /// replaced, which only happens when a contract is re-analyzed.
    pub fn create_variable(&mut self, decl: &VariableDeclaration) {
        let var = SymbolicVariable::new(decl);
        self.pending_declarations
            .push((var.current_name(), var.sort.clone()));
        trace!(name = %var.current_name(), "created symbolic variable");
        self.variables.insert(decl.id, var);
    }

    pub fn variable(&self, decl: NodeId) -> Result<&SymbolicVariable, EncodingError> {
        self.variables
            .get(&decl)
            .ok_or(EncodingError::UnknownVariable(decl))
    }

    pub fn current_value(&self, decl: NodeId) -> Result<SmtExpr, EncodingError> {
        Ok(self.variable(decl)?.current_value())
    }

    /// Advance `decl` to a fresh incarnation and return its value. The new
    /// incarnation is left unconstrained.
    pub fn increase_index(&mut self, decl: NodeId) -> Result<SmtExpr, EncodingError> {
        let var = self
            .variables
            .get_mut(&decl)
            .ok_or(EncodingError::UnknownVariable(decl))?;
        var.increase_index();
        let value = var.current_value();
        let sort = var.sort.clone();
        self.pending_declarations.push((value.text.clone(), sort));
        Ok(value)
    }

    /// SSA assignment: fresh incarnation constrained to equal `value`.
    pub fn assign(&mut self, decl: NodeId, value: &SmtExpr) -> Result<SmtExpr, EncodingError> {
        let new = self.increase_index(decl)?;
        self.add_assertion(new.eq(value));
        Ok(new)
    }

    /// Constrain the current incarnation to its type's zero value.
    pub fn set_zero_value(&mut self, decl: NodeId) -> Result<(), EncodingError> {
        let var = self.variable(decl)?;
        let zero = SmtExpr::zero_of(var.sort());
        let constraint = var.current_value().eq(&zero);
        self.add_assertion(constraint);
        Ok(())
    }

    /// Leave the current incarnation unconstrained except for its type
    /// range.
    pub fn set_unknown_value(&mut self, decl: NodeId) -> Result<(), EncodingError> {
        let var = self.variable(decl)?;
        if let Some(range) = range_constraint(&var.current_value(), var.ty()) {
            self.add_assertion(range);
        }
        Ok(())
    }

    /// A symbolic value not backed by a declaration, keyed by the node
    /// that produced it (havocked call results). Unconstrained except for
    /// its type range; re-encountering the node yields a fresh
    /// incarnation.
    pub fn create_synthetic(
        &mut self,
        id: NodeId,
        name: &str,
        ty: &TypeName,
    ) -> Result<SmtExpr, EncodingError> {
        if self.has_variable(id) {
            self.increase_index(id)?;
        } else {
            let var = SymbolicVariable {
                unique_name: sanitize_smt_identifier(&format!("{name}_{id}")),
                ty: ty.clone(),
                sort: Sort::from_type(ty),
                index: 0,
            };
            self.pending_declarations
                .push((var.current_name(), var.sort.clone()));
            self.variables.insert(id, var);
        }
        self.set_unknown_value(id)?;
        self.current_value(id)
    }

    /// Havoc every variable accepted by `filter`: fresh incarnation, only
    /// range-constrained. This is the erase-knowledge primitive.
    pub fn reset_variables(
        &mut self,
        filter: impl Fn(NodeId, &SymbolicVariable) -> bool,
    ) -> Result<(), EncodingError> {
        let targets: Vec<NodeId> = self
            .variables
            .iter()
            .filter(|(id, var)| filter(**id, var))
            .map(|(id, _)| *id)
            .collect();
        for id in targets {
            self.increase_index(id)?;
            self.set_unknown_value(id)?;
        }
        Ok(())
    }

    // ---- constraint scopes ----

    pub fn add_assertion(&mut self, constraint: SmtExpr) {
        // The base scope always exists.
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(constraint);
        }
    }

    /// Conjunction of the constraints accumulated on the current scope.
    pub fn assertions(&self) -> SmtExpr {
        match self.scopes.last() {
            Some(scope) => SmtExpr::conjunction(scope),
            None => SmtExpr::true_(),
        }
    }

    pub fn push_solver(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn pop_solver(&mut self) -> Result<(), EncodingError> {
        if self.scopes.len() <= 1 {
            return Err(EncodingError::ScopeUnderflow);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Number of scopes above the base scope; mirrors the path stack.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len() - 1
    }

    // ---- path conditions ----

    pub fn push_path_condition(&mut self, condition: SmtExpr) {
        self.path_conditions.push(condition);
    }

    pub fn pop_path_condition(&mut self) -> Result<(), EncodingError> {
        self.path_conditions
            .pop()
            .map(|_| ())
            .ok_or(EncodingError::PathConditionUnderflow)
    }

    pub fn current_path_conditions(&self) -> SmtExpr {
        SmtExpr::conjunction(&self.path_conditions)
    }

    // ---- engine hand-off ----

    /// Variable incarnations created since the last drain, in creation
    /// order. The caller forwards them to the Horn engine.
    pub fn take_pending_declarations(&mut self) -> Vec<(String, Sort)> {
        std::mem::take(&mut self.pending_declarations)
    }
}
