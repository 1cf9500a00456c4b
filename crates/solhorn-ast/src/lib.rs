//! Annotated AST for the solhorn model checker.
//!
//! The checker does not parse source text. Hosts hand it a tree of
//! contract, function, statement and expression nodes that has already been
//! type-checked: every expression carries its type, every identifier points
//! at its declaration, and every node has a stable identity.
//!
//! Nodes are plain sum types dispatched with `match`; there is no visitor
//! machinery. [`AstFactory`] builds well-formed trees with unique node ids
//! and is what the test suites use in place of a parser.

mod builder;
mod nodes;
mod types;

pub use builder::AstFactory;
pub use nodes::{
    Block, ContractDefinition, Expression, FunctionDefinition, SourceUnit, Statement,
    VariableDeclaration,
};
pub use types::{
    AssignmentOperator, BinaryOperator, ContractKind, FunctionCallKind, FunctionKind, TypeName,
    UnaryOperator, Visibility,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of an AST node.
///
/// Ids are unique within a [`SourceUnit`] and are embedded into predicate
/// names by the checker, so two nodes must never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte range of a node in the original source, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
