//! Symbolic layer of the solhorn model checker.
//!
//! This crate turns annotated AST fragments into SMT-LIB2 terms:
//!
//! - [`Sort`] — the logical types of variables and predicates;
//! - [`SmtExpr`] — sort-tagged SMT-LIB2 term strings with combinators;
//! - [`EncodingContext`] — SSA-indexed symbolic variables, the scoped
//!   solver stack and the accumulated path-local constraints;
//! - [`encoder`] — statement and expression encoding, reporting the
//!   `assert`/`require`/unknown calls it runs into as [`CallEvent`]s so the
//!   control-flow layer can react to them.
//!
//! The control-flow encoding itself (blocks, predicates, Horn rules) lives
//! in `solhorn-chc`; nothing here talks to a solver.

pub mod context;
pub mod encoder;
pub mod sort;
pub mod term;

pub use context::{EncodingContext, EncodingError, SymbolicVariable};
pub use encoder::{encode_expression, encode_return, encode_statement, init_function, CallEvent};
pub use sort::Sort;
pub use term::SmtExpr;
