//! Logical sorts of symbolic variables and predicates.

use serde::{Deserialize, Serialize};
use solhorn_ast::TypeName;
use std::fmt;

/// An SMT sort. `Function` sorts only ever describe predicates and never
/// appear as the sort of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sort {
    Bool,
    Int,
    Array {
        index: Box<Sort>,
        element: Box<Sort>,
    },
    Function {
        domain: Vec<Sort>,
        range: Box<Sort>,
    },
}

impl Sort {
    pub fn array(index: Sort, element: Sort) -> Self {
        Sort::Array {
            index: Box::new(index),
            element: Box::new(element),
        }
    }

    /// A Boolean-valued function sort, the shape of every block predicate.
    pub fn predicate(domain: Vec<Sort>) -> Self {
        Sort::Function {
            domain,
            range: Box::new(Sort::Bool),
        }
    }

    /// The declared type of an AST entity as a sort.
    ///
    /// The Horn back-end cannot handle function-typed values, so those
    /// degrade to `Int`; addresses and both integer flavors are unbounded
    /// integers with range constraints added at havoc time.
    pub fn from_type(ty: &TypeName) -> Self {
        match ty {
            TypeName::Bool => Sort::Bool,
            TypeName::Uint256 | TypeName::Int256 | TypeName::Address | TypeName::Function => {
                Sort::Int
            }
            TypeName::Mapping { key, value } => {
                Sort::array(Sort::from_type(key), Sort::from_type(value))
            }
            TypeName::Array { element } => Sort::array(Sort::Int, Sort::from_type(element)),
        }
    }

    pub fn domain(&self) -> &[Sort] {
        match self {
            Sort::Function { domain, .. } => domain,
            _ => &[],
        }
    }

    /// SMT-LIB2 rendering of a first-order sort, e.g. `(Array Int Int)`.
    pub fn to_smt_string(&self) -> String {
        match self {
            Sort::Bool => "Bool".to_string(),
            Sort::Int => "Int".to_string(),
            Sort::Array { index, element } => {
                format!(
                    "(Array {} {})",
                    index.to_smt_string(),
                    element.to_smt_string()
                )
            }
            // Function sorts are rendered where they are declared; this
            // form only shows up in diagnostics.
            Sort::Function { domain, range } => {
                let domain: Vec<String> = domain.iter().map(Sort::to_smt_string).collect();
                format!("({}) {}", domain.join(" "), range.to_smt_string())
            }
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_smt_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smt_rendering() {
        assert_eq!(Sort::Bool.to_smt_string(), "Bool");
        assert_eq!(Sort::Int.to_smt_string(), "Int");
        assert_eq!(
            Sort::array(Sort::Int, Sort::Bool).to_smt_string(),
            "(Array Int Bool)"
        );
        assert_eq!(
            Sort::array(Sort::Int, Sort::array(Sort::Int, Sort::Int)).to_smt_string(),
            "(Array Int (Array Int Int))"
        );
    }

    #[test]
    fn type_lowering() {
        assert_eq!(Sort::from_type(&TypeName::Bool), Sort::Bool);
        assert_eq!(Sort::from_type(&TypeName::Uint256), Sort::Int);
        assert_eq!(Sort::from_type(&TypeName::Address), Sort::Int);
        assert_eq!(Sort::from_type(&TypeName::Function), Sort::Int);
        assert_eq!(
            Sort::from_type(&TypeName::mapping(TypeName::Address, TypeName::Uint256)),
            Sort::array(Sort::Int, Sort::Int)
        );
        assert_eq!(
            Sort::from_type(&TypeName::array(TypeName::Bool)),
            Sort::array(Sort::Int, Sort::Bool)
        );
    }

    #[test]
    fn predicate_domain() {
        let p = Sort::predicate(vec![Sort::Int, Sort::Bool]);
        assert_eq!(p.domain(), &[Sort::Int, Sort::Bool]);
        assert!(Sort::Int.domain().is_empty());
    }

    #[test]
    fn serialization_round_trip() {
        let s = Sort::predicate(vec![Sort::Int, Sort::array(Sort::Int, Sort::Int)]);
        let json = serde_json::to_string(&s).unwrap();
        let back: Sort = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
