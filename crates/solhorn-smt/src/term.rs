//! Sort-tagged SMT-LIB2 terms.
//!
//! Terms are carried as rendered SMT-LIB2 text plus the sort of the whole
//! term. The text is built from sanitized identifiers only, so it can be
//! embedded into rules and queries without further quoting.

use crate::sort::Sort;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SMT-LIB2 keywords and operators that must survive sanitization intact.
const SMT_KEYWORDS: &[&str] = &[
    "true", "false", "and", "or", "not", "=>", "=", ">", "<", ">=", "<=", "+", "-", "*", "/",
    "mod", "div", "ite", "select", "store", "as", "const", "forall", "exists", "Int", "Bool",
    "Array",
];

fn is_smt_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_numeric() || c == '-' || c == '.')
}

fn is_smt_keyword(token: &str) -> bool {
    SMT_KEYWORDS.contains(&token)
}

/// Make a name a valid SMT-LIB2 simple symbol: non-alphanumeric characters
/// become `_`, runs of `_` collapse, and a leading digit gets a prefix.
pub fn sanitize_smt_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.chars() {
        let c = if c.is_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' {
            if !last_was_underscore {
                result.push(c);
            }
            last_was_underscore = true;
        } else {
            result.push(c);
            last_was_underscore = false;
        }
    }
    if result.bytes().next().is_some_and(|b| b.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Split an S-expression into parens and atom tokens, applying `f` to each
/// atom. Used both for sanitizing and for free-variable discovery.
pub fn for_each_atom(expr: &str, mut f: impl FnMut(&str)) {
    let mut token = String::new();
    for c in expr.chars() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if !token.is_empty() {
                f(&token);
                token.clear();
            }
        } else {
            token.push(c);
        }
    }
    if !token.is_empty() {
        f(&token);
    }
}

/// Sanitize every identifier inside an S-expression, leaving structure,
/// numbers and keywords alone.
pub fn sanitize_smt_expr(expr: &str) -> String {
    if !expr.contains(' ') && !expr.contains('(') {
        if is_smt_number(expr) || is_smt_keyword(expr) {
            return expr.to_string();
        }
        return sanitize_smt_identifier(expr);
    }

    let mut result = String::with_capacity(expr.len());
    let mut token = String::new();
    for c in expr.chars() {
        if c == '(' || c == ')' || c == ' ' {
            if !token.is_empty() {
                if is_smt_number(&token) || is_smt_keyword(&token) {
                    result.push_str(&token);
                } else {
                    result.push_str(&sanitize_smt_identifier(&token));
                }
                token.clear();
            }
            result.push(c);
        } else {
            token.push(c);
        }
    }
    if !token.is_empty() {
        if is_smt_number(&token) || is_smt_keyword(&token) {
            result.push_str(&token);
        } else {
            result.push_str(&sanitize_smt_identifier(&token));
        }
    }
    result
}

/// A rendered SMT-LIB2 term together with its sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtExpr {
    pub text: String,
    pub sort: Sort,
}

impl SmtExpr {
    pub fn new(text: impl Into<String>, sort: Sort) -> Self {
        Self {
            text: text.into(),
            sort,
        }
    }

    pub fn symbol(name: &str, sort: Sort) -> Self {
        Self::new(sanitize_smt_identifier(name), sort)
    }

    pub fn true_() -> Self {
        Self::new("true", Sort::Bool)
    }

    pub fn false_() -> Self {
        Self::new("false", Sort::Bool)
    }

    pub fn is_true(&self) -> bool {
        self.text == "true"
    }

    /// Integer literal from a decimal string; negative values render as a
    /// unary minus application as SMT-LIB2 requires.
    pub fn int_lit(value: &str) -> Self {
        let text = match value.strip_prefix('-') {
            Some(abs) => format!("(- {abs})"),
            None => value.to_string(),
        };
        Self::new(text, Sort::Int)
    }

    /// The zero value of a first-order sort, used for default-initialized
    /// variables.
    pub fn zero_of(sort: &Sort) -> Self {
        match sort {
            Sort::Int => Self::new("0", Sort::Int),
            Sort::Bool => Self::false_(),
            Sort::Array { element, .. } => {
                let zero = Self::zero_of(element);
                Self::new(
                    format!("((as const {}) {})", sort.to_smt_string(), zero.text),
                    sort.clone(),
                )
            }
            Sort::Function { .. } => Self::new("0", Sort::Int),
        }
    }

    fn unary(op: &str, a: &SmtExpr, sort: Sort) -> Self {
        Self::new(format!("({op} {})", a.text), sort)
    }

    fn binary(op: &str, a: &SmtExpr, b: &SmtExpr, sort: Sort) -> Self {
        Self::new(format!("({op} {} {})", a.text, b.text), sort)
    }

    pub fn not(&self) -> Self {
        Self::unary("not", self, Sort::Bool)
    }

    pub fn and(&self, other: &Self) -> Self {
        // Skipping `true` conjuncts keeps emitted rules readable.
        if self.is_true() {
            return other.clone();
        }
        if other.is_true() {
            return self.clone();
        }
        Self::binary("and", self, other, Sort::Bool)
    }

    pub fn or(&self, other: &Self) -> Self {
        Self::binary("or", self, other, Sort::Bool)
    }

    pub fn implies(&self, other: &Self) -> Self {
        Self::binary("=>", self, other, Sort::Bool)
    }

    pub fn eq(&self, other: &Self) -> Self {
        Self::binary("=", self, other, Sort::Bool)
    }

    pub fn neq(&self, other: &Self) -> Self {
        self.eq(other).not()
    }

    pub fn lt(&self, other: &Self) -> Self {
        Self::binary("<", self, other, Sort::Bool)
    }

    pub fn le(&self, other: &Self) -> Self {
        Self::binary("<=", self, other, Sort::Bool)
    }

    pub fn gt(&self, other: &Self) -> Self {
        Self::binary(">", self, other, Sort::Bool)
    }

    pub fn ge(&self, other: &Self) -> Self {
        Self::binary(">=", self, other, Sort::Bool)
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::binary("+", self, other, Sort::Int)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::binary("-", self, other, Sort::Int)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::binary("*", self, other, Sort::Int)
    }

    pub fn div(&self, other: &Self) -> Self {
        Self::binary("div", self, other, Sort::Int)
    }

    pub fn modulo(&self, other: &Self) -> Self {
        Self::binary("mod", self, other, Sort::Int)
    }

    pub fn neg(&self) -> Self {
        Self::unary("-", self, Sort::Int)
    }

    pub fn ite(&self, then: &Self, otherwise: &Self) -> Self {
        Self::new(
            format!("(ite {} {} {})", self.text, then.text, otherwise.text),
            then.sort.clone(),
        )
    }

    pub fn select(&self, index: &Self) -> Self {
        let element = match &self.sort {
            Sort::Array { element, .. } => (**element).clone(),
            // Selecting from a non-array is caught by the sort checks on
            // predicate application; keep the term printable.
            other => other.clone(),
        };
        Self::new(format!("(select {} {})", self.text, index.text), element)
    }

    pub fn store(&self, index: &Self, value: &Self) -> Self {
        Self::new(
            format!("(store {} {} {})", self.text, index.text, value.text),
            self.sort.clone(),
        )
    }

    /// Conjunction of a slice: empty is `true`, singletons stay bare,
    /// `true` conjuncts are dropped.
    pub fn conjunction(parts: &[SmtExpr]) -> Self {
        let parts: Vec<&SmtExpr> = parts.iter().filter(|p| !p.is_true()).collect();
        match parts.len() {
            0 => Self::true_(),
            1 => parts[0].clone(),
            _ => {
                let texts: Vec<&str> = parts.iter().map(|p| p.text.as_str()).collect();
                Self::new(format!("(and {})", texts.join(" ")), Sort::Bool)
            }
        }
    }
}

impl fmt::Display for SmtExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
