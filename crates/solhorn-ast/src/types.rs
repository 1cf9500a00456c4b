//! Type and kind annotations attached to AST nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a variable or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Bool,
    /// Unsigned 256-bit integer.
    Uint256,
    /// Signed 256-bit integer.
    Int256,
    /// Account address, modeled as an unbounded integer.
    Address,
    Mapping {
        key: Box<TypeName>,
        value: Box<TypeName>,
    },
    /// Dynamically sized array with integer indices.
    Array {
        element: Box<TypeName>,
    },
    /// Function-typed variable. The Horn back-end cannot quantify over
    /// these, so the sort catalogue degrades them to `Int`.
    Function,
}

impl TypeName {
    pub fn mapping(key: TypeName, value: TypeName) -> Self {
        TypeName::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn array(element: TypeName) -> Self {
        TypeName::Array {
            element: Box::new(element),
        }
    }

    /// Reference and mapping types share storage aliasing, so knowledge
    /// about them is erased together with state variables.
    pub fn is_reference_or_mapping(&self) -> bool {
        matches!(self, TypeName::Mapping { .. } | TypeName::Array { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeName::Uint256 | TypeName::Int256 | TypeName::Address
        )
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Bool => write!(f, "bool"),
            TypeName::Uint256 => write!(f, "uint256"),
            TypeName::Int256 => write!(f, "int256"),
            TypeName::Address => write!(f, "address"),
            TypeName::Mapping { key, value } => write!(f, "mapping({key} => {value})"),
            TypeName::Array { element } => write!(f, "{element}[]"),
            TypeName::Function => write!(f, "function"),
        }
    }
}

/// Declaration visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

/// What a contract-level definition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Contract,
    Library,
    Interface,
}

/// Role of a function within its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Regular,
    Constructor,
    Fallback,
}

/// Discriminates what a call expression invokes.
///
/// Everything except [`Assert`](FunctionCallKind::Assert) and
/// [`Require`](FunctionCallKind::Require) is outside the encoded fragment
/// and collapses knowledge about state when it is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionCallKind {
    Assert,
    Require,
    Internal,
    External,
    DelegateCall,
    BareCall,
    BareCallCode,
    BareDelegateCall,
    BareStaticCall,
    Creation,
    Keccak256,
    EcRecover,
    Sha256,
    Ripemd160,
    BlockHash,
    AddMod,
    MulMod,
}

impl FunctionCallKind {
    /// Whether the effects of the call cannot be modeled, forcing the
    /// checker to havoc state and reference-typed variables.
    pub fn erases_knowledge(&self) -> bool {
        !matches!(self, FunctionCallKind::Assert | FunctionCallKind::Require)
    }
}

/// Binary operators on annotated expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    /// Operators whose result is `bool` regardless of operand type.
    pub fn is_boolean(&self) -> bool {
        !matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Negate,
}

/// Assignment flavor; compound operators fold the binary operation into
/// the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
}

impl AssignmentOperator {
    /// The binary operator folded into a compound assignment.
    pub fn folded(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubAssign => Some(BinaryOperator::Sub),
            AssignmentOperator::MulAssign => Some(BinaryOperator::Mul),
        }
    }
}
