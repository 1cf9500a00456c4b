//! The node tree: source units, contracts, functions, statements and
//! expressions.

use crate::types::{
    AssignmentOperator, BinaryOperator, ContractKind, FunctionCallKind, FunctionKind, TypeName,
    UnaryOperator, Visibility,
};
use crate::{NodeId, SourceLocation};
use serde::{Deserialize, Serialize};

/// A type-checked compilation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Whether the host opted the unit into model checking.
    pub checker_enabled: bool,
    pub contracts: Vec<ContractDefinition>,
}

impl SourceUnit {
    pub fn contract(&self, id: NodeId) -> Option<&ContractDefinition> {
        self.contracts.iter().find(|c| c.id == id)
    }

    /// State variables of `contract` including the ones inherited from its
    /// linearized bases, base-most first, restricted to variables visible
    /// to the derived contract.
    pub fn state_variables_including_inherited<'a>(
        &'a self,
        contract: &'a ContractDefinition,
    ) -> Vec<&'a VariableDeclaration> {
        let mut vars = Vec::new();
        for base_id in contract.linearized_bases.iter().rev() {
            if let Some(base) = self.contract(*base_id) {
                vars.extend(
                    base.state_variables
                        .iter()
                        .filter(|v| v.visibility != Visibility::Private),
                );
            }
        }
        vars.extend(contract.state_variables.iter());
        vars
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: ContractKind,
    /// C3-linearized base contracts, most derived first, excluding the
    /// contract itself.
    pub linearized_bases: Vec<NodeId>,
    pub state_variables: Vec<VariableDeclaration>,
    pub functions: Vec<FunctionDefinition>,
    pub location: SourceLocation,
}

impl ContractDefinition {
    pub fn is_library(&self) -> bool {
        self.kind == ContractKind::Library
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ContractKind::Interface
    }

    pub fn constructor(&self) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.is_constructor())
    }
}

/// A variable declaration: state variable, parameter, return parameter or
/// local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeName,
    pub visibility: Visibility,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub parameters: Vec<VariableDeclaration>,
    pub return_parameters: Vec<VariableDeclaration>,
    /// `None` for unimplemented (abstract) functions.
    pub body: Option<Block>,
    pub location: SourceLocation,
}

impl FunctionDefinition {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_implemented(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == FunctionKind::Fallback
    }

    /// All local variables declared anywhere in the body, in declaration
    /// order. They are part of the function's body-block sort, so the
    /// checker needs them up front.
    pub fn local_variables(&self) -> Vec<&VariableDeclaration> {
        let mut locals = Vec::new();
        if let Some(body) = &self.body {
            collect_locals_block(body, &mut locals);
        }
        locals
    }
}

fn collect_locals_block<'a>(block: &'a Block, out: &mut Vec<&'a VariableDeclaration>) {
    for stmt in &block.statements {
        collect_locals(stmt, out);
    }
}

fn collect_locals<'a>(stmt: &'a Statement, out: &mut Vec<&'a VariableDeclaration>) {
    match stmt {
        Statement::Block(block) => collect_locals_block(block, out),
        Statement::VariableDeclaration { decl, .. } => out.push(decl),
        Statement::If {
            true_branch,
            false_branch,
            ..
        } => {
            collect_locals(true_branch, out);
            if let Some(false_branch) = false_branch {
                collect_locals(false_branch, out);
            }
        }
        Statement::While { body, .. } => collect_locals(body, out),
        Statement::For {
            init, post, body, ..
        } => {
            if let Some(init) = init {
                collect_locals(init, out);
            }
            collect_locals(body, out);
            if let Some(post) = post {
                collect_locals(post, out);
            }
        }
        Statement::Expression { .. }
        | Statement::Return { .. }
        | Statement::Break { .. }
        | Statement::Continue { .. } => {}
    }
}

/// A `{ ... }` statement list. The function body is one of these and has
/// its own node identity, which the checker keys the body predicate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    Block(Block),
    VariableDeclaration {
        decl: VariableDeclaration,
        initial_value: Option<Expression>,
    },
    Expression {
        id: NodeId,
        expression: Expression,
        location: SourceLocation,
    },
    If {
        id: NodeId,
        condition: Expression,
        true_branch: Box<Statement>,
        false_branch: Option<Box<Statement>>,
        location: SourceLocation,
    },
    While {
        id: NodeId,
        condition: Expression,
        body: Box<Statement>,
        is_do_while: bool,
        location: SourceLocation,
    },
    For {
        id: NodeId,
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        post: Option<Box<Statement>>,
        body: Box<Statement>,
        location: SourceLocation,
    },
    Return {
        id: NodeId,
        values: Vec<Expression>,
        location: SourceLocation,
    },
    Break {
        id: NodeId,
        location: SourceLocation,
    },
    Continue {
        id: NodeId,
        location: SourceLocation,
    },
}

impl Statement {
    pub fn id(&self) -> NodeId {
        match self {
            Statement::Block(block) => block.id,
            Statement::VariableDeclaration { decl, .. } => decl.id,
            Statement::Expression { id, .. }
            | Statement::If { id, .. }
            | Statement::While { id, .. }
            | Statement::For { id, .. }
            | Statement::Return { id, .. }
            | Statement::Break { id, .. }
            | Statement::Continue { id, .. } => *id,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Block(block) => block.location,
            Statement::VariableDeclaration { decl, .. } => decl.location,
            Statement::Expression { location, .. }
            | Statement::If { location, .. }
            | Statement::While { location, .. }
            | Statement::For { location, .. }
            | Statement::Return { location, .. }
            | Statement::Break { location, .. }
            | Statement::Continue { location, .. } => *location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expression {
    BoolLiteral {
        id: NodeId,
        value: bool,
        location: SourceLocation,
    },
    /// Integer literal, kept as a decimal string so 256-bit values fit.
    NumberLiteral {
        id: NodeId,
        value: String,
        ty: TypeName,
        location: SourceLocation,
    },
    /// Resolved reference to a declaration.
    Identifier {
        id: NodeId,
        declaration: NodeId,
        name: String,
        ty: TypeName,
        location: SourceLocation,
    },
    UnaryOp {
        id: NodeId,
        op: UnaryOperator,
        operand: Box<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
    BinaryOp {
        id: NodeId,
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
    Assignment {
        id: NodeId,
        op: AssignmentOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
    /// Ternary `cond ? a : b`.
    Conditional {
        id: NodeId,
        condition: Box<Expression>,
        true_value: Box<Expression>,
        false_value: Box<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
    IndexAccess {
        id: NodeId,
        base: Box<Expression>,
        index: Box<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
    /// A call. The callee itself is abstracted away by the type checker;
    /// only its kind and the annotated result type survive.
    FunctionCall {
        id: NodeId,
        kind: FunctionCallKind,
        arguments: Vec<Expression>,
        ty: TypeName,
        location: SourceLocation,
    },
}

impl Expression {
    pub fn id(&self) -> NodeId {
        match self {
            Expression::BoolLiteral { id, .. }
            | Expression::NumberLiteral { id, .. }
            | Expression::Identifier { id, .. }
            | Expression::UnaryOp { id, .. }
            | Expression::BinaryOp { id, .. }
            | Expression::Assignment { id, .. }
            | Expression::Conditional { id, .. }
            | Expression::IndexAccess { id, .. }
            | Expression::FunctionCall { id, .. } => *id,
        }
    }

    pub fn ty(&self) -> TypeName {
        match self {
            Expression::BoolLiteral { .. } => TypeName::Bool,
            Expression::NumberLiteral { ty, .. }
            | Expression::Identifier { ty, .. }
            | Expression::UnaryOp { ty, .. }
            | Expression::BinaryOp { ty, .. }
            | Expression::Assignment { ty, .. }
            | Expression::Conditional { ty, .. }
            | Expression::IndexAccess { ty, .. }
            | Expression::FunctionCall { ty, .. } => ty.clone(),
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::BoolLiteral { location, .. }
            | Expression::NumberLiteral { location, .. }
            | Expression::Identifier { location, .. }
            | Expression::UnaryOp { location, .. }
            | Expression::BinaryOp { location, .. }
            | Expression::Assignment { location, .. }
            | Expression::Conditional { location, .. }
            | Expression::IndexAccess { location, .. }
            | Expression::FunctionCall { location, .. } => *location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstFactory;

    #[test]
    fn inherited_state_variables_visible_only() {
        let mut f = AstFactory::new();
        let base_pub = f.state_var("a", TypeName::Uint256, Visibility::Public);
        let base_priv = f.state_var("b", TypeName::Uint256, Visibility::Private);
        let own = f.state_var("c", TypeName::Uint256, Visibility::Internal);

        let base = f.contract("Base", vec![base_pub, base_priv], vec![]);
        let base_id = base.id;
        let mut derived = f.contract("Derived", vec![own], vec![]);
        derived.linearized_bases = vec![base_id];

        let unit = SourceUnit {
            checker_enabled: true,
            contracts: vec![base, derived],
        };
        let derived = unit.contracts.last().unwrap();
        let vars = unit.state_variables_including_inherited(derived);
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn locals_collected_across_nesting() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let y = f.var("y", TypeName::Bool);
        let decl_x = f.declare(x, None);
        let decl_y = f.declare(y, None);
        let cond = f.boolean(true);
        let then = f.block_stmt(vec![decl_y]);
        let inner = f.if_stmt(cond, then, None);
        let body = f.block(vec![decl_x, inner]);
        let func = f.function("g", vec![], vec![], body);
        let names: Vec<_> = func
            .local_variables()
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn unimplemented_function_has_no_body() {
        let mut f = AstFactory::new();
        let body = f.block(vec![]);
        let mut func = f.function("h", vec![], vec![], body);
        func.body = None;
        assert!(!func.is_implemented());
    }
}
