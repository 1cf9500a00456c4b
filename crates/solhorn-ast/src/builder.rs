//! Programmatic construction of annotated trees.
//!
//! The factory owns the node-id counter and fills in the type annotations a
//! front end would normally compute, which keeps test fixtures short.

use crate::nodes::{
    Block, ContractDefinition, Expression, FunctionDefinition, SourceUnit, Statement,
    VariableDeclaration,
};
use crate::types::{
    AssignmentOperator, BinaryOperator, ContractKind, FunctionCallKind, FunctionKind, TypeName,
    UnaryOperator, Visibility,
};
use crate::{NodeId, SourceLocation};

#[derive(Debug, Default)]
pub struct AstFactory {
    next_id: u32,
}

impl AstFactory {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    // ---- declarations ----

    pub fn var(&mut self, name: impl Into<String>, ty: TypeName) -> VariableDeclaration {
        self.state_var(name, ty, Visibility::Internal)
    }

    pub fn state_var(
        &mut self,
        name: impl Into<String>,
        ty: TypeName,
        visibility: Visibility,
    ) -> VariableDeclaration {
        VariableDeclaration {
            id: self.next_id(),
            name: name.into(),
            ty,
            visibility,
            location: SourceLocation::default(),
        }
    }

    // ---- expressions ----

    pub fn ident(&mut self, decl: &VariableDeclaration) -> Expression {
        Expression::Identifier {
            id: self.next_id(),
            declaration: decl.id,
            name: decl.name.clone(),
            ty: decl.ty.clone(),
            location: SourceLocation::default(),
        }
    }

    pub fn boolean(&mut self, value: bool) -> Expression {
        Expression::BoolLiteral {
            id: self.next_id(),
            value,
            location: SourceLocation::default(),
        }
    }

    pub fn uint(&mut self, value: u64) -> Expression {
        self.number(value.to_string(), TypeName::Uint256)
    }

    pub fn number(&mut self, value: impl Into<String>, ty: TypeName) -> Expression {
        Expression::NumberLiteral {
            id: self.next_id(),
            value: value.into(),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn unary(&mut self, op: UnaryOperator, operand: Expression) -> Expression {
        let ty = match op {
            UnaryOperator::Not => TypeName::Bool,
            UnaryOperator::Negate => operand.ty(),
        };
        Expression::UnaryOp {
            id: self.next_id(),
            op,
            operand: Box::new(operand),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn binary(&mut self, op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        let ty = if op.is_boolean() {
            TypeName::Bool
        } else {
            left.ty()
        };
        Expression::BinaryOp {
            id: self.next_id(),
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn assign(&mut self, lhs: Expression, rhs: Expression) -> Expression {
        self.compound_assign(AssignmentOperator::Assign, lhs, rhs)
    }

    pub fn compound_assign(
        &mut self,
        op: AssignmentOperator,
        lhs: Expression,
        rhs: Expression,
    ) -> Expression {
        let ty = lhs.ty();
        Expression::Assignment {
            id: self.next_id(),
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn conditional(
        &mut self,
        condition: Expression,
        true_value: Expression,
        false_value: Expression,
    ) -> Expression {
        let ty = true_value.ty();
        Expression::Conditional {
            id: self.next_id(),
            condition: Box::new(condition),
            true_value: Box::new(true_value),
            false_value: Box::new(false_value),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn index(&mut self, base: Expression, index: Expression) -> Expression {
        let ty = match base.ty() {
            TypeName::Mapping { value, .. } => *value,
            TypeName::Array { element } => *element,
            other => other,
        };
        Expression::IndexAccess {
            id: self.next_id(),
            base: Box::new(base),
            index: Box::new(index),
            ty,
            location: SourceLocation::default(),
        }
    }

    pub fn call(
        &mut self,
        kind: FunctionCallKind,
        arguments: Vec<Expression>,
        ty: TypeName,
    ) -> Expression {
        Expression::FunctionCall {
            id: self.next_id(),
            kind,
            arguments,
            ty,
            location: SourceLocation::default(),
        }
    }

    // ---- statements ----

    pub fn expr_stmt(&mut self, expression: Expression) -> Statement {
        Statement::Expression {
            id: self.next_id(),
            expression,
            location: SourceLocation::default(),
        }
    }

    pub fn assert_stmt(&mut self, condition: Expression) -> Statement {
        let call = self.call(FunctionCallKind::Assert, vec![condition], TypeName::Bool);
        self.expr_stmt(call)
    }

    pub fn require_stmt(&mut self, condition: Expression) -> Statement {
        let call = self.call(FunctionCallKind::Require, vec![condition], TypeName::Bool);
        self.expr_stmt(call)
    }

    pub fn declare(
        &mut self,
        decl: VariableDeclaration,
        initial_value: Option<Expression>,
    ) -> Statement {
        Statement::VariableDeclaration {
            decl,
            initial_value,
        }
    }

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.next_id(),
            statements,
            location: SourceLocation::default(),
        }
    }

    pub fn block_stmt(&mut self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    pub fn if_stmt(
        &mut self,
        condition: Expression,
        true_branch: Statement,
        false_branch: Option<Statement>,
    ) -> Statement {
        Statement::If {
            id: self.next_id(),
            condition,
            true_branch: Box::new(true_branch),
            false_branch: false_branch.map(Box::new),
            location: SourceLocation::default(),
        }
    }

    pub fn while_stmt(&mut self, condition: Expression, body: Statement) -> Statement {
        Statement::While {
            id: self.next_id(),
            condition,
            body: Box::new(body),
            is_do_while: false,
            location: SourceLocation::default(),
        }
    }

    pub fn do_while_stmt(&mut self, condition: Expression, body: Statement) -> Statement {
        Statement::While {
            id: self.next_id(),
            condition,
            body: Box::new(body),
            is_do_while: true,
            location: SourceLocation::default(),
        }
    }

    pub fn for_stmt(
        &mut self,
        init: Option<Statement>,
        condition: Option<Expression>,
        post: Option<Statement>,
        body: Statement,
    ) -> Statement {
        Statement::For {
            id: self.next_id(),
            init: init.map(Box::new),
            condition,
            post: post.map(Box::new),
            body: Box::new(body),
            location: SourceLocation::default(),
        }
    }

    pub fn ret(&mut self, values: Vec<Expression>) -> Statement {
        Statement::Return {
            id: self.next_id(),
            values,
            location: SourceLocation::default(),
        }
    }

    pub fn brk(&mut self) -> Statement {
        Statement::Break {
            id: self.next_id(),
            location: SourceLocation::default(),
        }
    }

    pub fn cont(&mut self) -> Statement {
        Statement::Continue {
            id: self.next_id(),
            location: SourceLocation::default(),
        }
    }

    // ---- definitions ----

    /// A public, implemented function.
    pub fn function(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<VariableDeclaration>,
        return_parameters: Vec<VariableDeclaration>,
        body: Block,
    ) -> FunctionDefinition {
        FunctionDefinition {
            id: self.next_id(),
            name: name.into(),
            kind: FunctionKind::Regular,
            visibility: Visibility::Public,
            parameters,
            return_parameters,
            body: Some(body),
            location: SourceLocation::default(),
        }
    }

    pub fn constructor(
        &mut self,
        parameters: Vec<VariableDeclaration>,
        body: Block,
    ) -> FunctionDefinition {
        FunctionDefinition {
            id: self.next_id(),
            name: String::new(),
            kind: FunctionKind::Constructor,
            visibility: Visibility::Public,
            parameters,
            return_parameters: vec![],
            body: Some(body),
            location: SourceLocation::default(),
        }
    }

    pub fn contract(
        &mut self,
        name: impl Into<String>,
        state_variables: Vec<VariableDeclaration>,
        functions: Vec<FunctionDefinition>,
    ) -> ContractDefinition {
        ContractDefinition {
            id: self.next_id(),
            name: name.into(),
            kind: ContractKind::Contract,
            linearized_bases: vec![],
            state_variables,
            functions,
            location: SourceLocation::default(),
        }
    }

    pub fn library(
        &mut self,
        name: impl Into<String>,
        functions: Vec<FunctionDefinition>,
    ) -> ContractDefinition {
        let mut c = self.contract(name, vec![], functions);
        c.kind = ContractKind::Library;
        c
    }

    pub fn interface(&mut self, name: impl Into<String>) -> ContractDefinition {
        let mut c = self.contract(name, vec![], vec![]);
        c.kind = ContractKind::Interface;
        c
    }

    pub fn source_unit(contracts: Vec<ContractDefinition>) -> SourceUnit {
        SourceUnit {
            checker_enabled: true,
            contracts,
        }
    }
}
