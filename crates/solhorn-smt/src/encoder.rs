//! Statement and expression encoding.
//!
//! Straight-line statements and expressions become constraints on the
//! current solver scope. Calls that the control-flow layer must react to
//! (`assert` targets and calls that collapse knowledge) are reported back
//! as [`CallEvent`]s in evaluation order instead of being handled here —
//! the expression layer knows nothing about blocks or predicates.

use crate::context::{EncodingContext, EncodingError};
use crate::term::SmtExpr;
use solhorn_ast::{
    BinaryOperator, Expression, FunctionCallKind, FunctionDefinition, NodeId, SourceLocation,
    Statement, UnaryOperator,
};

/// A call the control-flow encoder has to act on.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// An `assert(condition)` verification target.
    Assert {
        call: NodeId,
        location: SourceLocation,
        condition: SmtExpr,
    },
    /// A call whose effects cannot be modeled; triggers knowledge erasure.
    Unknown {
        kind: FunctionCallKind,
        location: SourceLocation,
    },
}

/// Create the symbolic state a function body starts from: parameters are
/// unconstrained within their type range, returns and locals hold their
/// zero values.
pub fn init_function(
    ctx: &mut EncodingContext,
    function: &FunctionDefinition,
) -> Result<(), EncodingError> {
    for param in &function.parameters {
        ctx.create_variable(param);
        ctx.set_unknown_value(param.id)?;
    }
    for ret in &function.return_parameters {
        ctx.create_variable(ret);
        ctx.set_zero_value(ret.id)?;
    }
    for local in function.local_variables() {
        ctx.create_variable(local);
        ctx.set_zero_value(local.id)?;
    }
    Ok(())
}

/// Encode a straight-line statement. Control-flow statements are the
/// caller's job and are rejected here.
pub fn encode_statement(
    ctx: &mut EncodingContext,
    stmt: &Statement,
) -> Result<Vec<CallEvent>, EncodingError> {
    let mut events = Vec::new();
    match stmt {
        Statement::VariableDeclaration {
            decl,
            initial_value,
        } => {
            if !ctx.has_variable(decl.id) {
                ctx.create_variable(decl);
                ctx.set_zero_value(decl.id)?;
            }
            if let Some(init) = initial_value {
                let value = encode_expression(ctx, init, &mut events)?;
                ctx.assign(decl.id, &value)?;
            }
        }
        Statement::Expression { expression, .. } => {
            encode_expression(ctx, expression, &mut events)?;
        }
        Statement::Block(_)
        | Statement::If { .. }
        | Statement::While { .. }
        | Statement::For { .. }
        | Statement::Return { .. }
        | Statement::Break { .. }
        | Statement::Continue { .. } => return Err(EncodingError::ControlFlowStatement),
    }
    Ok(events)
}

/// Encode `return v1, ..., vn` as assignments to the return parameters.
pub fn encode_return(
    ctx: &mut EncodingContext,
    values: &[Expression],
    return_params: &[NodeId],
    events: &mut Vec<CallEvent>,
) -> Result<(), EncodingError> {
    for (value, param) in values.iter().zip(return_params.iter()) {
        let encoded = encode_expression(ctx, value, events)?;
        ctx.assign(*param, &encoded)?;
    }
    Ok(())
}

/// Encode an expression to a term, accumulating side-effect constraints on
/// the current scope and recording calls of interest.
pub fn encode_expression(
    ctx: &mut EncodingContext,
    expr: &Expression,
    events: &mut Vec<CallEvent>,
) -> Result<SmtExpr, EncodingError> {
    match expr {
        Expression::BoolLiteral { value, .. } => Ok(if *value {
            SmtExpr::true_()
        } else {
            SmtExpr::false_()
        }),
        Expression::NumberLiteral { value, .. } => Ok(SmtExpr::int_lit(value)),
        Expression::Identifier { declaration, .. } => ctx.current_value(*declaration),
        Expression::UnaryOp { op, operand, .. } => {
            let operand = encode_expression(ctx, operand, events)?;
            Ok(match op {
                UnaryOperator::Not => operand.not(),
                UnaryOperator::Negate => operand.neg(),
            })
        }
        Expression::BinaryOp {
            op, left, right, ..
        } => {
            let left = encode_expression(ctx, left, events)?;
            let right = encode_expression(ctx, right, events)?;
            Ok(apply_binary(*op, &left, &right))
        }
        Expression::Assignment { op, lhs, rhs, .. } => {
            let mut value = encode_expression(ctx, rhs, events)?;
            match &**lhs {
                Expression::Identifier { declaration, .. } => {
                    if let Some(folded) = op.folded() {
                        let current = ctx.current_value(*declaration)?;
                        value = apply_binary(folded, &current, &value);
                    }
                    ctx.assign(*declaration, &value)?;
                    Ok(value)
                }
                Expression::IndexAccess { base, index, .. } => {
                    let Expression::Identifier { declaration, .. } = &**base else {
                        return Err(EncodingError::UnsupportedAssignment);
                    };
                    let index = encode_expression(ctx, index, events)?;
                    let container = ctx.current_value(*declaration)?;
                    if let Some(folded) = op.folded() {
                        let current = container.select(&index);
                        value = apply_binary(folded, &current, &value);
                    }
                    let stored = container.store(&index, &value);
                    ctx.assign(*declaration, &stored)?;
                    Ok(value)
                }
                _ => Err(EncodingError::UnsupportedAssignment),
            }
        }
        Expression::Conditional {
            condition,
            true_value,
            false_value,
            ..
        } => {
            let condition = encode_expression(ctx, condition, events)?;
            let true_value = encode_expression(ctx, true_value, events)?;
            let false_value = encode_expression(ctx, false_value, events)?;
            Ok(condition.ite(&true_value, &false_value))
        }
        Expression::IndexAccess { base, index, .. } => {
            let base = encode_expression(ctx, base, events)?;
            let index = encode_expression(ctx, index, events)?;
            Ok(base.select(&index))
        }
        Expression::FunctionCall {
            id,
            kind,
            arguments,
            ty,
            location,
        } => {
            let mut encoded_args = Vec::with_capacity(arguments.len());
            for arg in arguments {
                encoded_args.push(encode_expression(ctx, arg, events)?);
            }
            match kind {
                FunctionCallKind::Assert => {
                    let condition = encoded_args
                        .into_iter()
                        .next()
                        .unwrap_or_else(SmtExpr::true_);
                    events.push(CallEvent::Assert {
                        call: *id,
                        location: *location,
                        condition: condition.clone(),
                    });
                    Ok(condition)
                }
                FunctionCallKind::Require => {
                    let condition = encoded_args
                        .into_iter()
                        .next()
                        .unwrap_or_else(SmtExpr::true_);
                    ctx.add_assertion(condition.clone());
                    Ok(condition)
                }
                _ => {
                    events.push(CallEvent::Unknown {
                        kind: *kind,
                        location: *location,
                    });
                    // The call's value is a fresh symbol of the annotated
                    // type; nothing else about it is known.
                    ctx.create_synthetic(*id, "call", ty)
                }
            }
        }
    }
}

fn apply_binary(op: BinaryOperator, left: &SmtExpr, right: &SmtExpr) -> SmtExpr {
    match op {
        BinaryOperator::Add => left.add(right),
        BinaryOperator::Sub => left.sub(right),
        BinaryOperator::Mul => left.mul(right),
        BinaryOperator::Div => left.div(right),
        BinaryOperator::Mod => left.modulo(right),
        BinaryOperator::Equal => left.eq(right),
        BinaryOperator::NotEqual => left.neq(right),
        BinaryOperator::LessThan => left.lt(right),
        BinaryOperator::LessThanOrEqual => left.le(right),
        BinaryOperator::GreaterThan => left.gt(right),
        BinaryOperator::GreaterThanOrEqual => left.ge(right),
        BinaryOperator::And => left.and(right),
        BinaryOperator::Or => left.or(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solhorn_ast::{AssignmentOperator, AstFactory, TypeName};

    #[test]
    fn simple_expression_encoding() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let lhs = f.ident(&x);
        let one = f.uint(1);
        let sum = f.binary(BinaryOperator::Add, lhs, one);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&x);
        let mut events = Vec::new();
        let term = encode_expression(&mut ctx, &sum, &mut events).unwrap();
        assert_eq!(term.text, "(+ x_1_0 1)");
        assert!(events.is_empty());
    }

    #[test]
    fn assignment_advances_ssa() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let lhs = f.ident(&x);
        let rhs = f.uint(7);
        let assign = f.assign(lhs, rhs);
        let stmt = f.expr_stmt(assign);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&x);
        encode_statement(&mut ctx, &stmt).unwrap();
        assert_eq!(ctx.current_value(x.id).unwrap().text, "x_1_1");
        assert_eq!(ctx.assertions().text, "(= x_1_1 7)");
    }

    #[test]
    fn compound_assignment_folds_operator() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let lhs = f.ident(&x);
        let rhs = f.uint(2);
        let assign = f.compound_assign(AssignmentOperator::AddAssign, lhs, rhs);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&x);
        let mut events = Vec::new();
        encode_expression(&mut ctx, &assign, &mut events).unwrap();
        assert_eq!(ctx.assertions().text, "(= x_1_1 (+ x_1_0 2))");
    }

    #[test]
    fn mapping_store_encoding() {
        let mut f = AstFactory::new();
        let m = f.var(
            "balances",
            TypeName::mapping(TypeName::Address, TypeName::Uint256),
        );
        let k = f.var("key", TypeName::Address);
        let base = f.ident(&m);
        let index = f.ident(&k);
        let access = f.index(base, index);
        let rhs = f.uint(9);
        let assign = f.assign(access, rhs);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&m);
        ctx.create_variable(&k);
        let mut events = Vec::new();
        encode_expression(&mut ctx, &assign, &mut events).unwrap();
        assert_eq!(
            ctx.assertions().text,
            "(= balances_1_1 (store balances_1_0 key_2_0 9))"
        );
    }

    #[test]
    fn assert_call_becomes_event() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let l = f.ident(&x);
        let r = f.ident(&x);
        let cond = f.binary(BinaryOperator::Equal, l, r);
        let stmt = f.assert_stmt(cond);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&x);
        let events = encode_statement(&mut ctx, &stmt).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            CallEvent::Assert { condition, .. } => {
                assert_eq!(condition.text, "(= x_1_0 x_1_0)");
            }
            other => panic!("expected assert event, got {other:?}"),
        }
        // assert itself adds no constraint
        assert!(ctx.assertions().is_true());
    }

    #[test]
    fn require_adds_path_knowledge() {
        let mut f = AstFactory::new();
        let x = f.var("x", TypeName::Uint256);
        let l = f.ident(&x);
        let r = f.uint(0);
        let cond = f.binary(BinaryOperator::GreaterThan, l, r);
        let stmt = f.require_stmt(cond);

        let mut ctx = EncodingContext::new();
        ctx.create_variable(&x);
        let events = encode_statement(&mut ctx, &stmt).unwrap();
        assert!(events.is_empty());
        assert_eq!(ctx.assertions().text, "(> x_1_0 0)");
    }

    #[test]
    fn unknown_call_yields_fresh_symbol_and_event() {
        let mut f = AstFactory::new();
        let call = f.call(FunctionCallKind::BlockHash, vec![], TypeName::Uint256);
        let call_id = call.id();
        let stmt = f.expr_stmt(call);

        let mut ctx = EncodingContext::new();
        let events = encode_statement(&mut ctx, &stmt).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CallEvent::Unknown {
                kind: FunctionCallKind::BlockHash,
                ..
            }
        ));
        // result symbol exists and is range constrained
        let value = ctx.current_value(call_id).unwrap();
        assert!(ctx.assertions().text.contains(&value.text));
    }

    #[test]
    fn init_function_seeds_variables() {
        let mut f = AstFactory::new();
        let p = f.var("p", TypeName::Uint256);
        let r = f.var("r", TypeName::Bool);
        let l = f.var("l", TypeName::Uint256);
        let decl = f.declare(l.clone(), None);
        let body = f.block(vec![decl]);
        let func = f.function("g", vec![p.clone()], vec![r.clone()], body);

        let mut ctx = EncodingContext::new();
        init_function(&mut ctx, &func).unwrap();
        let text = ctx.assertions().text;
        // parameter ranged, return and local zeroed
        assert!(text.contains("(<= 0 p_1_0)"), "{text}");
        assert!(text.contains("(= r_2_0 false)"), "{text}");
        assert!(text.contains("(= l_3_0 0)"), "{text}");
    }

    #[test]
    fn control_flow_statements_rejected() {
        let mut f = AstFactory::new();
        let stmt = f.brk();
        let mut ctx = EncodingContext::new();
        assert!(matches!(
            encode_statement(&mut ctx, &stmt),
            Err(EncodingError::ControlFlowStatement)
        ));
    }

    #[test]
    fn ternary_uses_ite() {
        let mut f = AstFactory::new();
        let c = f.boolean(true);
        let a = f.uint(1);
        let b = f.uint(2);
        let cond = f.conditional(c, a, b);
        let mut ctx = EncodingContext::new();
        let mut events = Vec::new();
        let term = encode_expression(&mut ctx, &cond, &mut events).unwrap();
        assert_eq!(term.text, "(ite true 1 2)");
    }
}
