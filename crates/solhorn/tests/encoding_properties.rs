//! Property tests over arbitrary control-flow shapes.
//!
//! The recording engine stands in for the solver, so these check the
//! encoding itself: the traversal must come back from any program shape
//! without tripping its internal invariants (path/scope parity, predicate
//! sort checks), and must issue exactly one query per `assert`.

use proptest::prelude::*;
use solhorn::ast::{
    AstFactory, BinaryOperator, FunctionCallKind, SourceUnit, Statement, TypeName,
    VariableDeclaration, Visibility,
};
use solhorn::{analyze_with, CollectingReporter, RecordingEngine};

#[derive(Debug, Clone)]
enum Shape {
    /// `s = s + k;`
    Bump(u8),
    /// `assert(s >= 0);`
    Assert,
    /// an unmodeled external call
    ExternalCall,
    Branch(Vec<Shape>, Option<Vec<Shape>>),
    Loop(Vec<Shape>),
    Break,
    Continue,
}

fn arb_shapes() -> impl Strategy<Value = Vec<Shape>> {
    let leaf = prop_oneof![
        (1u8..5).prop_map(Shape::Bump),
        Just(Shape::Assert),
        Just(Shape::ExternalCall),
        Just(Shape::Break),
        Just(Shape::Continue),
    ];
    let node = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (
                prop::collection::vec(inner.clone(), 0..4),
                prop::option::of(prop::collection::vec(inner.clone(), 0..3)),
            )
                .prop_map(|(t, e)| Shape::Branch(t, e)),
            prop::collection::vec(inner, 0..4).prop_map(Shape::Loop),
        ]
    });
    prop::collection::vec(node, 0..6)
}

fn count_asserts(shapes: &[Shape]) -> usize {
    shapes
        .iter()
        .map(|shape| match shape {
            Shape::Assert => 1,
            Shape::Branch(t, e) => {
                count_asserts(t) + e.as_ref().map(|e| count_asserts(e)).unwrap_or(0)
            }
            Shape::Loop(body) => count_asserts(body),
            _ => 0,
        })
        .sum()
}

fn materialize(
    f: &mut AstFactory,
    s: &VariableDeclaration,
    x: &VariableDeclaration,
    shapes: &[Shape],
) -> Vec<Statement> {
    let mut statements = Vec::new();
    for shape in shapes {
        let stmt = match shape {
            Shape::Bump(k) => {
                let lhs = f.ident(s);
                let sl = f.ident(s);
                let amount = f.uint(u64::from(*k));
                let sum = f.binary(BinaryOperator::Add, sl, amount);
                let assign = f.assign(lhs, sum);
                f.expr_stmt(assign)
            }
            Shape::Assert => {
                let sl = f.ident(s);
                let zero = f.uint(0);
                let cond = f.binary(BinaryOperator::GreaterThanOrEqual, sl, zero);
                f.assert_stmt(cond)
            }
            Shape::ExternalCall => {
                let call = f.call(FunctionCallKind::External, vec![], TypeName::Bool);
                f.expr_stmt(call)
            }
            Shape::Branch(then_shapes, else_shapes) => {
                let xl = f.ident(x);
                let zero = f.uint(0);
                let cond = f.binary(BinaryOperator::GreaterThan, xl, zero);
                let then_stmts = materialize(f, s, x, then_shapes);
                let then_branch = f.block_stmt(then_stmts);
                let else_branch = else_shapes.as_ref().map(|shapes| {
                    let stmts = materialize(f, s, x, shapes);
                    f.block_stmt(stmts)
                });
                f.if_stmt(cond, then_branch, else_branch)
            }
            Shape::Loop(body_shapes) => {
                let sl = f.ident(s);
                let bound = f.uint(10);
                let cond = f.binary(BinaryOperator::LessThan, sl, bound);
                let body_stmts = materialize(f, s, x, body_shapes);
                let body = f.block_stmt(body_stmts);
                f.while_stmt(cond, body)
            }
            Shape::Break => f.brk(),
            Shape::Continue => f.cont(),
        };
        statements.push(stmt);
    }
    statements
}

fn build_unit(shapes: &[Shape]) -> SourceUnit {
    let mut f = AstFactory::new();
    let s = f.state_var("s", TypeName::Uint256, Visibility::Internal);
    let x = f.var("x", TypeName::Uint256);
    let statements = materialize(&mut f, &s, &x, shapes);
    let body = f.block(statements);
    let func = f.function("f", vec![x], vec![], body);
    let contract = f.contract("C", vec![s], vec![func]);
    AstFactory::source_unit(vec![contract])
}

proptest! {
    /// Any pure branching/looping shape encodes without tripping the
    /// internal invariants, and every assertion gets exactly one query.
    #[test]
    fn arbitrary_shapes_encode_cleanly(shapes in arb_shapes()) {
        let unit = build_unit(&shapes);
        let mut engine = RecordingEngine::new();
        let mut reporter = CollectingReporter::new();
        let analyses = analyze_with(&mut engine, &mut reporter, &unit);

        prop_assert!(
            !reporter.contains("Internal error"),
            "encoding failed: {:?}",
            reporter.warnings
        );
        prop_assert_eq!(analyses.len(), 1);
        let expected = count_asserts(&shapes);
        prop_assert_eq!(engine.queries.len(), expected);
        prop_assert_eq!(analyses[0].targets.len(), expected);
    }

    /// Relations stay namespaced: analyzing the same shapes as two
    /// contracts in one unit never reuses a query.
    #[test]
    fn queries_are_namespaced_across_contracts(shapes in arb_shapes()) {
        let mut f = AstFactory::new();
        let mut contracts = Vec::new();
        for name in ["A", "B"] {
            let s = f.state_var("s", TypeName::Uint256, Visibility::Internal);
            let x = f.var("x", TypeName::Uint256);
            let statements = materialize(&mut f, &s, &x, &shapes);
            let body = f.block(statements);
            let func = f.function("f", vec![x], vec![], body);
            contracts.push(f.contract(name, vec![s], vec![func]));
        }
        let unit = AstFactory::source_unit(contracts);

        let mut engine = RecordingEngine::new();
        let mut reporter = CollectingReporter::new();
        let analyses = analyze_with(&mut engine, &mut reporter, &unit);

        prop_assert!(!reporter.contains("Internal error"));
        prop_assert_eq!(analyses.len(), 2);
        let unique: std::collections::BTreeSet<&String> = engine.queries.iter().collect();
        prop_assert_eq!(unique.len(), engine.queries.len(), "queries collide");
    }
}
