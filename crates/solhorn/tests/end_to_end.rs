//! End-to-end verification through the real Spacer back-end.
//!
//! These tests need `z3` on `PATH` and skip themselves otherwise.

use solhorn::ast::{
    AstFactory, BinaryOperator, FunctionCallKind, SourceUnit, TypeName, Visibility,
};
use solhorn::{analyze, TargetVerdict};

fn z3_available() -> bool {
    if which::which("z3").is_err() {
        eprintln!("Skipping: z3 not installed");
        return false;
    }
    true
}

fn verdicts(unit: &SourceUnit) -> Vec<TargetVerdict> {
    let (analyses, warnings) = analyze(unit).expect("solver back-end available");
    for warning in &warnings {
        eprintln!("warning at {}: {}", warning.location, warning.message);
    }
    analyses
        .into_iter()
        .flat_map(|a| a.targets)
        .map(|t| t.verdict)
        .collect()
}

/// `contract C { function f(uint x) public { assert(x == x); } }`
#[test]
fn reflexive_equality_is_safe() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let x = f.var("x", TypeName::Uint256);
    let l = f.ident(&x);
    let r = f.ident(&x);
    let cond = f.binary(BinaryOperator::Equal, l, r);
    let assert = f.assert_stmt(cond);
    let body = f.block(vec![assert]);
    let func = f.function("f", vec![x], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// `contract C { uint s; function f(uint x) public { s = x; assert(s == x); } }`
#[test]
fn state_assignment_is_tracked() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let s = f.state_var("s", TypeName::Uint256, Visibility::Internal);
    let x = f.var("x", TypeName::Uint256);
    let lhs = f.ident(&s);
    let rhs = f.ident(&x);
    let store = f.assign(lhs, rhs);
    let store_stmt = f.expr_stmt(store);
    let al = f.ident(&s);
    let ar = f.ident(&x);
    let cond = f.binary(BinaryOperator::Equal, al, ar);
    let assert = f.assert_stmt(cond);
    let body = f.block(vec![store_stmt, assert]);
    let func = f.function("f", vec![x], vec![], body);
    let contract = f.contract("C", vec![s], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// `contract C { function f(uint x) public { if (x > 0) assert(x > 0); } }`
#[test]
fn branch_condition_reaches_assertion() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let x = f.var("x", TypeName::Uint256);
    let cl = f.ident(&x);
    let cr = f.uint(0);
    let cond = f.binary(BinaryOperator::GreaterThan, cl, cr);
    let al = f.ident(&x);
    let ar = f.uint(0);
    let inner = f.binary(BinaryOperator::GreaterThan, al, ar);
    let assert = f.assert_stmt(inner);
    let if_stmt = f.if_stmt(cond, assert, None);
    let body = f.block(vec![if_stmt]);
    let func = f.function("f", vec![x], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// `contract C { function f(uint x, uint y) public { assert(x == y); } }`
#[test]
fn unequal_parameters_are_unsafe() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let x = f.var("x", TypeName::Uint256);
    let y = f.var("y", TypeName::Uint256);
    let l = f.ident(&x);
    let r = f.ident(&y);
    let cond = f.binary(BinaryOperator::Equal, l, r);
    let assert = f.assert_stmt(cond);
    let body = f.block(vec![assert]);
    let func = f.function("f", vec![x, y], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Unsafe]);
}

/// `contract C { uint s; function f() public { while (s < 10) s = s + 1;
/// assert(s <= 10); } }` — provable only through an inferred inductive
/// invariant.
#[test]
fn loop_invariant_is_inferred() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let s = f.state_var("s", TypeName::Uint256, Visibility::Internal);
    let cl = f.ident(&s);
    let cr = f.uint(10);
    let cond = f.binary(BinaryOperator::LessThan, cl, cr);
    let al = f.ident(&s);
    let sl = f.ident(&s);
    let one = f.uint(1);
    let sum = f.binary(BinaryOperator::Add, sl, one);
    let update = f.assign(al, sum);
    let loop_body = f.expr_stmt(update);
    let while_stmt = f.while_stmt(cond, loop_body);
    let bl = f.ident(&s);
    let ten = f.uint(10);
    let le = f.binary(BinaryOperator::LessThanOrEqual, bl, ten);
    let assert = f.assert_stmt(le);
    let body = f.block(vec![while_stmt, assert]);
    let func = f.function("f", vec![], vec![], body);
    let contract = f.contract("C", vec![s], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// `contract C { function f(address a) public { a.call(""); assert(true); } }`
/// — the call erases knowledge, but a trivial assertion stays safe.
#[test]
fn knowledge_erasure_keeps_trivial_assertion_safe() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let a = f.var("a", TypeName::Address);
    let call = f.call(FunctionCallKind::BareCall, vec![], TypeName::Bool);
    let call_stmt = f.expr_stmt(call);
    let t = f.boolean(true);
    let assert = f.assert_stmt(t);
    let body = f.block(vec![call_stmt, assert]);
    let func = f.function("f", vec![a], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// A literal `assert(false)` on a reachable path must be flagged.
#[test]
fn reachable_assert_false_is_unsafe() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let lit = f.boolean(false);
    let assert = f.assert_stmt(lit);
    let body = f.block(vec![assert]);
    let func = f.function("f", vec![], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Unsafe]);
}

/// A do-while with a constant-false condition still runs its body once.
#[test]
fn do_while_runs_body_once() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let x = f.var("x", TypeName::Uint256);
    let al = f.ident(&x);
    let xl = f.ident(&x);
    let one = f.uint(1);
    let sum = f.binary(BinaryOperator::Add, xl, one);
    let update = f.assign(al, sum);
    let loop_body = f.expr_stmt(update);
    let cond = f.boolean(false);
    let dw = f.do_while_stmt(cond, loop_body);
    let cl = f.ident(&x);
    let cr = f.uint(1);
    let eq = f.binary(BinaryOperator::Equal, cl, cr);
    let assert = f.assert_stmt(eq);
    let decl = f.declare(x, None);
    let body = f.block(vec![decl, dw, assert]);
    let func = f.function("f", vec![], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    assert_eq!(verdicts(&unit), vec![TargetVerdict::Safe]);
}

/// Assertions after pure branching on `true` are safe whatever the shape.
#[test]
fn pure_branching_round_trip() {
    if !z3_available() {
        return;
    }
    let mut f = AstFactory::new();
    let x = f.var("x", TypeName::Uint256);
    let c1l = f.ident(&x);
    let c1r = f.uint(5);
    let outer_cond = f.binary(BinaryOperator::LessThan, c1l, c1r);
    let t1 = f.boolean(true);
    let inner_assert = f.assert_stmt(t1);
    let c2l = f.ident(&x);
    let c2r = f.uint(3);
    let inner_cond = f.binary(BinaryOperator::GreaterThan, c2l, c2r);
    let t2 = f.boolean(true);
    let deep_assert = f.assert_stmt(t2);
    let inner_if = f.if_stmt(inner_cond, deep_assert, Some(inner_assert));
    let then_branch = f.block_stmt(vec![inner_if]);
    let t3 = f.boolean(true);
    let else_assert = f.assert_stmt(t3);
    let outer_if = f.if_stmt(outer_cond, then_branch, Some(else_assert));
    let body = f.block(vec![outer_if]);
    let func = f.function("f", vec![x], vec![], body);
    let contract = f.contract("C", vec![], vec![func]);
    let unit = AstFactory::source_unit(vec![contract]);

    let verdicts = verdicts(&unit);
    assert_eq!(verdicts.len(), 3);
    assert!(verdicts.iter().all(|v| *v == TargetVerdict::Safe));
}
