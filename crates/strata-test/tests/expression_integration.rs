//! Expression trees end to end: building, evaluating over encoded rows,
//! wire round trips and key-range extraction.

use std::sync::Arc;
use std::thread;

use strata_common::StrataError;
use strata_expr::{
    AndExpression, CompareOp, ComparisonExpression, Expression, InListExpression, KeyRangeVisitor, NotExpression,
    OrExpression,
};
use strata_test::utils::{encode_int, init_tracing, int_column, int_literal, int_row, null_literal};

fn in_list(negate: bool) -> Expression {
    InListExpression::create(
        vec![
            int_column(0),
            int_literal(5),
            int_literal(3),
            int_literal(5),
            null_literal(),
            int_literal(3),
        ],
        negate,
    )
    .unwrap()
}

fn eval(expr: &Expression, value: Option<i32>) -> Option<bool> {
    expr.evaluate(&int_row(&[value])).and_then(|v| v.as_bool())
}

#[test]
fn in_list_with_duplicates_and_null() {
    init_tracing();
    let expr = in_list(false);
    let Expression::InList(node) = &expr else {
        panic!("expected IN-list, got {expr}");
    };
    assert_eq!(node.values(), &[encode_int(3), encode_int(5)]);
    assert!(node.contains_null());

    assert_eq!(eval(&expr, Some(3)), Some(true));
    assert_eq!(eval(&expr, Some(5)), Some(true));
    // no match but the list holds NULL: unknown
    assert_eq!(eval(&expr, Some(4)), None);
    assert_eq!(eval(&expr, None), None);
}

#[test]
fn not_in_list() {
    let expr = InListExpression::create(vec![int_column(0), int_literal(3), int_literal(5)], true).unwrap();
    assert_eq!(eval(&expr, Some(4)), Some(true));
    assert_eq!(eval(&expr, Some(5)), Some(false));
    assert_eq!(eval(&expr, None), None);

    let with_null = in_list(true);
    assert_eq!(eval(&with_null, Some(3)), Some(false));
    assert_eq!(eval(&with_null, Some(4)), None);
}

#[test]
fn wire_round_trip_is_idempotent() {
    let predicate = Expression::Or(OrExpression::new(vec![
        Expression::And(AndExpression::new(vec![
            in_list(false),
            ComparisonExpression::create(CompareOp::Gt, int_column(1), int_literal(10)).unwrap(),
        ])),
        Expression::Not(NotExpression::new(in_list(true))),
    ]));

    let bytes = predicate.serialize();
    let decoded = Expression::deserialize(&bytes).unwrap();
    assert_eq!(decoded, predicate);
    assert_eq!(decoded.serialize(), bytes);

    for row in [[Some(3), Some(11)], [Some(4), Some(11)], [Some(5), Some(1)], [None, None]] {
        let r = int_row(&row);
        assert_eq!(decoded.evaluate(&r), predicate.evaluate(&r));
    }
}

#[test]
fn wire_rejects_garbage() {
    let bytes = in_list(false).serialize();
    let truncated = Expression::deserialize(&bytes[..bytes.len() - 2]);
    assert!(matches!(truncated, Err(StrataError::Serialization { .. })));
    assert!(Expression::deserialize(&[]).is_err());
}

#[test]
fn compiled_tree_is_shared_across_threads() {
    let expr = Arc::new(in_list(false));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                (0..1_000)
                    .filter(|i| eval(&expr, Some((i + t) % 10)) == Some(true))
                    .count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 200);
    }
}

#[test]
fn key_range_from_in_list_and_bound() {
    let predicate = Expression::And(AndExpression::new(vec![
        in_list(false),
        ComparisonExpression::create(CompareOp::Gt, int_column(0), int_literal(4)).unwrap(),
    ]));
    let range = KeyRangeVisitor::key_range(&predicate, 0);
    assert!(!range.contains(encode_int(3).as_bytes()));
    assert!(!range.contains(encode_int(4).as_bytes()));
    assert!(range.contains(encode_int(5).as_bytes()));
    assert!(!range.contains(encode_int(6).as_bytes()));

    // the predicate says nothing about other columns
    assert!(KeyRangeVisitor::key_range(&predicate, 1).is_everything());
}
