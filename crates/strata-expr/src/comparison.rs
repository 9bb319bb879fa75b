//! Comparison node.

use std::cmp::Ordering;
use std::fmt;

use strata_common::{StrataError, StrataResult};
use strata_types::{codec, EncodedValue};

use crate::coerce::CoerceExpression;
use crate::expression::{fold_constant, Expression};
use crate::row::RowSource;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompareOp {
    /// Wire identifier.
    pub fn id(self) -> u8 {
        match self {
            CompareOp::Eq => 0,
            CompareOp::NotEq => 1,
            CompareOp::Lt => 2,
            CompareOp::LtEq => 3,
            CompareOp::Gt => 4,
            CompareOp::GtEq => 5,
        }
    }

    /// Looks up an operator by wire identifier.
    pub fn from_id(id: u8) -> StrataResult<Self> {
        Ok(match id {
            0 => CompareOp::Eq,
            1 => CompareOp::NotEq,
            2 => CompareOp::Lt,
            3 => CompareOp::LtEq,
            4 => CompareOp::Gt,
            5 => CompareOp::GtEq,
            other => {
                return Err(StrataError::serialization(format!(
                    "unknown comparison operator {other}"
                )))
            }
        })
    }

    /// Returns true if `ordering` of the left operand against the right
    /// satisfies the operator.
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }

    /// The operator with its operands swapped (`a < b` is `b > a`).
    pub fn mirror(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::LtEq => CompareOp::GtEq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::LtEq,
            other => other,
        }
    }

    /// The logical negation (`a < b` is `NOT a >= b`).
    pub fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::NotEq,
            CompareOp::NotEq => CompareOp::Eq,
            CompareOp::Lt => CompareOp::GtEq,
            CompareOp::LtEq => CompareOp::Gt,
            CompareOp::Gt => CompareOp::LtEq,
            CompareOp::GtEq => CompareOp::Lt,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::LtEq => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::GtEq => write!(f, ">="),
        }
    }
}

/// Compares two operands of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparisonExpression {
    op: CompareOp,
    lhs: Box<Expression>,
    rhs: Box<Expression>,
}

impl ComparisonExpression {
    /// Builds `lhs op rhs`.
    ///
    /// A constant operand is re-encoded in the type and order of the other
    /// operand when that is lossless, so the comparison runs on raw bytes
    /// and can bound a key range. Otherwise both sides are coerced to their
    /// common type. A comparison of two constants folds to a literal.
    pub fn create(op: CompareOp, lhs: Expression, rhs: Expression) -> StrataResult<Expression> {
        let lhs = fold_constant(lhs);
        let rhs = fold_constant(rhs);

        if let Some(adapted) = adapt_literal(&rhs, &lhs) {
            return Ok(fold_constant(Expression::Comparison(Self::new(op, lhs, adapted))));
        }
        if let Some(adapted) = adapt_literal(&lhs, &rhs) {
            return Ok(fold_constant(Expression::Comparison(Self::new(op, adapted, rhs))));
        }

        let (lhs_type, rhs_type) = (lhs.data_type(), rhs.data_type());
        let common = lhs_type
            .common_type(rhs_type)
            .ok_or_else(|| StrataError::type_mismatch(rhs_type, lhs_type))?;
        let lhs_order = lhs.sort_order();
        let lhs = CoerceExpression::create(lhs, common, lhs_order)?;
        // Byte comparison needs both sides in one order.
        let rhs = CoerceExpression::create(rhs, common, lhs_order)?;
        Ok(fold_constant(Expression::Comparison(Self::new(op, lhs, rhs))))
    }

    /// Builds the node without checks or folding.
    pub(crate) fn new(op: CompareOp, lhs: Expression, rhs: Expression) -> Self {
        Self {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// The operator.
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Left operand.
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    /// Right operand.
    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        let left = self.lhs.evaluate(row)?;
        let right = self.rhs.evaluate(row)?;
        if left.is_null() || right.is_null() {
            return Some(EncodedValue::null());
        }
        let ordering = codec::compare_encoded(
            self.lhs.data_type(),
            &left,
            self.lhs.sort_order(),
            &right,
            self.rhs.sort_order(),
        )
        .ok()?;
        Some(EncodedValue::boolean(self.op.matches(ordering)))
    }
}

/// Re-encodes `constant` as the type and order of `other`, if lossless.
fn adapt_literal(constant: &Expression, other: &Expression) -> Option<Expression> {
    match constant {
        Expression::Literal(lit) if !other.is_stateless() => lit
            .coerce_exact(other.data_type(), other.sort_order())
            .map(Expression::Literal),
        _ => None,
    }
}

impl fmt::Display for ComparisonExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnExpression;
    use crate::literal::LiteralExpression;
    use crate::row::EncodedRow;
    use strata_types::{Datum, LogicalType, SortOrder};

    fn lit(d: Datum) -> Expression {
        Expression::Literal(LiteralExpression::from_datum(&d).unwrap())
    }

    fn eval_int(expr: &Expression, v: i32) -> Option<bool> {
        let bytes = codec::encode(LogicalType::Integer, &Datum::Integer(v)).unwrap();
        let row = EncodedRow::from_values(&[bytes.as_bytes()]);
        expr.evaluate(&row).and_then(|r| r.as_bool())
    }

    #[test]
    fn test_literal_adopts_column_type() {
        let col = Expression::Column(ColumnExpression::new(0, LogicalType::Integer));
        let expr = ComparisonExpression::create(CompareOp::Lt, col, lit(Datum::BigInt(10))).unwrap();
        let Expression::Comparison(cmp) = &expr else {
            panic!("expected comparison, got {expr:?}");
        };
        assert_eq!(cmp.rhs().data_type(), LogicalType::Integer);
        assert_eq!(eval_int(&expr, 9), Some(true));
        assert_eq!(eval_int(&expr, 10), Some(false));
    }

    #[test]
    fn test_out_of_range_literal_widens_column() {
        let col = Expression::Column(ColumnExpression::new(0, LogicalType::Integer));
        let expr =
            ComparisonExpression::create(CompareOp::Lt, col, lit(Datum::BigInt(1 << 40))).unwrap();
        let Expression::Comparison(cmp) = &expr else {
            panic!("expected comparison, got {expr:?}");
        };
        assert_eq!(cmp.lhs().data_type(), LogicalType::BigInt);
        assert_eq!(eval_int(&expr, i32::MAX), Some(true));
    }

    #[test]
    fn test_descending_column() {
        let col = Expression::Column(
            ColumnExpression::new(0, LogicalType::Integer).with_sort_order(SortOrder::Desc),
        );
        let expr = ComparisonExpression::create(CompareOp::Gt, col, lit(Datum::Integer(5))).unwrap();
        let bytes =
            codec::encode_with_order(LogicalType::Integer, &Datum::Integer(7), SortOrder::Desc)
                .unwrap();
        let row = EncodedRow::from_values(&[bytes.as_bytes()]);
        assert_eq!(expr.evaluate(&row).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_null_operand_yields_null() {
        let col = Expression::Column(ColumnExpression::new(0, LogicalType::Integer));
        let expr = ComparisonExpression::create(CompareOp::Eq, col, lit(Datum::Integer(1))).unwrap();
        let row = EncodedRow::from_values(&[&[]]);
        assert!(expr.evaluate(&row).unwrap().is_null());
    }

    #[test]
    fn test_constants_fold() {
        let expr =
            ComparisonExpression::create(CompareOp::GtEq, lit(Datum::Integer(2)), lit(Datum::Double(1.5)))
                .unwrap();
        assert_eq!(expr, Expression::Literal(LiteralExpression::boolean(true)));
    }

    #[test]
    fn test_incomparable_types_rejected() {
        let col = Expression::Column(ColumnExpression::new(0, LogicalType::Integer));
        let err = ComparisonExpression::create(CompareOp::Eq, col, lit(Datum::from("x"))).unwrap_err();
        assert!(err.is_coercion_failure());
    }

    #[test]
    fn test_op_helpers() {
        assert_eq!(CompareOp::Lt.mirror(), CompareOp::Gt);
        assert_eq!(CompareOp::Lt.negate(), CompareOp::GtEq);
        for op in [CompareOp::Eq, CompareOp::NotEq, CompareOp::Lt, CompareOp::LtEq, CompareOp::Gt, CompareOp::GtEq] {
            assert_eq!(CompareOp::from_id(op.id()).unwrap(), op);
        }
    }
}
