//! Boolean connectives and null tests.
//!
//! All follow SQL three-valued logic: NULL is "unknown", `FALSE AND NULL`
//! is FALSE and `TRUE OR NULL` is TRUE. A child that cannot be evaluated
//! for the row makes the result unavailable unless another child already
//! decides it.

use std::fmt;

use strata_types::EncodedValue;

use crate::expression::Expression;
use crate::row::RowSource;

/// `NOT child`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotExpression {
    child: Box<Expression>,
}

impl NotExpression {
    /// Negates `child`.
    pub fn new(child: Expression) -> Self {
        Self {
            child: Box::new(child),
        }
    }

    /// The negated expression.
    pub fn child(&self) -> &Expression {
        &self.child
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        let value = self.child.evaluate(row)?;
        Some(match value.as_bool() {
            Some(b) => EncodedValue::boolean(!b),
            None => EncodedValue::null(),
        })
    }
}

impl fmt::Display for NotExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOT ({})", self.child)
    }
}

/// Conjunction of two or more children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AndExpression {
    children: Vec<Expression>,
}

impl AndExpression {
    /// Creates `c1 AND c2 AND ...`.
    pub fn new(children: Vec<Expression>) -> Self {
        Self { children }
    }

    /// The conjuncts.
    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        combine(&self.children, row, false)
    }
}

impl fmt::Display for AndExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.children, " AND ")
    }
}

/// Disjunction of two or more children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrExpression {
    children: Vec<Expression>,
}

impl OrExpression {
    /// Creates `c1 OR c2 OR ...`.
    pub fn new(children: Vec<Expression>) -> Self {
        Self { children }
    }

    /// The disjuncts.
    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        combine(&self.children, row, true)
    }
}

impl fmt::Display for OrExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.children, " OR ")
    }
}

/// `child IS [NOT] NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsNullExpression {
    child: Box<Expression>,
    negate: bool,
}

impl IsNullExpression {
    /// Creates `child IS NULL`, or `IS NOT NULL` when `negate` is set.
    pub fn new(child: Expression, negate: bool) -> Self {
        Self {
            child: Box::new(child),
            negate,
        }
    }

    /// The tested expression.
    pub fn child(&self) -> &Expression {
        &self.child
    }

    /// True for `IS NOT NULL`.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        let value = self.child.evaluate(row)?;
        Some(EncodedValue::boolean(value.is_null() != self.negate))
    }
}

impl fmt::Display for IsNullExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "{} IS NOT NULL", self.child)
        } else {
            write!(f, "{} IS NULL", self.child)
        }
    }
}

/// `decisive` is the value that ends evaluation: FALSE for AND, TRUE for OR.
fn combine(children: &[Expression], row: &dyn RowSource, decisive: bool) -> Option<EncodedValue> {
    let mut saw_null = false;
    let mut unavailable = false;
    for child in children {
        match child.evaluate(row) {
            None => unavailable = true,
            Some(value) => match value.as_bool() {
                Some(b) if b == decisive => return Some(EncodedValue::boolean(decisive)),
                Some(_) => {}
                None => saw_null = true,
            },
        }
    }
    if unavailable {
        None
    } else if saw_null {
        Some(EncodedValue::null())
    } else {
        Some(EncodedValue::boolean(!decisive))
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Expression], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnExpression;
    use crate::literal::LiteralExpression;
    use crate::row::{EncodedRow, NullRow};
    use strata_types::LogicalType;

    fn b(v: bool) -> Expression {
        Expression::Literal(LiteralExpression::boolean(v))
    }

    fn null() -> Expression {
        Expression::Literal(LiteralExpression::null(LogicalType::Boolean))
    }

    fn eval(expr: Expression) -> Option<Option<bool>> {
        expr.evaluate(&NullRow).map(|v| v.as_bool())
    }

    #[test]
    fn test_and_three_valued() {
        assert_eq!(eval(Expression::And(AndExpression::new(vec![b(true), b(true)]))), Some(Some(true)));
        assert_eq!(eval(Expression::And(AndExpression::new(vec![null(), b(false)]))), Some(Some(false)));
        assert_eq!(eval(Expression::And(AndExpression::new(vec![null(), b(true)]))), Some(None));
    }

    #[test]
    fn test_or_three_valued() {
        assert_eq!(eval(Expression::Or(OrExpression::new(vec![null(), b(true)]))), Some(Some(true)));
        assert_eq!(eval(Expression::Or(OrExpression::new(vec![b(false), b(false)]))), Some(Some(false)));
        assert_eq!(eval(Expression::Or(OrExpression::new(vec![b(false), null()]))), Some(None));
    }

    #[test]
    fn test_not_and_is_null() {
        assert_eq!(eval(Expression::Not(NotExpression::new(b(true)))), Some(Some(false)));
        assert_eq!(eval(Expression::Not(NotExpression::new(null()))), Some(None));
        assert_eq!(eval(Expression::IsNull(IsNullExpression::new(null(), false))), Some(Some(true)));
        assert_eq!(eval(Expression::IsNull(IsNullExpression::new(b(false), true))), Some(Some(true)));
    }

    #[test]
    fn test_unavailable_column() {
        let col = Expression::Column(ColumnExpression::new(3, LogicalType::Boolean));
        let and = Expression::And(AndExpression::new(vec![col.clone(), b(true)]));
        assert!(and.evaluate(&EncodedRow::default()).is_none());
        // a FALSE conjunct decides regardless
        let and = Expression::And(AndExpression::new(vec![col, b(false)]));
        assert_eq!(and.evaluate(&EncodedRow::default()).unwrap().as_bool(), Some(false));
    }
}
