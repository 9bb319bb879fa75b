//! Expression tree and evaluation.
//!
//! Trees are immutable once built. Evaluation takes `&self` and allocates
//! its scratch space per call, so one compiled tree may be evaluated by
//! many threads at once.

use std::fmt;

use bytes::Bytes;
use strata_common::StrataResult;
use strata_types::{EncodedValue, LogicalType, SortOrder};
use tracing::trace;

use crate::coerce::CoerceExpression;
use crate::column::ColumnExpression;
use crate::comparison::ComparisonExpression;
use crate::in_list::InListExpression;
use crate::literal::LiteralExpression;
use crate::logical::{AndExpression, IsNullExpression, NotExpression, OrExpression};
use crate::row::{NullRow, RowSource};
use crate::visitor::ExpressionVisitor;

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// Constant value.
    Literal(LiteralExpression),
    /// Column of the current row.
    Column(ColumnExpression),
    /// Type/order conversion.
    Coerce(CoerceExpression),
    /// Binary comparison.
    Comparison(ComparisonExpression),
    /// IN-list membership.
    InList(InListExpression),
    /// Boolean negation.
    Not(NotExpression),
    /// Conjunction.
    And(AndExpression),
    /// Disjunction.
    Or(OrExpression),
    /// NULL test.
    IsNull(IsNullExpression),
}

impl Expression {
    /// Evaluates the expression against `row`.
    ///
    /// Returns `None` if the expression cannot be evaluated for this row
    /// (for example a needed column is not available). Otherwise returns
    /// the encoded result, with the empty span for NULL.
    pub fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        match self {
            Expression::Literal(e) => e.evaluate(),
            Expression::Column(e) => e.evaluate(row),
            Expression::Coerce(e) => e.evaluate(row),
            Expression::Comparison(e) => e.evaluate(row),
            Expression::InList(e) => e.evaluate(row),
            Expression::Not(e) => e.evaluate(row),
            Expression::And(e) => e.evaluate(row),
            Expression::Or(e) => e.evaluate(row),
            Expression::IsNull(e) => e.evaluate(row),
        }
    }

    /// Result type.
    pub fn data_type(&self) -> LogicalType {
        match self {
            Expression::Literal(e) => e.data_type(),
            Expression::Column(e) => e.data_type(),
            Expression::Coerce(e) => e.target_type(),
            Expression::Comparison(_)
            | Expression::InList(_)
            | Expression::Not(_)
            | Expression::And(_)
            | Expression::Or(_)
            | Expression::IsNull(_) => LogicalType::Boolean,
        }
    }

    /// Storage order of the result bytes.
    pub fn sort_order(&self) -> SortOrder {
        match self {
            Expression::Literal(e) => e.sort_order(),
            Expression::Column(e) => e.sort_order(),
            Expression::Coerce(e) => e.target_order(),
            _ => SortOrder::Asc,
        }
    }

    /// Child nodes in serialization order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Column(_) => Vec::new(),
            Expression::Coerce(e) => vec![e.child()],
            Expression::Comparison(e) => vec![e.lhs(), e.rhs()],
            Expression::InList(e) => vec![e.probe()],
            Expression::Not(e) => vec![e.child()],
            Expression::And(e) => e.children().iter().collect(),
            Expression::Or(e) => e.children().iter().collect(),
            Expression::IsNull(e) => vec![e.child()],
        }
    }

    /// Returns true if the result does not depend on the row.
    pub fn is_stateless(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Column(_) => false,
            _ => self.children().iter().all(|c| c.is_stateless()),
        }
    }

    /// Returns true if equal inputs always give equal results.
    ///
    /// Every node variant currently is.
    pub fn is_deterministic(&self) -> bool {
        self.children().iter().all(|c| c.is_deterministic())
    }

    /// Returns true if this is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_))
    }

    /// Serializes the tree to the wire format.
    pub fn serialize(&self) -> Bytes {
        crate::wire::serialize(self)
    }

    /// Rebuilds a tree from the wire format.
    pub fn deserialize(bytes: &[u8]) -> StrataResult<Self> {
        crate::wire::deserialize(bytes)
    }

    /// Walks the tree: `visit_enter` pre-order, children, then
    /// `visit_leave` post-order, falling back to `default_return`.
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        let child_results: Vec<V::Output> = if visitor.visit_enter(self) {
            self.children().into_iter().map(|c| c.accept(visitor)).collect()
        } else {
            Vec::new()
        };
        match visitor.visit_leave(self, &child_results) {
            Some(result) => result,
            None => visitor.default_return(self, child_results),
        }
    }
}

/// Replaces a row-independent expression by the literal it evaluates to.
///
/// Expressions that depend on the row, or that cannot be evaluated, are
/// returned unchanged.
pub fn fold_constant(expr: Expression) -> Expression {
    if expr.is_literal() || !expr.is_stateless() {
        return expr;
    }
    match expr.evaluate(&NullRow) {
        Some(value) => {
            trace!(expression = %expr, null = value.is_null(), "folded constant expression");
            Expression::Literal(LiteralExpression::new(
                value,
                expr.data_type(),
                expr.sort_order(),
            ))
        }
        None => expr,
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(e) => fmt::Display::fmt(e, f),
            Expression::Column(e) => fmt::Display::fmt(e, f),
            Expression::Coerce(e) => fmt::Display::fmt(e, f),
            Expression::Comparison(e) => fmt::Display::fmt(e, f),
            Expression::InList(e) => fmt::Display::fmt(e, f),
            Expression::Not(e) => fmt::Display::fmt(e, f),
            Expression::And(e) => fmt::Display::fmt(e, f),
            Expression::Or(e) => fmt::Display::fmt(e, f),
            Expression::IsNull(e) => fmt::Display::fmt(e, f),
        }
    }
}
