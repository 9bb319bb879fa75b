//! Coercion node.

use std::fmt;

use strata_common::{StrataError, StrataResult};
use strata_types::{coerce_bytes, EncodedValue, LogicalType, SortOrder};

use crate::expression::Expression;
use crate::row::RowSource;

/// Converts the value of its child to another type and order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoerceExpression {
    child: Box<Expression>,
    target_type: LogicalType,
    target_order: SortOrder,
}

impl CoerceExpression {
    /// Wraps `child` so that it produces `target_type` in `target_order`.
    ///
    /// Returns `child` itself when no conversion is needed, and a literal
    /// when `child` is one. Fails with `TypeMismatch` when the types are not
    /// coercible, or with the coercion error of a constant child.
    pub fn create(
        child: Expression,
        target_type: LogicalType,
        target_order: SortOrder,
    ) -> StrataResult<Expression> {
        if child.data_type() == target_type && child.sort_order() == target_order {
            return Ok(child);
        }
        if !child.data_type().is_coercible_to(target_type) {
            return Err(StrataError::type_mismatch(child.data_type(), target_type));
        }
        if let Expression::Literal(lit) = &child {
            return Ok(Expression::Literal(lit.coerce_to(target_type, target_order)?));
        }
        Ok(Expression::Coerce(Self::new(child, target_type, target_order)))
    }

    /// Builds the node without checks or folding.
    pub(crate) fn new(child: Expression, target_type: LogicalType, target_order: SortOrder) -> Self {
        Self {
            child: Box::new(child),
            target_type,
            target_order,
        }
    }

    /// The wrapped expression.
    pub fn child(&self) -> &Expression {
        &self.child
    }

    /// Result type.
    pub fn target_type(&self) -> LogicalType {
        self.target_type
    }

    /// Result order.
    pub fn target_order(&self) -> SortOrder {
        self.target_order
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        let value = self.child.evaluate(row)?;
        coerce_bytes(
            &value,
            self.child.data_type(),
            self.child.sort_order(),
            self.target_type,
            self.target_order,
        )
        .ok()
    }
}

impl fmt::Display for CoerceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TO_{}({})", self.target_type, self.child)
    }
}
