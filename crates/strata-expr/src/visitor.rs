//! Tree traversal.
//!
//! [`Expression::accept`] calls `visit_enter` on the way down and
//! `visit_leave` on the way up. `visit_leave` dispatches to one method per
//! node variant; a visitor overrides the variants it cares about and lets
//! `default_return` combine the child results of the rest.

use std::collections::BTreeSet;

use crate::coerce::CoerceExpression;
use crate::column::ColumnExpression;
use crate::comparison::ComparisonExpression;
use crate::expression::Expression;
use crate::in_list::InListExpression;
use crate::literal::LiteralExpression;
use crate::logical::{AndExpression, IsNullExpression, NotExpression, OrExpression};

/// A post-order fold over an expression tree.
#[allow(unused_variables)]
pub trait ExpressionVisitor {
    /// Result of visiting one node.
    type Output;

    /// Called before the children of `expr`. Returning false skips them.
    fn visit_enter(&mut self, expr: &Expression) -> bool {
        true
    }

    /// Called after the children of `expr` were visited.
    fn visit_leave(&mut self, expr: &Expression, children: &[Self::Output]) -> Option<Self::Output> {
        match expr {
            Expression::Literal(e) => self.visit_literal(e),
            Expression::Column(e) => self.visit_column(e),
            Expression::Coerce(e) => self.visit_leave_coerce(e, children),
            Expression::Comparison(e) => self.visit_leave_comparison(e, children),
            Expression::InList(e) => self.visit_leave_in_list(e, children),
            Expression::Not(e) => self.visit_leave_not(e, children),
            Expression::And(e) => self.visit_leave_and(e, children),
            Expression::Or(e) => self.visit_leave_or(e, children),
            Expression::IsNull(e) => self.visit_leave_is_null(e, children),
        }
    }

    /// Result for a node whose `visit_leave` returned `None`.
    fn default_return(&mut self, expr: &Expression, children: Vec<Self::Output>) -> Self::Output;

    /// Visits a literal.
    fn visit_literal(&mut self, node: &LiteralExpression) -> Option<Self::Output> {
        None
    }

    /// Visits a column reference.
    fn visit_column(&mut self, node: &ColumnExpression) -> Option<Self::Output> {
        None
    }

    /// Leaves a coercion.
    fn visit_leave_coerce(
        &mut self,
        node: &CoerceExpression,
        children: &[Self::Output],
    ) -> Option<Self::Output> {
        None
    }

    /// Leaves a comparison.
    fn visit_leave_comparison(
        &mut self,
        node: &ComparisonExpression,
        children: &[Self::Output],
    ) -> Option<Self::Output> {
        None
    }

    /// Leaves an IN-list.
    fn visit_leave_in_list(
        &mut self,
        node: &InListExpression,
        children: &[Self::Output],
    ) -> Option<Self::Output> {
        None
    }

    /// Leaves a NOT.
    fn visit_leave_not(&mut self, node: &NotExpression, children: &[Self::Output]) -> Option<Self::Output> {
        None
    }

    /// Leaves an AND.
    fn visit_leave_and(&mut self, node: &AndExpression, children: &[Self::Output]) -> Option<Self::Output> {
        None
    }

    /// Leaves an OR.
    fn visit_leave_or(&mut self, node: &OrExpression, children: &[Self::Output]) -> Option<Self::Output> {
        None
    }

    /// Leaves an IS NULL.
    fn visit_leave_is_null(
        &mut self,
        node: &IsNullExpression,
        children: &[Self::Output],
    ) -> Option<Self::Output> {
        None
    }
}

/// Collects the positions of every column an expression reads.
#[derive(Debug, Default)]
pub struct ReferencedColumnsVisitor {
    positions: BTreeSet<usize>,
}

impl ReferencedColumnsVisitor {
    /// Creates an empty visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits `expr` and returns the referenced positions in ascending order.
    pub fn collect(expr: &Expression) -> Vec<usize> {
        let mut visitor = Self::new();
        expr.accept(&mut visitor);
        visitor.positions.into_iter().collect()
    }

    /// Positions seen so far.
    pub fn positions(&self) -> &BTreeSet<usize> {
        &self.positions
    }
}

impl ExpressionVisitor for ReferencedColumnsVisitor {
    type Output = ();

    fn default_return(&mut self, _expr: &Expression, _children: Vec<()>) {}

    fn visit_column(&mut self, node: &ColumnExpression) -> Option<()> {
        self.positions.insert(node.position());
        Some(())
    }
}
