//! Key ranges derived from predicates.
//!
//! A [`KeyRange`] bounds the stored bytes of one column. The store can
//! skip everything outside it. Ranges are conservative: a row inside the
//! range may still fail the predicate, but no row outside it can pass.

use strata_types::EncodedValue;

use crate::column::ColumnExpression;
use crate::comparison::{CompareOp, ComparisonExpression};
use crate::expression::Expression;
use crate::in_list::InListExpression;
use crate::literal::LiteralExpression;
use crate::logical::{AndExpression, OrExpression};
use crate::visitor::ExpressionVisitor;

/// One end of a key range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBound {
    /// Bound bytes.
    pub key: EncodedValue,
    /// Whether `key` itself is inside the range.
    pub inclusive: bool,
}

impl KeyBound {
    /// Bound including `key`.
    pub fn inclusive(key: EncodedValue) -> Self {
        Self {
            key,
            inclusive: true,
        }
    }

    /// Bound excluding `key`.
    pub fn exclusive(key: EncodedValue) -> Self {
        Self {
            key,
            inclusive: false,
        }
    }
}

/// A contiguous range of byte keys. `None` bounds are unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Option<KeyBound>,
    upper: Option<KeyBound>,
    empty: bool,
}

impl KeyRange {
    /// Every key.
    pub fn everything() -> Self {
        Self {
            lower: None,
            upper: None,
            empty: false,
        }
    }

    /// No key.
    pub fn empty() -> Self {
        Self {
            lower: None,
            upper: None,
            empty: true,
        }
    }

    /// Exactly `key`.
    pub fn point(key: EncodedValue) -> Self {
        Self::between(Some(KeyBound::inclusive(key.clone())), Some(KeyBound::inclusive(key)))
    }

    /// Keys between two bounds.
    pub fn between(lower: Option<KeyBound>, upper: Option<KeyBound>) -> Self {
        let empty = match (&lower, &upper) {
            (Some(l), Some(u)) => match l.key.cmp(&u.key) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => !(l.inclusive && u.inclusive),
                std::cmp::Ordering::Less => false,
            },
            _ => false,
        };
        if empty {
            return Self::empty();
        }
        Self {
            lower,
            upper,
            empty: false,
        }
    }

    /// Lower bound, `None` if unbounded.
    pub fn lower(&self) -> Option<&KeyBound> {
        self.lower.as_ref()
    }

    /// Upper bound, `None` if unbounded.
    pub fn upper(&self) -> Option<&KeyBound> {
        self.upper.as_ref()
    }

    /// Returns true if no key is in the range.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Returns true if every key is in the range.
    pub fn is_everything(&self) -> bool {
        !self.empty && self.lower.is_none() && self.upper.is_none()
    }

    /// Returns true if `key` is in the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        if self.empty {
            return false;
        }
        let above_lower = self.lower.as_ref().map_or(true, |b| {
            let k = b.key.as_bytes();
            key > k || (b.inclusive && key == k)
        });
        let below_upper = self.upper.as_ref().map_or(true, |b| {
            let k = b.key.as_bytes();
            key < k || (b.inclusive && key == k)
        });
        above_lower && below_upper
    }

    /// Keys in both ranges.
    pub fn intersect(&self, other: &KeyRange) -> KeyRange {
        if self.empty || other.empty {
            return Self::empty();
        }
        let lower = tighter(self.lower.as_ref(), other.lower.as_ref(), true);
        let upper = tighter(self.upper.as_ref(), other.upper.as_ref(), false);
        Self::between(lower, upper)
    }

    /// The smallest range covering both.
    pub fn span(&self, other: &KeyRange) -> KeyRange {
        if self.empty {
            return other.clone();
        }
        if other.empty {
            return self.clone();
        }
        let lower = looser(self.lower.as_ref(), other.lower.as_ref(), true);
        let upper = looser(self.upper.as_ref(), other.upper.as_ref(), false);
        Self::between(lower, upper)
    }
}

/// The more restrictive of two bounds on the same side.
fn tighter(a: Option<&KeyBound>, b: Option<&KeyBound>, is_lower: bool) -> Option<KeyBound> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) | (None, Some(x)) => Some(x.clone()),
        (Some(x), Some(y)) => {
            let pick_x = match x.key.cmp(&y.key) {
                std::cmp::Ordering::Equal => !x.inclusive,
                std::cmp::Ordering::Greater => is_lower,
                std::cmp::Ordering::Less => !is_lower,
            };
            Some(if pick_x { x.clone() } else { y.clone() })
        }
    }
}

/// The less restrictive of two bounds on the same side.
fn looser(a: Option<&KeyBound>, b: Option<&KeyBound>, is_lower: bool) -> Option<KeyBound> {
    match (a, b) {
        (Some(x), Some(y)) => {
            let pick_x = match x.key.cmp(&y.key) {
                std::cmp::Ordering::Equal => x.inclusive,
                std::cmp::Ordering::Greater => !is_lower,
                std::cmp::Ordering::Less => is_lower,
            };
            Some(if pick_x { x.clone() } else { y.clone() })
        }
        _ => None,
    }
}

/// Derives the key range of one column from a predicate.
///
/// Understands comparisons of the column against a constant, IN-lists on
/// the column (through their min/max members), AND, OR and boolean
/// constants. Anything else yields [`KeyRange::everything`].
#[derive(Debug, Clone)]
pub struct KeyRangeVisitor {
    position: usize,
}

impl KeyRangeVisitor {
    /// Creates a visitor for the column at `position`.
    pub fn new(position: usize) -> Self {
        Self { position }
    }

    /// Derives the range of column `position` allowed by `predicate`.
    pub fn key_range(predicate: &Expression, position: usize) -> KeyRange {
        predicate.accept(&mut Self::new(position))
    }

    fn is_target<'a>(&self, expr: &'a Expression) -> Option<&'a ColumnExpression> {
        match expr {
            Expression::Column(col) if col.position() == self.position => Some(col),
            _ => None,
        }
    }
}

fn range_for(op: CompareOp, key: EncodedValue) -> KeyRange {
    match op {
        CompareOp::Eq => KeyRange::point(key),
        CompareOp::NotEq => KeyRange::everything(),
        CompareOp::Lt => KeyRange::between(None, Some(KeyBound::exclusive(key))),
        CompareOp::LtEq => KeyRange::between(None, Some(KeyBound::inclusive(key))),
        CompareOp::Gt => KeyRange::between(Some(KeyBound::exclusive(key)), None),
        CompareOp::GtEq => KeyRange::between(Some(KeyBound::inclusive(key)), None),
    }
}

impl ExpressionVisitor for KeyRangeVisitor {
    type Output = KeyRange;

    fn visit_enter(&mut self, expr: &Expression) -> bool {
        matches!(expr, Expression::And(_) | Expression::Or(_))
    }

    fn default_return(&mut self, _expr: &Expression, _children: Vec<KeyRange>) -> KeyRange {
        KeyRange::everything()
    }

    fn visit_literal(&mut self, node: &LiteralExpression) -> Option<KeyRange> {
        // FALSE and NULL predicates select nothing.
        match node.value().as_bool() {
            Some(true) => None,
            _ if node.data_type() == strata_types::LogicalType::Boolean => Some(KeyRange::empty()),
            _ => None,
        }
    }

    fn visit_leave_comparison(
        &mut self,
        node: &ComparisonExpression,
        _children: &[KeyRange],
    ) -> Option<KeyRange> {
        let (col, lit, op) = match (node.lhs(), node.rhs()) {
            (lhs, Expression::Literal(lit)) => (self.is_target(lhs)?, lit, node.op()),
            (Expression::Literal(lit), rhs) => (self.is_target(rhs)?, lit, node.op().mirror()),
            _ => return None,
        };
        if lit.data_type() != col.data_type() || lit.sort_order() != col.sort_order() {
            return None;
        }
        if lit.is_null() {
            return Some(KeyRange::empty());
        }
        // Descending bytes run opposite to values.
        let op = if col.sort_order().is_desc() { op.mirror() } else { op };
        Some(range_for(op, lit.value().clone()))
    }

    fn visit_leave_in_list(
        &mut self,
        node: &InListExpression,
        _children: &[KeyRange],
    ) -> Option<KeyRange> {
        self.is_target(node.probe())?;
        Some(KeyRange::between(
            Some(KeyBound::inclusive(node.min_key().clone())),
            Some(KeyBound::inclusive(node.max_key().clone())),
        ))
    }

    fn visit_leave_and(&mut self, _node: &AndExpression, children: &[KeyRange]) -> Option<KeyRange> {
        Some(
            children
                .iter()
                .fold(KeyRange::everything(), |acc, r| acc.intersect(r)),
        )
    }

    fn visit_leave_or(&mut self, _node: &OrExpression, children: &[KeyRange]) -> Option<KeyRange> {
        let mut ranges = children.iter();
        let first = ranges.next()?.clone();
        Some(ranges.fold(first, |acc, r| acc.span(r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::{codec, Datum, LogicalType, SortOrder};

    fn col(order: SortOrder) -> Expression {
        Expression::Column(ColumnExpression::new(0, LogicalType::Integer).with_sort_order(order))
    }

    fn int(v: i32) -> Expression {
        Expression::Literal(LiteralExpression::from_datum(&Datum::Integer(v)).unwrap())
    }

    fn enc(v: i32) -> EncodedValue {
        codec::encode(LogicalType::Integer, &Datum::Integer(v)).unwrap()
    }

    fn cmp(op: CompareOp, lhs: Expression, rhs: Expression) -> Expression {
        ComparisonExpression::create(op, lhs, rhs).unwrap()
    }

    #[test]
    fn test_range_algebra() {
        let a = KeyRange::between(Some(KeyBound::inclusive(enc(1))), Some(KeyBound::exclusive(enc(10))));
        let b = KeyRange::between(Some(KeyBound::exclusive(enc(5))), None);
        let both = a.intersect(&b);
        assert!(!both.contains(&enc(5)));
        assert!(both.contains(&enc(6)));
        assert!(!both.contains(&enc(10)));

        let disjoint = KeyRange::point(enc(1)).intersect(&KeyRange::point(enc(2)));
        assert!(disjoint.is_empty());

        let cover = KeyRange::point(enc(1)).span(&KeyRange::point(enc(4)));
        assert!(cover.contains(&enc(3)));
        assert!(KeyRange::empty().span(&cover) == cover);
    }

    #[test]
    fn test_comparison_ranges() {
        let r = KeyRangeVisitor::key_range(&cmp(CompareOp::Lt, col(SortOrder::Asc), int(5)), 0);
        assert!(r.contains(&enc(4)));
        assert!(!r.contains(&enc(5)));

        // literal on the left
        let r = KeyRangeVisitor::key_range(&cmp(CompareOp::Lt, int(5), col(SortOrder::Asc)), 0);
        assert!(r.contains(&enc(6)));
        assert!(!r.contains(&enc(5)));

        // other column
        let r = KeyRangeVisitor::key_range(&cmp(CompareOp::Lt, col(SortOrder::Asc), int(5)), 1);
        assert!(r.is_everything());
    }

    #[test]
    fn test_descending_column_range() {
        let r = KeyRangeVisitor::key_range(&cmp(CompareOp::Gt, col(SortOrder::Desc), int(5)), 0);
        let stored =
            |v| codec::encode_with_order(LogicalType::Integer, &Datum::Integer(v), SortOrder::Desc).unwrap();
        assert!(r.contains(&stored(6)));
        assert!(!r.contains(&stored(5)));
        assert!(!r.contains(&stored(4)));
    }

    #[test]
    fn test_in_list_uses_min_max() {
        let expr = InListExpression::create(
            vec![col(SortOrder::Asc), int(7), int(3), int(5)],
            false,
        )
        .unwrap();
        let r = KeyRangeVisitor::key_range(&expr, 0);
        assert_eq!(r.lower(), Some(&KeyBound::inclusive(enc(3))));
        assert_eq!(r.upper(), Some(&KeyBound::inclusive(enc(7))));
    }

    #[test]
    fn test_and_or() {
        let and = Expression::And(AndExpression::new(vec![
            cmp(CompareOp::GtEq, col(SortOrder::Asc), int(2)),
            cmp(CompareOp::Lt, col(SortOrder::Asc), int(8)),
        ]));
        let r = KeyRangeVisitor::key_range(&and, 0);
        assert!(r.contains(&enc(2)) && r.contains(&enc(7)));
        assert!(!r.contains(&enc(8)) && !r.contains(&enc(1)));

        let or = Expression::Or(OrExpression::new(vec![
            cmp(CompareOp::Eq, col(SortOrder::Asc), int(2)),
            cmp(CompareOp::Eq, col(SortOrder::Asc), int(9)),
        ]));
        let r = KeyRangeVisitor::key_range(&or, 0);
        assert!(r.contains(&enc(5)));
        assert!(!r.contains(&enc(10)));

        let contradiction = Expression::And(AndExpression::new(vec![
            cmp(CompareOp::Eq, col(SortOrder::Asc), int(2)),
            cmp(CompareOp::Eq, col(SortOrder::Asc), int(9)),
        ]));
        assert!(KeyRangeVisitor::key_range(&contradiction, 0).is_empty());
    }

    #[test]
    fn test_false_literal_is_empty() {
        let f = Expression::Literal(LiteralExpression::boolean(false));
        assert!(KeyRangeVisitor::key_range(&f, 0).is_empty());
        let t = Expression::Literal(LiteralExpression::boolean(true));
        assert!(KeyRangeVisitor::key_range(&t, 0).is_everything());
    }
}
