//! IN-list membership node.
//!
//! `probe IN (v1, v2, ...)` with constant candidates. The candidates are
//! coerced to the probe's type and order once, at construction, and kept
//! as a sorted, de-duplicated set of encoded values. Evaluation is a hash
//! lookup of the probe's bytes.
//!
//! Degenerate lists never produce this node:
//!
//! | after filtering candidates        | result                         |
//! |-----------------------------------|--------------------------------|
//! | constant NULL probe               | NULL                           |
//! | exactly one candidate given       | `probe = c` / `probe != c`     |
//! | nothing left                      | FALSE (`NOT IN`: TRUE)         |
//! | only NULL left                    | NULL                           |
//! | one value left, no NULL           | `probe = v` / `probe != v`     |

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use strata_common::config::ExpressionConfig;
use strata_common::{StrataError, StrataResult};
use strata_types::{codec, coerce_bytes, EncodedValue, LogicalType};
use tracing::debug;

use crate::comparison::{CompareOp, ComparisonExpression};
use crate::expression::{fold_constant, Expression};
use crate::literal::LiteralExpression;
use crate::logical::NotExpression;
use crate::row::{NullRow, RowSource};

/// Membership test of a probe against a constant set.
#[derive(Debug, Clone)]
pub struct InListExpression {
    probe: Box<Expression>,
    /// Distinct members in ascending byte order.
    values: Vec<EncodedValue>,
    lookup: HashSet<EncodedValue>,
    contains_null: bool,
    fixed_width: i32,
    min_value: EncodedValue,
    max_value: EncodedValue,
    values_byte_length: usize,
    /// Candidates as literals of the probe type; not serialized.
    key_expressions: Vec<Expression>,
    max_display_len: usize,
}

impl InListExpression {
    /// Builds `children[0] IN (children[1..])`, or `NOT IN` when `negate`
    /// is set, using the default configuration.
    pub fn create(children: Vec<Expression>, negate: bool) -> StrataResult<Expression> {
        Self::create_with_config(children, negate, &ExpressionConfig::default())
    }

    /// Builds `children[0] [NOT] IN (children[1..])`.
    ///
    /// Candidates must be constant. Candidates that cannot be coerced to the
    /// probe's type can never match and are dropped. Degenerate lists
    /// collapse to a comparison or a literal, and a constant probe folds
    /// the whole predicate.
    pub fn create_with_config(
        children: Vec<Expression>,
        negate: bool,
        config: &ExpressionConfig,
    ) -> StrataResult<Expression> {
        if children.len() < 2 {
            return Err(StrataError::invalid_argument(format!(
                "IN-list needs a probe and at least one candidate, got {} children",
                children.len()
            )));
        }
        let mut children = children.into_iter();
        let probe = match children.next() {
            Some(probe) => fold_constant(probe),
            None => return Err(StrataError::internal("IN-list lost its probe")),
        };
        let mut candidates: Vec<Expression> = children.collect();

        if probe.is_stateless() && probe.evaluate(&NullRow).map_or(true, |v| v.is_null()) {
            debug!(probe = %probe, "IN-list with NULL probe collapsed to NULL");
            return Ok(null_boolean());
        }
        let op = if negate { CompareOp::NotEq } else { CompareOp::Eq };
        if candidates.len() == 1 {
            if let Some(candidate) = candidates.pop() {
                return ComparisonExpression::create(op, probe, candidate);
            }
        }

        let probe_type = probe.data_type();
        let probe_order = probe.sort_order();
        let mut contains_null = false;
        let mut values = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if !candidate.is_stateless() {
                return Err(StrataError::invalid_argument(format!(
                    "IN-list candidate {candidate} is not constant"
                )));
            }
            let value = candidate.evaluate(&NullRow).ok_or_else(|| {
                StrataError::invalid_argument(format!(
                    "IN-list candidate {candidate} cannot be evaluated"
                ))
            })?;
            if value.is_null() {
                contains_null = true;
                continue;
            }
            match coerce_bytes(
                &value,
                candidate.data_type(),
                candidate.sort_order(),
                probe_type,
                probe_order,
            ) {
                Ok(coerced) => values.push(coerced),
                Err(e) if e.is_coercion_failure() => {
                    debug!(candidate = %candidate, error = %e, "dropped IN-list candidate that cannot match");
                }
                Err(e) => return Err(e),
            }
        }
        values.sort();
        values.dedup();

        match (values.len(), contains_null) {
            (0, false) => {
                debug!(probe = %probe, negate, "IN-list without matchable candidates collapsed to constant");
                return Ok(Expression::Literal(LiteralExpression::boolean(negate)));
            }
            (0, true) => {
                debug!(probe = %probe, "IN-list with only NULL candidates collapsed to NULL");
                return Ok(null_boolean());
            }
            (1, false) => {
                let value = values.remove(0);
                let literal = LiteralExpression::new(value, probe_type, probe_order);
                return ComparisonExpression::create(op, probe, Expression::Literal(literal));
            }
            _ => {}
        }

        let node = Self::from_parts(probe, values, contains_null, config.max_display_values_len);
        let expr = Expression::InList(node);
        let expr = if negate {
            Expression::Not(NotExpression::new(expr))
        } else {
            expr
        };
        Ok(fold_constant(expr))
    }

    /// Assembles the node from members already in ascending byte order.
    pub(crate) fn from_parts(
        probe: Expression,
        values: Vec<EncodedValue>,
        contains_null: bool,
        max_display_len: usize,
    ) -> Self {
        let fixed_width = match values.first() {
            Some(first) if values.iter().all(|v| v.len() == first.len()) => {
                i32::try_from(first.len()).unwrap_or(-1)
            }
            _ => -1,
        };
        let min_value = values.first().cloned().unwrap_or_default();
        let max_value = values.last().cloned().unwrap_or_default();
        let values_byte_length = values.iter().map(|v| v.len()).sum();
        let key_expressions = values
            .iter()
            .map(|v| {
                Expression::Literal(LiteralExpression::new(
                    v.clone(),
                    probe.data_type(),
                    probe.sort_order(),
                ))
            })
            .collect();
        Self {
            lookup: values.iter().cloned().collect(),
            probe: Box::new(probe),
            values,
            contains_null,
            fixed_width,
            min_value,
            max_value,
            values_byte_length,
            key_expressions,
            max_display_len,
        }
    }

    /// The tested expression.
    pub fn probe(&self) -> &Expression {
        &self.probe
    }

    /// Distinct members in ascending byte order.
    pub fn values(&self) -> &[EncodedValue] {
        &self.values
    }

    /// Returns true if the bytes are a member.
    pub fn contains(&self, value: &EncodedValue) -> bool {
        self.lookup.contains(value)
    }

    /// Returns true if a candidate was NULL.
    pub fn contains_null(&self) -> bool {
        self.contains_null
    }

    /// Byte width shared by every member, or -1 if widths differ.
    pub fn fixed_width(&self) -> i32 {
        self.fixed_width
    }

    /// Smallest member by byte order.
    pub fn min_key(&self) -> &EncodedValue {
        &self.min_value
    }

    /// Largest member by byte order.
    pub fn max_key(&self) -> &EncodedValue {
        &self.max_value
    }

    /// Total length of all member bytes.
    pub fn values_byte_length(&self) -> usize {
        self.values_byte_length
    }

    /// The candidates as literals of the probe type.
    pub fn key_expressions(&self) -> &[Expression] {
        &self.key_expressions
    }

    pub(crate) fn evaluate(&self, row: &dyn RowSource) -> Option<EncodedValue> {
        let value = self.probe.evaluate(row)?;
        if value.is_null() {
            return Some(EncodedValue::null());
        }
        Some(if self.lookup.contains(&value) {
            EncodedValue::true_value()
        } else if self.contains_null {
            EncodedValue::null()
        } else {
            EncodedValue::false_value()
        })
    }

    fn literal_of(&self, value: &EncodedValue) -> String {
        codec::to_string_literal(self.probe.data_type(), value, self.probe.sort_order())
            .unwrap_or_else(|_| format!("{value:?}"))
    }
}

fn null_boolean() -> Expression {
    Expression::Literal(LiteralExpression::null(LogicalType::Boolean))
}

impl PartialEq for InListExpression {
    fn eq(&self, other: &Self) -> bool {
        self.contains_null == other.contains_null
            && self.lookup == other.lookup
            && self.probe == other.probe
    }
}

impl Eq for InListExpression {}

impl Hash for InListExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.probe.hash(state);
        self.contains_null.hash(state);
        // Member order must not matter.
        let members = self.lookup.iter().fold(0u64, |acc, v| {
            let mut hasher = DefaultHasher::new();
            v.hash(&mut hasher);
            acc ^ hasher.finish()
        });
        state.write_u64(members);
        state.write_usize(self.lookup.len());
    }
}

impl fmt::Display for InListExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = format!("{} IN (", self.probe);
        if self.contains_null {
            buf.push_str("null,");
        }
        for value in &self.values {
            buf.push_str(&self.literal_of(value));
            buf.push(',');
            if buf.len() >= self.max_display_len {
                buf.push_str("... ");
                break;
            }
        }
        if buf.ends_with(',') || buf.ends_with(' ') {
            buf.pop();
        }
        buf.push(')');
        f.write_str(&buf)
    }
}
