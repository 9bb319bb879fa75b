//! # strata-expr
//!
//! Expression trees for Strata.
//!
//! Expressions are compiled once on the client, constant-folded, and then
//! either evaluated locally or serialized and shipped to the server that
//! holds the rows. Every node evaluates against a [`RowSource`] and yields
//! an [`EncodedValue`](strata_types::EncodedValue) in the binary codec of
//! its result type.
//!
//! This crate implements:
//! - Node variants (literal, column, coercion, comparison, IN-list, logic)
//! - Constant folding of row-independent sub-trees
//! - Visitor traversal, including key-range extraction
//! - A versioned, forward-compatible wire format
//!
//! ## Example
//!
//! ```rust
//! use strata_expr::{ColumnExpression, Expression, InListExpression, LiteralExpression};
//! use strata_expr::row::EncodedRow;
//! use strata_types::{codec, Datum, LogicalType};
//!
//! let probe = Expression::Column(ColumnExpression::new(0, LogicalType::Integer));
//! let candidates = [3, 5, 7].map(|v| Expression::Literal(LiteralExpression::from_datum(&Datum::Integer(v)).unwrap()));
//! let mut children = vec![probe];
//! children.extend(candidates);
//! let in_list = InListExpression::create(children, false).unwrap();
//!
//! let five = codec::encode(LogicalType::Integer, &Datum::Integer(5)).unwrap();
//! let row = EncodedRow::from_values(&[five.as_bytes()]);
//! assert_eq!(in_list.evaluate(&row).unwrap().as_bool(), Some(true));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Column reference node
pub mod column;

/// Coercion node
pub mod coerce;

/// Comparison node
pub mod comparison;

/// Expression tree and evaluation
pub mod expression;

/// IN-list membership node
pub mod in_list;

/// Key ranges derived from predicates
pub mod key_range;

/// Constant node
pub mod literal;

/// NOT, AND, OR and IS NULL
pub mod logical;

/// Row access during evaluation
pub mod row;

/// Tree traversal
pub mod visitor;

/// Binary wire format
pub mod wire;

pub use column::ColumnExpression;
pub use coerce::CoerceExpression;
pub use comparison::{CompareOp, ComparisonExpression};
pub use expression::{fold_constant, Expression};
pub use in_list::InListExpression;
pub use key_range::{KeyRange, KeyRangeVisitor};
pub use literal::LiteralExpression;
pub use logical::{AndExpression, IsNullExpression, NotExpression, OrExpression};
pub use row::RowSource;
pub use visitor::{ExpressionVisitor, ReferencedColumnsVisitor};
