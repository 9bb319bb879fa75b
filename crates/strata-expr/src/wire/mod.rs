//! Binary wire format for expression trees.
//!
//! A serialized tree is one format version byte followed by the root node.
//! Every node is framed as
//!
//! ```text
//! +--------+-------------------+------------------------------------------+
//! | tag u8 | body len uvarint  | fields | child count uvarint | children  |
//! +--------+-------------------+------------------------------------------+
//! ```
//!
//! Readers consume the fields and children they know and skip whatever is
//! left of the body, so later versions may append optional trailing fields
//! without breaking older readers.

pub mod varint;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use strata_common::{
    StrataError, StrataResult, DEFAULT_MAX_DISPLAY_VALUES_LEN, EXPRESSION_WIRE_VERSION,
    MAX_EXPRESSION_DEPTH,
};
use strata_types::{EncodedValue, LogicalType, SortOrder};

use crate::coerce::CoerceExpression;
use crate::column::ColumnExpression;
use crate::comparison::{CompareOp, ComparisonExpression};
use crate::expression::Expression;
use crate::in_list::InListExpression;
use crate::literal::LiteralExpression;
use crate::logical::{AndExpression, IsNullExpression, NotExpression, OrExpression};

use self::varint::{get_len, get_svarint, put_svarint, put_uvarint};

const TAG_LITERAL: u8 = 1;
const TAG_COLUMN: u8 = 2;
const TAG_COERCE: u8 = 3;
const TAG_COMPARISON: u8 = 4;
const TAG_IN_LIST: u8 = 5;
const TAG_NOT: u8 = 6;
const TAG_AND: u8 = 7;
const TAG_OR: u8 = 8;
const TAG_IS_NULL: u8 = 9;

/// Serializes `expr` and its children.
pub fn serialize(expr: &Expression) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_u8(EXPRESSION_WIRE_VERSION);
    write_node(&mut buf, expr);
    buf.freeze()
}

/// Rebuilds a tree written by [`serialize`].
///
/// Fails with a serialization error on an unknown version or tag, a
/// truncated or oversized frame, trees nested deeper than the depth limit,
/// or bytes after the root node.
pub fn deserialize(bytes: &[u8]) -> StrataResult<Expression> {
    let mut buf = bytes;
    if !buf.has_remaining() {
        return Err(StrataError::serialization("empty expression"));
    }
    let version = buf.get_u8();
    if version != EXPRESSION_WIRE_VERSION {
        return Err(StrataError::serialization(format!(
            "unsupported expression format version {version}"
        )));
    }
    let expr = read_node(&mut buf, 0)?;
    if buf.has_remaining() {
        return Err(StrataError::serialization(format!(
            "{} trailing bytes after expression",
            buf.remaining()
        )));
    }
    Ok(expr)
}

fn write_node(out: &mut BytesMut, expr: &Expression) {
    let mut body = BytesMut::new();
    let tag = match expr {
        Expression::Literal(lit) => {
            body.put_u8(lit.data_type().type_id());
            body.put_u8(lit.sort_order().system_value());
            put_bytes(&mut body, lit.value().as_bytes());
            TAG_LITERAL
        }
        Expression::Column(col) => {
            put_uvarint(&mut body, col.position() as u64);
            body.put_u8(col.data_type().type_id());
            body.put_u8(col.sort_order().system_value());
            match col.name() {
                Some(name) => {
                    body.put_u8(1);
                    put_bytes(&mut body, name.as_bytes());
                }
                None => body.put_u8(0),
            }
            TAG_COLUMN
        }
        Expression::Coerce(c) => {
            body.put_u8(c.target_type().type_id());
            body.put_u8(c.target_order().system_value());
            TAG_COERCE
        }
        Expression::Comparison(c) => {
            body.put_u8(c.op().id());
            TAG_COMPARISON
        }
        Expression::InList(list) => {
            write_in_list(&mut body, list);
            TAG_IN_LIST
        }
        Expression::Not(_) => TAG_NOT,
        Expression::And(_) => TAG_AND,
        Expression::Or(_) => TAG_OR,
        Expression::IsNull(n) => {
            body.put_u8(u8::from(n.is_negated()));
            TAG_IS_NULL
        }
    };
    let children = expr.children();
    put_uvarint(&mut body, children.len() as u64);
    for child in children {
        write_node(&mut body, child);
    }
    out.put_u8(tag);
    put_uvarint(out, body.len() as u64);
    out.extend_from_slice(&body);
}

fn write_in_list(body: &mut BytesMut, list: &InListExpression) {
    body.put_u8(u8::from(list.contains_null()));
    put_svarint(body, i64::from(list.fixed_width()));
    put_uvarint(body, list.values_byte_length() as u64);
    for value in list.values() {
        body.extend_from_slice(value.as_bytes());
    }
    if list.fixed_width() < 0 {
        put_uvarint(body, list.values().len() as u64);
        for value in list.values() {
            put_uvarint(body, value.len() as u64);
        }
    }
}

fn put_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    put_uvarint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn read_node(buf: &mut &[u8], depth: usize) -> StrataResult<Expression> {
    if depth >= MAX_EXPRESSION_DEPTH {
        return Err(StrataError::serialization(format!(
            "expression nested deeper than {MAX_EXPRESSION_DEPTH}"
        )));
    }
    let tag = get_u8(buf, "node tag")?;
    let body_len = get_len(buf)?;
    if buf.remaining() < body_len {
        return Err(StrataError::serialization(format!(
            "node body truncated: need {body_len} bytes, have {}",
            buf.remaining()
        )));
    }
    let data: &[u8] = *buf;
    let mut body = &data[..body_len];
    *buf = &data[body_len..];

    let expr = match tag {
        TAG_LITERAL => {
            let ty = get_type(&mut body)?;
            let order = get_order(&mut body)?;
            let value = EncodedValue::copy_from_slice(get_bytes(&mut body, "literal value")?);
            expect_children(&mut body, depth, 0)?;
            Expression::Literal(LiteralExpression::new(value, ty, order))
        }
        TAG_COLUMN => {
            let position = get_len(&mut body)?;
            let ty = get_type(&mut body)?;
            let order = get_order(&mut body)?;
            let mut col = ColumnExpression::new(position, ty).with_sort_order(order);
            if get_u8(&mut body, "column name flag")? != 0 {
                let raw = get_bytes(&mut body, "column name")?;
                let name = std::str::from_utf8(raw)
                    .map_err(|e| StrataError::serialization(format!("column name: {e}")))?;
                col = col.with_name(name);
            }
            expect_children(&mut body, depth, 0)?;
            Expression::Column(col)
        }
        TAG_COERCE => {
            let ty = get_type(&mut body)?;
            let order = get_order(&mut body)?;
            let child = single_child(expect_children(&mut body, depth, 1)?)?;
            Expression::Coerce(CoerceExpression::new(child, ty, order))
        }
        TAG_COMPARISON => {
            let op = CompareOp::from_id(get_u8(&mut body, "comparison operator")?)?;
            let mut children = expect_children(&mut body, depth, 2)?.into_iter();
            match (children.next(), children.next()) {
                (Some(lhs), Some(rhs)) => Expression::Comparison(ComparisonExpression::new(op, lhs, rhs)),
                _ => return Err(StrataError::internal("comparison lost an operand")),
            }
        }
        TAG_IN_LIST => read_in_list(&mut body, depth)?,
        TAG_NOT => {
            let child = single_child(expect_children(&mut body, depth, 1)?)?;
            Expression::Not(NotExpression::new(child))
        }
        TAG_AND => Expression::And(AndExpression::new(read_children(&mut body, depth)?)),
        TAG_OR => Expression::Or(OrExpression::new(read_children(&mut body, depth)?)),
        TAG_IS_NULL => {
            let negate = get_u8(&mut body, "IS NULL flag")? != 0;
            let child = single_child(expect_children(&mut body, depth, 1)?)?;
            Expression::IsNull(IsNullExpression::new(child, negate))
        }
        other => {
            return Err(StrataError::serialization(format!("unknown expression tag {other}")))
        }
    };
    // Remaining body bytes are fields added by a newer writer.
    Ok(expr)
}

fn read_in_list(body: &mut &[u8], depth: usize) -> StrataResult<Expression> {
    let contains_null = get_u8(body, "IN-list null flag")? != 0;
    let fixed_width = get_svarint(body)?;
    let total = get_len(body)?;
    if body.remaining() < total {
        return Err(StrataError::serialization("IN-list values truncated"));
    }
    let raw = Bytes::copy_from_slice(&body[..total]);
    body.advance(total);

    let lengths: Vec<usize> = if fixed_width < 0 {
        let count = get_len(body)?;
        let lengths = (0..count).map(|_| get_len(body)).collect::<StrataResult<Vec<_>>>()?;
        if lengths.iter().sum::<usize>() != total {
            return Err(StrataError::serialization("IN-list value lengths do not add up"));
        }
        lengths
    } else {
        let width = usize::try_from(fixed_width)
            .map_err(|_| StrataError::serialization("IN-list width out of range"))?;
        if width == 0 || total % width != 0 {
            return Err(StrataError::serialization(format!(
                "IN-list byte length {total} is not a multiple of width {width}"
            )));
        }
        vec![width; total / width]
    };

    let mut values = Vec::with_capacity(lengths.len());
    let mut offset = 0;
    for len in lengths {
        values.push(EncodedValue::slice_of(&raw, offset, len));
        offset += len;
    }
    if values.windows(2).any(|w| w[0] >= w[1]) {
        return Err(StrataError::serialization("IN-list values not in ascending order"));
    }

    let probe = single_child(expect_children(body, depth, 1)?)?;
    Ok(Expression::InList(InListExpression::from_parts(
        probe,
        values,
        contains_null,
        DEFAULT_MAX_DISPLAY_VALUES_LEN,
    )))
}

fn read_children(body: &mut &[u8], depth: usize) -> StrataResult<Vec<Expression>> {
    let count = get_len(body)?;
    // Each child takes at least two bytes.
    if count > body.remaining() / 2 {
        return Err(StrataError::serialization(format!("child count {count} exceeds body")));
    }
    (0..count).map(|_| read_node(body, depth + 1)).collect()
}

fn expect_children(body: &mut &[u8], depth: usize, expected: usize) -> StrataResult<Vec<Expression>> {
    let children = read_children(body, depth)?;
    if children.len() != expected {
        return Err(StrataError::serialization(format!(
            "expected {expected} children, found {}",
            children.len()
        )));
    }
    Ok(children)
}

fn single_child(children: Vec<Expression>) -> StrataResult<Expression> {
    children
        .into_iter()
        .next()
        .ok_or_else(|| StrataError::internal("missing child"))
}

fn get_u8(buf: &mut &[u8], what: &str) -> StrataResult<u8> {
    if !buf.has_remaining() {
        return Err(StrataError::serialization(format!("{what} truncated")));
    }
    Ok(buf.get_u8())
}

fn get_bytes<'a>(buf: &mut &'a [u8], what: &str) -> StrataResult<&'a [u8]> {
    let len = get_len(buf)?;
    if buf.len() < len {
        return Err(StrataError::serialization(format!("{what} truncated")));
    }
    let data: &'a [u8] = *buf;
    let (head, tail) = data.split_at(len);
    *buf = tail;
    Ok(head)
}

fn get_type(buf: &mut &[u8]) -> StrataResult<LogicalType> {
    let id = get_u8(buf, "type id")?;
    LogicalType::from_type_id(id)
        .ok_or_else(|| StrataError::serialization(format!("unknown type id {id}")))
}

fn get_order(buf: &mut &[u8]) -> StrataResult<SortOrder> {
    let value = get_u8(buf, "sort order")?;
    SortOrder::from_system_value(value)
        .map_err(|_| StrataError::serialization(format!("unknown sort order {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::EncodedRow;
    use strata_types::{codec, Datum};

    fn col(position: usize, ty: LogicalType) -> Expression {
        Expression::Column(ColumnExpression::new(position, ty).with_name(format!("C{position}")))
    }

    fn lit(datum: Datum) -> Expression {
        Expression::Literal(LiteralExpression::from_datum(&datum).unwrap())
    }

    fn row(values: &[Datum]) -> EncodedRow {
        let encoded: Vec<EncodedValue> = values
            .iter()
            .map(|d| codec::encode(d.data_type(), d).unwrap())
            .collect();
        let slices: Vec<&[u8]> = encoded.iter().map(|e| e.as_bytes()).collect();
        EncodedRow::from_values(&slices)
    }

    fn round_trip(expr: &Expression) -> Expression {
        let bytes = serialize(expr);
        assert_eq!(bytes[0], EXPRESSION_WIRE_VERSION);
        deserialize(&bytes).unwrap()
    }

    #[test]
    fn test_round_trip_comparison() {
        let expr = ComparisonExpression::create(
            CompareOp::LtEq,
            col(0, LogicalType::BigInt),
            lit(Datum::BigInt(40)),
        )
        .unwrap();
        let back = round_trip(&expr);
        assert_eq!(back, expr);
        let r = row(&[Datum::BigInt(12)]);
        assert_eq!(back.evaluate(&r), expr.evaluate(&r));
    }

    #[test]
    fn test_round_trip_fixed_width_in_list() {
        let mut children = vec![col(0, LogicalType::Integer)];
        children.extend([9, 1, 4].map(|v| lit(Datum::Integer(v))));
        children.push(Expression::Literal(LiteralExpression::null(LogicalType::Integer)));
        let expr = InListExpression::create(children, false).unwrap();
        let back = round_trip(&expr);
        let Expression::InList(list) = &back else {
            panic!("expected IN-list, got {back:?}");
        };
        assert_eq!(list.fixed_width(), 4);
        assert!(list.contains_null());
        assert_eq!(list.min_key(), &codec::encode(LogicalType::Integer, &Datum::Integer(1)).unwrap());
        assert_eq!(list.max_key(), &codec::encode(LogicalType::Integer, &Datum::Integer(9)).unwrap());
        assert_eq!(back, expr);
        for probe in [1, 2, 9] {
            let r = row(&[Datum::Integer(probe)]);
            assert_eq!(back.evaluate(&r), expr.evaluate(&r));
        }
    }

    #[test]
    fn test_round_trip_variable_width_in_list() {
        let mut children = vec![col(0, LogicalType::Varchar)];
        children.extend(["a", "bcd", "ef"].map(|s| lit(Datum::String(s.into()))));
        let expr = InListExpression::create(children, true).unwrap();
        let back = round_trip(&expr);
        assert_eq!(back, expr);
        for probe in ["a", "zz"] {
            let r = row(&[Datum::String(probe.into())]);
            assert_eq!(back.evaluate(&r), expr.evaluate(&r));
        }
    }

    #[test]
    fn test_round_trip_logic_and_coerce() {
        let widened = CoerceExpression::create(
            col(1, LogicalType::Integer),
            LogicalType::BigInt,
            SortOrder::Desc,
        )
        .unwrap();
        let expr = Expression::Or(OrExpression::new(vec![
            Expression::IsNull(IsNullExpression::new(col(0, LogicalType::Varchar), true)),
            Expression::Not(NotExpression::new(widened.clone())),
            widened,
        ]));
        assert_eq!(round_trip(&expr), expr);
    }

    #[test]
    fn test_unknown_trailing_fields_are_skipped() {
        let expr = lit(Datum::Integer(7));
        let bytes = serialize(&expr);
        // version | tag | len | body
        let body = &bytes[3..];
        let mut patched = BytesMut::new();
        patched.put_u8(EXPRESSION_WIRE_VERSION);
        patched.put_u8(TAG_LITERAL);
        put_uvarint(&mut patched, (body.len() + 2) as u64);
        patched.extend_from_slice(body);
        patched.extend_from_slice(&[0xAB, 0xCD]);
        assert_eq!(deserialize(&patched).unwrap(), expr);
    }

    #[test]
    fn test_malformed_input() {
        assert!(deserialize(&[]).is_err());
        assert!(deserialize(&[99]).is_err());
        assert!(deserialize(&[EXPRESSION_WIRE_VERSION, 42, 0]).is_err());

        let bytes = serialize(&lit(Datum::Integer(7)));
        assert!(deserialize(&bytes[..bytes.len() - 1]).is_err());

        let mut extra = bytes.to_vec();
        extra.push(0);
        assert!(deserialize(&extra).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut expr = lit(Datum::Boolean(true));
        for _ in 0..MAX_EXPRESSION_DEPTH {
            expr = Expression::Not(NotExpression::new(expr));
        }
        let err = deserialize(&serialize(&expr)).unwrap_err();
        assert_eq!(err.code(), strata_common::ErrorCode::Serialization);
    }
}
