//! DATE, TIME and TIMESTAMP encodings.
//!
//! ```text
//! DATE       i32 days since 1970-01-01          (4 bytes)
//! TIME       i64 nanoseconds since midnight     (8 bytes)
//! TIMESTAMP  i64 seconds since epoch | u32 ns   (12 bytes)
//! ```
//!
//! Signed words use the integer encoding, so pre-epoch values sort first.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use strata_common::{StrataError, StrataResult};

use super::numeric::{decode_i32_as, decode_i64_as, encode_i32, encode_i64};
use crate::data_type::LogicalType;

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

pub(crate) fn encode_date(date: &NaiveDate) -> [u8; 4] {
    encode_i32(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

pub(crate) fn decode_date(bytes: &[u8]) -> StrataResult<NaiveDate> {
    let days = decode_i32_as(LogicalType::Date, bytes)?;
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| StrataError::illegal_data(LogicalType::Date, "day out of range"))
}

pub(crate) fn encode_time(time: &NaiveTime) -> [u8; 8] {
    let nanos =
        time.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + time.nanosecond() as i64;
    encode_i64(nanos)
}

pub(crate) fn decode_time(bytes: &[u8]) -> StrataResult<NaiveTime> {
    let nanos = decode_i64_as(LogicalType::Time, bytes)?;
    if nanos < 0 {
        return Err(StrataError::illegal_data(LogicalType::Time, "negative time of day"));
    }
    let secs = u32::try_from(nanos / NANOS_PER_SECOND)
        .map_err(|_| StrataError::illegal_data(LogicalType::Time, "time of day out of range"))?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, (nanos % NANOS_PER_SECOND) as u32)
        .ok_or_else(|| StrataError::illegal_data(LogicalType::Time, "time of day out of range"))
}

pub(crate) fn encode_timestamp(ts: &NaiveDateTime) -> [u8; 12] {
    let utc = ts.and_utc();
    let mut out = [0u8; 12];
    out[..8].copy_from_slice(&encode_i64(utc.timestamp()));
    out[8..].copy_from_slice(&utc.timestamp_subsec_nanos().to_be_bytes());
    out
}

pub(crate) fn decode_timestamp(bytes: &[u8]) -> StrataResult<NaiveDateTime> {
    if bytes.len() != 12 {
        return Err(StrataError::illegal_data(
            LogicalType::Timestamp,
            format!("expected 12 bytes, found {}", bytes.len()),
        ));
    }
    let secs = decode_i64_as(LogicalType::Timestamp, &bytes[..8])?;
    let nanos = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| StrataError::illegal_data(LogicalType::Timestamp, "instant out of range"))
}
