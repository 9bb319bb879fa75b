//! Decimal normalization.
//!
//! Precision is the number of significant digits and scale the number of
//! digits after the decimal point. Values never carry more than
//! [`MAX_DECIMAL_PRECISION`] digits.

use rust_decimal::{Decimal, RoundingStrategy};

use strata_common::constants::{MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE};
use strata_common::{StrataError, StrataResult};

/// Strips trailing zeros and rounds to the maximum precision.
///
/// Fails with `PrecisionOverflow` when the integer part alone needs more
/// digits than the maximum precision.
pub fn normalize(value: Decimal) -> StrataResult<Decimal> {
    let stripped = value.normalize();
    let digits = precision(&stripped);
    if digits <= MAX_DECIMAL_PRECISION {
        return Ok(stripped);
    }
    let excess = digits - MAX_DECIMAL_PRECISION;
    if stripped.scale() < excess {
        return Err(overflow(&value, MAX_DECIMAL_PRECISION, 0));
    }
    let rounded = stripped
        .round_dp_with_strategy(stripped.scale() - excess, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    // Rounding up can carry into a new leading digit.
    if precision(&rounded) > MAX_DECIMAL_PRECISION {
        return Err(overflow(&value, MAX_DECIMAL_PRECISION, 0));
    }
    Ok(rounded)
}

/// Number of significant digits, counting leading fractional zeros.
///
/// `12.340` has precision 5 and `0.001` precision 3.
pub fn precision(value: &Decimal) -> u32 {
    let mantissa = value.mantissa().unsigned_abs();
    let digits = if mantissa == 0 {
        1
    } else {
        mantissa.ilog10() + 1
    };
    digits.max(value.scale())
}

/// Digits before the decimal point (`precision - scale`).
pub fn integer_digits(value: &Decimal) -> u32 {
    precision(value) - value.scale()
}

/// Fits `value` into DECIMAL(`precision`, `scale`).
///
/// Excess fractional digits are truncated toward zero. Returns `None` when
/// the integer digits do not fit; the caller decides whether that is an
/// error.
pub fn set_width_and_scale(value: Decimal, precision: u32, scale: u32) -> Option<Decimal> {
    if scale > precision || scale > MAX_DECIMAL_SCALE {
        return None;
    }
    let stripped = value.normalize();
    if integer_digits(&stripped) > precision - scale {
        return None;
    }
    let mut truncated = stripped.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    truncated.rescale(scale);
    Some(truncated)
}

/// Like [`set_width_and_scale`], failing with `PrecisionOverflow`.
pub fn normalize_to(value: Decimal, precision: u32, scale: u32) -> StrataResult<Decimal> {
    set_width_and_scale(value, precision, scale).ok_or_else(|| overflow(&value, precision, scale))
}

fn overflow(value: &Decimal, precision: u32, scale: u32) -> StrataError {
    StrataError::PrecisionOverflow {
        value: value.to_string(),
        precision,
        scale,
    }
}
