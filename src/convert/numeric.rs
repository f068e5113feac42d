//! Numeric narrowing
//!
//! Materializes decimal text into the narrowest native numeric type that
//! represents it exactly. The ladder is int8, int16, int32, int64, big
//! integer, float32 (only when exact), float64.

use crate::error::{Error, Result};
use crate::schema::{Schema, SchemaKind, Value};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::str::FromStr;

/// Decimal exponent of the largest power of ten a double can exceed
const MAX_MAGNITUDE: i64 = 309;

/// Decimal exponent of the smallest power of ten above the smallest
/// subnormal double
const MIN_MAGNITUDE: i64 = -323;

/// Parse decimal text whose magnitude a double can represent.
///
/// The check runs on digit count and scale alone, before anything rescales
/// the mantissa, so exponents like `1e100000000` fail fast.
pub(crate) fn parse_decimal(text: &str) -> Result<BigDecimal> {
    let invalid = || Error::InvalidNumber {
        text: text.to_string(),
    };
    let decimal = BigDecimal::from_str(text.trim()).map_err(|_| invalid())?;

    let (mantissa, scale) = decimal.as_bigint_and_exponent();
    if mantissa.is_zero() {
        return Ok(BigDecimal::zero());
    }

    // |value| lies in [10^(magnitude - 1), 10^magnitude)
    let digits = i64::try_from(decimal.digits()).map_err(|_| invalid())?;
    let magnitude = digits.checked_sub(scale).ok_or_else(invalid)?;
    if !(MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&magnitude) {
        return Err(invalid());
    }
    Ok(decimal)
}

/// Narrow a number given as decimal text
pub fn narrow_str(text: &str) -> Result<Value> {
    let decimal = parse_decimal(text)?;

    if decimal.is_integer() {
        let (int, _) = decimal.with_scale(0).into_bigint_and_exponent();
        return Ok(narrow_integer(int));
    }

    if let Ok(f) = text.trim().parse::<f32>() {
        if f.is_finite() && exact_f32(f) == decimal {
            return Ok(Value::Float32(f));
        }
    }

    let f = match text.trim().parse::<f64>() {
        Ok(f) => f,
        Err(_) => decimal.to_f64().ok_or_else(|| Error::InvalidNumber {
            text: text.to_string(),
        })?,
    };
    Ok(Value::Float64(f))
}

/// Narrow a parsed JSON number, using its original text
pub fn narrow_json(number: &serde_json::Number) -> Result<Value> {
    narrow_str(&number.to_string())
}

/// Narrow an integer down the integer rungs of the ladder
pub fn narrow_integer(int: BigInt) -> Value {
    if let Some(v) = int.to_i8() {
        Value::Int8(v)
    } else if let Some(v) = int.to_i16() {
        Value::Int16(v)
    } else if let Some(v) = int.to_i32() {
        Value::Int32(v)
    } else if let Some(v) = int.to_i64() {
        Value::Int64(v)
    } else {
        Value::BigInt(int)
    }
}

/// Narrow every numeric leaf of a value, building new containers.
///
/// Big integers and decimals are already exact and pass through unchanged,
/// as do structs, whose leaves are bound to their schema.
pub fn narrow_value(value: &Value) -> Value {
    match value {
        Value::Int8(v) => narrow_integer(BigInt::from(*v)),
        Value::Int16(v) => narrow_integer(BigInt::from(*v)),
        Value::Int32(v) => narrow_integer(BigInt::from(*v)),
        Value::Int64(v) => narrow_integer(BigInt::from(*v)),
        Value::Float64(v) => narrow_f64(*v),
        Value::Array(items) => Value::Array(items.iter().map(narrow_value).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), narrow_value(v)))
                .collect::<IndexMap<_, _>>(),
        ),
        other => other.clone(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn narrow_f64(v: f64) -> Value {
    let f = v as f32;
    if v.is_finite() && f64::from(f) == v {
        Value::Float32(f)
    } else {
        Value::Float64(v)
    }
}

/// Schema describing a narrowed leaf value. Every leaf is optional.
pub fn leaf_schema(value: &Value) -> Result<Schema> {
    let schema = match value {
        Value::Null => Schema::NULL_SENTINEL,
        Value::Boolean(_) => Schema::optional(SchemaKind::Boolean),
        Value::Int8(_) => Schema::optional(SchemaKind::Int8),
        Value::Int16(_) => Schema::optional(SchemaKind::Int16),
        Value::Int32(_) => Schema::optional(SchemaKind::Int32),
        Value::Int64(_) => Schema::optional(SchemaKind::Int64),
        Value::Float32(_) => Schema::optional(SchemaKind::Float32),
        Value::Float64(_) => Schema::optional(SchemaKind::Float64),
        Value::String(_) => Schema::optional(SchemaKind::String),
        Value::Bytes(_) => Schema::optional(SchemaKind::Bytes),
        Value::BigInt(_) => Schema::decimal(0, true),
        Value::Decimal(d) => Schema::decimal(d.as_bigint_and_exponent().1, true),
        Value::Timestamp(_) => Schema::timestamp(true),
        Value::Array(_) | Value::Map(_) | Value::Struct(_) => {
            return Err(Error::unhandled("leaf", value.kind_name()))
        }
    };
    Ok(schema)
}

/// Exact decimal value of a finite f32, digit for digit
fn exact_f32(f: f32) -> BigDecimal {
    let bits = f.to_bits();
    let negative = bits >> 31 == 1;
    let exponent_bits = i64::from((bits >> 23) & 0xff);
    let fraction = bits & 0x7f_ffff;

    // value = mantissa * 2^exponent
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -149)
    } else {
        (fraction | 0x80_0000, exponent_bits - 150)
    };

    let mut int = BigInt::from(mantissa);
    if negative {
        int = -int;
    }

    if exponent >= 0 {
        BigDecimal::new(int << exponent as usize, 0)
    } else {
        // m * 2^-k == m * 5^k / 10^k
        let k = -exponent;
        BigDecimal::new(int * BigInt::from(5u8).pow(k as u32), k)
    }
}
