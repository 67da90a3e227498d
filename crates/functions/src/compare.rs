use std::cmp::Ordering;

use rust_decimal::Decimal;
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::Value;

/// Total order over comparable values, promoting across numeric kinds.
pub fn value_cmp(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Int64(x), Value::Int64(y)) => Ok(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Ok(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Ok(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Ok(x.cmp(y)),
        (Value::Interval(x), Value::Interval(y)) => Ok(x.cmp(y)),
        (Value::Numeric(_) | Value::Int64(_), Value::Numeric(_) | Value::Int64(_)) => {
            let x = a.as_numeric().unwrap_or(Decimal::ZERO);
            let y = b.as_numeric().unwrap_or(Decimal::ZERO);
            Ok(x.cmp(&y))
        }
        _ => match (crate::scalar::to_f64_lossy(a), crate::scalar::to_f64_lossy(b)) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .ok_or_else(|| Error::invalid_operation("NaN is not comparable")),
            _ => Err(Error::type_mismatch_with(
                format!("{}", a.kind()),
                format!("{}", b.kind()),
            )),
        },
    }
}

fn compare(a: &Value, b: &Value, f: fn(Ordering) -> bool) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::Bool(f(value_cmp(a, b)?)))
}

pub fn lt(a: &Value, b: &Value) -> Result<Value> {
    compare(a, b, Ordering::is_lt)
}

pub fn le(a: &Value, b: &Value) -> Result<Value> {
    compare(a, b, Ordering::is_le)
}

pub fn gt(a: &Value, b: &Value) -> Result<Value> {
    compare(a, b, Ordering::is_gt)
}

pub fn ge(a: &Value, b: &Value) -> Result<Value> {
    compare(a, b, Ordering::is_ge)
}

pub fn eq(a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    match value_cmp(a, b) {
        Ok(ord) => Ok(Value::Bool(ord.is_eq())),
        // Values of incomparable kinds are simply not equal.
        Err(_) => Ok(Value::Bool(a == b)),
    }
}

pub fn ne(a: &Value, b: &Value) -> Result<Value> {
    match eq(a, b)? {
        Value::Bool(v) => Ok(Value::Bool(!v)),
        other => Ok(other),
    }
}

/// The smaller of two values; a null accumulator is the identity.
pub fn lesser(a: &Value, b: &Value) -> Result<Value> {
    extremum(a, b, Ordering::is_le)
}

/// The larger of two values; a null accumulator is the identity.
pub fn greater(a: &Value, b: &Value) -> Result<Value> {
    extremum(a, b, Ordering::is_ge)
}

fn extremum(a: &Value, b: &Value, keep_left: fn(Ordering) -> bool) -> Result<Value> {
    if a.is_null() {
        return Ok(b.clone());
    }
    if b.is_null() {
        return Ok(a.clone());
    }
    if keep_left(value_cmp(a, b)?) {
        Ok(a.clone())
    } else {
        Ok(b.clone())
    }
}
