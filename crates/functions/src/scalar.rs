use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::Value;

pub fn upper(val: &Value) -> Result<Value> {
    match val {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        Value::Null => Ok(Value::Null),
        _ => Err(Error::type_mismatch("UPPER requires a string")),
    }
}

pub fn lower(val: &Value) -> Result<Value> {
    match val {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        Value::Null => Ok(Value::Null),
        _ => Err(Error::type_mismatch("LOWER requires a string")),
    }
}

pub fn initcap(val: &Value) -> Result<Value> {
    match val {
        Value::String(s) => {
            let mut result = String::with_capacity(s.len());
            let mut at_word_start = true;
            for c in s.chars() {
                if c.is_alphanumeric() {
                    if at_word_start {
                        result.extend(c.to_uppercase());
                    } else {
                        result.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    result.push(c);
                    at_word_start = true;
                }
            }
            Ok(Value::String(result))
        }
        Value::Null => Ok(Value::Null),
        _ => Err(Error::type_mismatch("INITCAP requires a string")),
    }
}

pub fn substring(val: &Value, start: &Value, len: Option<&Value>) -> Result<Value> {
    match (val, start) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(s), Value::Int64(start_idx)) => {
            let start = (*start_idx as usize).saturating_sub(1);
            let chars: Vec<char> = s.chars().collect();
            let result: String = match len {
                Some(Value::Int64(l)) => chars.into_iter().skip(start).take(*l as usize).collect(),
                Some(Value::Null) => return Ok(Value::Null),
                None => chars.into_iter().skip(start).collect(),
                _ => return Err(Error::type_mismatch("SUBSTRING length must be an integer")),
            };
            Ok(Value::String(result))
        }
        _ => Err(Error::type_mismatch("SUBSTRING requires (string, int, [int])")),
    }
}

pub fn char_length(val: &Value) -> Result<Value> {
    match val {
        Value::String(s) => Ok(Value::Int64(s.chars().count() as i64)),
        Value::Null => Ok(Value::Null),
        _ => Err(Error::type_mismatch("CHAR_LENGTH requires a string")),
    }
}

pub fn concat(values: &[Value]) -> Result<Value> {
    let mut result = String::new();
    for val in values {
        match val {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => result.push_str(s),
            v => result.push_str(&v.to_string()),
        }
    }
    Ok(Value::String(result))
}

pub fn overlay(val: &Value, replacement: &Value, start: &Value, len: Option<&Value>) -> Result<Value> {
    match (val, replacement, start) {
        (Value::Null, _, _) | (_, Value::Null, _) | (_, _, Value::Null) => Ok(Value::Null),
        (Value::String(s), Value::String(r), Value::Int64(start_idx)) => {
            let chars: Vec<char> = s.chars().collect();
            let start = (*start_idx as usize).saturating_sub(1).min(chars.len());
            let removed = match len {
                Some(Value::Int64(l)) => (*l).max(0) as usize,
                Some(Value::Null) => return Ok(Value::Null),
                None => r.chars().count(),
                _ => return Err(Error::type_mismatch("OVERLAY length must be an integer")),
            };
            let mut result: String = chars[..start].iter().collect();
            result.push_str(r);
            result.extend(chars.iter().skip(start + removed.min(chars.len() - start)));
            Ok(Value::String(result))
        }
        _ => Err(Error::type_mismatch("OVERLAY requires (string, string, int, [int])")),
    }
}

pub fn position(needle: &Value, haystack: &Value) -> Result<Value> {
    match (needle, haystack) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(n), Value::String(h)) => {
            let index = h.find(n.as_str()).map(|byte_idx| {
                // 1-based character position
                h[..byte_idx].chars().count() as i64 + 1
            });
            Ok(Value::Int64(index.unwrap_or(0)))
        }
        _ => Err(Error::type_mismatch("POSITION requires strings")),
    }
}

pub fn trim(leading: &Value, trailing: &Value, val: &Value, chars: &Value) -> Result<Value> {
    let (Some(leading), Some(trailing)) = (leading.as_bool(), trailing.as_bool()) else {
        return Err(Error::type_mismatch("TRIM flags must be booleans"));
    };
    match (val, chars) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(s), Value::String(seek)) => {
            let strip: Vec<char> = seek.chars().collect();
            let matches = |c: char| strip.contains(&c);
            let mut result = s.as_str();
            if leading {
                result = result.trim_start_matches(&matches);
            }
            if trailing {
                result = result.trim_end_matches(&matches);
            }
            Ok(Value::String(result.to_string()))
        }
        _ => Err(Error::type_mismatch("TRIM requires strings")),
    }
}

fn like_pattern_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            '\\' => {
                if let Some(&next) = chars.peek() {
                    regex.push_str(&regex::escape(&next.to_string()));
                    chars.next();
                }
            }
            _ => regex.push_str(&regex::escape(&c.to_string())),
        }
    }
    regex
}

pub fn like(val: &Value, pattern: &Value) -> Result<Value> {
    match (val, pattern) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(s), Value::String(p)) => {
            let regex = format!("^{}$", like_pattern_to_regex(p));
            let re = Regex::new(&regex)
                .map_err(|e| Error::invalid_query(format!("bad LIKE pattern: {}", e)))?;
            Ok(Value::Bool(re.is_match(s)))
        }
        _ => Err(Error::type_mismatch("LIKE requires strings")),
    }
}

fn similar_pattern_to_regex(pattern: &str) -> String {
    // SQL SIMILAR TO: % and _ are wildcards, the rest is already a regex.
    pattern.replace('%', ".*").replace('_', ".")
}

pub fn similar(val: &Value, pattern: &Value) -> Result<Value> {
    match (val, pattern) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(s), Value::String(p)) => {
            let regex = format!("^{}$", similar_pattern_to_regex(p));
            let re = Regex::new(&regex)
                .map_err(|e| Error::invalid_query(format!("bad SIMILAR pattern: {}", e)))?;
            Ok(Value::Bool(re.is_match(s)))
        }
        _ => Err(Error::type_mismatch("SIMILAR TO requires strings")),
    }
}

pub fn plus(a: &Value, b: &Value) -> Result<Value> {
    numeric_binop(a, b, "+", |x, y| x.checked_add(y), |x, y| Some(x + y), |x, y| {
        x.checked_add(y)
    })
}

pub fn minus(a: &Value, b: &Value) -> Result<Value> {
    numeric_binop(a, b, "-", |x, y| x.checked_sub(y), |x, y| Some(x - y), |x, y| {
        x.checked_sub(y)
    })
}

pub fn multiply(a: &Value, b: &Value) -> Result<Value> {
    numeric_binop(a, b, "*", |x, y| x.checked_mul(y), |x, y| Some(x * y), |x, y| {
        x.checked_mul(y)
    })
}

pub fn divide(a: &Value, b: &Value) -> Result<Value> {
    match b {
        Value::Int64(0) => return Err(Error::DivisionByZero),
        Value::Numeric(d) if d.is_zero() => return Err(Error::DivisionByZero),
        _ => {}
    }
    numeric_binop(a, b, "/", |x, y| x.checked_div(y), |x, y| Some(x / y), |x, y| {
        x.checked_div(y)
    })
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> Option<f64>,
    decimal_op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Value> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int64(x), Value::Int64(y)) => {
            int_op(*x, *y).map(Value::Int64).ok_or(Error::Overflow)
        }
        (Value::Numeric(x), Value::Numeric(y)) => {
            decimal_op(*x, *y).map(Value::Numeric).ok_or(Error::Overflow)
        }
        (Value::Numeric(x), Value::Int64(y)) => decimal_op(*x, Decimal::from(*y))
            .map(Value::Numeric)
            .ok_or(Error::Overflow),
        (Value::Int64(x), Value::Numeric(y)) => decimal_op(Decimal::from(*x), *y)
            .map(Value::Numeric)
            .ok_or(Error::Overflow),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => float_op(x, y).map(Value::Float64).ok_or(Error::Overflow),
            _ => Err(Error::type_mismatch_with(
                format!("numeric operands for {}", op),
                format!("{} and {}", a.kind(), b.kind()),
            )),
        },
    }
}

pub fn decimal_add(acc: &Value, arg: &Value) -> Result<Value> {
    let (Some(acc), Some(arg)) = (acc.as_numeric(), arg.as_numeric()) else {
        return Err(Error::type_mismatch("decimal add requires numeric operands"));
    };
    acc.checked_add(arg).map(Value::Numeric).ok_or(Error::Overflow)
}

pub fn modulo(a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int64(_), Value::Int64(0)) => Err(Error::DivisionByZero),
        (Value::Int64(x), Value::Int64(y)) => Ok(Value::Int64(x % y)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Float64(x % y)),
            _ => Err(Error::type_mismatch("MOD requires numeric operands")),
        },
    }
}

fn unary_float(val: &Value, name: &str, f: fn(f64) -> f64) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        v => match v.as_f64() {
            Some(x) => Ok(Value::Float64(f(x))),
            None => Err(Error::type_mismatch(format!("{} requires a numeric", name))),
        },
    }
}

pub fn exp(val: &Value) -> Result<Value> {
    unary_float(val, "EXP", f64::exp)
}

pub fn ln(val: &Value) -> Result<Value> {
    unary_float(val, "LN", f64::ln)
}

pub fn log10(val: &Value) -> Result<Value> {
    unary_float(val, "LOG10", f64::log10)
}

pub fn power(base: &Value, exponent: &Value) -> Result<Value> {
    match (base, exponent) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        _ => match (base.as_f64(), exponent.as_f64()) {
            (Some(b), Some(e)) => Ok(Value::Float64(b.powf(e))),
            _ => Err(Error::type_mismatch("POWER requires numeric operands")),
        },
    }
}

pub fn abs(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => Ok(Value::Int64(i.abs())),
        Value::Float64(f) => Ok(Value::Float64(f.abs())),
        Value::Numeric(d) => Ok(Value::Numeric(d.abs())),
        _ => Err(Error::type_mismatch("ABS requires a numeric")),
    }
}

pub fn ceil(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => Ok(Value::Int64(*i)),
        Value::Float64(f) => Ok(Value::Float64(f.ceil())),
        Value::Numeric(d) => Ok(Value::Numeric(d.ceil())),
        _ => Err(Error::type_mismatch("CEIL requires a numeric")),
    }
}

pub fn floor(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => Ok(Value::Int64(*i)),
        Value::Float64(f) => Ok(Value::Float64(f.floor())),
        Value::Numeric(d) => Ok(Value::Numeric(d.floor())),
        _ => Err(Error::type_mismatch("FLOOR requires a numeric")),
    }
}

pub fn to_f64_lossy(val: &Value) -> Option<f64> {
    match val {
        Value::Numeric(d) => d.to_f64(),
        v => v.as_f64(),
    }
}
