mod coercion;
mod sql;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
pub use coercion::{least_restrictive, nullify};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
pub use sql::{SqlType, TypeKind};

/// A SQL value: a literal in an input tree, a generated constant, or a
/// runtime value produced by the expression evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Numeric(Decimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<Utc>),
    /// Interval in milliseconds.
    Interval(i64),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn null() -> Self {
        Value::Null
    }

    pub fn bool_val(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn int64(i: i64) -> Self {
        Value::Int64(i)
    }

    pub fn float64(f: f64) -> Self {
        Value::Float64(f)
    }

    pub fn numeric(d: Decimal) -> Self {
        Value::Numeric(d)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn date(d: NaiveDate) -> Self {
        Value::Date(d)
    }

    pub fn time(t: NaiveTime) -> Self {
        Value::Time(t)
    }

    pub fn timestamp(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }

    pub fn interval_millis(ms: i64) -> Self {
        Value::Interval(ms)
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(values)
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(entries)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            Value::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<Decimal> {
        match self {
            Value::Numeric(d) => Some(*d),
            Value::Int64(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The kind of this value, used for diagnostics and ANY dispatch.
    pub fn kind(&self) -> TypeKind {
        match self {
            Value::Null => TypeKind::Any,
            Value::Bool(_) => TypeKind::Boolean,
            Value::Int64(_) => TypeKind::Bigint,
            Value::Float64(_) => TypeKind::Double,
            Value::Numeric(_) => TypeKind::Decimal(None),
            Value::String(_) => TypeKind::Varchar,
            Value::Date(_) => TypeKind::Date,
            Value::Time(_) => TypeKind::Time,
            Value::Timestamp(_) => TypeKind::Timestamp,
            Value::Interval(_) => TypeKind::Interval,
            Value::Array(_) => TypeKind::Array(Box::new(TypeKind::Any)),
            Value::Map(_) => TypeKind::Map(Box::new(TypeKind::Any), Box::new(TypeKind::Any)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Numeric(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Interval(ms) => write!(f, "INTERVAL {} MILLISECOND", ms),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
