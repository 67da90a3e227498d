use chrono::{DateTime, Datelike, Utc};
use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::Value;

/// The execution-root context the engine hands to generated code: the query
/// start time and session identity.
#[derive(Debug, Clone)]
pub struct EvalRoot {
    pub now: DateTime<Utc>,
    pub user: String,
}

impl Default for EvalRoot {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            user: std::env::var("USER").unwrap_or_default(),
        }
    }
}

impl EvalRoot {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            user: std::env::var("USER").unwrap_or_default(),
        }
    }
}

pub fn current_timestamp(root: &EvalRoot) -> Value {
    Value::Timestamp(root.now)
}

pub fn current_time(root: &EvalRoot) -> Value {
    Value::Time(root.now.time())
}

pub fn current_date(root: &EvalRoot) -> Value {
    Value::Date(root.now.date_naive())
}

/// EXTRACT over a date, with the unit riding as a constant string.
pub fn extract_date(unit: &Value, date: &Value) -> Result<Value> {
    let Some(unit) = unit.as_str() else {
        return Err(Error::type_mismatch("EXTRACT unit must be a string"));
    };
    let date = match date {
        Value::Null => return Ok(Value::Null),
        Value::Date(d) => *d,
        Value::Timestamp(ts) => ts.date_naive(),
        _ => return Err(Error::type_mismatch("EXTRACT requires a date")),
    };
    let result = match unit {
        "YEAR" => date.year() as i64,
        "MONTH" => date.month() as i64,
        "DAY" => date.day() as i64,
        "DOW" => date.weekday().num_days_from_sunday() as i64,
        "DOY" => date.ordinal() as i64,
        other => {
            return Err(Error::unsupported(format!(
                "EXTRACT unit {} is not supported for dates",
                other
            )));
        }
    };
    Ok(Value::Int64(result))
}
