use skiffsql_core::error::{Error, Result};
use skiffsql_core::types::Value;

pub fn collection_size(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => Ok(Value::Int64(items.len() as i64)),
        Value::Map(entries) => Ok(Value::Int64(entries.len() as i64)),
        _ => Err(Error::type_mismatch("CARDINALITY requires a collection")),
    }
}

/// The sole element of a collection: null when empty, an error when there is
/// more than one.
pub fn element(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(Value::Null),
            [only] => Ok(only.clone()),
            _ => Err(Error::invalid_operation(
                "ELEMENT requires a collection with at most one element",
            )),
        },
        _ => Err(Error::type_mismatch("ELEMENT requires an array")),
    }
}

pub fn slice(val: &Value) -> Result<Value> {
    match val {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => Ok(Value::Array(items.clone())),
        _ => Err(Error::type_mismatch("SLICE requires an array")),
    }
}

/// 1-based array indexing; out-of-range reads yield null.
pub fn array_item(array: &Value, index: &Value) -> Result<Value> {
    match (array, index) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Array(items), Value::Int64(i)) => {
            if *i < 1 {
                return Ok(Value::Null);
            }
            Ok(items.get(*i as usize - 1).cloned().unwrap_or(Value::Null))
        }
        _ => Err(Error::type_mismatch("array item requires (array, int)")),
    }
}

/// Map lookup by key; a missing key yields null.
pub fn map_item(map: &Value, key: &Value) -> Result<Value> {
    match map {
        Value::Null => Ok(Value::Null),
        Value::Map(entries) => Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)),
        _ => Err(Error::type_mismatch("map item requires a map")),
    }
}

/// ITEM over a value only known to be a collection at runtime.
pub fn any_item(collection: &Value, key: &Value) -> Result<Value> {
    match collection {
        Value::Null => Ok(Value::Null),
        Value::Array(_) => array_item(collection, key),
        Value::Map(_) => map_item(collection, key),
        _ => Err(Error::type_mismatch("ITEM requires a collection")),
    }
}

/// Builds a map value from alternating key/value arguments.
pub fn map_value(args: &[Value]) -> Result<Value> {
    if args.len() % 2 != 0 {
        return Err(Error::invalid_query(
            "MAP constructor requires an even number of arguments",
        ));
    }
    let entries = args
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    Ok(Value::Map(entries))
}
