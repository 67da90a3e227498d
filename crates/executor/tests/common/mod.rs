#![allow(dead_code)]

use skiffsql_codegen::{ImpTable, NullAs, Translator};
use skiffsql_core::Result;
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_executor::Evaluator;
use skiffsql_functions::EvalRoot;
use skiffsql_ir::sql::{SqlExpr, SqlOp, SqlOperator};

/// Lowers `node` against bound column parameters, then evaluates it with
/// `row` bound to the columns.
pub fn eval_scalar(
    table: &ImpTable,
    columns: &[SqlType],
    node: &SqlExpr,
    null_as: NullAs,
    row: &[Value],
) -> Result<Value> {
    let (translator, params) = Translator::for_columns(table, columns);
    let expr = translator.lower(node, null_as)?;
    let mut evaluator = Evaluator::new(EvalRoot::default());
    for (param, value) in params.iter().zip(row) {
        evaluator.bind_param(param, value.clone());
    }
    evaluator.eval(&expr)
}

pub fn call(op: impl Into<SqlOp>, operands: Vec<SqlExpr>, ty: SqlType) -> SqlExpr {
    SqlExpr::call(op, operands, ty)
}

pub fn int_lit(i: i64) -> SqlExpr {
    SqlExpr::literal(Value::int64(i), SqlType::int())
}

pub fn str_lit(s: &str) -> SqlExpr {
    SqlExpr::literal(Value::string(s), SqlType::varchar())
}

pub fn bool_lit(b: bool) -> SqlExpr {
    SqlExpr::literal(Value::bool_val(b), SqlType::boolean())
}

pub fn null_lit(kind: TypeKind) -> SqlExpr {
    SqlExpr::null_literal(SqlType::new(kind))
}

pub fn col(index: usize, ty: SqlType) -> SqlExpr {
    SqlExpr::column(index, ty)
}

pub fn bool_null() -> SqlType {
    SqlType::nullable(TypeKind::Boolean)
}

pub fn int_null() -> SqlType {
    SqlType::nullable(TypeKind::Int)
}

pub fn varchar_null() -> SqlType {
    SqlType::nullable(TypeKind::Varchar)
}

/// Binary boolean call with a nullable result.
pub fn predicate(op: SqlOperator, left: SqlExpr, right: SqlExpr) -> SqlExpr {
    call(op, vec![left, right], bool_null())
}

pub fn opt_i64(v: Option<i64>) -> Value {
    match v {
        Some(i) => Value::int64(i),
        None => Value::Null,
    }
}

pub fn opt_bool(v: Option<bool>) -> Value {
    match v {
        Some(b) => Value::bool_val(b),
        None => Value::Null,
    }
}

pub fn int_rows(values: &[Option<i64>]) -> Vec<Vec<Value>> {
    values.iter().map(|v| vec![opt_i64(*v)]).collect()
}
