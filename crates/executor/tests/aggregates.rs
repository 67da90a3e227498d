mod common;

use std::sync::Arc;

use common::*;
use rust_decimal::Decimal;
use skiffsql_codegen::{AggregateUdf, ImpTable, Strict, UserDefinedAggImplementor};
use skiffsql_core::Error;
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_executor::Aggregator;
use skiffsql_ir::code::{Primitive, Type, UdfMethod};
use skiffsql_ir::sql::Aggregation;

fn run_int_agg(
    table: &ImpTable,
    aggregation: Aggregation,
    values: &[Option<i64>],
    return_type: SqlType,
) -> Result<Value, Error> {
    let columns = [int_null()];
    let args = [col(0, columns[0].clone())];
    Aggregator::new(table).aggregate(
        &aggregation,
        &args,
        &columns,
        &int_rows(values),
        return_type,
    )
}

#[test]
fn sum_skips_null_rows() {
    let table = ImpTable::new();
    let result = run_int_agg(
        &table,
        Aggregation::Sum,
        &[Some(1), None, Some(2), Some(3)],
        SqlType::nullable(TypeKind::Bigint),
    )
    .unwrap();
    assert_eq!(result, Value::int64(6));
}

#[test]
fn count_counts_non_null_rows() {
    let table = ImpTable::new();
    let result = run_int_agg(
        &table,
        Aggregation::Count,
        &[Some(1), None, Some(2), Some(3)],
        SqlType::bigint(),
    )
    .unwrap();
    assert_eq!(result, Value::int64(3));
}

#[test]
fn sum0_of_empty_group_is_zero() {
    let table = ImpTable::new();
    let result = run_int_agg(
        &table,
        Aggregation::Sum0,
        &[],
        SqlType::bigint(),
    )
    .unwrap();
    assert_eq!(result, Value::int64(0));
}

#[test]
fn min_and_max_over_integers() {
    let table = ImpTable::new();
    let values = [Some(3), Some(1), None, Some(4)];
    let min = run_int_agg(&table, Aggregation::Min, &values, SqlType::nullable(TypeKind::Bigint))
        .unwrap();
    assert_eq!(min, Value::int64(1));
    let max = run_int_agg(&table, Aggregation::Max, &values, SqlType::nullable(TypeKind::Bigint))
        .unwrap();
    assert_eq!(max, Value::int64(4));
}

#[test]
fn min_over_decimals_starts_from_null() {
    let table = ImpTable::new();
    let columns = [SqlType::nullable(TypeKind::Decimal(Some((10, 2))))];
    let args = [col(0, columns[0].clone())];
    let rows = vec![
        vec![Value::numeric(Decimal::new(250, 2))],
        vec![Value::Null],
        vec![Value::numeric(Decimal::new(100, 2))],
    ];
    let result = Aggregator::new(&table)
        .aggregate(
            &Aggregation::Min,
            &args,
            &columns,
            &rows,
            SqlType::nullable(TypeKind::Decimal(Some((10, 2)))),
        )
        .unwrap();
    assert_eq!(result, Value::numeric(Decimal::new(100, 2)));
}

#[test]
fn sum_over_decimals_uses_decimal_addition() {
    let table = ImpTable::new();
    let columns = [SqlType::nullable(TypeKind::Decimal(Some((10, 2))))];
    let args = [col(0, columns[0].clone())];
    let rows = vec![
        vec![Value::numeric(Decimal::new(150, 2))],
        vec![Value::numeric(Decimal::new(250, 2))],
        vec![Value::Null],
    ];
    let result = Aggregator::new(&table)
        .aggregate(
            &Aggregation::Sum,
            &args,
            &columns,
            &rows,
            SqlType::nullable(TypeKind::Decimal(Some((10, 2)))),
        )
        .unwrap();
    assert_eq!(result, Value::numeric(Decimal::new(400, 2)));
}

#[test]
fn single_value_accepts_one_row() {
    let table = ImpTable::new();
    let result = run_int_agg(
        &table,
        Aggregation::SingleValue,
        &[Some(42)],
        SqlType::nullable(TypeKind::Bigint),
    )
    .unwrap();
    assert_eq!(result, Value::int64(42));
}

#[test]
fn single_value_rejects_second_row() {
    let table = ImpTable::new();
    let err = run_int_agg(
        &table,
        Aggregation::SingleValue,
        &[Some(1), Some(2)],
        SqlType::nullable(TypeKind::Bigint),
    )
    .unwrap_err();
    match err {
        Error::IllegalState(msg) => {
            assert!(msg.contains("more than one value in agg"), "{}", msg)
        }
        other => panic!("expected illegal state, got {}", other),
    }
}

fn product_init(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::int64(1))
}

fn product_add(args: &[Value]) -> Result<Value, Error> {
    let acc = args[0].as_i64().unwrap_or(1);
    let arg = args[1].as_i64().unwrap_or(1);
    Ok(Value::int64(acc * arg))
}

fn product_result(args: &[Value]) -> Result<Value, Error> {
    Ok(args[0].clone())
}

fn product_udaf() -> Arc<AggregateUdf> {
    let i64_ty = Type::Primitive(Primitive::I64);
    Arc::new(AggregateUdf {
        name: "PRODUCT".to_string(),
        accumulator_type: i64_ty,
        constructor: None,
        init: UdfMethod::new("product_init", i64_ty, product_init),
        add: UdfMethod::new("product_add", i64_ty, product_add),
        result: UdfMethod::new("product_result", i64_ty, product_result),
    })
}

#[test]
fn user_defined_aggregate_runs_through_descriptor() {
    let mut table = ImpTable::new();
    let udf = product_udaf();
    table.register_udaf("product", {
        let udf = Arc::clone(&udf);
        Arc::new(move || {
            Ok(Box::new(Strict(UserDefinedAggImplementor {
                udf: Arc::clone(&udf),
            })) as Box<dyn skiffsql_codegen::AggImplementor>)
        })
    });
    let result = run_int_agg(
        &table,
        Aggregation::Udaf("product".to_string()),
        &[Some(2), None, Some(3), Some(4)],
        SqlType::bigint(),
    )
    .unwrap();
    assert_eq!(result, Value::int64(24));
}

#[test]
fn unregistered_udaf_is_invalid() {
    let table = ImpTable::new();
    let err = run_int_agg(
        &table,
        Aggregation::Udaf("mystery".to_string()),
        &[Some(1)],
        SqlType::bigint(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidUdf(_)), "{}", err);
}

#[test]
fn factory_construction_failure_surfaces() {
    let mut table = ImpTable::new();
    table.register_udaf(
        "broken",
        Arc::new(|| Err(Error::ConstructionFailure("broken".to_string()))),
    );
    let err = run_int_agg(
        &table,
        Aggregation::Udaf("broken".to_string()),
        &[Some(1)],
        SqlType::bigint(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConstructionFailure(_)), "{}", err);
}
