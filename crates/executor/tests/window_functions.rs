mod common;

use common::*;
use skiffsql_codegen::ImpTable;
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_executor::WindowExec;
use skiffsql_ir::sql::{Aggregation, SqlExpr};

fn x_column() -> Vec<(String, SqlType)> {
    vec![("x".to_string(), SqlType::int())]
}

fn x_rows(values: &[i64]) -> Vec<Vec<Value>> {
    values.iter().map(|&v| vec![Value::int64(v)]).collect()
}

fn run(
    table: &ImpTable,
    aggregation: Aggregation,
    args: &[SqlExpr],
    values: &[i64],
    order_by: &[usize],
    return_type: SqlType,
) -> Vec<Value> {
    WindowExec::new(table)
        .run(
            &aggregation,
            args,
            &x_column(),
            &x_rows(values),
            order_by,
            return_type,
        )
        .unwrap()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::int64(v)).collect()
}

#[test]
fn row_number_over_unordered_partition() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::RowNumber,
        &[],
        &[3, 1, 4, 1, 5],
        &[],
        SqlType::bigint(),
    );
    assert_eq!(results, ints(&[1, 2, 3, 4, 5]));
}

#[test]
fn rank_jumps_over_ties() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::Rank,
        &[],
        &[3, 1, 4, 1, 5],
        &[0],
        SqlType::bigint(),
    );
    // sorted values [1, 1, 3, 4, 5] get ranks [1, 1, 3, 4, 5]
    assert_eq!(results, ints(&[3, 1, 4, 1, 5]));
}

#[test]
fn dense_rank_has_no_gaps() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::DenseRank,
        &[],
        &[3, 1, 4, 1, 5],
        &[0],
        SqlType::bigint(),
    );
    assert_eq!(results, ints(&[2, 1, 3, 1, 4]));
}

#[test]
fn rank_assigns_equal_rows_the_same_value() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::Rank,
        &[],
        &[7, 7, 7],
        &[0],
        SqlType::bigint(),
    );
    assert_eq!(results, ints(&[1, 1, 1]));
}

#[test]
fn first_value_reads_frame_start() {
    let table = ImpTable::new();
    let arg = col(0, SqlType::int());
    let results = run(
        &table,
        Aggregation::FirstValue,
        &[arg],
        &[3, 1, 4],
        &[0],
        SqlType::nullable(TypeKind::Int),
    );
    // ordered by x the first value of the growing frame is always 1
    assert_eq!(results, ints(&[1, 1, 1]));
}

#[test]
fn last_value_reads_frame_end() {
    let table = ImpTable::new();
    let arg = col(0, SqlType::int());
    let results = run(
        &table,
        Aggregation::LastValue,
        &[arg],
        &[3, 1, 4],
        &[0],
        SqlType::nullable(TypeKind::Int),
    );
    // the cumulative frame ends at the current row
    assert_eq!(results, ints(&[3, 1, 4]));
}

#[test]
fn lead_reads_next_row_with_null_default() {
    let table = ImpTable::new();
    let arg = col(0, SqlType::int());
    let results = run(
        &table,
        Aggregation::Lead,
        &[arg],
        &[10, 20, 30],
        &[],
        SqlType::nullable(TypeKind::Int),
    );
    assert_eq!(
        results,
        vec![Value::int64(20), Value::int64(30), Value::Null]
    );
}

#[test]
fn lag_with_offset_and_default() {
    let table = ImpTable::new();
    let arg = col(0, SqlType::int());
    let results = run(
        &table,
        Aggregation::Lag,
        &[arg, int_lit(2), int_lit(-1)],
        &[10, 20, 30, 40],
        &[],
        SqlType::nullable(TypeKind::Int),
    );
    assert_eq!(
        results,
        vec![
            Value::int64(-1),
            Value::int64(-1),
            Value::int64(10),
            Value::int64(20)
        ]
    );
}

#[test]
fn ntile_splits_partition_evenly() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::Ntile,
        &[int_lit(2)],
        &[10, 20, 30, 40],
        &[0],
        SqlType::bigint(),
    );
    assert_eq!(results, ints(&[1, 1, 2, 2]));
}

#[test]
fn count_over_window_counts_frame_rows() {
    let table = ImpTable::new();
    let results = run(
        &table,
        Aggregation::Count,
        &[],
        &[5, 6, 7],
        &[0],
        SqlType::bigint(),
    );
    assert_eq!(results, ints(&[1, 2, 3]));
}

#[test]
fn count_over_window_with_nullable_argument() {
    let table = ImpTable::new();
    let columns = vec![("x".to_string(), int_null())];
    let rows = vec![
        vec![Value::int64(1)],
        vec![Value::Null],
        vec![Value::int64(3)],
    ];
    let arg = col(0, int_null());
    let results = WindowExec::new(&table)
        .run(
            &Aggregation::Count,
            &[arg],
            &columns,
            &rows,
            &[],
            SqlType::bigint(),
        )
        .unwrap();
    // the null row joins the frame but not the count
    assert_eq!(results, ints(&[1, 1, 2]));
}

#[test]
fn regular_aggregate_runs_over_window() {
    // SUM has no window-specialized implementor and goes through the
    // regular-aggregate adapter.
    let table = ImpTable::new();
    let arg = col(0, SqlType::int());
    let results = run(
        &table,
        Aggregation::Sum,
        &[arg],
        &[1, 2, 3, 4],
        &[],
        SqlType::nullable(TypeKind::Bigint),
    );
    assert_eq!(results, ints(&[1, 3, 6, 10]));
}
