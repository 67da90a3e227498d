mod common;

use chrono::NaiveDate;
use common::*;
use skiffsql_codegen::{ImpTable, NullAs};
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_ir::sql::{SqlExpr, SqlOperator, TrimSpan};

fn table() -> ImpTable {
    ImpTable::new()
}

#[test]
fn upper_of_string_literal() {
    let table = table();
    let node = call(
        SqlOperator::Upper,
        vec![str_lit("abc")],
        SqlType::varchar(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("ABC"));
}

#[test]
fn upper_of_null_is_null() {
    let table = table();
    let node = call(
        SqlOperator::Upper,
        vec![null_lit(TypeKind::Varchar)],
        varchar_null(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn addition_with_null_operand_is_null() {
    let table = table();
    let node = call(
        SqlOperator::Plus,
        vec![int_lit(1), null_lit(TypeKind::Int)],
        int_null(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn addition_of_constants() {
    let table = table();
    let node = call(
        SqlOperator::Plus,
        vec![int_lit(1), int_lit(2)],
        SqlType::int(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::NotPossible, &[]).unwrap();
    assert_eq!(result, Value::int64(3));
}

#[test]
fn case_skips_unknown_conditions() {
    // CASE WHEN NULL THEN 'x' WHEN TRUE THEN 'y' ELSE 'z' END
    let table = table();
    let node = call(
        SqlOperator::Case,
        vec![
            null_lit(TypeKind::Boolean),
            str_lit("x"),
            bool_lit(true),
            str_lit("y"),
            str_lit("z"),
        ],
        SqlType::varchar(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("y"));
}

#[test]
fn is_null_of_strict_call_over_null() {
    let table = table();
    let upper = call(
        SqlOperator::Upper,
        vec![null_lit(TypeKind::Varchar)],
        varchar_null(),
    );
    let is_null = call(SqlOperator::IsNull, vec![upper.clone()], SqlType::boolean());
    assert_eq!(
        eval_scalar(&table, &[], &is_null, NullAs::Null, &[]).unwrap(),
        Value::bool_val(true)
    );
    let is_not_null = call(SqlOperator::IsNotNull, vec![upper], SqlType::boolean());
    assert_eq!(
        eval_scalar(&table, &[], &is_not_null, NullAs::Null, &[]).unwrap(),
        Value::bool_val(false)
    );
}

#[test]
fn date_plus_day_interval() {
    let table = table();
    let date = SqlExpr::literal(
        Value::date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        SqlType::date(),
    );
    let interval = SqlExpr::literal(Value::interval_millis(86_400_000), SqlType::interval());
    let node = call(SqlOperator::DatetimePlus, vec![date, interval], SqlType::date());
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(
        result,
        Value::date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
    );
}

#[test]
fn trim_respects_span_flag() {
    let table = table();
    let node = call(
        SqlOperator::Trim,
        vec![TrimSpan::Leading.flag(), str_lit("x"), str_lit("xxhixx")],
        SqlType::varchar(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("hixx"));

    let node = call(
        SqlOperator::Trim,
        vec![TrimSpan::Both.flag(), str_lit("x"), str_lit("xxhixx")],
        SqlType::varchar(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("hi"));
}

#[test]
fn item_dispatches_on_collection_kind() {
    let table = table();
    let array = SqlExpr::literal(
        Value::array(vec![Value::int64(10), Value::int64(20)]),
        SqlType::array(TypeKind::Int),
    );
    let node = call(
        SqlOperator::Item,
        vec![array, int_lit(2)],
        int_null(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::int64(20));

    let map = SqlExpr::literal(
        Value::map(vec![(Value::string("k"), Value::int64(7))]),
        SqlType::map(TypeKind::Varchar, TypeKind::Int),
    );
    let node = call(
        SqlOperator::Item,
        vec![map, str_lit("k")],
        int_null(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::int64(7));
}

#[test]
fn array_constructor_builds_value() {
    let table = table();
    let node = call(
        SqlOperator::ArrayValueConstructor,
        vec![int_lit(1), int_lit(2), int_lit(3)],
        SqlType::array(TypeKind::Int),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(
        result,
        Value::array(vec![Value::int64(1), Value::int64(2), Value::int64(3)])
    );
}

#[test]
fn string_functions_compose() {
    let table = table();
    let node = call(
        SqlOperator::CharLength,
        vec![call(
            SqlOperator::Concat,
            vec![str_lit("foo"), str_lit("bar")],
            SqlType::varchar(),
        )],
        SqlType::int(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::int64(6));

    let node = call(
        SqlOperator::Substring,
        vec![str_lit("abcdef"), int_lit(2), int_lit(3)],
        SqlType::varchar(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("bcd"));
}

#[test]
fn like_and_negation() {
    let table = table();
    let node = call(
        SqlOperator::Like,
        vec![str_lit("hello"), str_lit("he%")],
        SqlType::boolean(),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::bool_val(true)
    );
    let node = call(
        SqlOperator::NotLike,
        vec![str_lit("hello"), str_lit("he%")],
        SqlType::boolean(),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::bool_val(false)
    );
}

#[test]
fn math_functions_over_columns() {
    let table = table();
    let columns = [int_null()];
    let node = call(
        SqlOperator::Abs,
        vec![col(0, columns[0].clone())],
        int_null(),
    );
    assert_eq!(
        eval_scalar(&table, &columns, &node, NullAs::Null, &[Value::int64(-5)]).unwrap(),
        Value::int64(5)
    );
    assert_eq!(
        eval_scalar(&table, &columns, &node, NullAs::Null, &[Value::Null]).unwrap(),
        Value::Null
    );

    let node = call(
        SqlOperator::Mod,
        vec![col(0, columns[0].clone()), int_lit(3)],
        int_null(),
    );
    assert_eq!(
        eval_scalar(&table, &columns, &node, NullAs::Null, &[Value::int64(7)]).unwrap(),
        Value::int64(1)
    );
}

#[test]
fn cast_widens_integers() {
    let table = table();
    let node = call(
        SqlOperator::Cast,
        vec![int_lit(7)],
        SqlType::bigint(),
    );
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::int64(7));
}

#[test]
fn comparisons_on_strings_use_backup() {
    let table = table();
    let node = predicate(SqlOperator::LessThan, str_lit("apple"), str_lit("banana"));
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::bool_val(true));
}

#[test]
fn collection_helpers() {
    let table = table();
    let array = SqlExpr::literal(
        Value::array(vec![Value::int64(1), Value::int64(2)]),
        SqlType::array(TypeKind::Int),
    );
    let node = call(
        SqlOperator::Cardinality,
        vec![array.clone()],
        SqlType::int(),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::int64(2)
    );

    let single = SqlExpr::literal(
        Value::array(vec![Value::int64(9)]),
        SqlType::array(TypeKind::Int),
    );
    let node = call(SqlOperator::Element, vec![single], int_null());
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::int64(9)
    );

    let node = call(
        SqlOperator::Slice,
        vec![array],
        SqlType::array(TypeKind::Int),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::array(vec![Value::int64(1), Value::int64(2)])
    );
}

#[test]
fn extract_year_from_date() {
    let table = table();
    let date = SqlExpr::literal(
        Value::date(NaiveDate::from_ymd_opt(2020, 3, 14).unwrap()),
        SqlType::date(),
    );
    let node = call(
        SqlOperator::ExtractDate,
        vec![str_lit("YEAR"), date],
        SqlType::bigint(),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap(),
        Value::int64(2020)
    );
}

#[test]
fn current_user_is_constant() {
    let table = table();
    let node = call(SqlOperator::CurrentUser, vec![], SqlType::varchar());
    let result = eval_scalar(&table, &[], &node, NullAs::Null, &[]).unwrap();
    assert_eq!(result, Value::string("sa"));
}

#[test]
fn system_functions_are_never_null() {
    let table = table();
    let node = call(
        SqlOperator::CurrentTimestamp,
        vec![],
        SqlType::timestamp(),
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::IsNull, &[]).unwrap(),
        Value::bool_val(false)
    );
    assert_eq!(
        eval_scalar(&table, &[], &node, NullAs::IsNotNull, &[]).unwrap(),
        Value::bool_val(true)
    );
}
