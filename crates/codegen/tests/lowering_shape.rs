use skiffsql_codegen::{
    ImpTable, NotNullImplementor, NullAs, NullPolicy, Translator, create_implementor,
    policy::harmonize,
};
use skiffsql_core::Error;
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_ir::code::{BinOp, Builtin, Expr, Flavor, MethodRef, Type, UdfMethod};
use skiffsql_ir::sql::{SqlCall, SqlExpr, SqlOp, SqlOperator};

fn int_lit(i: i64) -> SqlExpr {
    SqlExpr::literal(Value::int64(i), SqlType::int())
}

fn lower(table: &ImpTable, columns: &[SqlType], node: &SqlExpr, null_as: NullAs) -> Expr {
    let (translator, _) = Translator::for_columns(table, columns);
    translator.lower(node, null_as).unwrap()
}

#[test]
fn not_possible_demand_emits_unboxed_code() {
    let table = ImpTable::new();
    let node = SqlExpr::call(
        SqlOperator::Plus,
        vec![int_lit(1), int_lit(2)],
        SqlType::int(),
    );
    let expr = lower(&table, &[], &node, NullAs::NotPossible);
    assert!(
        matches!(expr, Expr::Binary { op: BinOp::Add, .. }),
        "expected a bare binary node, got {:?}",
        expr
    );
    assert_eq!(expr.type_of().flavor(), Flavor::Primitive);
}

#[test]
fn nullable_operand_lowers_to_null_guard() {
    let table = ImpTable::new();
    let columns = [SqlType::nullable(TypeKind::Int)];
    let node = SqlExpr::call(
        SqlOperator::Plus,
        vec![SqlExpr::column(0, columns[0].clone()), int_lit(1)],
        SqlType::nullable(TypeKind::Int),
    );
    let expr = lower(&table, &columns, &node, NullAs::Null);
    match expr {
        Expr::Condition { test, if_true, .. } => {
            assert!(
                matches!(*test, Expr::Binary { op: BinOp::Equal, .. }),
                "guard should be a null test, got {:?}",
                test
            );
            assert!(if_true.is_constant_null());
        }
        other => panic!("expected a null-guarded conditional, got {:?}", other),
    }
}

#[test]
fn strict_is_null_becomes_operand_null_tests() {
    let table = ImpTable::new();
    let columns = [
        SqlType::nullable(TypeKind::Int),
        SqlType::nullable(TypeKind::Int),
    ];
    let node = SqlExpr::call(
        SqlOperator::Plus,
        vec![
            SqlExpr::column(0, columns[0].clone()),
            SqlExpr::column(1, columns[1].clone()),
        ],
        SqlType::nullable(TypeKind::Int),
    );
    let expr = lower(&table, &columns, &node, NullAs::IsNull);
    // f(a, b) IS NULL == a IS NULL OR b IS NULL for strict f
    assert!(
        matches!(expr, Expr::Binary { op: BinOp::OrElse, .. }),
        "expected folded null tests, got {:?}",
        expr
    );
}

#[test]
fn cast_to_identical_type_is_a_no_op() {
    let table = ImpTable::new();
    let columns = [SqlType::nullable(TypeKind::Int)];
    let node = SqlExpr::call(
        SqlOperator::Cast,
        vec![SqlExpr::column(0, columns[0].clone())],
        columns[0].clone(),
    );
    let expr = lower(&table, &columns, &node, NullAs::Null);
    assert!(
        matches!(expr, Expr::Param(_)),
        "identical cast should lower to the bare input, got {:?}",
        expr
    );
}

#[test]
fn string_comparison_routes_to_backup_helper() {
    let table = ImpTable::new();
    let node = SqlExpr::call(
        SqlOperator::LessThan,
        vec![
            SqlExpr::literal(Value::string("a"), SqlType::varchar()),
            SqlExpr::literal(Value::string("b"), SqlType::varchar()),
        ],
        SqlType::boolean(),
    );
    let expr = lower(&table, &[], &node, NullAs::NotPossible);
    assert!(
        matches!(
            expr,
            Expr::Call {
                method: MethodRef::Builtin(Builtin::Lt),
                ..
            }
        ),
        "expected the lt helper, got {:?}",
        expr
    );
}

#[test]
fn system_user_lowers_to_a_constant() {
    let table = ImpTable::new();
    let node = SqlExpr::call(SqlOperator::SystemUser, vec![], SqlType::varchar());
    let expr = lower(&table, &[], &node, NullAs::Null);
    assert!(
        matches!(
            expr,
            Expr::Const {
                value: Value::String(_),
                ..
            }
        ),
        "SYSTEM_USER should fold to the login constant, got {:?}",
        expr
    );
}

#[test]
fn trim_flag_is_decoded_at_lowering_time() {
    let table = ImpTable::new();
    let node = SqlExpr::call(
        SqlOperator::Trim,
        vec![
            skiffsql_ir::sql::TrimSpan::Trailing.flag(),
            SqlExpr::literal(Value::string(" "), SqlType::varchar()),
            SqlExpr::literal(Value::string("pad "), SqlType::varchar()),
        ],
        SqlType::varchar(),
    );
    let expr = lower(&table, &[], &node, NullAs::Null);
    match expr {
        Expr::Call { method, args, .. } => {
            assert_eq!(method, MethodRef::Builtin(Builtin::Trim));
            assert_eq!(
                args[0],
                Expr::constant(
                    Value::bool_val(false),
                    Type::Primitive(skiffsql_ir::code::Primitive::Bool)
                )
            );
            assert_eq!(
                args[1],
                Expr::constant(
                    Value::bool_val(true),
                    Type::Primitive(skiffsql_ir::code::Primitive::Bool)
                )
            );
        }
        other => panic!("expected a trim helper call, got {:?}", other),
    }
}

#[test]
fn udf_lookup_requires_registered_implementor() {
    let table = ImpTable::new();
    let err = table.get(&SqlOp::Udf("mystery".to_string())).unwrap_err();
    assert!(matches!(err, Error::InvalidUdf(_)), "{}", err);
}

#[test]
fn registered_udf_lowers_and_dispatches() {
    fn reverse(args: &[Value]) -> Result<Value, Error> {
        match &args[0] {
            Value::String(s) => Ok(Value::string(s.chars().rev().collect::<String>())),
            _ => Err(Error::type_mismatch("REVERSE requires a string")),
        }
    }
    let mut table = ImpTable::new();
    table.register_udf(
        "reverse",
        create_implementor(
            NotNullImplementor::Udf(UdfMethod::new(
                "reverse",
                Type::Object(skiffsql_ir::code::Class::Str),
                reverse,
            )),
            NullPolicy::Strict,
            false,
        ),
    );
    let node = SqlExpr::call(
        SqlOp::Udf("REVERSE".to_string()),
        vec![SqlExpr::literal(Value::string("abc"), SqlType::varchar())],
        SqlType::varchar(),
    );
    let expr = lower(&table, &[], &node, NullAs::Null);
    assert!(
        matches!(
            expr,
            Expr::Call {
                method: MethodRef::Udf(_),
                ..
            }
        ),
        "expected a UDF call, got {:?}",
        expr
    );
}

#[test]
fn harmonize_is_a_fixed_point() {
    let table = ImpTable::new();
    let columns = [SqlType::int(), SqlType::nullable(TypeKind::Bigint)];
    let call = SqlCall {
        op: SqlOp::Std(SqlOperator::Plus),
        operands: vec![
            SqlExpr::column(0, columns[0].clone()),
            SqlExpr::column(1, columns[1].clone()),
        ],
        ty: SqlType::nullable(TypeKind::Bigint),
    };
    let (mut translator, _) = Translator::for_columns(&table, &columns);
    let once = harmonize(&mut translator, &call).expect("operands should harmonize");
    // the INT operand is cast up to BIGINT
    assert!(matches!(&once[0], SqlExpr::Call(c) if c.op == SqlOp::Std(SqlOperator::Cast)));
    let call2 = SqlCall {
        op: call.op.clone(),
        operands: once.clone(),
        ty: call.ty.clone(),
    };
    match harmonize(&mut translator, &call2) {
        None => {}
        Some(twice) => assert_eq!(twice, once),
    }
}

#[test]
fn asymmetric_operands_are_left_unharmonized() {
    let table = ImpTable::new();
    let columns = [SqlType::interval(), SqlType::int()];
    let call = SqlCall {
        op: SqlOp::Std(SqlOperator::Divide),
        operands: vec![
            SqlExpr::column(0, columns[0].clone()),
            SqlExpr::column(1, columns[1].clone()),
        ],
        ty: SqlType::interval(),
    };
    let (mut translator, _) = Translator::for_columns(&table, &columns);
    assert!(harmonize(&mut translator, &call).is_none());
}

#[test]
fn always_null_under_not_possible_is_an_error() {
    let table = ImpTable::new();
    let node = SqlExpr::null_literal(SqlType::int());
    let (translator, _) = Translator::for_columns(&table, &[]);
    assert!(translator.lower(&node, NullAs::NotPossible).is_err());
}
