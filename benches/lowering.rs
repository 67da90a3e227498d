use criterion::{Criterion, black_box, criterion_group, criterion_main};
use skiffsql::{ImpTable, NullAs, SqlExpr, SqlOperator, SqlType, Translator, Value};

fn int_lit(i: i64) -> SqlExpr {
    SqlExpr::literal(Value::int64(i), SqlType::int())
}

fn arithmetic_tree(depth: usize) -> SqlExpr {
    let mut expr = int_lit(1);
    for i in 0..depth {
        expr = SqlExpr::call(
            SqlOperator::Plus,
            vec![expr, int_lit(i as i64)],
            SqlType::int(),
        );
    }
    expr
}

fn bench_lowering(c: &mut Criterion) {
    let table = ImpTable::new();
    let deep = arithmetic_tree(32);
    let columns = [SqlType::nullable(skiffsql::TypeKind::Int)];

    c.bench_function("lower_arithmetic_constants", |b| {
        b.iter(|| {
            let (translator, _) = Translator::for_columns(&table, &[]);
            translator.lower(black_box(&deep), NullAs::Null).unwrap()
        })
    });

    let predicate = SqlExpr::call(
        SqlOperator::And,
        vec![
            SqlExpr::call(
                SqlOperator::GreaterThan,
                vec![SqlExpr::column(0, columns[0].clone()), int_lit(5)],
                SqlType::nullable(skiffsql::TypeKind::Boolean),
            ),
            SqlExpr::call(
                SqlOperator::LessThan,
                vec![SqlExpr::column(0, columns[0].clone()), int_lit(100)],
                SqlType::nullable(skiffsql::TypeKind::Boolean),
            ),
        ],
        SqlType::nullable(skiffsql::TypeKind::Boolean),
    );

    c.bench_function("lower_nullable_predicate", |b| {
        b.iter(|| {
            let (translator, _) = Translator::for_columns(&table, &columns);
            translator
                .lower(black_box(&predicate), NullAs::False)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_lowering);
criterion_main!(benches);
