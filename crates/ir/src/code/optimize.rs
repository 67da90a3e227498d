use skiffsql_core::types::Value;

use crate::code::expr::{BinOp, Expr, NULL_EXPR, UnaryOp};

/// Applies purely local simplifications, bottom-up. Sound but not complete.
pub fn optimize(expr: Expr) -> Expr {
    let expr = optimize_children(expr);
    match expr {
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => match constant_bool(&test) {
            Some(true) => *if_true,
            Some(false) => *if_false,
            None => {
                if if_true == if_false {
                    *if_true
                } else {
                    Expr::Condition {
                        test,
                        if_true,
                        if_false,
                    }
                }
            }
        },
        Expr::Unary {
            op: UnaryOp::Not,
            expr,
        } => match *expr {
            Expr::Unary {
                op: UnaryOp::Not,
                expr: inner,
            } => *inner,
            other => match constant_bool(&other) {
                Some(b) => {
                    if b {
                        crate::code::expr::FALSE_EXPR.clone()
                    } else {
                        crate::code::expr::TRUE_EXPR.clone()
                    }
                }
                None => Expr::unary(UnaryOp::Not, other),
            },
        },
        Expr::Binary {
            op: op @ (BinOp::Equal | BinOp::NotEqual),
            left,
            right,
        } => match (constant_value(&left), constant_value(&right)) {
            (Some(a), Some(b)) => {
                let equal = a == b;
                bool_const(if op == BinOp::Equal { equal } else { !equal })
            }
            _ => Expr::Binary { op, left, right },
        },
        other => other,
    }
}

/// Lifts `expr` to null-propagating form over `operand`: when the operand is
/// non-primitive, a null operand short-circuits to null.
pub fn optimize2(operand: &Expr, expr: Expr) -> Expr {
    if operand.type_of().is_primitive() {
        optimize(expr)
    } else {
        let null = Expr::typed_null(expr.type_of());
        optimize(Expr::condition(
            Expr::equal(operand.clone(), NULL_EXPR.clone()),
            null,
            expr,
        ))
    }
}

fn optimize_children(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, left, right } => Expr::Binary {
            op,
            left: Box::new(optimize(*left)),
            right: Box::new(optimize(*right)),
        },
        Expr::Unary { op, expr } => Expr::Unary {
            op,
            expr: Box::new(optimize(*expr)),
        },
        Expr::Condition {
            test,
            if_true,
            if_false,
        } => Expr::Condition {
            test: Box::new(optimize(*test)),
            if_true: Box::new(optimize(*if_true)),
            if_false: Box::new(optimize(*if_false)),
        },
        Expr::Call {
            target,
            method,
            args,
            ty,
        } => Expr::Call {
            target: target.map(|t| Box::new(optimize(*t))),
            method,
            args: args.into_iter().map(optimize).collect(),
            ty,
        },
        Expr::Cast { ty, expr } => Expr::Cast {
            ty,
            expr: Box::new(optimize(*expr)),
        },
        Expr::Field { target, name, ty } => Expr::Field {
            target: target.map(|t| Box::new(optimize(*t))),
            name,
            ty,
        },
        other => other,
    }
}

fn constant_bool(e: &Expr) -> Option<bool> {
    match e {
        Expr::Const {
            value: Value::Bool(b),
            ..
        } => Some(*b),
        _ => None,
    }
}

fn constant_value(e: &Expr) -> Option<&Value> {
    match e {
        Expr::Const { value, .. } => Some(value),
        _ => None,
    }
}

fn bool_const(b: bool) -> Expr {
    if b {
        crate::code::expr::TRUE_EXPR.clone()
    } else {
        crate::code::expr::FALSE_EXPR.clone()
    }
}

#[cfg(test)]
mod tests {
    use skiffsql_core::types::Value;

    use super::*;
    use crate::code::expr::{FALSE_EXPR, Primitive, TRUE_EXPR, Type};

    fn int(i: i64) -> Expr {
        Expr::constant(Value::int64(i), Type::Primitive(Primitive::I64))
    }

    #[test]
    fn condition_on_constant_test_collapses() {
        let e = Expr::condition(TRUE_EXPR.clone(), int(1), int(2));
        assert_eq!(optimize(e), int(1));
        let e = Expr::condition(FALSE_EXPR.clone(), int(1), int(2));
        assert_eq!(optimize(e), int(2));
    }

    #[test]
    fn condition_with_equal_branches_collapses() {
        let test = Expr::equal(
            Expr::param(&crate::code::expr::ParamExpr::new(
                "x",
                Type::Primitive(Primitive::I64),
            )),
            int(0),
        );
        let e = Expr::condition(test, int(7), int(7));
        assert_eq!(optimize(e), int(7));
    }

    #[test]
    fn double_negation_cancels() {
        let x = Expr::param(&crate::code::expr::ParamExpr::new(
            "b",
            Type::Primitive(Primitive::Bool),
        ));
        let e = Expr::not(Expr::not(x.clone()));
        assert_eq!(optimize(e), x);
    }

    #[test]
    fn null_equals_null_is_true() {
        let e = Expr::equal(NULL_EXPR.clone(), NULL_EXPR.clone());
        assert_eq!(optimize(e), TRUE_EXPR.clone());
    }

    #[test]
    fn null_equals_constant_is_false() {
        let e = Expr::equal(int(3), NULL_EXPR.clone());
        assert_eq!(optimize(e), FALSE_EXPR.clone());
    }

    #[test]
    fn rules_apply_bottom_up() {
        // condition(not(not(true)), a, b) -> a
        let e = Expr::condition(Expr::not(Expr::not(TRUE_EXPR.clone())), int(1), int(2));
        assert_eq!(optimize(e), int(1));
    }

    #[test]
    fn optimize2_passes_primitive_operands_through() {
        let operand = int(5);
        let e = Expr::binary(BinOp::Add, operand.clone(), int(1));
        assert_eq!(optimize2(&operand, e.clone()), e);
    }

    #[test]
    fn optimize2_guards_nullable_operands() {
        let operand = Expr::param(&crate::code::expr::ParamExpr::new(
            "v",
            Type::Boxed(Primitive::I64),
        ));
        let e = Expr::binary(BinOp::Add, operand.clone(), int(1));
        let guarded = optimize2(&operand, e.clone());
        match guarded {
            Expr::Condition { test, .. } => {
                assert_eq!(*test, Expr::equal(operand, NULL_EXPR.clone()));
            }
            other => panic!("expected null guard, got {:?}", other),
        }
    }
}
