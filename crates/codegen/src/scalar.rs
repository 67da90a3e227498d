use skiffsql_core::Error;
use skiffsql_core::types::{TypeKind, Value};
use skiffsql_ir::code::{
    BinOp, Builtin, Class, Expr, FALSE_EXPR, MethodRef, Primitive, TRUE_EXPR, Type, UdfMethod,
    UnaryOp,
};
use skiffsql_ir::sql::{SqlCall, SqlOp, SqlOperator};

use crate::null_as::NullAs;
use crate::policy::{NullPolicy, implement_null_semantics0, implement_policied};
use crate::translator::{LowerError, LowerResult, Translator};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Primitives that the comparison operators can compare directly; everything
/// else goes through the backup helper.
const COMP_OP_PRIMITIVES: [Primitive; 3] = [Primitive::I32, Primitive::I64, Primitive::F64];

/// Lowers a call whose operands are already translated and known non-null.
#[derive(Debug, Clone)]
pub enum NotNullImplementor {
    /// A method symbol; instance methods bind the first operand as receiver.
    Method(Builtin),
    /// A call into the runtime helper library.
    SqlFunction(Builtin),
    /// A binary expression node, with a backup helper for operands the node
    /// cannot handle directly.
    Binary {
        op: BinOp,
        backup: Option<Builtin>,
    },
    Unary(UnaryOp),
    Trim,
    DatetimeArithmetic,
    Reinterpret,
    Cast,
    /// Negates the wrapped implementor's result (NOT LIKE and friends).
    Not(Box<NotNullImplementor>),
    /// A user-registered runtime function.
    Udf(UdfMethod),
}

impl NotNullImplementor {
    pub fn not(inner: NotNullImplementor) -> NotNullImplementor {
        NotNullImplementor::Not(Box::new(inner))
    }

    pub fn implement(
        &self,
        translator: &mut Translator,
        call: &SqlCall,
        operands: Vec<Expr>,
    ) -> LowerResult {
        let result_ty = Type::of(&call.ty.with_nullable(false));
        match self {
            NotNullImplementor::Method(builtin) => {
                if builtin.is_instance_method() {
                    let mut iter = operands.into_iter();
                    let target = iter.next().ok_or_else(|| {
                        LowerError::from(Error::internal("instance method without receiver"))
                    })?;
                    Ok(Expr::call(Some(target), *builtin, iter.collect(), result_ty))
                } else {
                    Ok(Expr::call(None, *builtin, operands, result_ty))
                }
            }
            NotNullImplementor::SqlFunction(builtin) => {
                Ok(Expr::call(None, *builtin, operands, result_ty))
            }
            NotNullImplementor::Binary { op, backup } => {
                let [left, right]: [Expr; 2] = operands.try_into().map_err(|_| {
                    LowerError::from(Error::internal("binary operator expects two operands"))
                })?;
                if let Some(backup) = backup {
                    let prim = match left.type_of().unboxed() {
                        Type::Primitive(p) => Some(p),
                        _ => None,
                    };
                    let needs_backup = match prim {
                        None => true,
                        Some(p) => op.is_comparison() && !COMP_OP_PRIMITIVES.contains(&p),
                    };
                    if needs_backup {
                        let ty = if op.is_comparison() {
                            Type::Primitive(Primitive::Bool)
                        } else {
                            result_ty
                        };
                        return Ok(Expr::call(None, *backup, vec![left, right], ty));
                    }
                }
                Ok(Expr::binary(*op, left, right))
            }
            NotNullImplementor::Unary(op) => {
                let [operand]: [Expr; 1] = operands.try_into().map_err(|_| {
                    LowerError::from(Error::internal("unary operator expects one operand"))
                })?;
                Ok(Expr::unary(*op, operand))
            }
            NotNullImplementor::Trim => implement_trim(operands),
            NotNullImplementor::DatetimeArithmetic => {
                let [lhs, rhs]: [Expr; 2] = operands.try_into().map_err(|_| {
                    LowerError::from(Error::internal("datetime arithmetic expects two operands"))
                })?;
                let rhs = match call.operands[0].ty().kind {
                    TypeKind::Date => Expr::cast(
                        Type::Primitive(Primitive::I32),
                        Expr::binary(
                            BinOp::Divide,
                            rhs,
                            Expr::constant(
                                Value::int64(MILLIS_PER_DAY),
                                Type::Primitive(Primitive::I64),
                            ),
                        ),
                    ),
                    TypeKind::Time => Expr::cast(Type::Primitive(Primitive::I32), rhs),
                    _ => rhs,
                };
                Ok(Expr::binary(BinOp::Add, lhs, rhs))
            }
            NotNullImplementor::Reinterpret => {
                let [operand]: [Expr; 1] = operands.try_into().map_err(|_| {
                    LowerError::from(Error::internal("REINTERPRET expects one operand"))
                })?;
                Ok(operand)
            }
            NotNullImplementor::Cast => {
                let [operand]: [Expr; 1] = operands.try_into().map_err(|_| {
                    LowerError::from(Error::internal("CAST expects one operand"))
                })?;
                let source = call.operands[0].ty().clone();
                // The result can only be null when both the expression and
                // the source are nullable; a nullable-looking operand has
                // already been null-checked by the caller.
                let nullable =
                    call.ty.nullable && source.nullable && !operand.type_of().is_primitive();
                let target = translator.nullify_type(&call.ty, nullable);
                Ok(translator.translate_cast(&source, &target, operand))
            }
            NotNullImplementor::Not(inner) => {
                let result = inner.implement(translator, call, operands)?;
                Ok(Expr::not(result))
            }
            NotNullImplementor::Udf(method) => Ok(Expr::call(
                None,
                MethodRef::Udf(method.clone()),
                operands,
                method.ret,
            )),
        }
    }
}

fn implement_trim(operands: Vec<Expr>) -> LowerResult {
    let flag = match operands.first() {
        Some(Expr::Const {
            value: Value::String(s),
            ..
        }) => s.clone(),
        _ => {
            return Err(LowerError::from(Error::invalid_query(
                "TRIM flag must be a constant",
            )));
        }
    };
    let leading = flag == "BOTH" || flag == "LEADING";
    let trailing = flag == "BOTH" || flag == "TRAILING";
    let mut iter = operands.into_iter().skip(1);
    let chars = iter.next().ok_or_else(|| {
        LowerError::from(Error::invalid_query("TRIM expects a character operand"))
    })?;
    let string = iter.next().ok_or_else(|| {
        LowerError::from(Error::invalid_query("TRIM expects a string operand"))
    })?;
    Ok(Expr::call(
        None,
        Builtin::Trim,
        vec![
            Expr::constant(Value::bool_val(leading), Type::Primitive(Primitive::Bool)),
            Expr::constant(Value::bool_val(trailing), Type::Primitive(Primitive::Bool)),
            string,
            chars,
        ],
        Type::Object(Class::Str),
    ))
}

/// Lowers a call under a null demand. The variants carrying a
/// `NotNullImplementor` route through the null-semantics engine; the rest
/// handle nulls themselves.
#[derive(Debug, Clone)]
pub enum CallImplementor {
    Policied {
        implementor: NotNullImplementor,
        null_policy: NullPolicy,
        harmonize: bool,
    },
    Case,
    CastOptimized,
    ValueConstructor,
    Item,
    SystemFunction,
    IsXxx {
        seek: Option<bool>,
        negate: bool,
    },
}

impl CallImplementor {
    pub fn implement(
        &self,
        translator: &mut Translator,
        call: &SqlCall,
        null_as: NullAs,
    ) -> LowerResult {
        match self {
            CallImplementor::Policied {
                implementor,
                null_policy,
                harmonize,
            } => implement_policied(
                translator,
                call,
                null_as,
                implementor,
                *null_policy,
                *harmonize,
            ),
            CallImplementor::Case => implement_case(translator, call, null_as, 0),
            CallImplementor::CastOptimized => {
                // Short-circuit when no cast is required.
                let arg = &call.operands[0];
                if call.ty == *arg.ty() {
                    return translator.translate(arg, null_as);
                }
                implement_null_semantics0(
                    translator,
                    call,
                    null_as,
                    NullPolicy::Strict,
                    false,
                    &NotNullImplementor::Cast,
                )
            }
            CallImplementor::ValueConstructor => {
                let op = match &call.op {
                    SqlOp::Std(op) => *op,
                    SqlOp::Udf(name) => {
                        return Err(LowerError::from(Error::internal(format!(
                            "not a value constructor: {}",
                            name
                        ))));
                    }
                };
                translator.translate_constructor(&call.operands, op)
            }
            CallImplementor::Item => {
                let builtin = match &call.operands[0].ty().kind {
                    TypeKind::Array(_) => Builtin::ArrayItem,
                    TypeKind::Map(_, _) => Builtin::MapItem,
                    _ => Builtin::AnyItem,
                };
                implement_null_semantics0(
                    translator,
                    call,
                    null_as,
                    NullPolicy::Strict,
                    false,
                    &NotNullImplementor::Method(builtin),
                )
            }
            CallImplementor::SystemFunction => implement_system_function(translator, call, null_as),
            CallImplementor::IsXxx { seek, negate } => {
                let operand = &call.operands[0];
                match seek {
                    None => translator.translate(
                        operand,
                        if *negate {
                            NullAs::IsNotNull
                        } else {
                            NullAs::IsNull
                        },
                    ),
                    Some(seek) => {
                        let e = translator.translate(
                            operand,
                            if *seek { NullAs::False } else { NullAs::True },
                        )?;
                        Ok(maybe_negate(*negate == *seek, e))
                    }
                }
            }
        }
    }
}

fn maybe_negate(negate: bool, e: Expr) -> Expr {
    if negate { Expr::not(e) } else { e }
}

// CASE WHEN c1 THEN v1 WHEN c2 THEN v2 ... ELSE ve END, recursing two
// operands at a time. A branch that proves always-null collapses into the
// other; if both do, the whole CASE is always null.
fn implement_case(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
    i: usize,
) -> LowerResult {
    let operands = &call.operands;
    if i == operands.len() - 1 {
        // the ELSE clause
        let node = translator.ensure_type(&call.ty, operands[i].clone(), false);
        return translator.translate(&node, null_as);
    }
    let then_node = translator.ensure_type(&call.ty, operands[i + 1].clone(), false);
    let if_true = match translator.translate(&then_node, null_as) {
        Err(LowerError::AlwaysNull(_)) => None,
        other => Some(other?),
    };
    let if_false = match implement_case(translator, call, null_as, i + 2) {
        Err(LowerError::AlwaysNull(s)) => {
            if if_true.is_none() {
                return Err(s.into());
            }
            None
        }
        other => Some(other?),
    };
    let test = translator.translate(&operands[i], NullAs::False)?;
    Ok(match (if_true, if_false) {
        (Some(t), Some(f)) => Expr::condition(test, t, f),
        (Some(t), None) => t,
        (None, Some(f)) => f,
        (None, None) => unreachable!("both CASE branches were always null"),
    })
}

fn implement_system_function(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
) -> LowerResult {
    // System functions never return null.
    match null_as {
        NullAs::IsNull => return Ok(FALSE_EXPR.clone()),
        NullAs::IsNotNull => return Ok(TRUE_EXPR.clone()),
        _ => {}
    }
    let op = match &call.op {
        SqlOp::Std(op) => *op,
        SqlOp::Udf(name) => {
            return Err(LowerError::from(Error::internal(format!(
                "not a system function: {}",
                name
            ))));
        }
    };
    let root = translator.root();
    let string_const = |s: String| Expr::constant(Value::string(s), Type::Object(Class::Str));
    let context_call = |b: Builtin, ty: Type| Expr::call(None, b, vec![root.clone()], ty);
    Ok(match op {
        SqlOperator::User | SqlOperator::CurrentUser | SqlOperator::SessionUser => {
            string_const("sa".to_string())
        }
        SqlOperator::SystemUser => string_const(std::env::var("USER").unwrap_or_default()),
        SqlOperator::CurrentPath | SqlOperator::CurrentRole => {
            // A role has to be set explicitly, so the default is empty.
            string_const(String::new())
        }
        SqlOperator::CurrentTimestamp => context_call(
            Builtin::CurrentTimestamp,
            Type::Primitive(Primitive::I64),
        ),
        SqlOperator::CurrentTime => {
            context_call(Builtin::CurrentTime, Type::Primitive(Primitive::I32))
        }
        SqlOperator::CurrentDate => {
            context_call(Builtin::CurrentDate, Type::Primitive(Primitive::I32))
        }
        SqlOperator::LocalTimestamp => {
            context_call(Builtin::LocalTimestamp, Type::Primitive(Primitive::I64))
        }
        SqlOperator::LocalTime => {
            context_call(Builtin::LocalTime, Type::Primitive(Primitive::I32))
        }
        other => {
            return Err(LowerError::from(Error::internal(format!(
                "unknown system function {:?}",
                other
            ))));
        }
    })
}
