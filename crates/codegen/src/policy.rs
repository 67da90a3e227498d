use debug_print::debug_eprintln;
use skiffsql_ir::code::{
    BOXED_FALSE_EXPR, BOXED_TRUE_EXPR, Builtin, Expr, FALSE_EXPR, NULL_EXPR, Primitive, TRUE_EXPR,
    Type, optimize,
};
use skiffsql_ir::sql::SqlCall;

use crate::null_as::NullAs;
use crate::scalar::{CallImplementor, NotNullImplementor};
use crate::translator::{AlwaysNull, LowerError, LowerResult, Translator};

/// How an operator treats null operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Returns null iff all operands are null.
    Any,
    /// Any null operand produces a null result.
    Strict,
    /// Three-valued AND.
    And,
    /// Three-valued OR.
    Or,
    /// Three-valued NOT.
    Not,
    /// The implementor handles nulls itself.
    None,
}

impl NullPolicy {
    /// Policies under which a null operand forces a null result.
    fn is_strict(&self) -> bool {
        matches!(self, NullPolicy::Strict | NullPolicy::Not)
    }
}

/// Wraps a not-null implementor with a null-handling strategy.
pub fn create_implementor(
    implementor: NotNullImplementor,
    null_policy: NullPolicy,
    harmonize: bool,
) -> CallImplementor {
    CallImplementor::Policied {
        implementor,
        null_policy,
        harmonize,
    }
}

pub(crate) fn implement_policied(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
    implementor: &NotNullImplementor,
    null_policy: NullPolicy,
    harmonize: bool,
) -> LowerResult {
    match null_policy {
        NullPolicy::Any | NullPolicy::Strict => implement_null_semantics0(
            translator,
            call,
            null_as,
            null_policy,
            harmonize,
            implementor,
        ),
        NullPolicy::And => implement_and(translator, call, null_as),
        NullPolicy::Or => implement_or(translator, call, null_as, harmonize),
        NullPolicy::Not => match null_as {
            // The negation distributes over the demand: "NOT x, null as
            // false" is "x, null as true" negated.
            NullAs::False => {
                let operand = translator.translate(&call.operands[0], NullAs::True)?;
                Ok(Expr::not(operand))
            }
            NullAs::True => {
                let operand = translator.translate(&call.operands[0], NullAs::False)?;
                Ok(Expr::not(operand))
            }
            other => implement_null_semantics0(
                translator,
                call,
                other,
                null_policy,
                harmonize,
                implementor,
            ),
        },
        NullPolicy::None => {
            let call2 = call2(false, translator, call);
            implement_call(translator, &call2, implementor, null_as)
        }
    }
}

pub(crate) fn implement_null_semantics0(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
    null_policy: NullPolicy,
    harmonize: bool,
    implementor: &NotNullImplementor,
) -> LowerResult {
    match null_as {
        // If "f" is strict, "f(a0, a1) IS NOT NULL" is equivalent to
        // "a0 IS NOT NULL AND a1 IS NOT NULL".
        NullAs::IsNotNull if null_policy.is_strict() => {
            let exprs = translator.translate_list(&call.operands, NullAs::IsNotNull)?;
            return Ok(Expr::fold_and(exprs));
        }
        // Likewise "f(a0, a1) IS NULL" is "a0 IS NULL OR a1 IS NULL".
        NullAs::IsNull if null_policy.is_strict() => {
            let exprs = translator.translate_list(&call.operands, NullAs::IsNull)?;
            return Ok(Expr::fold_or(exprs));
        }
        _ => {}
    }
    let call2 = call2(harmonize, translator, call);
    match implement_null_semantics(translator, &call2, null_as, null_policy, implementor) {
        Err(LowerError::AlwaysNull(_)) => match null_as {
            NullAs::NotPossible => Err(AlwaysNull.into()),
            NullAs::False => Ok(FALSE_EXPR.clone()),
            NullAs::True => Ok(TRUE_EXPR.clone()),
            _ => Ok(NULL_EXPR.clone()),
        },
        other => other,
    }
}

fn implement_null_semantics(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
    null_policy: NullPolicy,
    implementor: &NotNullImplementor,
) -> LowerResult {
    match null_as {
        NullAs::Null => {
            // v0 == null || v1 == null ? null : f(v0, v1)
            let mut null_checks = Vec::new();
            let mut operands = Vec::new();
            let mut overrides = Vec::new();
            for op in &call.operands {
                let t = translator.translate(op, NullAs::Null)?;
                if translator.is_nullable(op) {
                    let v = translator.current_block().append("v", t);
                    null_checks.push(Expr::equal(v.clone(), NULL_EXPR.clone()));
                    operands.push(v.unboxed());
                    overrides.push((op.clone(), false));
                } else {
                    operands.push(t);
                }
            }
            let result = translator.with_nullable(overrides, |tr| {
                implement_call_with(tr, call, implementor, null_as, operands)
            })?;
            let boxed = result.boxed();
            let null_branch = Expr::typed_null(boxed.type_of());
            Ok(optimize(Expr::condition(
                Expr::fold_or(null_checks),
                null_branch,
                boxed,
            )))
        }
        NullAs::False => {
            // v0 != null && v1 != null && f(v0, v1)
            let mut list = Vec::new();
            let mut operands = Vec::new();
            let mut overrides = Vec::new();
            for op in &call.operands {
                let t = translator.translate(op, NullAs::Null)?;
                if translator.is_nullable(op) {
                    let v = translator.current_block().append("v", t);
                    list.push(Expr::not_equal(v.clone(), NULL_EXPR.clone()));
                    operands.push(v.unboxed());
                    overrides.push((op.clone(), false));
                } else {
                    operands.push(t);
                }
            }
            let result = translator.with_nullable(overrides, |tr| {
                implement_call_with(tr, call, implementor, null_as, operands)
            })?;
            list.push(result);
            Ok(Expr::fold_and(list))
        }
        NullAs::True => {
            // v0 == null || v1 == null ? true : f(v0, v1)
            let mut null_checks = Vec::new();
            let mut operands = Vec::new();
            let mut overrides = Vec::new();
            for op in &call.operands {
                let t = translator.translate(op, NullAs::Null)?;
                if translator.is_nullable(op) {
                    let v = translator.current_block().append("v", t);
                    null_checks.push(Expr::equal(v.clone(), NULL_EXPR.clone()));
                    operands.push(v.unboxed());
                    overrides.push((op.clone(), false));
                } else {
                    operands.push(t);
                }
            }
            let result = translator.with_nullable(overrides, |tr| {
                implement_call_with(tr, call, implementor, null_as, operands)
            })?;
            Ok(optimize(Expr::condition(
                Expr::fold_or(null_checks),
                TRUE_EXPR.clone(),
                result,
            )))
        }
        NullAs::NotPossible => {
            // The call cannot return null, so the implementor may emit
            // unboxed code. Under a strict policy the operands are known
            // non-null as well.
            let overrides = if null_policy.is_strict() {
                call.operands
                    .iter()
                    .filter(|op| translator.is_nullable(op))
                    .map(|op| (op.clone(), false))
                    .collect()
            } else {
                Vec::new()
            };
            translator.with_nullable(overrides, |tr| {
                implement_call(tr, call, implementor, null_as)
            })
        }
        _ => implement_call(translator, call, implementor, null_as),
    }
}

fn implement_call(
    translator: &mut Translator,
    call: &SqlCall,
    implementor: &NotNullImplementor,
    null_as: NullAs,
) -> LowerResult {
    let mut operands = Vec::with_capacity(call.operands.len());
    for op in &call.operands {
        let demand = NullAs::of(translator.is_nullable(op));
        operands.push(translator.translate(op, demand)?);
    }
    implement_call_with(translator, call, implementor, null_as, operands)
}

fn implement_call_with(
    translator: &mut Translator,
    call: &SqlCall,
    implementor: &NotNullImplementor,
    null_as: NullAs,
    operands: Vec<Expr>,
) -> LowerResult {
    if matches!(null_as, NullAs::NotPossible | NullAs::Null)
        && operands.iter().any(Expr::is_constant_null)
    {
        return Ok(NULL_EXPR.clone());
    }
    let result = implementor.implement(translator, call, operands)?;
    Ok(null_as.handle(result))
}

/// Rewrites the call's operands to their least-restrictive common type when
/// `harmonize` is requested. Harmonization is a fixed point: already-uniform
/// operands come back unchanged.
fn call2(harmonize_operands: bool, translator: &mut Translator, call: &SqlCall) -> SqlCall {
    if !harmonize_operands {
        return call.clone();
    }
    match harmonize(translator, call) {
        Some(operands) => SqlCall {
            op: call.op.clone(),
            operands,
            ty: call.ty.clone(),
        },
        None => call.clone(),
    }
}

/// Rewrites operands to their least-restrictive common type, or `None` when
/// they are already uniform or have no common type.
pub fn harmonize(
    translator: &mut Translator,
    call: &SqlCall,
) -> Option<Vec<skiffsql_ir::sql::SqlExpr>> {
    let mut null_count = 0;
    let mut types = Vec::with_capacity(call.operands.len());
    for op in &call.operands {
        let nullable = translator.is_nullable(op);
        if nullable {
            null_count += 1;
        }
        types.push(op.ty().with_nullable(nullable));
    }
    if types.windows(2).all(|w| w[0] == w[1]) {
        // Operands already share a type and nullability.
        return None;
    }
    // No common type: presumably a binary operator with asymmetric arguments
    // (e.g. interval / integer) which is not intended to be harmonized.
    let common = translator.least_restrictive(&types)?;
    debug_assert_eq!(common.nullable, null_count > 0);
    debug_eprintln!(
        "[codegen::policy] harmonize {:?} -> {:?}",
        types,
        common
    );
    Some(
        call.operands
            .iter()
            .map(|op| translator.ensure_type(&common, op.clone(), false))
            .collect(),
    )
}

fn truth(e: Expr) -> Expr {
    if e.type_of().is_primitive() {
        e
    } else {
        Expr::call(
            None,
            Builtin::IsTrue,
            vec![e],
            Type::Primitive(Primitive::Bool),
        )
    }
}

fn null_check(e: &Expr) -> Expr {
    if e.type_of().is_primitive() {
        FALSE_EXPR.clone()
    } else {
        Expr::equal(e.clone(), NULL_EXPR.clone())
    }
}

// If any of the arguments are false, result is false;
// else if any arguments are null, result is null;
// else true.
//
// b0 == null ? (b1 == null || b1 ? null : FALSE)
//   : b0 ? b1
//   : FALSE
fn and_tree(t0: Expr, t1: Expr) -> Expr {
    let null_bool = Expr::typed_null(Type::Boxed(Primitive::Bool));
    Expr::condition(
        null_check(&t0),
        Expr::condition(
            Expr::fold_or(vec![null_check(&t1), truth(t1.clone())]),
            null_bool,
            BOXED_FALSE_EXPR.clone(),
        ),
        Expr::condition(truth(t0), t1.boxed(), BOXED_FALSE_EXPR.clone()),
    )
}

// If any of the arguments are true, result is true;
// else if any arguments are null, result is null;
// else false.
//
// b0 == null ? (b1 == null || !b1 ? null : TRUE)
//   : !b0 ? b1
//   : TRUE
fn or_tree(t0: Expr, t1: Expr) -> Expr {
    let null_bool = Expr::typed_null(Type::Boxed(Primitive::Bool));
    Expr::condition(
        null_check(&t0),
        Expr::condition(
            Expr::fold_or(vec![null_check(&t1), Expr::not(truth(t1.clone()))]),
            null_bool,
            BOXED_TRUE_EXPR.clone(),
        ),
        Expr::condition(Expr::not(truth(t0)), t1.boxed(), BOXED_TRUE_EXPR.clone()),
    )
}

fn implement_and(translator: &mut Translator, call: &SqlCall, null_as: NullAs) -> LowerResult {
    match null_as {
        NullAs::NotPossible | NullAs::True | NullAs::False => {
            let exprs = translator.translate_list(&call.operands, null_as)?;
            Ok(Expr::fold_and(exprs))
        }
        _ => {
            if call.operands.iter().all(|op| !translator.is_nullable(op)) {
                let exprs = translator.translate_list(&call.operands, NullAs::NotPossible)?;
                return Ok(null_as.handle(Expr::fold_and(exprs)));
            }
            let exprs = translator.translate_list(&call.operands, NullAs::Null)?;
            let bound: Vec<Expr> = exprs
                .into_iter()
                .map(|e| translator.current_block().append("b", e))
                .collect();
            let tree = fold_tree(bound, and_tree);
            Ok(null_as.handle(optimize(tree)))
        }
    }
}

fn implement_or(
    translator: &mut Translator,
    call: &SqlCall,
    null_as: NullAs,
    harmonize_operands: bool,
) -> LowerResult {
    let call2 = call2(harmonize_operands, translator, call);
    match null_as {
        NullAs::NotPossible | NullAs::True | NullAs::False => {
            let exprs = translator.translate_list(&call2.operands, null_as)?;
            Ok(Expr::fold_or(exprs))
        }
        _ => {
            if call2.operands.iter().all(|op| !translator.is_nullable(op)) {
                let exprs = translator.translate_list(&call2.operands, NullAs::NotPossible)?;
                return Ok(null_as.handle(Expr::fold_or(exprs)));
            }
            let exprs = translator.translate_list(&call2.operands, NullAs::Null)?;
            let bound: Vec<Expr> = exprs
                .into_iter()
                .map(|e| translator.current_block().append("b", e))
                .collect();
            let tree = fold_tree(bound, or_tree);
            Ok(null_as.handle(optimize(tree)))
        }
    }
}

fn fold_tree(mut exprs: Vec<Expr>, combine: fn(Expr, Expr) -> Expr) -> Expr {
    debug_assert!(!exprs.is_empty());
    let mut acc = exprs.pop().expect("binary operator with no operands");
    while let Some(e) = exprs.pop() {
        acc = combine(e, acc);
    }
    acc
}
