use std::sync::Arc;

use rust_decimal::Decimal;
use skiffsql_core::types::{SqlType, TypeKind, Value};
use skiffsql_core::{Error, Result};
use skiffsql_ir::code::{
    BinOp, BlockBuilder, BlockStack, Builtin, Expr, NULL_EXPR, Primitive, Type, UdfMethod,
};
use skiffsql_ir::sql::{Aggregation, SqlExpr};

use crate::null_as::NullAs;
use crate::translator::{LowerResult, Translator, convert};

/// What an aggregate is being lowered for: its symbol and the planner's
/// types for the call.
#[derive(Debug, Clone)]
pub struct AggContext {
    pub aggregation: Aggregation,
    pub return_type: SqlType,
    pub parameter_types: Vec<SqlType>,
}

impl AggContext {
    pub fn return_storage(&self) -> Type {
        Type::of(&self.return_type)
    }
}

/// Emit context for the reset hook: accumulator slot references plus the
/// block being written.
pub struct AggResetContext {
    pub accumulator: Vec<Expr>,
    blocks: BlockStack,
}

impl AggResetContext {
    pub fn new(accumulator: Vec<Expr>) -> Self {
        Self {
            accumulator,
            blocks: BlockStack::new(),
        }
    }

    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.blocks.current()
    }

    pub fn into_block(self) -> Expr {
        self.blocks.finish(None)
    }
}

/// Emit context for the add hook. Arguments are input nodes; implementors
/// translate them through the enclosed translator.
pub struct AggAddContext<'a, 't> {
    pub accumulator: Vec<Expr>,
    blocks: BlockStack,
    translator: &'a mut Translator<'t>,
    rex_args: Vec<SqlExpr>,
}

impl<'a, 't> AggAddContext<'a, 't> {
    pub fn new(
        accumulator: Vec<Expr>,
        translator: &'a mut Translator<'t>,
        rex_args: Vec<SqlExpr>,
    ) -> Self {
        Self {
            accumulator,
            blocks: BlockStack::new(),
            translator,
            rex_args,
        }
    }

    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.blocks.current()
    }

    pub fn nest_block(&mut self) {
        self.blocks.nest();
    }

    pub fn exit_block(&mut self) -> Expr {
        self.blocks.exit()
    }

    pub fn rex_arguments(&self) -> &[SqlExpr] {
        &self.rex_args
    }

    pub fn translator(&mut self) -> &mut Translator<'t> {
        self.translator
    }

    pub fn arguments(&mut self, null_as: NullAs) -> LowerResult<Vec<Expr>> {
        let args = self.rex_args.clone();
        args.iter()
            .map(|a| self.translator.translate(a, null_as))
            .collect()
    }

    pub fn into_block(self) -> Expr {
        self.blocks.finish(None)
    }
}

/// Emit context for the result hook.
pub struct AggResultContext {
    pub accumulator: Vec<Expr>,
    blocks: BlockStack,
}

impl AggResultContext {
    pub fn new(accumulator: Vec<Expr>) -> Self {
        Self {
            accumulator,
            blocks: BlockStack::new(),
        }
    }

    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.blocks.current()
    }

    pub fn into_result(self, result: Expr) -> Expr {
        self.blocks.finish(Some(result))
    }
}

/// The three-phase state machine of an aggregate. The execution engine owns
/// the accumulator; implementors only emit code addressing slots by
/// position.
pub trait AggImplementor {
    fn state_types(&self, info: &AggContext) -> Vec<Type>;
    fn implement_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()>;
    fn implement_add(&self, info: &AggContext, add: &mut AggAddContext<'_, '_>) -> Result<()>;
    fn implement_result(&self, info: &AggContext, result: &mut AggResultContext) -> Result<Expr>;
}

/// Factory for an aggregate implementor. Construction failures surface
/// through the returned `Result`.
pub type AggFactory = Arc<dyn Fn() -> Result<Box<dyn AggImplementor>> + Send + Sync>;

pub(crate) fn reify<T>(r: LowerResult<T>) -> Result<T> {
    r.map_err(|e| e.into_error())
}

/// The not-null core of a strict aggregate: null arguments are skipped and
/// leave the accumulator unchanged.
pub trait StrictAggImplementor {
    fn not_null_state(&self, info: &AggContext) -> Vec<Type> {
        vec![Type::of(&info.return_type.with_nullable(false))]
    }

    fn not_null_reset(&self, _info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        for acc in reset.accumulator.clone() {
            let init = Expr::default_value(acc.type_of());
            reset.current_block().add(Expr::assign(acc, init));
        }
        Ok(())
    }

    fn not_null_add(
        &self,
        info: &AggContext,
        add: &mut AggAddContext<'_, '_>,
        args: &[Expr],
    ) -> Result<()>;

    fn not_null_result(&self, _info: &AggContext, result: &mut AggResultContext) -> Result<Expr> {
        Ok(result.accumulator[0].clone())
    }
}

/// Wraps a not-null core with the null-skipping add guard.
pub struct Strict<T>(pub T);

impl<T: StrictAggImplementor> AggImplementor for Strict<T> {
    fn state_types(&self, info: &AggContext) -> Vec<Type> {
        self.0.not_null_state(info)
    }

    fn implement_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        self.0.not_null_reset(info, reset)
    }

    fn implement_add(&self, info: &AggContext, add: &mut AggAddContext<'_, '_>) -> Result<()> {
        let (checks, args) = guard_arguments(add)?;
        if checks.is_empty() {
            return self.0.not_null_add(info, add, &args);
        }
        add.nest_block();
        self.0.not_null_add(info, add, &args)?;
        let body = add.exit_block();
        add.current_block()
            .add(Expr::if_then(Expr::fold_and(checks), body));
        Ok(())
    }

    fn implement_result(&self, info: &AggContext, result: &mut AggResultContext) -> Result<Expr> {
        self.0.not_null_result(info, result)
    }
}

/// Translates the aggregate arguments, returning non-null checks for the
/// nullable ones alongside unboxed argument expressions.
pub(crate) fn guard_arguments(
    add: &mut AggAddContext<'_, '_>,
) -> Result<(Vec<Expr>, Vec<Expr>)> {
    let rex_args = add.rex_arguments().to_vec();
    let mut checks = Vec::new();
    let mut args = Vec::new();
    for a in &rex_args {
        let t = reify(add.translator().translate(a, NullAs::Null))?;
        if add.translator().is_nullable(a) {
            let v = add.current_block().append("a", t);
            checks.push(Expr::not_equal(v.clone(), NULL_EXPR.clone()));
            args.push(v.unboxed());
        } else {
            args.push(t);
        }
    }
    Ok((checks, args))
}

/// COUNT: a single long slot, incremented per non-null row.
pub struct CountImplementor;

impl StrictAggImplementor for CountImplementor {
    fn not_null_state(&self, _info: &AggContext) -> Vec<Type> {
        vec![Type::Primitive(Primitive::I64)]
    }

    fn not_null_add(
        &self,
        _info: &AggContext,
        add: &mut AggAddContext<'_, '_>,
        _args: &[Expr],
    ) -> Result<()> {
        let acc = add.accumulator[0].clone();
        let one = Expr::constant(Value::int64(1), Type::Primitive(Primitive::I64));
        let next = Expr::binary(BinOp::Add, acc.clone(), one);
        add.current_block().add(Expr::assign(acc, next));
        Ok(())
    }
}

/// SUM and $SUM0: accumulate into the return type, decimal additions going
/// through the decimal add method.
pub struct SumImplementor;

impl StrictAggImplementor for SumImplementor {
    fn not_null_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        let acc = reset.accumulator[0].clone();
        let start = if matches!(info.return_type.kind, TypeKind::Decimal(_)) {
            Expr::constant(Value::numeric(Decimal::ZERO), acc.type_of())
        } else {
            Expr::default_value(acc.type_of())
        };
        reset.current_block().add(Expr::assign(acc, start));
        Ok(())
    }

    fn not_null_add(
        &self,
        info: &AggContext,
        add: &mut AggAddContext<'_, '_>,
        args: &[Expr],
    ) -> Result<()> {
        let acc = add.accumulator[0].clone();
        let arg = args[0].clone();
        let next = if matches!(info.return_type.kind, TypeKind::Decimal(_)) {
            Expr::call(Some(acc.clone()), Builtin::DecimalAdd, vec![arg], acc.type_of())
        } else {
            Expr::binary(BinOp::Add, acc.clone(), convert(arg, acc.type_of()))
        };
        add.current_block().add(Expr::assign(acc, next));
        Ok(())
    }
}

/// MIN and MAX, sharing one implementor that inspects the aggregation
/// symbol. Primitive accumulators reset to the opposite extremum, reference
/// accumulators to null; `lesser`/`greater` ignore the null.
pub struct MinMaxImplementor;

impl StrictAggImplementor for MinMaxImplementor {
    fn not_null_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        let acc = reset.accumulator[0].clone();
        let is_min = info.aggregation == Aggregation::Min;
        let init = match acc.type_of() {
            Type::Primitive(p) => {
                let inf = if is_min { p.max_value() } else { p.min_value() };
                Expr::constant(inf, Type::Primitive(p))
            }
            other => Expr::typed_null(other),
        };
        reset.current_block().add(Expr::assign(acc, init));
        Ok(())
    }

    fn not_null_add(
        &self,
        info: &AggContext,
        add: &mut AggAddContext<'_, '_>,
        args: &[Expr],
    ) -> Result<()> {
        let acc = add.accumulator[0].clone();
        let method = if info.aggregation == Aggregation::Min {
            Builtin::Lesser
        } else {
            Builtin::Greater
        };
        let next = Expr::call(
            None,
            method,
            vec![acc.clone(), args[0].clone().unboxed()],
            acc.type_of(),
        );
        add.current_block().add(Expr::assign(acc, next));
        Ok(())
    }
}

/// SINGLE_VALUE: state is a seen flag plus the value; a second row throws
/// at evaluation time.
pub struct SingleValueImplementor;

impl AggImplementor for SingleValueImplementor {
    fn state_types(&self, info: &AggContext) -> Vec<Type> {
        vec![
            Type::Primitive(Primitive::Bool),
            Type::of(&info.return_type.with_nullable(true)),
        ]
    }

    fn implement_reset(&self, _info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        let flag = reset.accumulator[0].clone();
        let value = reset.accumulator[1].clone();
        let default = Expr::default_value(value.type_of());
        reset
            .current_block()
            .add(Expr::assign(flag, Expr::constant(Value::bool_val(false), Type::Primitive(Primitive::Bool))));
        reset.current_block().add(Expr::assign(value, default));
        Ok(())
    }

    fn implement_add(&self, info: &AggContext, add: &mut AggAddContext<'_, '_>) -> Result<()> {
        let flag = add.accumulator[0].clone();
        let value = add.accumulator[1].clone();
        let arg = reify(add.arguments(NullAs::Null))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::internal("SINGLE_VALUE expects one argument"))?;
        add.current_block().add(Expr::if_then(
            flag.clone(),
            Expr::throw(format!(
                "more than one value in agg {}",
                info.aggregation.name()
            )),
        ));
        add.current_block().add(Expr::assign(
            flag,
            Expr::constant(Value::bool_val(true), Type::Primitive(Primitive::Bool)),
        ));
        let value_ty = value.type_of();
        add.current_block()
            .add(Expr::assign(value, convert(arg.boxed(), value_ty)));
        Ok(())
    }

    fn implement_result(&self, info: &AggContext, result: &mut AggResultContext) -> Result<Expr> {
        Ok(convert(
            result.accumulator[1].clone(),
            Type::of(&info.return_type),
        ))
    }
}

/// Descriptor of a user-defined aggregate: an accumulator type plus the
/// init/add/result functions, and optionally a constructor when the
/// functions close over an instance.
pub struct AggregateUdf {
    pub name: String,
    pub accumulator_type: Type,
    pub constructor: Option<UdfMethod>,
    pub init: UdfMethod,
    pub add: UdfMethod,
    pub result: UdfMethod,
}

/// Lowers a user-defined aggregate through its descriptor. State is
/// `[acc]`, or `[acc, instance]` when the accumulator factory is not
/// static.
pub struct UserDefinedAggImplementor {
    pub udf: Arc<AggregateUdf>,
}

impl UserDefinedAggImplementor {
    fn instance(&self, accumulator: &[Expr]) -> Option<Expr> {
        self.udf.constructor.as_ref().map(|_| accumulator[1].clone())
    }
}

impl StrictAggImplementor for UserDefinedAggImplementor {
    fn not_null_state(&self, _info: &AggContext) -> Vec<Type> {
        match self.udf.constructor {
            None => vec![self.udf.accumulator_type],
            Some(_) => vec![
                self.udf.accumulator_type,
                Type::Object(skiffsql_ir::code::Class::Any),
            ],
        }
    }

    fn not_null_reset(&self, _info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        let acc = reset.accumulator[0].clone();
        if let Some(ctor) = &self.udf.constructor {
            let instance = reset.accumulator[1].clone();
            let make = Expr::call(
                None,
                ctor.clone(),
                Vec::new(),
                Type::Object(skiffsql_ir::code::Class::Any),
            );
            reset.current_block().add(Expr::assign(instance, make));
        }
        let target = self.instance(&reset.accumulator);
        let init = Expr::call(
            target,
            self.udf.init.clone(),
            Vec::new(),
            self.udf.accumulator_type,
        );
        reset.current_block().add(Expr::assign(acc, init));
        Ok(())
    }

    fn not_null_add(
        &self,
        _info: &AggContext,
        add: &mut AggAddContext<'_, '_>,
        args: &[Expr],
    ) -> Result<()> {
        let acc = add.accumulator[0].clone();
        let target = self.instance(&add.accumulator);
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(acc.clone());
        call_args.extend(args.iter().cloned());
        let next = Expr::call(
            target,
            self.udf.add.clone(),
            call_args,
            self.udf.accumulator_type,
        );
        add.current_block().add(Expr::assign(acc, next));
        Ok(())
    }

    fn not_null_result(&self, _info: &AggContext, result: &mut AggResultContext) -> Result<Expr> {
        let target = self.instance(&result.accumulator);
        let ret = self.udf.result.ret;
        Ok(Expr::call(
            target,
            self.udf.result.clone(),
            vec![result.accumulator[0].clone()],
            ret,
        ))
    }
}
