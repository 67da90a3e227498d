use std::sync::Arc;

use skiffsql_core::types::Value;
use skiffsql_core::{Error, Result};
use skiffsql_ir::code::{BinOp, BlockBuilder, Expr, Primitive, Type, UnaryOp};
use skiffsql_ir::sql::SqlExpr;

use crate::agg::{
    AggAddContext, AggContext, AggImplementor, AggResetContext, AggResultContext, guard_arguments,
    reify,
};
use crate::null_as::NullAs;
use crate::translator::{Translator, convert};

/// Which end of the frame an index computation is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekType {
    Start,
    End,
    Set,
}

/// The engine-bound frame and partition positions, as expressions the
/// generated code reads.
#[derive(Debug, Clone)]
pub struct WinAggFrame {
    pub current_position: Expr,
    pub start_index: Expr,
    pub end_index: Expr,
    pub frame_row_count: Expr,
    pub partition_row_count: Expr,
    pub has_rows: Expr,
}

fn const_i32(n: i64) -> Expr {
    Expr::constant(Value::int64(n), Type::Primitive(Primitive::I32))
}

fn compute_index(frame: &WinAggFrame, offset: Expr, seek: SeekType) -> Expr {
    let base = match seek {
        SeekType::Start => frame.start_index.clone(),
        SeekType::End => frame.end_index.clone(),
        SeekType::Set => frame.current_position.clone(),
    };
    if offset == const_i32(0) {
        base
    } else {
        Expr::binary(BinOp::Add, base, offset)
    }
}

/// Add context for window aggregates: the aggregate context plus frame
/// positions and the row comparator.
pub struct WinAggAddContext<'a, 't> {
    pub agg: AggAddContext<'a, 't>,
    pub frame: &'a WinAggFrame,
}

impl<'a, 't> WinAggAddContext<'a, 't> {
    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.agg.current_block()
    }

    pub fn nest_block(&mut self) {
        self.agg.nest_block();
    }

    pub fn exit_block(&mut self) -> Expr {
        self.agg.exit_block()
    }

    pub fn current_position(&self) -> Expr {
        self.frame.current_position.clone()
    }

    pub fn start_index(&self) -> Expr {
        self.frame.start_index.clone()
    }

    /// Compares the ORDER BY keys of two partition rows; negative when the
    /// first sorts before the second.
    pub fn compare_rows(&self, i: Expr, j: Expr) -> Expr {
        Expr::call(
            None,
            skiffsql_ir::code::Builtin::CompareRows,
            vec![i, j],
            Type::Primitive(Primitive::I32),
        )
    }

    pub fn compute_index(&self, offset: Expr, seek: SeekType) -> Expr {
        compute_index(self.frame, offset, seek)
    }
}

/// Result context for window aggregates: positional access to the frame and
/// a translator for reading arbitrary partition rows.
pub struct WinAggResultContext<'a, 't> {
    pub agg: AggResultContext,
    translator: &'a Translator<'t>,
    rex_args: Vec<SqlExpr>,
    pub frame: &'a WinAggFrame,
}

impl<'a, 't> WinAggResultContext<'a, 't> {
    pub fn new(
        agg: AggResultContext,
        translator: &'a Translator<'t>,
        rex_args: Vec<SqlExpr>,
        frame: &'a WinAggFrame,
    ) -> Self {
        Self {
            agg,
            translator,
            rex_args,
            frame,
        }
    }

    pub fn current_block(&mut self) -> &mut BlockBuilder {
        self.agg.current_block()
    }

    pub fn rex_arguments(&self) -> &[SqlExpr] {
        &self.rex_args
    }

    pub fn compute_index(&self, offset: Expr, seek: SeekType) -> Expr {
        compute_index(self.frame, offset, seek)
    }

    /// Whether `index` falls inside the partition.
    pub fn row_in_partition(&self, index: Expr) -> Expr {
        Expr::fold_and(vec![
            Expr::binary(BinOp::GreaterThanOrEqual, index.clone(), const_i32(0)),
            Expr::binary(
                BinOp::LessThan,
                index,
                self.frame.partition_row_count.clone(),
            ),
        ])
    }

    /// A translator whose column references read the partition row at
    /// `index`.
    pub fn row_translator(&self, index: Expr) -> Result<Translator<'t>> {
        self.translator.row_translator(index)
    }

    pub fn into_result(self, result: Expr) -> Expr {
        self.agg.into_result(result)
    }
}

/// A frame-aware aggregate state machine. Implementors additionally declare
/// whether their value may be cached across rows while the frame shape is
/// unchanged.
pub trait WinAggImplementor {
    fn state_types(&self, info: &AggContext) -> Vec<Type>;
    fn implement_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()>;
    fn implement_add(&self, info: &AggContext, add: &mut WinAggAddContext<'_, '_>) -> Result<()>;
    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr>;
    fn need_cache_when_frame_intact(&self) -> bool;
}

pub type WinAggFactory = Arc<dyn Fn() -> Result<Box<dyn WinAggImplementor>> + Send + Sync>;

/// The not-null core of a strict window aggregate.
pub trait StrictWinAggImplementor {
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
        add: &mut WinAggAddContext<'_, '_>,
        args: &[Expr],
    ) -> Result<()>;

    fn not_null_result(
        &self,
        _info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        Ok(result.agg.accumulator[0].clone())
    }

    fn need_cache(&self) -> bool {
        true
    }
}

/// Strict wrapper for window aggregates: null arguments leave the
/// accumulator unchanged.
pub struct StrictWin<T>(pub T);

impl<T: StrictWinAggImplementor> WinAggImplementor for StrictWin<T> {
    fn state_types(&self, info: &AggContext) -> Vec<Type> {
        self.0.not_null_state(info)
    }

    fn implement_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        self.0.not_null_reset(info, reset)
    }

    fn implement_add(&self, info: &AggContext, add: &mut WinAggAddContext<'_, '_>) -> Result<()> {
        let (checks, args) = guard_arguments(&mut add.agg)?;
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

    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        self.0.not_null_result(info, result)
    }

    fn need_cache_when_frame_intact(&self) -> bool {
        self.0.need_cache()
    }
}

/// RANK and DENSE_RANK share the trigger (the ORDER BY key changed between
/// the previous and current row); only the new-rank computation differs.
pub struct RankImplementor {
    compute_new_rank: fn(&Expr, &WinAggAddContext<'_, '_>) -> Expr,
}

pub fn rank_implementor() -> RankImplementor {
    RankImplementor {
        compute_new_rank: rank_value,
    }
}

pub fn dense_rank_implementor() -> RankImplementor {
    RankImplementor {
        compute_new_rank: dense_rank_value,
    }
}

fn rank_value(_acc: &Expr, add: &WinAggAddContext<'_, '_>) -> Expr {
    // In general currentPosition - startIndex, but RANK does not allow a
    // frame clause so startIndex is zero in practice.
    let mut pos = add.current_position();
    if add.start_index() != const_i32(0) {
        pos = Expr::binary(BinOp::Subtract, pos, add.start_index());
    }
    convert(pos, Type::Primitive(Primitive::I64))
}

fn dense_rank_value(acc: &Expr, _add: &WinAggAddContext<'_, '_>) -> Expr {
    Expr::binary(
        BinOp::Add,
        acc.clone(),
        Expr::constant(Value::int64(1), Type::Primitive(Primitive::I64)),
    )
}

impl StrictWinAggImplementor for RankImplementor {
    fn not_null_state(&self, _info: &AggContext) -> Vec<Type> {
        vec![Type::Primitive(Primitive::I64)]
    }

    fn not_null_add(
        &self,
        _info: &AggContext,
        add: &mut WinAggAddContext<'_, '_>,
        _args: &[Expr],
    ) -> Result<()> {
        let acc = add.agg.accumulator[0].clone();
        add.nest_block();
        let prev = Expr::binary(BinOp::Subtract, add.current_position(), const_i32(1));
        let ordering_differs = Expr::binary(
            BinOp::LessThan,
            add.compare_rows(prev, add.current_position()),
            const_i32(0),
        );
        let new_rank = (self.compute_new_rank)(&acc, add);
        add.current_block()
            .add(Expr::if_then(ordering_differs, Expr::assign(acc, new_rank)));
        let body = add.exit_block();
        let guard = Expr::binary(BinOp::GreaterThan, add.current_position(), add.start_index());
        add.current_block().add(Expr::if_then(guard, body));
        Ok(())
    }

    fn not_null_result(
        &self,
        _info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        // Rank is 1-based.
        Ok(Expr::binary(
            BinOp::Add,
            result.agg.accumulator[0].clone(),
            Expr::constant(Value::int64(1), Type::Primitive(Primitive::I64)),
        ))
    }
}

/// ROW_NUMBER: stateless; the position within the partition, 1-based.
pub struct RowNumberImplementor;

impl StrictWinAggImplementor for RowNumberImplementor {
    fn not_null_state(&self, _info: &AggContext) -> Vec<Type> {
        Vec::new()
    }

    fn not_null_add(
        &self,
        _info: &AggContext,
        _add: &mut WinAggAddContext<'_, '_>,
        _args: &[Expr],
    ) -> Result<()> {
        Ok(())
    }

    fn not_null_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        let pos = Expr::binary(
            BinOp::Subtract,
            result.frame.current_position.clone(),
            result.frame.start_index.clone(),
        );
        let number = Expr::binary(BinOp::Add, pos, const_i32(1));
        Ok(convert(
            number,
            Type::of(&info.return_type.with_nullable(false)),
        ))
    }
}

/// FIRST_VALUE and LAST_VALUE: read the argument at the frame start or end;
/// the type default when the frame is empty.
pub struct FirstLastValueImplementor {
    seek: SeekType,
}

impl FirstLastValueImplementor {
    pub fn first() -> Self {
        Self {
            seek: SeekType::Start,
        }
    }

    pub fn last() -> Self {
        Self {
            seek: SeekType::End,
        }
    }
}

impl WinAggImplementor for FirstLastValueImplementor {
    fn state_types(&self, _info: &AggContext) -> Vec<Type> {
        Vec::new()
    }

    fn implement_reset(&self, _info: &AggContext, _reset: &mut AggResetContext) -> Result<()> {
        Ok(())
    }

    fn implement_add(
        &self,
        _info: &AggContext,
        _add: &mut WinAggAddContext<'_, '_>,
    ) -> Result<()> {
        Ok(())
    }

    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        let ret = Type::of(&info.return_type);
        let index = result.compute_index(const_i32(0), self.seek);
        let arg0 = result
            .rex_arguments()
            .first()
            .cloned()
            .ok_or_else(|| Error::internal("FIRST_VALUE/LAST_VALUE expects an argument"))?;
        let value = reify(
            result
                .row_translator(index)?
                .translate_standalone(&arg0, NullAs::Null, ret),
        )?;
        Ok(Expr::condition(
            result.frame.has_rows.clone(),
            value,
            Expr::default_value(ret),
        ))
    }

    fn need_cache_when_frame_intact(&self) -> bool {
        true
    }
}

/// LEAD and LAG: read the argument `offset` rows away in the partition, or
/// the default when that row falls outside it.
pub struct LeadLagImplementor {
    is_lead: bool,
}

impl LeadLagImplementor {
    pub fn lead() -> Self {
        Self { is_lead: true }
    }

    pub fn lag() -> Self {
        Self { is_lead: false }
    }
}

impl WinAggImplementor for LeadLagImplementor {
    fn state_types(&self, _info: &AggContext) -> Vec<Type> {
        Vec::new()
    }

    fn implement_reset(&self, _info: &AggContext, _reset: &mut AggResetContext) -> Result<()> {
        Ok(())
    }

    fn implement_add(
        &self,
        _info: &AggContext,
        _add: &mut WinAggAddContext<'_, '_>,
    ) -> Result<()> {
        Ok(())
    }

    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        let res_ty = Type::of(&info.return_type);
        let name = if self.is_lead { "lead" } else { "lag" };
        let res = result.current_block().new_param(name, res_ty);
        let rex_args = result.rex_arguments().to_vec();
        let arg0 = rex_args
            .first()
            .cloned()
            .ok_or_else(|| Error::internal("LEAD/LAG expects an argument"))?;

        let current = result.compute_index(const_i32(0), SeekType::Set);
        let mut offset = match rex_args.get(1) {
            // lead(x, offset) or lead(x, offset, default)
            Some(offset_arg) => reify(result.row_translator(current.clone())?.translate_standalone(
                offset_arg,
                NullAs::NotPossible,
                Type::Primitive(Primitive::I32),
            ))?,
            None => const_i32(1),
        };
        if !self.is_lead {
            offset = Expr::unary(UnaryOp::Negate, offset);
        }
        let dst = result.compute_index(offset, SeekType::Set);
        let dst = result.current_block().append("idx", dst);
        let in_partition = result.row_in_partition(dst.clone());

        let value = reify(
            result
                .row_translator(dst)?
                .translate_standalone(&arg0, NullAs::Null, res_ty),
        )?;
        let default = match rex_args.get(2) {
            Some(default_arg) => reify(result.row_translator(current)?.translate_standalone(
                default_arg,
                NullAs::Null,
                res_ty,
            ))?,
            None => Expr::default_value(res_ty),
        };

        result.current_block().add(Expr::declare(&res, None));
        result.current_block().add(Expr::if_then_else(
            in_partition,
            Expr::assign(Expr::param(&res), value),
            Expr::assign(Expr::param(&res), default),
        ));
        Ok(Expr::param(&res))
    }

    fn need_cache_when_frame_intact(&self) -> bool {
        false
    }
}

/// NTILE(n): 1 + (n * (position - startIndex)) / partitionRowCount.
pub struct NtileImplementor;

impl WinAggImplementor for NtileImplementor {
    fn state_types(&self, _info: &AggContext) -> Vec<Type> {
        Vec::new()
    }

    fn implement_reset(&self, _info: &AggContext, _reset: &mut AggResetContext) -> Result<()> {
        Ok(())
    }

    fn implement_add(
        &self,
        _info: &AggContext,
        _add: &mut WinAggAddContext<'_, '_>,
    ) -> Result<()> {
        Ok(())
    }

    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        let arg0 = result
            .rex_arguments()
            .first()
            .cloned()
            .ok_or_else(|| Error::internal("NTILE expects an argument"))?;
        let current = result.compute_index(const_i32(0), SeekType::Set);
        let tiles = reify(result.row_translator(current)?.translate_standalone(
            &arg0,
            NullAs::NotPossible,
            Type::Primitive(Primitive::I32),
        ))?;
        let offset = Expr::binary(
            BinOp::Subtract,
            result.frame.current_position.clone(),
            result.frame.start_index.clone(),
        );
        let ntile = Expr::binary(
            BinOp::Add,
            const_i32(1),
            Expr::binary(
                BinOp::Divide,
                Expr::binary(BinOp::Multiply, tiles, offset),
                result.frame.partition_row_count.clone(),
            ),
        );
        Ok(convert(
            ntile,
            Type::of(&info.return_type.with_nullable(false)),
        ))
    }

    fn need_cache_when_frame_intact(&self) -> bool {
        false
    }
}

/// COUNT over a window. With no nullable parameter the state is empty and
/// the result is just the frame row count.
pub struct CountWinImplementor;

fn just_frame_row_count(info: &AggContext) -> bool {
    info.parameter_types.iter().all(|t| !t.nullable)
}

impl StrictWinAggImplementor for CountWinImplementor {
    fn not_null_state(&self, info: &AggContext) -> Vec<Type> {
        if just_frame_row_count(info) {
            Vec::new()
        } else {
            vec![Type::Primitive(Primitive::I64)]
        }
    }

    fn not_null_add(
        &self,
        info: &AggContext,
        add: &mut WinAggAddContext<'_, '_>,
        _args: &[Expr],
    ) -> Result<()> {
        if just_frame_row_count(info) {
            return Ok(());
        }
        let acc = add.agg.accumulator[0].clone();
        let one = Expr::constant(Value::int64(1), Type::Primitive(Primitive::I64));
        let next = Expr::binary(BinOp::Add, acc.clone(), one);
        add.current_block().add(Expr::assign(acc, next));
        Ok(())
    }

    fn not_null_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        if just_frame_row_count(info) {
            Ok(convert(
                result.frame.frame_row_count.clone(),
                Type::of(&info.return_type.with_nullable(false)),
            ))
        } else {
            Ok(result.agg.accumulator[0].clone())
        }
    }
}

/// Regular aggregates are usable in window context as well; this adapter
/// drives them through the window hooks.
pub struct RegularAggAdapter {
    inner: Box<dyn AggImplementor>,
}

impl RegularAggAdapter {
    pub fn new(inner: Box<dyn AggImplementor>) -> Self {
        Self { inner }
    }
}

impl WinAggImplementor for RegularAggAdapter {
    fn state_types(&self, info: &AggContext) -> Vec<Type> {
        self.inner.state_types(info)
    }

    fn implement_reset(&self, info: &AggContext, reset: &mut AggResetContext) -> Result<()> {
        self.inner.implement_reset(info, reset)
    }

    fn implement_add(&self, info: &AggContext, add: &mut WinAggAddContext<'_, '_>) -> Result<()> {
        self.inner.implement_add(info, &mut add.agg)
    }

    fn implement_result(
        &self,
        info: &AggContext,
        result: &mut WinAggResultContext<'_, '_>,
    ) -> Result<Expr> {
        self.inner.implement_result(info, &mut result.agg)
    }

    fn need_cache_when_frame_intact(&self) -> bool {
        true
    }
}
