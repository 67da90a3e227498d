use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use debug_print::debug_eprintln;
use skiffsql_core::{Error, Result};
use skiffsql_ir::code::{BinOp, Builtin, UnaryOp};
use skiffsql_ir::sql::{Aggregation, SqlOp, SqlOperator};

use crate::agg::{
    AggFactory, AggImplementor, CountImplementor, MinMaxImplementor, SingleValueImplementor,
    Strict, SumImplementor,
};
use crate::policy::{NullPolicy, create_implementor};
use crate::scalar::{CallImplementor, NotNullImplementor};
use crate::window::{
    CountWinImplementor, FirstLastValueImplementor, LeadLagImplementor, NtileImplementor,
    RegularAggAdapter, RowNumberImplementor, StrictWin, WinAggFactory, WinAggImplementor,
    dense_rank_implementor, rank_implementor,
};

/// The operator implementation table: maps every SQL operator to a call
/// implementor and every aggregation symbol to an implementor factory.
/// Built once at startup and immutable thereafter; user functions register
/// on a privately owned instance before it is shared.
pub struct ImpTable {
    map: HashMap<SqlOperator, CallImplementor>,
    agg_map: HashMap<Aggregation, AggFactory>,
    win_agg_map: HashMap<Aggregation, WinAggFactory>,
    udf_map: HashMap<String, CallImplementor>,
    udaf_map: HashMap<String, AggFactory>,
    win_udaf_map: HashMap<String, WinAggFactory>,
}

/// The shared table with the built-in operators.
pub static INSTANCE: LazyLock<ImpTable> = LazyLock::new(ImpTable::new);

impl Default for ImpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpTable {
    pub fn new() -> Self {
        let mut table = Self {
            map: HashMap::new(),
            agg_map: HashMap::new(),
            win_agg_map: HashMap::new(),
            udf_map: HashMap::new(),
            udaf_map: HashMap::new(),
            win_udaf_map: HashMap::new(),
        };
        table.register_builtins();
        debug_eprintln!(
            "[codegen::table] registered {} scalar operators, {} aggregates, {} window aggregates",
            table.map.len(),
            table.agg_map.len(),
            table.win_agg_map.len()
        );
        table
    }

    fn register_builtins(&mut self) {
        use SqlOperator::*;

        self.define_method(Upper, Builtin::Upper, NullPolicy::Strict);
        self.define_method(Lower, Builtin::Lower, NullPolicy::Strict);
        self.define_method(InitCap, Builtin::InitCap, NullPolicy::Strict);
        self.define_method(Substring, Builtin::Substring, NullPolicy::Strict);
        self.define_method(CharacterLength, Builtin::CharLength, NullPolicy::Strict);
        self.define_method(CharLength, Builtin::CharLength, NullPolicy::Strict);
        self.define_method(Concat, Builtin::Concat, NullPolicy::Strict);
        self.define_method(Overlay, Builtin::Overlay, NullPolicy::Strict);
        self.define_method(Position, Builtin::Position, NullPolicy::Strict);

        self.define_implementor(Trim, NullPolicy::Strict, NotNullImplementor::Trim, false);

        // logical
        self.define_binary(And, BinOp::AndAlso, NullPolicy::And, None);
        self.define_binary(Or, BinOp::OrElse, NullPolicy::Or, None);
        self.define_unary(Not, UnaryOp::Not, NullPolicy::Not);

        // comparisons
        self.define_binary(
            LessThan,
            BinOp::LessThan,
            NullPolicy::Strict,
            Some(Builtin::Lt),
        );
        self.define_binary(
            LessThanOrEqual,
            BinOp::LessThanOrEqual,
            NullPolicy::Strict,
            Some(Builtin::Le),
        );
        self.define_binary(
            GreaterThan,
            BinOp::GreaterThan,
            NullPolicy::Strict,
            Some(Builtin::Gt),
        );
        self.define_binary(
            GreaterThanOrEqual,
            BinOp::GreaterThanOrEqual,
            NullPolicy::Strict,
            Some(Builtin::Ge),
        );
        self.define_binary(Equals, BinOp::Equal, NullPolicy::Strict, Some(Builtin::Eq));
        self.define_binary(
            NotEquals,
            BinOp::NotEqual,
            NullPolicy::Strict,
            Some(Builtin::Ne),
        );

        // arithmetic
        self.define_binary(Plus, BinOp::Add, NullPolicy::Strict, Some(Builtin::Plus));
        self.define_binary(
            Minus,
            BinOp::Subtract,
            NullPolicy::Strict,
            Some(Builtin::Minus),
        );
        self.define_binary(
            Multiply,
            BinOp::Multiply,
            NullPolicy::Strict,
            Some(Builtin::Multiply),
        );
        self.define_binary(
            Divide,
            BinOp::Divide,
            NullPolicy::Strict,
            Some(Builtin::Divide),
        );
        self.define_binary(
            DivideInteger,
            BinOp::Divide,
            NullPolicy::Strict,
            Some(Builtin::Divide),
        );
        self.define_unary(UnaryMinus, UnaryOp::Negate, NullPolicy::Strict);
        self.define_unary(UnaryPlus, UnaryOp::UnaryPlus, NullPolicy::Strict);

        self.define_function(Mod, Builtin::Mod, NullPolicy::Strict);
        self.define_function(Exp, Builtin::Exp, NullPolicy::Strict);
        self.define_function(Power, Builtin::Power, NullPolicy::Strict);
        self.define_function(Ln, Builtin::Ln, NullPolicy::Strict);
        self.define_function(Log10, Builtin::Log10, NullPolicy::Strict);
        self.define_function(Abs, Builtin::Abs, NullPolicy::Strict);
        self.define_function(Ceil, Builtin::Ceil, NullPolicy::Strict);
        self.define_function(Floor, Builtin::Floor, NullPolicy::Strict);

        // datetime
        self.define_implementor(
            DatetimePlus,
            NullPolicy::Strict,
            NotNullImplementor::DatetimeArithmetic,
            false,
        );
        self.define_method(ExtractDate, Builtin::ExtractDate, NullPolicy::Strict);

        self.map.insert(
            IsNull,
            CallImplementor::IsXxx {
                seek: None,
                negate: false,
            },
        );
        self.map.insert(
            IsNotNull,
            CallImplementor::IsXxx {
                seek: None,
                negate: true,
            },
        );
        self.map.insert(
            IsTrue,
            CallImplementor::IsXxx {
                seek: Some(true),
                negate: false,
            },
        );
        self.map.insert(
            IsNotTrue,
            CallImplementor::IsXxx {
                seek: Some(true),
                negate: true,
            },
        );
        self.map.insert(
            IsFalse,
            CallImplementor::IsXxx {
                seek: Some(false),
                negate: false,
            },
        );
        self.map.insert(
            IsNotFalse,
            CallImplementor::IsXxx {
                seek: Some(false),
                negate: true,
            },
        );

        // LIKE and SIMILAR
        let like = NotNullImplementor::Method(Builtin::Like);
        self.define_implementor(Like, NullPolicy::Strict, like.clone(), false);
        self.define_implementor(
            NotLike,
            NullPolicy::Strict,
            NotNullImplementor::not(like),
            false,
        );
        let similar = NotNullImplementor::Method(Builtin::Similar);
        self.define_implementor(SimilarTo, NullPolicy::Strict, similar.clone(), false);
        self.define_implementor(
            NotSimilarTo,
            NullPolicy::Strict,
            NotNullImplementor::not(similar),
            false,
        );

        // collections
        self.define_method(Cardinality, Builtin::CollectionSize, NullPolicy::Strict);
        self.define_method(Slice, Builtin::Slice, NullPolicy::None);
        self.define_method(Element, Builtin::Element, NullPolicy::Strict);

        self.map.insert(Case, CallImplementor::Case);
        self.map.insert(Cast, CallImplementor::CastOptimized);
        self.define_implementor(
            Reinterpret,
            NullPolicy::Strict,
            NotNullImplementor::Reinterpret,
            false,
        );

        self.map
            .insert(MapValueConstructor, CallImplementor::ValueConstructor);
        self.map
            .insert(ArrayValueConstructor, CallImplementor::ValueConstructor);
        self.map.insert(Item, CallImplementor::Item);

        // system functions
        for op in [
            User,
            CurrentUser,
            SessionUser,
            SystemUser,
            CurrentPath,
            CurrentRole,
            CurrentTime,
            CurrentTimestamp,
            CurrentDate,
            LocalTime,
            LocalTimestamp,
        ] {
            self.map.insert(op, CallImplementor::SystemFunction);
        }

        // aggregates
        self.agg_map.insert(
            Aggregation::Count,
            agg_factory(|| Box::new(Strict(CountImplementor))),
        );
        self.agg_map.insert(
            Aggregation::Sum0,
            agg_factory(|| Box::new(Strict(SumImplementor))),
        );
        self.agg_map.insert(
            Aggregation::Sum,
            agg_factory(|| Box::new(Strict(SumImplementor))),
        );
        self.agg_map.insert(
            Aggregation::Min,
            agg_factory(|| Box::new(Strict(MinMaxImplementor))),
        );
        self.agg_map.insert(
            Aggregation::Max,
            agg_factory(|| Box::new(Strict(MinMaxImplementor))),
        );
        self.agg_map.insert(
            Aggregation::SingleValue,
            agg_factory(|| Box::new(SingleValueImplementor)),
        );

        // window aggregates
        self.win_agg_map.insert(
            Aggregation::Rank,
            win_factory(|| Box::new(StrictWin(rank_implementor()))),
        );
        self.win_agg_map.insert(
            Aggregation::DenseRank,
            win_factory(|| Box::new(StrictWin(dense_rank_implementor()))),
        );
        self.win_agg_map.insert(
            Aggregation::RowNumber,
            win_factory(|| Box::new(StrictWin(RowNumberImplementor))),
        );
        self.win_agg_map.insert(
            Aggregation::FirstValue,
            win_factory(|| Box::new(FirstLastValueImplementor::first())),
        );
        self.win_agg_map.insert(
            Aggregation::LastValue,
            win_factory(|| Box::new(FirstLastValueImplementor::last())),
        );
        self.win_agg_map.insert(
            Aggregation::Lead,
            win_factory(|| Box::new(LeadLagImplementor::lead())),
        );
        self.win_agg_map.insert(
            Aggregation::Lag,
            win_factory(|| Box::new(LeadLagImplementor::lag())),
        );
        self.win_agg_map.insert(
            Aggregation::Ntile,
            win_factory(|| Box::new(NtileImplementor)),
        );
        self.win_agg_map.insert(
            Aggregation::Count,
            win_factory(|| Box::new(StrictWin(CountWinImplementor))),
        );
    }

    fn define_implementor(
        &mut self,
        operator: SqlOperator,
        null_policy: NullPolicy,
        implementor: NotNullImplementor,
        harmonize: bool,
    ) {
        self.map.insert(
            operator,
            create_implementor(implementor, null_policy, harmonize),
        );
    }

    fn define_method(&mut self, operator: SqlOperator, method: Builtin, null_policy: NullPolicy) {
        self.define_implementor(
            operator,
            null_policy,
            NotNullImplementor::Method(method),
            false,
        );
    }

    fn define_function(&mut self, operator: SqlOperator, method: Builtin, null_policy: NullPolicy) {
        self.define_implementor(
            operator,
            null_policy,
            NotNullImplementor::SqlFunction(method),
            false,
        );
    }

    fn define_unary(&mut self, operator: SqlOperator, op: UnaryOp, null_policy: NullPolicy) {
        self.define_implementor(operator, null_policy, NotNullImplementor::Unary(op), false);
    }

    fn define_binary(
        &mut self,
        operator: SqlOperator,
        op: BinOp,
        null_policy: NullPolicy,
        backup: Option<Builtin>,
    ) {
        self.define_implementor(
            operator,
            null_policy,
            NotNullImplementor::Binary { op, backup },
            true,
        );
    }

    /// Registers the implementor of a user-defined scalar function.
    pub fn register_udf(&mut self, name: impl Into<String>, implementor: CallImplementor) {
        self.udf_map.insert(name.into().to_uppercase(), implementor);
    }

    /// Registers the implementor factory of a user-defined aggregate.
    pub fn register_udaf(&mut self, name: impl Into<String>, factory: AggFactory) {
        self.udaf_map.insert(name.into().to_uppercase(), factory);
    }

    /// Registers a window-specialized factory for a user-defined aggregate.
    pub fn register_window_udaf(&mut self, name: impl Into<String>, factory: WinAggFactory) {
        self.win_udaf_map.insert(name.into().to_uppercase(), factory);
    }

    /// Looks up the implementor for a scalar operator. A user-defined
    /// function must have registered its own implementor; a missing built-in
    /// is a plain lookup miss the caller decides about.
    pub fn get(&self, op: &SqlOp) -> Result<Option<CallImplementor>> {
        match op {
            SqlOp::Std(op) => Ok(self.map.get(op).cloned()),
            SqlOp::Udf(name) => self
                .udf_map
                .get(&name.to_uppercase())
                .cloned()
                .map(Some)
                .ok_or_else(|| Error::InvalidUdf(name.clone())),
        }
    }

    /// Instantiates the implementor for an aggregation in GROUP BY context.
    pub fn get_aggregate(&self, agg: &Aggregation) -> Result<Option<Box<dyn AggImplementor>>> {
        match agg {
            Aggregation::Udaf(name) => {
                let factory = self
                    .udaf_map
                    .get(&name.to_uppercase())
                    .ok_or_else(|| Error::InvalidUdf(name.clone()))?;
                factory().map(Some)
            }
            _ => match self.agg_map.get(agg) {
                Some(factory) => factory().map(Some),
                None => Ok(None),
            },
        }
    }

    /// Instantiates the implementor for an aggregation in OVER context. A
    /// window-specialized implementor is preferred; regular aggregates fall
    /// back to the adapter.
    pub fn get_window_aggregate(
        &self,
        agg: &Aggregation,
    ) -> Result<Option<Box<dyn WinAggImplementor>>> {
        match agg {
            Aggregation::Udaf(name) => {
                let key = name.to_uppercase();
                if let Some(factory) = self.win_udaf_map.get(&key) {
                    return factory().map(Some);
                }
                let factory = self
                    .udaf_map
                    .get(&key)
                    .ok_or_else(|| Error::InvalidUdf(name.clone()))?;
                factory().map(|imp| Some(Box::new(RegularAggAdapter::new(imp)) as Box<dyn WinAggImplementor>))
            }
            _ => {
                if let Some(factory) = self.win_agg_map.get(agg) {
                    return factory().map(Some);
                }
                match self.agg_map.get(agg) {
                    Some(factory) => {
                        factory().map(|imp| Some(Box::new(RegularAggAdapter::new(imp)) as Box<dyn WinAggImplementor>))
                    }
                    None => Ok(None),
                }
            }
        }
    }
}

fn agg_factory(f: fn() -> Box<dyn AggImplementor>) -> AggFactory {
    Arc::new(move || Ok(f()))
}

fn win_factory(f: fn() -> Box<dyn WinAggImplementor>) -> WinAggFactory {
    Arc::new(move || Ok(f()))
}
