//! The SkiffSQL operator implementation table: lowers SQL scalar calls,
//! aggregates and window aggregates into the executable expression tree,
//! wrapping per-operator implementors in a null-semantics engine.

pub mod agg;
pub mod null_as;
pub mod policy;
pub mod scalar;
pub mod table;
pub mod translator;
pub mod window;

pub use agg::{
    AggAddContext, AggContext, AggFactory, AggImplementor, AggResetContext, AggResultContext,
    AggregateUdf, Strict, StrictAggImplementor, UserDefinedAggImplementor,
};
pub use null_as::NullAs;
pub use policy::{NullPolicy, create_implementor};
pub use scalar::{CallImplementor, NotNullImplementor};
pub use table::{INSTANCE, ImpTable};
pub use translator::{AlwaysNull, InputSource, LowerError, LowerResult, Translator, convert};
pub use window::{
    SeekType, StrictWin, StrictWinAggImplementor, WinAggAddContext, WinAggFactory, WinAggFrame,
    WinAggImplementor, WinAggResultContext,
};
