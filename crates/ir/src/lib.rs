//! Expression trees for SkiffSQL: the relational scalar nodes that lowering
//! consumes and the executable expression tree (IET) it produces.

pub mod code;
pub mod sql;

pub use code::{
    BinOp, BlockBuilder, BlockStack, Builtin, Class, Expr, Flavor, MethodRef, ParamExpr, ParamRef,
    Primitive, Type, UdfMethod, UnaryOp, optimize, optimize2,
};
pub use sql::{Aggregation, SqlCall, SqlExpr, SqlOp, SqlOperator, TrimSpan, ensure_type};
