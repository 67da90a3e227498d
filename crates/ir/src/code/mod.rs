mod builder;
mod expr;
mod method;
mod optimize;

pub use builder::{BlockBuilder, BlockStack};
pub use expr::{
    BOXED_FALSE_EXPR, BOXED_TRUE_EXPR, BinOp, Class, Expr, FALSE_EXPR, Flavor, NULL_EXPR,
    ParamExpr, ParamRef, Primitive, TRUE_EXPR, Type, UnaryOp,
};
pub use method::{Builtin, MethodRef, UdfMethod};
pub use optimize::{optimize, optimize2};
