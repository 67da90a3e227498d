//! SkiffSQL - SQL operator lowering over an executable expression tree.

pub use skiffsql_codegen::{INSTANCE, ImpTable, NullAs, Translator};
pub use skiffsql_core::error::{Error, Result};
pub use skiffsql_core::types::{SqlType, TypeKind, Value};
pub use skiffsql_executor::{Aggregator, Evaluator, WindowExec};
pub use skiffsql_functions::EvalRoot;
pub use skiffsql_ir::sql::{Aggregation, SqlExpr, SqlOperator};
