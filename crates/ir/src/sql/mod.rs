mod operators;

pub use operators::{Aggregation, SqlOperator};
use serde::{Deserialize, Serialize};
use skiffsql_core::types::{SqlType, Value};

/// The operator of a call: a built-in, or a user-defined function resolved
/// by name against the registry it was registered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlOp {
    Std(SqlOperator),
    Udf(String),
}

impl From<SqlOperator> for SqlOp {
    fn from(op: SqlOperator) -> Self {
        SqlOp::Std(op)
    }
}

impl SqlOp {
    pub fn name(&self) -> String {
        match self {
            SqlOp::Std(op) => format!("{:?}", op),
            SqlOp::Udf(name) => name.clone(),
        }
    }
}

/// A relational scalar expression: what the lowering table consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlExpr {
    Literal { value: Value, ty: SqlType },
    ColumnRef { index: usize, ty: SqlType },
    Call(SqlCall),
}

/// An operator applied to operands, with the planner-assigned result type.
/// Operands may be nullable independently of the result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlCall {
    pub op: SqlOp,
    pub operands: Vec<SqlExpr>,
    pub ty: SqlType,
}

impl SqlExpr {
    pub fn literal(value: Value, ty: SqlType) -> Self {
        SqlExpr::Literal { value, ty }
    }

    pub fn null_literal(ty: SqlType) -> Self {
        SqlExpr::Literal {
            value: Value::Null,
            ty: ty.with_nullable(true),
        }
    }

    pub fn column(index: usize, ty: SqlType) -> Self {
        SqlExpr::ColumnRef { index, ty }
    }

    pub fn call(op: impl Into<SqlOp>, operands: Vec<SqlExpr>, ty: SqlType) -> Self {
        SqlExpr::Call(SqlCall {
            op: op.into(),
            operands,
            ty,
        })
    }

    pub fn ty(&self) -> &SqlType {
        match self {
            SqlExpr::Literal { ty, .. } => ty,
            SqlExpr::ColumnRef { ty, .. } => ty,
            SqlExpr::Call(call) => &call.ty,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, SqlExpr::Literal { value, .. } if value.is_null())
    }
}

/// Which side TRIM strips. The flag rides as a constant first operand of the
/// TRIM call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimSpan {
    Both,
    Leading,
    Trailing,
}

impl TrimSpan {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimSpan::Both => "BOTH",
            TrimSpan::Leading => "LEADING",
            TrimSpan::Trailing => "TRAILING",
        }
    }

    pub fn flag(&self) -> SqlExpr {
        SqlExpr::literal(Value::string(self.as_str()), SqlType::varchar())
    }
}

/// Casts `node` to `target` unless the kinds already match. With
/// `match_nullability` false the result keeps the operand's nullability.
pub fn ensure_type(target: &SqlType, node: SqlExpr, match_nullability: bool) -> SqlExpr {
    let node_ty = node.ty().clone();
    if node_ty.kind == target.kind
        && (!match_nullability || node_ty.nullable == target.nullable)
    {
        return node;
    }
    let nullable = if match_nullability {
        target.nullable
    } else {
        node_ty.nullable
    };
    let ty = target.with_nullable(nullable);
    SqlExpr::call(SqlOperator::Cast, vec![node], ty)
}
