use serde::{Deserialize, Serialize};

/// Built-in SQL scalar operators and functions known to the lowering table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlOperator {
    // strings
    Upper,
    Lower,
    InitCap,
    Substring,
    CharLength,
    CharacterLength,
    Concat,
    Overlay,
    Position,
    Trim,

    // logical
    And,
    Or,
    Not,

    // comparisons
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equals,
    NotEquals,

    // arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    DivideInteger,
    UnaryMinus,
    UnaryPlus,
    Mod,
    Exp,
    Power,
    Ln,
    Log10,
    Abs,
    Ceil,
    Floor,

    // datetime
    DatetimePlus,
    ExtractDate,

    // IS predicates
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,

    // pattern matching
    Like,
    NotLike,
    SimilarTo,
    NotSimilarTo,

    // collections
    Cardinality,
    Slice,
    Element,
    Item,
    ArrayValueConstructor,
    MapValueConstructor,

    // special forms
    Case,
    Cast,
    Reinterpret,

    // system functions
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
}

/// Aggregation symbols, usable in GROUP BY or OVER context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Count,
    Sum,
    Sum0,
    Min,
    Max,
    SingleValue,
    Rank,
    DenseRank,
    RowNumber,
    FirstValue,
    LastValue,
    Lead,
    Lag,
    Ntile,
    /// A user-defined aggregate, resolved by name against the registry.
    Udaf(String),
}

impl Aggregation {
    pub fn name(&self) -> &str {
        match self {
            Aggregation::Count => "COUNT",
            Aggregation::Sum => "SUM",
            Aggregation::Sum0 => "$SUM0",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::SingleValue => "SINGLE_VALUE",
            Aggregation::Rank => "RANK",
            Aggregation::DenseRank => "DENSE_RANK",
            Aggregation::RowNumber => "ROW_NUMBER",
            Aggregation::FirstValue => "FIRST_VALUE",
            Aggregation::LastValue => "LAST_VALUE",
            Aggregation::Lead => "LEAD",
            Aggregation::Lag => "LAG",
            Aggregation::Ntile => "NTILE",
            Aggregation::Udaf(name) => name,
        }
    }
}
