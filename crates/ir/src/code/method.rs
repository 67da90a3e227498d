use skiffsql_core::Result;
use skiffsql_core::types::Value;

use crate::code::expr::Type;

/// Symbols of the runtime helper library that generated code calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // strings
    Upper,
    Lower,
    InitCap,
    Substring,
    CharLength,
    Concat,
    Overlay,
    Position,
    Trim,
    Like,
    Similar,

    // math
    Mod,
    Exp,
    Power,
    Ln,
    Log10,
    Abs,
    Ceil,
    Floor,

    // collections
    CollectionSize,
    Element,
    Slice,
    ArrayItem,
    MapItem,
    AnyItem,
    ArrayValue,
    MapValue,

    // comparison and arithmetic backups for non-primitive operands
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Plus,
    Minus,
    Multiply,
    Divide,

    // three-valued boolean adapters
    IsTrue,
    IsNotFalse,

    // aggregate helpers
    Lesser,
    Greater,
    /// Instance method on a decimal receiver.
    DecimalAdd,

    // context-taking datetime functions
    CurrentTimestamp,
    CurrentTime,
    CurrentDate,
    LocalTimestamp,
    LocalTime,
    ExtractDate,

    // window frame access, resolved by the execution engine
    CompareRows,
    PartitionRow,
}

impl Builtin {
    /// Instance methods bind their first operand as the receiver.
    pub fn is_instance_method(&self) -> bool {
        matches!(self, Builtin::DecimalAdd)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Upper => "upper",
            Builtin::Lower => "lower",
            Builtin::InitCap => "initcap",
            Builtin::Substring => "substring",
            Builtin::CharLength => "char_length",
            Builtin::Concat => "concat",
            Builtin::Overlay => "overlay",
            Builtin::Position => "position",
            Builtin::Trim => "trim",
            Builtin::Like => "like",
            Builtin::Similar => "similar",
            Builtin::Mod => "mod",
            Builtin::Exp => "exp",
            Builtin::Power => "power",
            Builtin::Ln => "ln",
            Builtin::Log10 => "log10",
            Builtin::Abs => "abs",
            Builtin::Ceil => "ceil",
            Builtin::Floor => "floor",
            Builtin::CollectionSize => "collection_size",
            Builtin::Element => "element",
            Builtin::Slice => "slice",
            Builtin::ArrayItem => "array_item",
            Builtin::MapItem => "map_item",
            Builtin::AnyItem => "any_item",
            Builtin::ArrayValue => "array_value",
            Builtin::MapValue => "map_value",
            Builtin::Lt => "lt",
            Builtin::Le => "le",
            Builtin::Gt => "gt",
            Builtin::Ge => "ge",
            Builtin::Eq => "eq",
            Builtin::Ne => "ne",
            Builtin::Plus => "plus",
            Builtin::Minus => "minus",
            Builtin::Multiply => "multiply",
            Builtin::Divide => "divide",
            Builtin::IsTrue => "is_true",
            Builtin::IsNotFalse => "is_not_false",
            Builtin::Lesser => "lesser",
            Builtin::Greater => "greater",
            Builtin::DecimalAdd => "add",
            Builtin::CurrentTimestamp => "current_timestamp",
            Builtin::CurrentTime => "current_time",
            Builtin::CurrentDate => "current_date",
            Builtin::LocalTimestamp => "local_timestamp",
            Builtin::LocalTime => "local_time",
            Builtin::ExtractDate => "extract_date",
            Builtin::CompareRows => "compare_rows",
            Builtin::PartitionRow => "partition_row",
        }
    }
}

/// A user-registered runtime function, callable from generated code.
#[derive(Clone)]
pub struct UdfMethod {
    pub name: String,
    pub ret: Type,
    pub func: fn(&[Value]) -> Result<Value>,
}

impl UdfMethod {
    pub fn new(name: impl Into<String>, ret: Type, func: fn(&[Value]) -> Result<Value>) -> Self {
        Self {
            name: name.into(),
            ret,
            func,
        }
    }
}

impl std::fmt::Debug for UdfMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdfMethod")
            .field("name", &self.name)
            .field("ret", &self.ret)
            .finish()
    }
}

impl PartialEq for UdfMethod {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ret == other.ret
    }
}

/// A method symbol in a call expression: built-in or user-defined.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodRef {
    Builtin(Builtin),
    Udf(UdfMethod),
}

impl MethodRef {
    pub fn name(&self) -> &str {
        match self {
            MethodRef::Builtin(b) => b.name(),
            MethodRef::Udf(udf) => &udf.name,
        }
    }
}

impl From<Builtin> for MethodRef {
    fn from(b: Builtin) -> Self {
        MethodRef::Builtin(b)
    }
}

impl From<UdfMethod> for MethodRef {
    fn from(m: UdfMethod) -> Self {
        MethodRef::Udf(m)
    }
}
