use std::fmt;

use serde::{Deserialize, Serialize};

/// The name of a SQL type, without nullability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Boolean,
    Int,
    Bigint,
    Decimal(Option<(u8, u8)>),
    Double,
    Varchar,
    Date,
    Time,
    Timestamp,
    Interval,
    Array(Box<TypeKind>),
    Map(Box<TypeKind>, Box<TypeKind>),
    Any,
}

impl TypeKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeKind::Int | TypeKind::Bigint | TypeKind::Decimal(_) | TypeKind::Double
        )
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, TypeKind::Date | TypeKind::Time | TypeKind::Timestamp)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Boolean => write!(f, "BOOLEAN"),
            TypeKind::Int => write!(f, "INT"),
            TypeKind::Bigint => write!(f, "BIGINT"),
            TypeKind::Decimal(None) => write!(f, "DECIMAL"),
            TypeKind::Decimal(Some((p, s))) => write!(f, "DECIMAL({}, {})", p, s),
            TypeKind::Double => write!(f, "DOUBLE"),
            TypeKind::Varchar => write!(f, "VARCHAR"),
            TypeKind::Date => write!(f, "DATE"),
            TypeKind::Time => write!(f, "TIME"),
            TypeKind::Timestamp => write!(f, "TIMESTAMP"),
            TypeKind::Interval => write!(f, "INTERVAL"),
            TypeKind::Array(elem) => write!(f, "ARRAY<{}>", elem),
            TypeKind::Map(k, v) => write!(f, "MAP<{}, {}>", k, v),
            TypeKind::Any => write!(f, "ANY"),
        }
    }
}

/// A SQL type together with its nullability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlType {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl SqlType {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn nullable(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    pub fn with_nullable(&self, nullable: bool) -> Self {
        Self {
            kind: self.kind.clone(),
            nullable,
        }
    }

    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    pub fn int() -> Self {
        Self::new(TypeKind::Int)
    }

    pub fn bigint() -> Self {
        Self::new(TypeKind::Bigint)
    }

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::new(TypeKind::Decimal(Some((precision, scale))))
    }

    pub fn double() -> Self {
        Self::new(TypeKind::Double)
    }

    pub fn varchar() -> Self {
        Self::new(TypeKind::Varchar)
    }

    pub fn date() -> Self {
        Self::new(TypeKind::Date)
    }

    pub fn time() -> Self {
        Self::new(TypeKind::Time)
    }

    pub fn timestamp() -> Self {
        Self::new(TypeKind::Timestamp)
    }

    pub fn interval() -> Self {
        Self::new(TypeKind::Interval)
    }

    pub fn array(elem: TypeKind) -> Self {
        Self::new(TypeKind::Array(Box::new(elem)))
    }

    pub fn map(key: TypeKind, value: TypeKind) -> Self {
        Self::new(TypeKind::Map(Box::new(key), Box::new(value)))
    }

    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} NOT NULL", self.kind)
        }
    }
}
