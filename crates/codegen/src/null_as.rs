use skiffsql_ir::code::{Builtin, Expr, FALSE_EXPR, Flavor, NULL_EXPR, Primitive, TRUE_EXPR, Type};

/// The caller's statement of how the surrounding context consumes the value
/// of a lowered call when an operand turns out to be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullAs {
    /// Default three-valued behavior: yield the value, possibly null.
    Null,
    /// Replace a null result with false. Example: a WHERE predicate.
    False,
    /// Replace a null result with true.
    True,
    /// Operands are proved non-null; emit unboxed primitive code.
    NotPossible,
    /// Yield the boolean `x IS NULL` instead of the value.
    IsNull,
    /// Yield the boolean `x IS NOT NULL` instead of the value.
    IsNotNull,
}

impl NullAs {
    pub fn of(nullable: bool) -> NullAs {
        if nullable { NullAs::Null } else { NullAs::NotPossible }
    }

    /// Adapts an expression with a "normal" result to one that adheres to
    /// this demand, using the primitive/boxed/object flavor of its type.
    pub fn handle(&self, x: Expr) -> Expr {
        match x.type_of().flavor() {
            // A primitive can never be null; runtime checks collapse.
            Flavor::Primitive => match self {
                NullAs::Null | NullAs::NotPossible | NullAs::False | NullAs::True => x,
                NullAs::IsNull => FALSE_EXPR.clone(),
                NullAs::IsNotNull => TRUE_EXPR.clone(),
            },
            Flavor::Box if *self == NullAs::NotPossible => x.unboxed(),
            _ => match self {
                NullAs::Null | NullAs::NotPossible => x,
                NullAs::False => Expr::call(
                    None,
                    Builtin::IsTrue,
                    vec![x],
                    Type::Primitive(Primitive::Bool),
                ),
                NullAs::True => Expr::call(
                    None,
                    Builtin::IsNotFalse,
                    vec![x],
                    Type::Primitive(Primitive::Bool),
                ),
                NullAs::IsNull => Expr::equal(x, NULL_EXPR.clone()),
                NullAs::IsNotNull => Expr::not_equal(x, NULL_EXPR.clone()),
            },
        }
    }
}
