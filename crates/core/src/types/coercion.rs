use crate::types::{SqlType, TypeKind};

/// Returns `ty` with the requested nullability.
pub fn nullify(ty: &SqlType, nullable: bool) -> SqlType {
    ty.with_nullable(nullable)
}

/// Computes the least-restrictive common type of `types`, or `None` when the
/// operands have no common type (e.g. interval and integer).
///
/// The result is nullable iff any input is nullable.
pub fn least_restrictive(types: &[SqlType]) -> Option<SqlType> {
    let mut iter = types.iter();
    let first = iter.next()?;
    let mut kind = first.kind.clone();
    let mut nullable = first.nullable;
    for ty in iter {
        kind = least_restrictive_kind(&kind, &ty.kind)?;
        nullable = nullable || ty.nullable;
    }
    Some(SqlType { kind, nullable })
}

fn numeric_rank(kind: &TypeKind) -> Option<u8> {
    match kind {
        TypeKind::Int => Some(1),
        TypeKind::Bigint => Some(2),
        TypeKind::Decimal(_) => Some(3),
        TypeKind::Double => Some(4),
        _ => None,
    }
}

fn least_restrictive_kind(a: &TypeKind, b: &TypeKind) -> Option<TypeKind> {
    if a == b {
        return Some(a.clone());
    }
    if let (Some(ra), Some(rb)) = (numeric_rank(a), numeric_rank(b)) {
        // DECIMAL precisions merge so that both integral and fractional
        // digits of either operand fit.
        if let (TypeKind::Decimal(pa), TypeKind::Decimal(pb)) = (a, b) {
            return Some(TypeKind::Decimal(merge_decimal(*pa, *pb)));
        }
        return Some(if ra >= rb { a.clone() } else { b.clone() });
    }
    match (a, b) {
        (TypeKind::Any, other) | (other, TypeKind::Any) => Some(other.clone()),
        (TypeKind::Date, TypeKind::Timestamp) | (TypeKind::Timestamp, TypeKind::Date) => {
            Some(TypeKind::Timestamp)
        }
        (TypeKind::Array(ea), TypeKind::Array(eb)) => {
            least_restrictive_kind(ea, eb).map(|e| TypeKind::Array(Box::new(e)))
        }
        _ => None,
    }
}

fn merge_decimal(a: Option<(u8, u8)>, b: Option<(u8, u8)>) -> Option<(u8, u8)> {
    match (a, b) {
        (Some((pa, sa)), Some((pb, sb))) => {
            let scale = sa.max(sb);
            let integral = (pa - sa).max(pb - sb);
            Some(((integral + scale).min(38), scale))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ladder_promotes_upward() {
        let t = least_restrictive(&[SqlType::int(), SqlType::bigint()]).unwrap();
        assert_eq!(t.kind, TypeKind::Bigint);
        let t = least_restrictive(&[SqlType::bigint(), SqlType::double()]).unwrap();
        assert_eq!(t.kind, TypeKind::Double);
    }

    #[test]
    fn nullability_is_unioned() {
        let t = least_restrictive(&[SqlType::int(), SqlType::nullable(TypeKind::Bigint)]).unwrap();
        assert!(t.nullable);
        let t = least_restrictive(&[SqlType::int(), SqlType::bigint()]).unwrap();
        assert!(!t.nullable);
    }

    #[test]
    fn asymmetric_operands_have_no_common_type() {
        assert!(least_restrictive(&[SqlType::interval(), SqlType::int()]).is_none());
        assert!(least_restrictive(&[SqlType::varchar(), SqlType::int()]).is_none());
    }

    #[test]
    fn decimal_precisions_merge() {
        let t = least_restrictive(&[SqlType::decimal(10, 2), SqlType::decimal(8, 4)]).unwrap();
        assert_eq!(t.kind, TypeKind::Decimal(Some((12, 4))));
    }

    #[test]
    fn arrays_unify_elementwise() {
        let t = least_restrictive(&[
            SqlType::array(TypeKind::Int),
            SqlType::array(TypeKind::Bigint),
        ])
        .unwrap();
        assert_eq!(t.kind, TypeKind::Array(Box::new(TypeKind::Bigint)));
    }
}
