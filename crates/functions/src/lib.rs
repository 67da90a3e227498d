//! Runtime scalar helper library for SkiffSQL: the functions generated
//! expression trees call by symbol.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![allow(missing_docs)]

pub mod collection;
pub mod compare;
pub mod datetime;
pub mod scalar;

pub use datetime::EvalRoot;
use skiffsql_core::types::Value;
use skiffsql_core::{Error, Result};
use skiffsql_ir::code::Builtin;

/// Dispatches a built-in method symbol to its implementation. The window
/// frame symbols are resolved by the execution engine, not here.
pub fn invoke(
    builtin: Builtin,
    target: Option<&Value>,
    args: &[Value],
    root: &EvalRoot,
) -> Result<Value> {
    match builtin {
        Builtin::Upper => scalar::upper(&args[0]),
        Builtin::Lower => scalar::lower(&args[0]),
        Builtin::InitCap => scalar::initcap(&args[0]),
        Builtin::Substring => scalar::substring(&args[0], &args[1], args.get(2)),
        Builtin::CharLength => scalar::char_length(&args[0]),
        Builtin::Concat => scalar::concat(args),
        Builtin::Overlay => scalar::overlay(&args[0], &args[1], &args[2], args.get(3)),
        Builtin::Position => scalar::position(&args[0], &args[1]),
        Builtin::Trim => scalar::trim(&args[0], &args[1], &args[2], &args[3]),
        Builtin::Like => scalar::like(&args[0], &args[1]),
        Builtin::Similar => scalar::similar(&args[0], &args[1]),

        Builtin::Mod => scalar::modulo(&args[0], &args[1]),
        Builtin::Exp => scalar::exp(&args[0]),
        Builtin::Power => scalar::power(&args[0], &args[1]),
        Builtin::Ln => scalar::ln(&args[0]),
        Builtin::Log10 => scalar::log10(&args[0]),
        Builtin::Abs => scalar::abs(&args[0]),
        Builtin::Ceil => scalar::ceil(&args[0]),
        Builtin::Floor => scalar::floor(&args[0]),

        Builtin::CollectionSize => collection::collection_size(&args[0]),
        Builtin::Element => collection::element(&args[0]),
        Builtin::Slice => collection::slice(&args[0]),
        Builtin::ArrayItem => collection::array_item(&args[0], &args[1]),
        Builtin::MapItem => collection::map_item(&args[0], &args[1]),
        Builtin::AnyItem => collection::any_item(&args[0], &args[1]),
        Builtin::ArrayValue => Ok(Value::array(args.to_vec())),
        Builtin::MapValue => collection::map_value(args),

        Builtin::Lt => compare::lt(&args[0], &args[1]),
        Builtin::Le => compare::le(&args[0], &args[1]),
        Builtin::Gt => compare::gt(&args[0], &args[1]),
        Builtin::Ge => compare::ge(&args[0], &args[1]),
        Builtin::Eq => compare::eq(&args[0], &args[1]),
        Builtin::Ne => compare::ne(&args[0], &args[1]),
        Builtin::Plus => scalar::plus(&args[0], &args[1]),
        Builtin::Minus => scalar::minus(&args[0], &args[1]),
        Builtin::Multiply => scalar::multiply(&args[0], &args[1]),
        Builtin::Divide => scalar::divide(&args[0], &args[1]),

        Builtin::IsTrue => Ok(Value::bool_val(args[0].as_bool().unwrap_or(false))),
        Builtin::IsNotFalse => Ok(Value::bool_val(args[0].as_bool().unwrap_or(true))),

        Builtin::Lesser => compare::lesser(&args[0], &args[1]),
        Builtin::Greater => compare::greater(&args[0], &args[1]),
        Builtin::DecimalAdd => {
            let target = target
                .ok_or_else(|| Error::internal("decimal add requires a receiver"))?;
            scalar::decimal_add(target, &args[0])
        }

        Builtin::CurrentTimestamp | Builtin::LocalTimestamp => {
            Ok(datetime::current_timestamp(root))
        }
        Builtin::CurrentTime | Builtin::LocalTime => Ok(datetime::current_time(root)),
        Builtin::CurrentDate => Ok(datetime::current_date(root)),
        Builtin::ExtractDate => datetime::extract_date(&args[0], &args[1]),

        Builtin::CompareRows | Builtin::PartitionRow => Err(Error::internal(format!(
            "{} must be resolved by the execution engine",
            builtin.name()
        ))),
    }
}
