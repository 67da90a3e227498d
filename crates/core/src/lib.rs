//! Core types and error handling for SkiffSQL.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![allow(missing_docs)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{SqlType, TypeKind, Value};
