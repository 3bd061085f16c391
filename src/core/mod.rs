//! Core data structures for normargs.
//!
//! This module contains the foundational types used throughout the pipeline:
//! - Dynamic argument values
//! - Raw call arguments and the canonical keyword mapping
//! - Parameter declarations and argument binding
//! - Combination records for availability data

pub mod args;
pub mod record;
pub mod signature;
pub mod value;

pub use args::{Args, Kwargs};
pub use record::Record;
pub use signature::{Param, ParamKind, Signature};
pub use value::Value;
