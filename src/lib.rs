//! normargs - argument validation and normalization pipelines
//!
//! This crate wraps callables so that every call has its arguments bound to
//! declared parameters, normalized one by one (aliases, value sets, type
//! coercion, multiplicity), and checked as a whole against a table of legal
//! combinations.
//!
//! ```rust,ignore
//! use normargs::{normalize, Args, Availability, PipelineBuilder, Signature, ValueType};
//!
//! let table = Availability::from_path("forecast.json")?;
//! let retrieve = PipelineBuilder::new(Signature::of(&["level", "param", "step"]))?
//!     .normalize(normalize("level").of_type(ValueType::Int))?
//!     .availability(table)?
//!     .build()
//!     .wrap(|kwargs| kwargs);
//!
//! let kwargs = retrieve.call(Args::new().arg("500").arg("z").arg(24))?;
//! ```

pub mod availability;
pub mod core;
pub mod errors;
pub mod normalize;
pub mod pipeline;
pub mod util;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use availability::{Availability, NoMatch};
pub use core::{Args, Kwargs, Param, ParamKind, Record, Signature, Value};
pub use errors::{ArgError, BindError, Expected};
pub use normalize::{normalize, Multiplicity, Normalizer, NormalizerSpec, ValueType};
pub use pipeline::{
    AvailabilityOptions, Entry, Guard, ImplicitNormalizers, Layer, Pipeline, PipelineBuilder,
    Wrapped,
};
pub use util::context::GlobalContext;
