//! The argument pipeline.
//!
//! A [`Pipeline`] is an ordered list of entries attached to one callable:
//! per-parameter [`Normalizer`]s and whole-set [`Guard`]s. Calls bind their
//! arguments through the callable's [`Signature`] and then run every entry
//! in attachment order, so a guard always sees the values normalized by the
//! entries before it.
//!
//! Pipelines are assembled with a [`PipelineBuilder`] and are immutable once
//! built. Attaching another layer to a wrapped callable goes back through
//! [`Pipeline::into_builder`], so layers accumulate in one pipeline instead
//! of nesting wrappers.

mod builder;
mod guard;
mod wrapped;

use std::fmt;

use crate::core::args::{Args, Kwargs};
use crate::core::signature::Signature;
use crate::errors::ArgError;
use crate::normalize::Normalizer;

pub use builder::{AvailabilityOptions, ImplicitNormalizers, Layer, PipelineBuilder};
pub use guard::Guard;
pub use wrapped::Wrapped;

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Normalize(Normalizer),
    Guard(Guard),
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Normalize(normalizer) => write!(f, "normalize {}", normalizer),
            Entry::Guard(guard) => write!(
                f,
                "guard over ({}), {} combinations",
                guard.table().keys().join(", "),
                guard.table().len()
            ),
        }
    }
}

/// An immutable, built pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    signature: Signature,
    entries: Vec<Entry>,
}

impl Pipeline {
    pub(crate) fn new(signature: Signature, entries: Vec<Entry>) -> Self {
        Pipeline { signature, entries }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Normalizers attached for `name`, in attachment order.
    pub fn normalizers_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Normalizer> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Normalize(n) if n.name() == name => Some(n),
            _ => None,
        })
    }

    /// Run every entry over already bound arguments.
    ///
    /// Normalizers whose parameter is absent are skipped.
    pub fn apply(&self, mut kwargs: Kwargs) -> Result<Kwargs, ArgError> {
        for entry in &self.entries {
            match entry {
                Entry::Normalize(normalizer) => {
                    let Some(raw) = kwargs.get(normalizer.name()) else {
                        continue;
                    };
                    let normalized = normalizer.apply(raw)?;
                    kwargs.insert(normalizer.name(), normalized);
                }
                Entry::Guard(guard) => guard.check(&kwargs)?,
            }
        }
        Ok(kwargs)
    }

    /// Bind call arguments and run the pipeline.
    pub fn call(&self, args: Args) -> Result<Kwargs, ArgError> {
        let kwargs = self.signature.bind(args)?;
        tracing::debug!("bound {} arguments", kwargs.len());
        self.apply(kwargs)
    }

    /// Reopen the pipeline to attach more layers.
    pub fn into_builder(self) -> PipelineBuilder {
        PipelineBuilder::from_parts(self.signature, self.entries)
    }

    /// Wrap a callable that receives the normalized arguments.
    pub fn wrap<F, R>(self, func: F) -> Wrapped<F>
    where
        F: Fn(Kwargs) -> R,
    {
        Wrapped::new(self, func)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, entry)?;
        }
        Ok(())
    }
}
