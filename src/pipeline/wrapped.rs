//! Callables wrapped with a pipeline.

use crate::availability::Availability;
use crate::core::args::{Args, Kwargs};
use crate::core::signature::Signature;
use crate::errors::ArgError;
use crate::normalize::NormalizerSpec;
use crate::pipeline::{AvailabilityOptions, Layer, Pipeline, PipelineBuilder};

/// A callable together with the pipeline that guards it.
///
/// The callable only ever sees bound, normalized, keyword-only arguments.
/// Adding a layer consumes the wrapper and extends its pipeline; the
/// callable is never wrapped twice.
#[derive(Debug, Clone)]
pub struct Wrapped<F> {
    pipeline: Pipeline,
    func: F,
}

impl<F, R> Wrapped<F>
where
    F: Fn(Kwargs) -> R,
{
    pub(crate) fn new(pipeline: Pipeline, func: F) -> Self {
        Wrapped { pipeline, func }
    }

    /// Wrap `func` with a single layer.
    pub fn with_layer(
        signature: Signature,
        layer: impl Into<Layer>,
        func: F,
    ) -> Result<Self, ArgError> {
        let pipeline = PipelineBuilder::new(signature)?.layer(layer)?.build();
        Ok(Wrapped::new(pipeline, func))
    }

    /// Call through the pipeline. The callable runs only if every entry
    /// passes.
    pub fn call(&self, args: Args) -> Result<R, ArgError> {
        let kwargs = self.pipeline.call(args)?;
        Ok((self.func)(kwargs))
    }

    /// Extend the pipeline with another layer.
    pub fn layer(self, layer: impl Into<Layer>) -> Result<Self, ArgError> {
        let Wrapped { pipeline, func } = self;
        let pipeline = pipeline.into_builder().layer(layer)?.build();
        Ok(Wrapped { pipeline, func })
    }

    pub fn normalize(self, spec: NormalizerSpec) -> Result<Self, ArgError> {
        self.layer(spec)
    }

    pub fn availability(self, table: Availability) -> Result<Self, ArgError> {
        self.layer(table)
    }

    pub fn availability_with(
        self,
        table: Availability,
        options: AvailabilityOptions,
    ) -> Result<Self, ArgError> {
        self.layer(Layer::Availability(table, options))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signature::Param;
    use crate::core::value::Value;
    use crate::normalize::{normalize, ValueType};
    use crate::test_support::fixtures;

    fn forecast_signature() -> Signature {
        Signature::new([
            Param::required("level"),
            Param::required("param"),
            Param::optional("step", 24),
        ])
    }

    #[test]
    fn test_layers_accumulate_in_one_pipeline() {
        let wrapped = Wrapped::with_layer(
            forecast_signature(),
            normalize("step").multiple(),
            |kwargs: Kwargs| kwargs,
        )
        .unwrap()
        .normalize(normalize("level").of_type(ValueType::Int))
        .unwrap();

        assert_eq!(wrapped.pipeline().entries().len(), 2);

        let kwargs = wrapped
            .call(Args::new().arg("500").arg("Z"))
            .unwrap();
        assert_eq!(kwargs.int("level"), Some(500));
        assert_eq!(kwargs.list("step"), Some(&[Value::from(24)][..]));
    }

    #[test]
    fn test_callable_not_invoked_on_failure() {
        use std::cell::Cell;

        let calls = Cell::new(0);
        let wrapped = Wrapped::with_layer(
            forecast_signature(),
            fixtures::forecast_table(),
            |_kwargs: Kwargs| calls.set(calls.get() + 1),
        )
        .unwrap();

        assert!(wrapped.call(Args::new().arg(500).arg("Z").arg(36)).is_ok());
        assert!(wrapped.call(Args::new().arg(1000).arg("Z").arg(36)).is_err());
        assert!(wrapped.call(Args::new().arg(500)).is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_concurrent_calls() {
        let wrapped = Wrapped::with_layer(
            forecast_signature(),
            fixtures::forecast_table(),
            |kwargs: Kwargs| kwargs.int("step"),
        )
        .unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let wrapped = &wrapped;
                    scope.spawn(move || {
                        let step = if i % 2 == 0 { 24 } else { 36 };
                        wrapped.call(Args::new().arg(500).arg("Z").arg(step))
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let expected = if i % 2 == 0 { 24 } else { 36 };
                assert_eq!(handle.join().unwrap().unwrap(), Some(expected));
            }
        });
    }
}
