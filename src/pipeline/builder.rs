//! Pipeline assembly.
//!
//! The builder is threaded by value through every attachment and finalized
//! into an immutable [`Pipeline`]. Each attachment validates itself against
//! what is already attached, so a misconfigured stack fails when it is
//! built, not on the first call.

use serde::{Deserialize, Serialize};

use crate::availability::Availability;
use crate::core::signature::Signature;
use crate::core::value::Value;
use crate::errors::ArgError;
use crate::normalize::{Normalizer, NormalizerSpec};
use crate::pipeline::{Entry, Guard, Pipeline};
use crate::util::config::Config;

/// Whether availability layers after the first add implicit normalizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImplicitNormalizers {
    /// Every availability layer adds them.
    #[default]
    Always,
    /// Only the first availability layer adds them.
    FirstOnly,
}

impl ImplicitNormalizers {
    pub fn from_config(config: &Config) -> Self {
        config.implicit_normalizers()
    }
}

/// Options for attaching an availability layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityOptions {
    pub implicit: ImplicitNormalizers,
}

impl AvailabilityOptions {
    pub fn from_config(config: &Config) -> Self {
        AvailabilityOptions {
            implicit: ImplicitNormalizers::from_config(config),
        }
    }
}

/// One attachable layer.
#[derive(Debug, Clone)]
pub enum Layer {
    Normalize(NormalizerSpec),
    Availability(Availability, AvailabilityOptions),
}

impl From<NormalizerSpec> for Layer {
    fn from(spec: NormalizerSpec) -> Self {
        Layer::Normalize(spec)
    }
}

impl From<Availability> for Layer {
    fn from(table: Availability) -> Self {
        Layer::Availability(table, AvailabilityOptions::default())
    }
}

/// Accumulates pipeline entries for one signature.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    signature: Signature,
    entries: Vec<Entry>,
}

impl PipelineBuilder {
    /// Start a pipeline. Fails if the signature cannot be wrapped.
    pub fn new(signature: Signature) -> Result<Self, ArgError> {
        signature.validate()?;
        Ok(PipelineBuilder {
            signature,
            entries: Vec::new(),
        })
    }

    pub(crate) fn from_parts(signature: Signature, entries: Vec<Entry>) -> Self {
        PipelineBuilder { signature, entries }
    }

    /// Attach any layer.
    pub fn layer(self, layer: impl Into<Layer>) -> Result<Self, ArgError> {
        match layer.into() {
            Layer::Normalize(spec) => self.normalize(spec),
            Layer::Availability(table, options) => self.availability_with(table, options),
        }
    }

    /// Attach a normalizer.
    pub fn normalize(mut self, spec: NormalizerSpec) -> Result<Self, ArgError> {
        let normalizer = spec.build()?;

        if !self.signature.accepts(normalizer.name()) {
            return Err(ArgError::configuration(
                normalizer.name(),
                "the callable declares no such parameter",
            ));
        }

        for existing in self.normalizers(normalizer.name()) {
            existing.check_compatible(&normalizer)?;
        }
        self.check_guard_values(&normalizer)?;

        tracing::debug!("attaching normalizer {}", normalizer);
        self.entries.push(Entry::Normalize(normalizer));
        Ok(self)
    }

    /// Attach an availability layer with default options.
    pub fn availability(self, table: Availability) -> Result<Self, ArgError> {
        self.availability_with(table, AvailabilityOptions::default())
    }

    /// Attach an availability layer.
    ///
    /// Keys without an explicit normalizer get an implicit value-set one
    /// (subject to `options.implicit` after the first layer), explicit
    /// any-mode normalizers are narrowed to the table's values, and the
    /// table's records are normalized through everything attached for their
    /// key before the guard is pushed.
    pub fn availability_with(
        mut self,
        table: Availability,
        options: AvailabilityOptions,
    ) -> Result<Self, ArgError> {
        let first = !self
            .entries
            .iter()
            .any(|entry| matches!(entry, Entry::Guard(_)));
        let add_implicit = first || options.implicit == ImplicitNormalizers::Always;

        for key in table.keys() {
            let values = table.values_of(key).unwrap_or_default();

            let mut explicit = false;
            for entry in &mut self.entries {
                if let Entry::Normalize(normalizer) = entry {
                    if normalizer.name() != key.as_str() || normalizer.is_implicit() {
                        continue;
                    }
                    explicit = true;
                    if normalizer.refine(&values) {
                        tracing::debug!("narrowed `{}` to the values of its availability", key);
                    }
                }
            }

            if explicit || !add_implicit {
                continue;
            }

            let implicit = Normalizer::implicit(key, values);
            for existing in self.normalizers(key) {
                existing.check_compatible(&implicit)?;
            }
            tracing::debug!("attaching normalizer {}", implicit);
            self.entries.push(Entry::Normalize(implicit));
        }

        let table = table.normalized_with(|key, value| self.normalize_record_value(key, value))?;

        tracing::debug!(
            "attaching guard over ({}) with {} combinations",
            table.keys().join(", "),
            table.len()
        );
        self.entries.push(Entry::Guard(Guard::new(table)));
        Ok(self)
    }

    /// A normalizer attached after a guard must keep the guard's values as
    /// they are, otherwise the callable receives values the table spells
    /// differently.
    fn check_guard_values(&self, normalizer: &Normalizer) -> Result<(), ArgError> {
        let key = normalizer.name();
        for entry in &self.entries {
            let Entry::Guard(guard) = entry else {
                continue;
            };
            for value in guard.table().values_of(key).unwrap_or_default() {
                match normalizer.normalize_scalar(&value) {
                    Ok(normalized) if normalized != value => {
                        return Err(ArgError::configuration(
                            key,
                            format!(
                                "{} would turn availability value `{}` into `{}`",
                                normalizer, value, normalized
                            ),
                        ))
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Pass one table value through the normalizers attached for `key`.
    fn normalize_record_value(&self, key: &str, value: &Value) -> Result<Option<Value>, ArgError> {
        let mut value = value.clone();
        for normalizer in self.normalizers(key) {
            match normalizer.normalize_scalar(&value) {
                Ok(normalized) => value = normalized,
                Err(_) if normalizer.is_implicit() => return Ok(None),
                Err(err) => {
                    return Err(ArgError::configuration(
                        key,
                        format!("availability value rejected: {}", err),
                    ))
                }
            }
        }
        Ok(Some(value))
    }

    fn normalizers<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Normalizer> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Normalize(n) if n.name() == name => Some(n),
            _ => None,
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn build(self) -> Pipeline {
        tracing::debug!("built pipeline with {} entries", self.entries.len());
        Pipeline::new(self.signature, self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::args::Args;
    use crate::core::record::Record;
    use crate::core::signature::Param;
    use crate::normalize::{normalize, Mode, ValueType};
    use crate::test_support::fixtures;

    fn ab_table() -> Availability {
        Availability::from_records([Record::new().with("a", "a"), Record::new().with("a", "b")])
            .unwrap()
    }

    #[test]
    fn test_catch_all_positional_fails_before_any_call() {
        let sig = Signature::new([Param::required("a"), Param::var_positional("rest")]);
        assert!(matches!(
            PipelineBuilder::new(sig),
            Err(ArgError::UnsupportedSignature { .. })
        ));
    }

    #[test]
    fn test_incompatible_values_after_availability() {
        let err = PipelineBuilder::new(Signature::of(&["a"]))
            .unwrap()
            .availability(ab_table())
            .unwrap()
            .normalize(normalize("a").values(["unk1", "unk2"]))
            .unwrap_err();
        assert!(matches!(err, ArgError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_parameter_is_configuration_error() {
        let err = PipelineBuilder::new(Signature::of(&["a"]))
            .unwrap()
            .normalize(normalize("b"))
            .unwrap_err();
        assert_eq!(err.parameter(), Some("b"));
    }

    #[test]
    fn test_any_mode_is_refined_by_availability() {
        let pipeline = PipelineBuilder::new(Signature::of(&["a"]))
            .unwrap()
            .normalize(normalize("a").multiple())
            .unwrap()
            .availability(ab_table())
            .unwrap()
            .build();

        let normalizer = pipeline.normalizers_for("a").next().unwrap();
        assert!(matches!(normalizer.mode(), Mode::Values(_)));
        assert_eq!(pipeline.normalizers_for("a").count(), 1);

        let kwargs = pipeline.call(Args::new().arg("b")).unwrap();
        assert_eq!(kwargs.list("a"), Some(&[Value::from("b")][..]));
        assert!(pipeline.call(Args::new().arg("c")).is_err());
    }

    #[test]
    fn test_records_rejected_by_explicit_normalizer() {
        let err = PipelineBuilder::new(Signature::of(&["level", "param", "step"]))
            .unwrap()
            .normalize(normalize("step").values([24]))
            .unwrap()
            .availability(fixtures::forecast_table())
            .unwrap_err();
        assert_eq!(err.parameter(), Some("step"));
    }

    #[test]
    fn test_string_records_with_int_normalizer() {
        let table = Availability::from_records([
            Record::new().with("level", "500").with("param", "Z"),
            Record::new().with("level", "850").with("param", "T"),
        ])
        .unwrap();

        let pipeline = PipelineBuilder::new(Signature::of(&["level", "param"]))
            .unwrap()
            .normalize(normalize("level").of_type(ValueType::Int))
            .unwrap()
            .availability(table)
            .unwrap()
            .build();

        let kwargs = pipeline
            .call(Args::new().kwarg("level", 850).kwarg("param", "T"))
            .unwrap();
        assert_eq!(kwargs.int("level"), Some(850));
    }

    #[test]
    fn test_implicit_normalizers_first_only() {
        let second = Availability::from_records([
            Record::new().with("param", "Z").with("grid", "1/1"),
        ])
        .unwrap();

        let pipeline = PipelineBuilder::new(Signature::of(&["level", "param", "step", "grid"]))
            .unwrap()
            .availability(fixtures::forecast_table())
            .unwrap()
            .availability_with(
                second,
                AvailabilityOptions {
                    implicit: ImplicitNormalizers::FirstOnly,
                },
            )
            .unwrap()
            .build();

        assert_eq!(pipeline.normalizers_for("grid").count(), 0);
        assert_eq!(pipeline.normalizers_for("param").count(), 1);
    }

    #[test]
    fn test_normalizer_after_guard_keeps_table_values() {
        let table = Availability::from_records([
            Record::new().with("param", "a"),
            Record::new().with("param", "b"),
        ])
        .unwrap();

        let err = PipelineBuilder::new(Signature::of(&["param"]))
            .unwrap()
            .availability(table.clone())
            .unwrap()
            .normalize(normalize("param").values(["A", "B"]))
            .unwrap_err();
        assert!(matches!(err, ArgError::Configuration { parameter, .. } if parameter == "param"));

        let pipeline = PipelineBuilder::new(Signature::of(&["param"]))
            .unwrap()
            .availability(table)
            .unwrap()
            .normalize(normalize("param").values(["a", "b"]).multiple())
            .unwrap()
            .build();
        let kwargs = pipeline.call(Args::new().kwarg("param", "A")).unwrap();
        assert_eq!(kwargs.get("param"), Some(&Value::from(vec!["a"])));
    }

    #[test]
    fn test_layer_conversions() {
        let pipeline = PipelineBuilder::new(Signature::of(&["level", "param", "step"]))
            .unwrap()
            .layer(normalize("level").of_type(ValueType::Int))
            .unwrap()
            .layer(fixtures::forecast_table())
            .unwrap()
            .build();

        assert_eq!(pipeline.entries().len(), 4);
        assert!(matches!(pipeline.entries()[3], Entry::Guard(_)));
    }
}
