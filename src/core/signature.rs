//! Declared parameters of a wrapped callable and argument binding.
//!
//! A [`Signature`] is the static descriptor of a callable's parameter list.
//! It is built once, when the callable is wrapped, and consulted on every
//! call to turn positional and keyword arguments into a canonical,
//! keyword-only [`Kwargs`] mapping with defaults applied.

use std::collections::HashSet;

use crate::core::args::{Args, Kwargs};
use crate::core::value::Value;
use crate::errors::{ArgError, BindError};

/// How a parameter receives its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Bound positionally or by keyword.
    Normal,
    /// Catch-all positional (`*args`). Declaring one makes the signature
    /// unwrappable.
    VarPositional,
    /// Catch-all keyword (`**kwargs`); its contents are merged flat.
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
}

impl Param {
    /// A normal parameter without a default.
    pub fn required(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::Normal,
            default: None,
        }
    }

    /// A normal parameter with a default value.
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::Normal,
            default: Some(default.into()),
        }
    }

    /// A catch-all keyword parameter.
    pub fn var_keyword(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::VarKeyword,
            default: None,
        }
    }

    /// A catch-all positional parameter.
    pub fn var_positional(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            kind: ParamKind::VarPositional,
            default: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Signature {
            params: params.into_iter().collect(),
        }
    }

    /// A signature of required normal parameters.
    pub fn of(names: &[&str]) -> Self {
        Signature::new(names.iter().map(|n| Param::required(*n)))
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.kind == ParamKind::Normal && p.name == name)
    }

    /// Whether a call can pass an argument named `name`.
    pub fn accepts(&self, name: &str) -> bool {
        self.param(name).is_some() || self.has_var_keyword()
    }

    fn has_var_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarKeyword)
    }

    fn normal(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.kind == ParamKind::Normal)
    }

    /// Check that the signature can be wrapped.
    ///
    /// Fails with `UnsupportedSignature` for a catch-all positional
    /// parameter, and with a configuration error for duplicate names or
    /// more than one catch-all keyword parameter.
    pub fn validate(&self) -> Result<(), ArgError> {
        if let Some(p) = self
            .params
            .iter()
            .find(|p| p.kind == ParamKind::VarPositional)
        {
            return Err(ArgError::UnsupportedSignature {
                parameter: p.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for p in &self.params {
            if !seen.insert(p.name.as_str()) {
                return Err(ArgError::configuration(
                    &p.name,
                    "parameter is declared more than once",
                ));
            }
        }

        let mut catch_all = self
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::VarKeyword);
        if let (Some(_), Some(second)) = (catch_all.next(), catch_all.next()) {
            return Err(ArgError::configuration(
                &second.name,
                "only one catch-all keyword parameter is allowed",
            ));
        }

        Ok(())
    }

    /// Bind call arguments to the declared parameters.
    ///
    /// Positional arguments fill normal parameters in declared order,
    /// keywords fill the rest, and defaults are applied for anything
    /// omitted. Keywords that match no parameter land in the catch-all
    /// keyword parameter, whose contents are merged flat into the result.
    ///
    /// The signature is assumed to have passed [`Signature::validate`];
    /// `PipelineBuilder::new` checks it once, before any call.
    pub fn bind(&self, args: Args) -> Result<Kwargs, ArgError> {
        let Args {
            positional,
            keywords,
        } = args;
        let normal: Vec<&Param> = self.normal().collect();

        if positional.len() > normal.len() {
            return Err(BindError::TooManyPositional {
                expected: normal.len(),
                got: positional.len(),
            }
            .into());
        }

        let mut bound = Kwargs::new();
        for (param, value) in normal.iter().zip(positional) {
            bound.insert(param.name.clone(), value);
        }

        let catch_all = self.has_var_keyword();
        for (name, value) in keywords {
            if normal.iter().any(|p| p.name == name) {
                if bound.contains(&name) {
                    return Err(BindError::Duplicate { parameter: name }.into());
                }
                bound.insert(name, value);
            } else if catch_all {
                bound.insert(name, value);
            } else {
                return Err(BindError::Unexpected { parameter: name }.into());
            }
        }

        for param in &normal {
            if bound.contains(&param.name) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    bound.insert(param.name.clone(), default.clone());
                }
                None => {
                    return Err(BindError::Missing {
                        parameter: param.name.clone(),
                    }
                    .into())
                }
            }
        }

        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast() -> Signature {
        Signature::new([
            Param::required("level"),
            Param::required("param"),
            Param::optional("step", 24),
        ])
    }

    #[test]
    fn test_bind_positional_and_keyword() {
        let kwargs = forecast()
            .bind(Args::new().arg(500).kwarg("param", "Z"))
            .unwrap();

        assert_eq!(kwargs.int("level"), Some(500));
        assert_eq!(kwargs.str("param"), Some("Z"));
        assert_eq!(kwargs.int("step"), Some(24));
    }

    #[test]
    fn test_bind_rejects_duplicate() {
        let err = forecast()
            .bind(Args::new().arg(500).kwarg("level", 850).kwarg("param", "Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            ArgError::InvalidArguments(BindError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_bind_rejects_unknown_keyword() {
        let err = forecast()
            .bind(Args::new().arg(500).arg("Z").kwarg("grid", "1/1"))
            .unwrap_err();
        assert_eq!(err.parameter(), Some("grid"));
    }

    #[test]
    fn test_bind_rejects_too_many_positional() {
        let err = forecast()
            .bind(Args::new().arg(500).arg("Z").arg(24).arg("extra"))
            .unwrap_err();
        assert!(matches!(
            err,
            ArgError::InvalidArguments(BindError::TooManyPositional {
                expected: 3,
                got: 4
            })
        ));
    }

    #[test]
    fn test_bind_reports_missing_required() {
        let err = forecast().bind(Args::new().arg(500)).unwrap_err();
        assert_eq!(err.parameter(), Some("param"));
    }

    #[test]
    fn test_catch_all_keyword_is_flattened() {
        let sig = Signature::new([Param::required("param"), Param::var_keyword("kwargs")]);
        let kwargs = sig
            .bind(Args::new().arg("Z").kwarg("grid", "1/1").kwarg("area", "europe"))
            .unwrap();

        assert_eq!(kwargs.len(), 3);
        assert_eq!(kwargs.str("grid"), Some("1/1"));
        assert!(!kwargs.contains("kwargs"));
    }

    #[test]
    fn test_catch_all_positional_is_unsupported() {
        let sig = Signature::new([Param::required("a"), Param::var_positional("args")]);
        assert!(matches!(
            sig.validate(),
            Err(ArgError::UnsupportedSignature { parameter }) if parameter == "args"
        ));
    }

    #[test]
    fn test_bind_does_not_revalidate() {
        // Catch-all positional parameters are refused when a pipeline is
        // built; binding itself only sees the normal parameters.
        let sig = Signature::new([Param::required("a"), Param::var_positional("args")]);
        let kwargs = sig.bind(Args::new().arg(1)).unwrap();
        assert_eq!(kwargs.int("a"), Some(1));
        assert!(!kwargs.contains("args"));
    }

    #[test]
    fn test_duplicate_parameter_is_configuration_error() {
        let sig = Signature::of(&["a", "a"]);
        assert!(matches!(sig.validate(), Err(ArgError::Configuration { .. })));
    }
}
