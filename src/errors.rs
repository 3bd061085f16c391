//! Pipeline error types and diagnostics.

use std::collections::BTreeSet;
use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::availability::NoMatch;
use crate::core::value::{join_values, Value};
use crate::normalize::ValueType;
use crate::util::diagnostic::Diagnostic;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Maximum number of "did you mean" suggestions.
const MAX_SUGGESTIONS: usize = 3;

/// Default number of candidate values listed per key in diagnostics.
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// What a normalizer would have accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// One of an enumerated set of values.
    OneOf(BTreeSet<Value>),
    /// A value coercible to a type.
    Type(ValueType),
    /// A single value rather than a sequence.
    Single,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::OneOf(values) => write!(f, "one of {}", join_values(values)),
            Expected::Type(ty) => write!(f, "a value of type {}", ty),
            Expected::Single => write!(f, "a single value"),
        }
    }
}

/// Binding failures of the call adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("takes {expected} positional arguments but {got} were given")]
    TooManyPositional { expected: usize, got: usize },

    #[error("got multiple values for argument `{parameter}`")]
    Duplicate { parameter: String },

    #[error("got an unexpected keyword argument `{parameter}`")]
    Unexpected { parameter: String },

    #[error("missing required argument `{parameter}`")]
    Missing { parameter: String },
}

/// Error raised while attaching layers or calling a wrapped callable.
#[derive(Debug, Clone, PartialEq, Error, MietteDiagnostic)]
pub enum ArgError {
    #[error("catch-all positional parameter `*{parameter}` is not supported")]
    #[diagnostic(
        code(normargs::unsupported_signature),
        help("Pass the values as a list argument or through a catch-all keyword parameter")
    )]
    UnsupportedSignature { parameter: String },

    #[error("invalid value `{value}` for `{parameter}`: expected {expected}")]
    #[diagnostic(code(normargs::invalid_value))]
    InvalidValue {
        parameter: String,
        value: Value,
        expected: Expected,
    },

    #[error("{0}")]
    #[diagnostic(code(normargs::no_match))]
    NoMatch(NoMatch),

    #[error("configuration error for `{parameter}`: {message}")]
    #[diagnostic(code(normargs::configuration))]
    Configuration { parameter: String, message: String },

    #[error("invalid arguments: {0}")]
    #[diagnostic(code(normargs::invalid_arguments))]
    InvalidArguments(#[from] BindError),
}

impl ArgError {
    pub(crate) fn invalid(parameter: &str, value: &Value, expected: Expected) -> Self {
        ArgError::InvalidValue {
            parameter: parameter.to_string(),
            value: value.clone(),
            expected,
        }
    }

    pub(crate) fn configuration(parameter: &str, message: impl Into<String>) -> Self {
        ArgError::Configuration {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    /// Name of the parameter the error is about, if it concerns exactly one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ArgError::UnsupportedSignature { parameter }
            | ArgError::InvalidValue { parameter, .. }
            | ArgError::Configuration { parameter, .. } => Some(parameter),
            ArgError::InvalidArguments(
                BindError::Duplicate { parameter }
                | BindError::Unexpected { parameter }
                | BindError::Missing { parameter },
            ) => Some(parameter),
            ArgError::InvalidArguments(BindError::TooManyPositional { .. }) => None,
            ArgError::NoMatch(_) => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        self.to_diagnostic_limited(DEFAULT_MAX_CANDIDATES)
    }

    /// Convert to a diagnostic, listing at most `max_candidates` values per key.
    pub fn to_diagnostic_limited(&self, max_candidates: usize) -> Diagnostic {
        match self {
            ArgError::UnsupportedSignature { parameter } => {
                Diagnostic::error(self.to_string())
                    .with_context(format!("`*{}` collects positional arguments", parameter))
                    .with_suggestion("Take the values as one list parameter instead")
                    .with_suggestion("Use a catch-all keyword parameter (`**kwargs`)")
            }

            ArgError::InvalidValue {
                parameter,
                value,
                expected,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "invalid value `{}` for `{}`",
                    value, parameter
                ));

                match expected {
                    Expected::OneOf(values) => {
                        diag = diag.with_context(format!(
                            "accepted values: {}",
                            limited(values, max_candidates)
                        ));
                        let close = did_you_mean(value, values);
                        if !close.is_empty() {
                            diag = diag.with_context(format!(
                                "did you mean: {}?",
                                join_values(&close)
                            ));
                        }
                    }
                    Expected::Type(ty) => {
                        diag = diag.with_context(format!(
                            "`{}` cannot be converted to {}",
                            value, ty
                        ));
                    }
                    Expected::Single => {
                        diag = diag.with_context(format!(
                            "`{}` accepts a single value, got {} values",
                            parameter,
                            value.items().len()
                        ));
                    }
                }

                diag.with_suggestion(format!("Pass {} for `{}`", expected, parameter))
            }

            ArgError::NoMatch(no_match) => {
                let mut diag = Diagnostic::error(no_match.to_string());

                if no_match.candidates.is_empty() {
                    diag = diag.with_context(
                        "no single change to one argument makes this combination available",
                    );
                }
                for (key, values) in &no_match.candidates {
                    diag = diag.with_context(format!(
                        "`{}` would be valid as: {}",
                        key,
                        limited(values, max_candidates)
                    ));
                }

                diag.with_suggestion(
                    "Change one of the arguments above to a listed value".to_string(),
                )
            }

            ArgError::Configuration { parameter, message } => {
                Diagnostic::error(format!("invalid configuration for `{}`", parameter))
                    .with_context(message.clone())
                    .with_suggestion(
                        "Check the normalizers and availability attached to this parameter"
                            .to_string(),
                    )
            }

            ArgError::InvalidArguments(bind) => Diagnostic::error(self.to_string())
                .with_context(bind.to_string())
                .with_suggestion("Check the call against the declared parameters".to_string()),
        }
    }
}

impl From<NoMatch> for ArgError {
    fn from(no_match: NoMatch) -> Self {
        ArgError::NoMatch(no_match)
    }
}

/// Join at most `max` values, noting how many were left out.
fn limited(values: &BTreeSet<Value>, max: usize) -> String {
    if values.len() <= max {
        return join_values(values);
    }
    format!(
        "{} (and {} more)",
        join_values(values.iter().take(max)),
        values.len() - max
    )
}

/// Rank accepted values by textual similarity to the offered one.
pub fn did_you_mean(offered: &Value, accepted: &BTreeSet<Value>) -> Vec<Value> {
    let Some(needle) = offered.text().map(|s| s.to_lowercase()) else {
        return Vec::new();
    };

    let mut scored: Vec<(f64, &Value)> = accepted
        .iter()
        .filter_map(|candidate| {
            let text = candidate.text()?.to_lowercase();
            let score = strsim::jaro_winkler(&needle, &text);
            (score >= SUGGESTION_THRESHOLD).then_some((score, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, v)| v.clone())
        .collect()
}
