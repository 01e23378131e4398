use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::{
    descriptor::ParameterDescriptor,
    errors::{DomainError, Result},
};

pub const DATE_TIME_FORMAT: &str = "date-time";

// Uppercase `T`, seconds required, `Z` or `±HH:MM`. chrono alone also takes a
// space separator and lowercase `t`/`z`.
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("date-time regex must compile")
});

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    Text,
    /// Closed set of strings, matched case-sensitively. Takes precedence over
    /// any `format` on the descriptor.
    OneOf(Vec<String>),
    DateTime,
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    TextArray,
    AnyArray,
    Unconstrained,
}

impl ParameterKind {
    pub fn from_descriptor(param: &ParameterDescriptor) -> Self {
        match param.kind.as_str() {
            "string" => match (&param.allowed, param.format.as_deref()) {
                (Some(values), _) => ParameterKind::OneOf(values.clone()),
                (None, Some(DATE_TIME_FORMAT)) => ParameterKind::DateTime,
                (None, _) => ParameterKind::Text,
            },
            "number" => ParameterKind::Number {
                minimum: param.minimum,
                maximum: param.maximum,
            },
            "array" => match param.items.as_ref().map(|items| items.kind.as_str()) {
                Some("string") => ParameterKind::TextArray,
                _ => ParameterKind::AnyArray,
            },
            _ => ParameterKind::Unconstrained,
        }
    }

    fn tolerates_absence(&self) -> bool {
        matches!(self, ParameterKind::Unconstrained)
    }

    fn check_value(&self, field: &str, value: &Value) -> Result<Value> {
        match self {
            ParameterKind::Text => {
                expect_str(field, value, "expected string")?;
                Ok(value.clone())
            }
            ParameterKind::OneOf(allowed) => {
                let text = expect_str(field, value, "expected string")?;
                if allowed.iter().any(|candidate| candidate == text) {
                    Ok(value.clone())
                } else {
                    Err(DomainError::violation(
                        field,
                        format!("expected one of [{}]", allowed.join(", ")),
                        Some(value),
                    ))
                }
            }
            ParameterKind::DateTime => {
                let text = expect_str(field, value, "expected ISO-8601 date-time string")?;
                if !DATE_TIME_RE.is_match(text) {
                    return Err(DomainError::violation(
                        field,
                        "expected ISO-8601 date-time string",
                        Some(value),
                    ));
                }
                DateTime::parse_from_rfc3339(text).map_err(|e| {
                    DomainError::violation(
                        field,
                        format!("expected ISO-8601 date-time string ({})", e),
                        Some(value),
                    )
                })?;
                Ok(value.clone())
            }
            ParameterKind::Number { minimum, maximum } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| DomainError::violation(field, "expected number", Some(value)))?;
                if let Some(min) = minimum {
                    if number < *min {
                        return Err(DomainError::violation(
                            field,
                            format!("must be >= {}", min),
                            Some(value),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if number > *max {
                        return Err(DomainError::violation(
                            field,
                            format!("must be <= {}", max),
                            Some(value),
                        ));
                    }
                }
                Ok(value.clone())
            }
            ParameterKind::TextArray => {
                let items = value
                    .as_array()
                    .ok_or_else(|| DomainError::violation(field, "expected array", Some(value)))?;
                if let Some(idx) = items.iter().position(|item| !item.is_string()) {
                    return Err(DomainError::violation(
                        field,
                        format!("element {} must be a string", idx),
                        Some(value),
                    ));
                }
                Ok(value.clone())
            }
            ParameterKind::AnyArray => {
                if !value.is_array() {
                    return Err(DomainError::violation(field, "expected array", Some(value)));
                }
                Ok(value.clone())
            }
            ParameterKind::Unconstrained => Ok(value.clone()),
        }
    }
}

fn expect_str<'a>(field: &str, value: &'a Value, reason: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| DomainError::violation(field, reason, Some(value)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    field: String,
    kind: ParameterKind,
    required: bool,
}

pub fn compile(field: &str, param: &ParameterDescriptor) -> Validator {
    Validator {
        field: field.to_string(),
        kind: ParameterKind::from_descriptor(param),
        required: param.required,
    }
}

impl Validator {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn check(&self, value: Option<&Value>) -> Result<Option<Value>> {
        match value {
            Some(value) => self.kind.check_value(&self.field, value).map(Some),
            None if !self.required || self.kind.tolerates_absence() => Ok(None),
            None => Err(DomainError::violation(&self.field, "required", None)),
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
