//! String-to-value conversion.
//!
//! Every option and argument payload flows through a [`TypeConverter`]: the
//! built-in set covers the non-custom [`ValueKind`]s, and callers may
//! register named converters for `ValueKind::Custom` types. Whether a kind
//! is convertible at all is checked when the engine is constructed, never
//! during a parse.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tiller_metadata::ValueKind;

use crate::error::ParseError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A converted option or argument payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    /// One of the constants declared on an enum kind.
    Enum(String),
    Date(NaiveDate),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) | Value::Enum(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// JSON rendering used by callers that serialize resolved invocations.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Integer(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(value) => serde_json::Value::String(value.to_string()),
            Value::String(value) | Value::Enum(value) => {
                serde_json::Value::String(value.clone())
            }
            Value::Date(value) => {
                serde_json::Value::String(value.format(DATE_FORMAT).to_string())
            }
        }
    }
}

/// Canonical token form; parsing the rendered text back under the same kind
/// yields an equal value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::String(value) | Value::Enum(value) => f.write_str(value),
            Value::Date(value) => write!(f, "{}", value.format(DATE_FORMAT)),
        }
    }
}

type ConvertFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// Registry of string-to-value conversions.
///
/// Cloneable and shareable; custom converters are reference-counted so one
/// registry can serve concurrent parses.
#[derive(Clone, Default)]
pub struct TypeConverter {
    custom: HashMap<String, Arc<ConvertFn>>,
}

impl fmt::Debug for TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TypeConverter").field("custom", &names).finish()
    }
}

impl TypeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter for `ValueKind::Custom(name)` payloads.
    pub fn register<F>(&mut self, name: impl Into<String>, convert: F)
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.custom.insert(name.into(), Arc::new(convert));
    }

    /// Whether values of `kind` can be converted at all.
    pub fn supports(&self, kind: &ValueKind) -> bool {
        match kind {
            ValueKind::Custom(name) => self.custom.contains_key(name),
            _ => true,
        }
    }

    /// Convert one token. `target` is the option or argument title reported
    /// on failure.
    pub fn convert(
        &self,
        target: &str,
        kind: &ValueKind,
        token: &str,
    ) -> Result<Value, ParseError> {
        let converted = match kind {
            ValueKind::Bool => token
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| "expected 'true' or 'false'".to_string()),
            ValueKind::Integer => token
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|err| err.to_string()),
            ValueKind::Float => token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| err.to_string()),
            ValueKind::Decimal => token
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|err| err.to_string()),
            ValueKind::String => Ok(Value::String(token.to_string())),
            ValueKind::Enum(constants) => {
                if constants.iter().any(|constant| constant == token) {
                    Ok(Value::Enum(token.to_string()))
                } else {
                    Err(format!("expected one of: {}", constants.join(", ")))
                }
            }
            ValueKind::Date => NaiveDate::parse_from_str(token, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|err| err.to_string()),
            ValueKind::Custom(name) => match self.custom.get(name) {
                Some(convert) => convert(token),
                None => Err(format!("no converter registered for '{name}'")),
            },
        };

        converted.map_err(|reason| ParseError::Conversion {
            token: token.to_string(),
            target: target.to_string(),
            kind: kind.label().to_string(),
            reason,
        })
    }
}
