use derive_more::From;
use serde::{Deserialize, Serialize};

/// A value produced or consumed by expression evaluation.
///
/// `Undefined` means "no decision". It is never implicitly promoted to a concrete value, so
/// callers have to decide what to do with it (usually: fall back to a default).
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, and `bool` types.
///
/// ```
/// # use rox::ExpressionValue;
/// let string_value: ExpressionValue = "example".into();
/// let number_value: ExpressionValue = 42.0.into();
/// let bool_value: ExpressionValue = true.into();
/// ```
#[derive(Debug, Clone, PartialEq, From, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ExpressionValue {
    /// A boolean value.
    Boolean(bool),
    /// A string value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// Absence of a decision.
    #[default]
    #[from(ignore)]
    Undefined,
}

impl ExpressionValue {
    /// Whether the value is `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, ExpressionValue::Undefined)
    }

    /// The boolean, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExpressionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExpressionValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExpressionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render the value the way flags store their values. Returns `None` for `Undefined`.
    ///
    /// Integral numbers are printed without a fractional part, so `1.0` becomes `"1"`.
    pub fn to_value_string(&self) -> Option<String> {
        match self {
            ExpressionValue::Boolean(b) => Some(b.to_string()),
            ExpressionValue::String(s) => Some(s.clone()),
            ExpressionValue::Number(n) => Some(format_number(*n)),
            ExpressionValue::Undefined => None,
        }
    }
}

impl From<&str> for ExpressionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Option<ExpressionValue>> for ExpressionValue {
    fn from(value: Option<ExpressionValue>) -> Self {
        value.unwrap_or(ExpressionValue::Undefined)
    }
}

fn format_number(n: f64) -> String {
    // i64 covers every integer f64 can represent exactly.
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}
