//! Dynamic values and their coercions.

use core::{cmp::Ordering, fmt};

use indexmap::IndexMap;

/// An insertion-ordered mapping from property names to values.
pub type Map = IndexMap<String, Value>;

/// A dynamically typed value.
///
/// Coercions follow JavaScript: `"1" + 1` is `"11"`, `"2" * 3` is `6`, and every value
/// has a truthiness.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Undefined,
    /// An explicit empty value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// A mapping of property names to values.
    Object(Map),
}

impl Value {
    /// Returns the type name used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns `true` for `null` and `undefined`.
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Returns the truthiness of the value.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    /// Converts the value to a number.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Object(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => parse_number(s),
            Self::Array(_) => parse_number(&self.to_string()),
        }
    }

    /// Returns the mapping if the value is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Converts the value into its mapping, handing the value back if it is not an object.
    ///
    /// # Errors
    ///
    /// Returns the original value when it is not [`Value::Object`].
    pub fn into_object(self) -> Result<Map, Self> {
        match self {
            Self::Object(map) => Ok(map),
            other => Err(other),
        }
    }

    /// Reads a property, as `value.property` would.
    ///
    /// Returns `None` for `null` and `undefined`, which have no properties.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<Self> {
        Some(match self {
            Self::Undefined | Self::Null => return None,
            Self::Object(map) => map.get(key).cloned().unwrap_or_default(),
            Self::Array(items) => match key {
                "length" => Self::from(items.len()),
                _ => index_of(key)
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or_default(),
            },
            Self::String(s) => match key {
                "length" => Self::from(s.chars().count()),
                _ => index_of(key)
                    .and_then(|index| s.chars().nth(index))
                    .map(|ch| Self::String(ch.to_string()))
                    .unwrap_or_default(),
            },
            Self::Bool(_) | Self::Number(_) => Self::Undefined,
        })
    }

    /// Strict equality (`===`). Arrays and objects compare structurally.
    #[must_use]
    pub fn strict_equals(&self, other: &Self) -> bool {
        self == other
    }

    /// Loose equality (`==`).
    #[must_use]
    pub fn loose_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Self::Number(a), Self::String(_)) => *a == other.to_number(),
            (Self::String(_), Self::Number(b)) => self.to_number() == *b,
            (Self::Bool(_), _) => Self::Number(self.to_number()).loose_equals(other),
            (_, Self::Bool(_)) => self.loose_equals(&Self::Number(other.to_number())),
            (Self::Array(_) | Self::Object(_), Self::Number(_) | Self::String(_)) => {
                Self::String(self.to_string()).loose_equals(other)
            }
            (Self::Number(_) | Self::String(_), Self::Array(_) | Self::Object(_)) => {
                self.loose_equals(&Self::String(other.to_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Relational comparison. Two strings compare lexicographically, everything else
    /// numerically; `None` when either side is `NaN`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => self.to_number().partial_cmp(&other.to_number()),
        }
    }
}

fn index_of(key: &str) -> Option<usize> {
    if key.bytes().all(|b| b.is_ascii_digit()) {
        key.parse().ok()
    } else {
        None
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts `inf` and `nan` spellings that are not numbers here.
        _ if trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') => {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Formats a number the way it is rendered into text: `1` rather than `1.0`.
///
/// Magnitudes outside `[1e-6, 1e21)` use exponent form with an explicit sign, e.g.
/// `1e+21` and `1.5e-7`.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{n:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Object(value)
    }
}
