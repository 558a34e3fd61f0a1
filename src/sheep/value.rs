//! Dynamically typed Sheep values.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Storage type of a value, variable or system-function parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Float,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::String => write!(f, "string"),
        }
    }
}

/// One operand-stack slot.
///
/// Strings come in two forms: an offset into the executing script's string
/// table, or text owned by the value itself (produced by host functions,
/// concatenation, or `GetString`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SheepValue {
    Int(i32),
    Float(f32),
    StringOffset(u32),
    String(Arc<str>),
}

impl SheepValue {
    pub fn string(text: impl Into<Arc<str>>) -> Self {
        SheepValue::String(text.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            SheepValue::Int(_) => ValueKind::Int,
            SheepValue::Float(_) => ValueKind::Float,
            SheepValue::StringOffset(_) | SheepValue::String(_) => ValueKind::String,
        }
    }

    pub fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            SheepValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            SheepValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Owned text; `None` for numbers and unresolved offsets.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SheepValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value as an int, truncating floats.
    pub fn to_int(&self) -> Option<i32> {
        match self {
            SheepValue::Int(v) => Some(*v),
            SheepValue::Float(v) => Some(*v as i32),
            _ => None,
        }
    }

    /// Numeric value as a float.
    pub fn to_float(&self) -> Option<f32> {
        match self {
            SheepValue::Int(v) => Some(*v as f32),
            SheepValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of a string value, resolving offsets against `strings`.
    pub fn resolve_str<'a>(&'a self, strings: &'a [String]) -> Option<&'a str> {
        match self {
            SheepValue::String(s) => Some(s),
            SheepValue::StringOffset(offset) => strings.get(*offset as usize).map(String::as_str),
            _ => None,
        }
    }

    /// Zero, `0.0` and the empty string are false.
    pub fn is_truthy(&self, strings: &[String]) -> bool {
        match self {
            SheepValue::Int(v) => *v != 0,
            SheepValue::Float(v) => *v != 0.0,
            _ => self.resolve_str(strings).is_some_and(|s| !s.is_empty()),
        }
    }
}

impl Default for SheepValue {
    fn default() -> Self {
        SheepValue::Int(0)
    }
}

impl From<i32> for SheepValue {
    fn from(v: i32) -> Self {
        SheepValue::Int(v)
    }
}

impl From<f32> for SheepValue {
    fn from(v: f32) -> Self {
        SheepValue::Float(v)
    }
}

impl From<&str> for SheepValue {
    fn from(v: &str) -> Self {
        SheepValue::String(v.into())
    }
}

impl fmt::Display for SheepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheepValue::Int(v) => write!(f, "{}", v),
            SheepValue::Float(v) => write!(f, "{}", v),
            SheepValue::StringOffset(offset) => write!(f, "@{}", offset),
            SheepValue::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
