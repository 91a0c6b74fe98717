//! Values stored on and computed for value plugs.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumDiscriminants, IntoStaticStr};

/// A value held by a value plug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(EnumDiscriminants)]
#[strum_discriminants(name(ValueType))]
#[strum_discriminants(derive(Hash, Display, AsRefStr, IntoStaticStr, Serialize, Deserialize))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
#[strum_discriminants(serde(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl Value {
    /// Returns the type of this value.
    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::from(self)
    }

    /// Returns the boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts this value to `target`, returning `None` when the types are
    /// incompatible.
    ///
    /// Booleans, integers and floats convert freely between each other.
    /// Strings only convert to strings.
    pub fn convert_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }

        let converted = match (self, target) {
            (Self::Bool(b), ValueType::Int) => Self::Int(i64::from(*b)),
            (Self::Bool(b), ValueType::Float) => Self::Float(if *b { 1.0 } else { 0.0 }),
            (Self::Int(i), ValueType::Bool) => Self::Bool(*i != 0),
            (Self::Int(i), ValueType::Float) => Self::Float(*i as f64),
            (Self::Float(f), ValueType::Bool) => Self::Bool(*f != 0.0),
            (Self::Float(f), ValueType::Int) => Self::Int(*f as i64),
            _ => return None,
        };

        Some(converted)
    }

    /// Returns the default value for `value_type`.
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Bool => Self::Bool(false),
            ValueType::Int => Self::Int(0),
            ValueType::Float => Self::Float(0.0),
            ValueType::String => Self::String(String::new()),
        }
    }
}

impl ValueType {
    /// Returns whether values of `self` can be converted to `target`.
    pub fn converts_to(self, target: ValueType) -> bool {
        self == target || (self != ValueType::String && target != ValueType::String)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
