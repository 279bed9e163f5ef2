//! Tagged-union value type (spec §4.1).

use crate::error::{MoldError, Result, Status};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The type discriminant of a [`Value`], fixed at bind-time for a keyval
/// and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Enum,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// A value of one of the five permitted types. Setting the empty string
/// stores a null payload (`None`) with size 0, mirroring the C library's
/// "empty string clears the value" behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    String(Option<String>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Enum(Option<String>),
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Enum(_) => ValueType::Enum,
        }
    }

    /// A freshly-typed, unset value for `ty`.
    #[must_use]
    pub fn empty(ty: ValueType) -> Self {
        match ty {
            ValueType::String => Value::String(None),
            ValueType::Integer => Value::Integer(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Enum => Value::Enum(None),
        }
    }

    fn wrong_type(&self, wanted: ValueType) -> MoldError {
        MoldError::new(
            Status::WrongValueType,
            format!(
                "cannot use a {wanted} operation on a {} value",
                self.value_type()
            ),
        )
    }

    pub fn set_string(&mut self, s: &str) -> Result<()> {
        match self {
            Value::String(v) => {
                *v = if s.is_empty() { None } else { Some(s.to_string()) };
                Ok(())
            }
            other => Err(other.wrong_type(ValueType::String)),
        }
    }

    pub fn get_string(&self) -> Result<Option<&str>> {
        match self {
            Value::String(v) => Ok(v.as_deref()),
            other => Err(other.wrong_type(ValueType::String)),
        }
    }

    pub fn set_integer(&mut self, n: i64) -> Result<()> {
        match self {
            Value::Integer(v) => {
                *v = n;
                Ok(())
            }
            other => Err(other.wrong_type(ValueType::Integer)),
        }
    }

    pub fn get_integer(&self) -> Result<i64> {
        match self {
            Value::Integer(v) => Ok(*v),
            other => Err(other.wrong_type(ValueType::Integer)),
        }
    }

    pub fn set_float(&mut self, n: f64) -> Result<()> {
        match self {
            Value::Float(v) => {
                *v = n;
                Ok(())
            }
            other => Err(other.wrong_type(ValueType::Float)),
        }
    }

    pub fn get_float(&self) -> Result<f64> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(other.wrong_type(ValueType::Float)),
        }
    }

    pub fn set_boolean(&mut self, b: bool) -> Result<()> {
        match self {
            Value::Boolean(v) => {
                *v = b;
                Ok(())
            }
            other => Err(other.wrong_type(ValueType::Boolean)),
        }
    }

    pub fn get_boolean(&self) -> Result<bool> {
        match self {
            Value::Boolean(v) => Ok(*v),
            other => Err(other.wrong_type(ValueType::Boolean)),
        }
    }

    pub fn set_enum(&mut self, s: &str) -> Result<()> {
        match self {
            Value::Enum(v) => {
                *v = if s.is_empty() { None } else { Some(s.to_string()) };
                Ok(())
            }
            other => Err(other.wrong_type(ValueType::Enum)),
        }
    }

    pub fn get_enum(&self) -> Result<Option<&str>> {
        match self {
            Value::Enum(v) => Ok(v.as_deref()),
            other => Err(other.wrong_type(ValueType::Enum)),
        }
    }

    /// Stringify for display/diff purposes, truncating safely to `cap`
    /// bytes on a char boundary. Never panics regardless of `cap`.
    #[must_use]
    pub fn stringify(&self, cap: usize) -> String {
        let full = match self {
            Value::String(v) | Value::Enum(v) => v.clone().unwrap_or_default(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
        };
        if full.len() <= cap {
            return full;
        }
        let mut end = cap;
        while end > 0 && !full.is_char_boundary(end) {
            end -= 1;
        }
        full[..end].to_string()
    }

    /// Compare by type then content (spec §4.1): integers/floats by
    /// numeric order, strings/enums by byte comparison, booleans by
    /// logical equality. Mismatched types are a [`Status::WrongValueType`]
    /// error, not a panic.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) | (Value::Enum(a), Value::Enum(b)) => {
                Ok(a.as_deref().unwrap_or("").cmp(b.as_deref().unwrap_or("")))
            }
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => {
                Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal))
            }
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            _ => Err(MoldError::new(
                Status::WrongValueType,
                format!(
                    "cannot compare a {} value with a {} value",
                    self.value_type(),
                    other.value_type()
                ),
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify(usize::MAX))
    }
}
