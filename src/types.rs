//! Dynamically-typed element values.
//!
//! Engines are generic over their element type. [`Value`] is the element used by pipelines
//! whose elements are not known until runtime; the [`crate::combinators`] dispatch on its
//! [`ValueKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, ProcessingResult};

/// Kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::Utf8 => "utf8",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dynamically-typed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Int64(_) => ValueKind::Int64,
            Self::Float64(_) => ValueKind::Float64,
            Self::Bool(_) => ValueKind::Bool,
            Self::Utf8(_) => ValueKind::Utf8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload, if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Convert every element of `values` into `T`, failing on the first mismatch.
    ///
    /// No partial output is returned on failure.
    pub fn extract_all<T>(values: Vec<Value>) -> ProcessingResult<Vec<T>>
    where
        T: TryFrom<Value, Error = ProcessingError>,
    {
        values.into_iter().map(T::try_from).collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
        }
    }
}

macro_rules! value_from {
    ($($native:ty => $variant:ident as $wide:ty),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Self::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

value_from! {
    i64 => Int64 as i64,
    i32 => Int64 as i64,
    u32 => Int64 as i64,
    f64 => Float64 as f64,
    f32 => Float64 as f64,
    bool => Bool as bool,
    String => Utf8 as String,
    &str => Utf8 as String,
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

macro_rules! value_try_into {
    ($($native:ty => $variant:ident, $name:literal);* $(;)?) => {
        $(
            impl TryFrom<Value> for $native {
                type Error = ProcessingError;

                fn try_from(v: Value) -> Result<Self, Self::Error> {
                    match v {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(ProcessingError::Conversion {
                            expected: $name,
                            found: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

value_try_into! {
    i64 => Int64, "int64";
    f64 => Float64, "float64";
    bool => Bool, "bool";
    String => Utf8, "utf8";
}
