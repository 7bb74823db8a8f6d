//! Runtime values that flow into and out of the graph.
//!
//! A `Value` is what a type descriptor filters. Scalars are held by value and
//! can never alias; arrays share reference-counted storage, which is what the
//! aliasing checks reason about.
pub mod array;
pub mod dtype;
pub mod scalar;

pub use array::{Array, ArrayError, Shape};
pub use dtype::{DType, Kind};
pub use scalar::{cast_is_lossless, Scalar};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(Array),
    /// Non-numeric data. No numeric type can interpret it.
    Text(String),
}

impl Value {
    /// Short description of the value's representation, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Scalar(s) => format!("{} scalar", s.dtype()),
            Value::Array(a) => format!("{} array of shape {:?}", a.dtype(), a.shape()),
            Value::Text(_) => "text".to_string(),
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// False only when the two values provably occupy distinct storage.
    pub fn may_share_memory(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.may_share_memory(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(a) => write!(f, "array({:?}, dtype={})", a.shape(), a.dtype()),
            Value::Text(t) => write!(f, "{:?}", t),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Float64(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(Scalar::Float32(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Int64(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::Int32(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
