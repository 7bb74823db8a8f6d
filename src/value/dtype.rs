//! Element kinds a runtime value can carry.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The element type of a scalar or of every element of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

/// Coarse category of a `DType`, used by downcast policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Integer,
    Float,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::Bool | DType::Int8 => 1,
            DType::Int16 => 2,
            DType::Int32 | DType::Float32 => 4,
            DType::Int64 | DType::Float64 => 8,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            DType::Bool => Kind::Bool,
            DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => Kind::Integer,
            DType::Float32 | DType::Float64 => Kind::Float,
        }
    }

    pub fn is_float(&self) -> bool {
        self.kind() == Kind::Float
    }

    pub fn is_integer(&self) -> bool {
        self.kind() == Kind::Integer
    }

    /// Half-open `[min, max + 1)` range of an integer kind, as floats. Both
    /// bounds are exact powers of two.
    pub fn integer_bounds(&self) -> Option<(f64, f64)> {
        let min = match self {
            DType::Int8 => i8::MIN as f64,
            DType::Int16 => i16::MIN as f64,
            DType::Int32 => i32::MIN as f64,
            DType::Int64 => i64::MIN as f64,
            _ => return None,
        };
        Some((min, -min))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
