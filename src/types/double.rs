//! `DoubleType`: a minimal scalar type bridging native floats and integers.
//!
//! It keeps the default identity equality, so only the shared instance from
//! [`double`] compares equal to itself. A second `DoubleType::new()` is a
//! different type as far as the graph is concerned.
use super::cast::{coerce_scalar, DowncastPolicy, FilterOptions};
use super::descriptor::{FilterResult, ShapeInfo, TypeDescriptor, TypeRef};
use super::error::FilterError;
use crate::value::{DType, Scalar, Value};
use once_cell::sync::Lazy;
use std::fmt;

static DOUBLE: Lazy<TypeRef> = Lazy::new(|| TypeRef::new(DoubleType::new()));

/// The process-wide `DoubleType` instance.
pub fn double() -> TypeRef {
    DOUBLE.clone()
}

#[derive(Debug, Clone)]
pub struct DoubleType {
    tolerance: f64,
}

impl DoubleType {
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;

    pub fn new() -> Self {
        Self { tolerance: Self::DEFAULT_TOLERANCE }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for DoubleType {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DoubleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("double")
    }
}

impl TypeDescriptor for DoubleType {
    fn filter(&self, value: Value, opts: FilterOptions) -> FilterResult {
        if let Value::Scalar(Scalar::Float64(_)) = value {
            return Ok(value);
        }
        if opts.strict {
            return Err(FilterError::TypeMismatch {
                ty: self.to_string(),
                expected: "a float64 scalar".to_string(),
                got: value.describe(),
            });
        }
        // Unset downcast is treated as a denial.
        let coerce = |s: Scalar| {
            coerce_scalar(self, s, DType::Float64, opts.allow_downcast, DowncastPolicy::Deny)
        };
        match value {
            Value::Scalar(s) => coerce(s).map(Value::Scalar),
            // A rank-0 array reads as a scalar, as for `ScalarType`.
            Value::Array(a) if a.ndim() == 0 => coerce(a.elements()[0]).map(Value::Scalar),
            other => {
                let reason = format!("cannot read {} as a double", other.describe());
                Err(FilterError::incompatible(self, reason))
            }
        }
    }

    /// Relative difference below the tolerance. Exactly equal values (zeros
    /// included) and NaN against NaN always compare equal.
    fn values_eq_approx(&self, a: &Value, b: &Value) -> bool {
        match (a.as_scalar(), b.as_scalar()) {
            (Some(x), Some(y)) => {
                let (x, y) = (x.to_f64(), y.to_f64());
                if x == y || (x.is_nan() && y.is_nan()) {
                    return true;
                }
                (x - y).abs() / (x.abs() + y.abs()) < self.tolerance
            }
            _ => self.values_eq(a, b),
        }
    }

    fn get_shape_info(&self, _value: &Value) -> Option<ShapeInfo> {
        Some(ShapeInfo::Scalar(DType::Float64))
    }

    fn get_size(&self, info: &ShapeInfo) -> Option<usize> {
        match info {
            ShapeInfo::Scalar(dtype) => Some(dtype.size_in_bytes()),
            ShapeInfo::Array { .. } => None,
        }
    }
}
