//! `ScalarType`: one element of a given `DType`, compared structurally.
use super::cast::{coerce_scalar, DowncastPolicy, FilterOptions};
use super::descriptor::{
    structural_eq, structural_hash, FilterResult, ShapeInfo, TypeDescriptor, TypeOverrides, TypeRef,
};
use super::error::{FilterError, TypeError};
use super::intern::Interner;
use crate::config;
use crate::value::{DType, Scalar, Value};
use once_cell::sync::Lazy;
use std::fmt;

static CANONICAL: Lazy<Interner<ScalarType>> = Lazy::new(Interner::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarType {
    dtype: DType,
    policy: DowncastPolicy,
}

impl ScalarType {
    /// A scalar type using the configured default downcast policy.
    pub fn new(dtype: DType) -> Self {
        Self::with_policy(dtype, config::current().default_downcast)
    }

    pub fn with_policy(dtype: DType, policy: DowncastPolicy) -> Self {
        Self { dtype, policy }
    }

    /// The shared instance for `dtype` under the configured default policy.
    pub fn canonical(dtype: DType) -> TypeRef {
        CANONICAL.intern(Self::new(dtype))
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn policy(&self) -> DowncastPolicy {
        self.policy
    }

    fn coerce(&self, element: Scalar, opts: FilterOptions) -> Result<Scalar, FilterError> {
        coerce_scalar(self, element, self.dtype, opts.allow_downcast, self.policy)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", self.dtype)
    }
}

impl TypeDescriptor for ScalarType {
    fn filter(&self, value: Value, opts: FilterOptions) -> FilterResult {
        match value {
            Value::Scalar(s) if s.dtype() == self.dtype => Ok(value),
            _ if opts.strict => Err(FilterError::TypeMismatch {
                ty: self.to_string(),
                expected: format!("a {} scalar", self.dtype),
                got: value.describe(),
            }),
            Value::Scalar(s) => self.coerce(s, opts).map(Value::Scalar),
            // A single-element array of rank 0 reads as a scalar.
            Value::Array(a) if a.ndim() == 0 => {
                let element = a.elements()[0];
                self.coerce(element, opts).map(Value::Scalar)
            }
            other => {
                let reason = format!("cannot read {} as a scalar", other.describe());
                Err(FilterError::incompatible(self, reason))
            }
        }
    }

    fn values_eq_approx(&self, a: &Value, b: &Value) -> bool {
        match (a.as_scalar(), b.as_scalar()) {
            (Some(x), Some(y)) if self.dtype.is_float() => {
                config::current().tolerance_for(self.dtype).close(x.to_f64(), y.to_f64())
            }
            _ => self.values_eq(a, b),
        }
    }

    fn type_eq(&self, other: &dyn TypeDescriptor) -> bool {
        structural_eq(self, other)
    }

    fn type_hash(&self) -> u64 {
        structural_hash(self)
    }

    fn get_shape_info(&self, _value: &Value) -> Option<ShapeInfo> {
        Some(ShapeInfo::Scalar(self.dtype))
    }

    fn get_size(&self, info: &ShapeInfo) -> Option<usize> {
        match info {
            ShapeInfo::Scalar(dtype) => Some(dtype.size_in_bytes()),
            ShapeInfo::Array { .. } => None,
        }
    }

    fn clone_with(&self, overrides: &TypeOverrides) -> Result<TypeRef, TypeError> {
        if overrides.broadcastable.is_some() {
            return Err(TypeError::InvalidOverride {
                ty: self.to_string(),
                reason: "scalars have no dimensions to broadcast".to_string(),
            });
        }
        Ok(TypeRef::new(Self {
            dtype: overrides.dtype.unwrap_or(self.dtype),
            policy: overrides.policy.unwrap_or(self.policy),
        }))
    }
}
