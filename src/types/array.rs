//! `ArrayType`: the parametrized array family (element kind + rank).
//!
//! Each dimension is either free or broadcastable; a broadcastable dimension
//! must have length 1 at runtime. Dimension lengths are otherwise not part of
//! the type. Two instances with the same dtype, broadcastable pattern and
//! downcast policy are the same type.
use super::cast::{coerce_scalar, DowncastPolicy, FilterOptions};
use super::descriptor::{
    structural_eq, structural_hash, FilterResult, ShapeInfo, TypeDescriptor, TypeOverrides, TypeRef,
};
use super::error::{FilterError, TypeError};
use super::intern::Interner;
use crate::config;
use crate::value::{Array, DType, Scalar, Shape, Value};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::fmt;

static CANONICAL: Lazy<Interner<ArrayType>> = Lazy::new(Interner::new);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    dtype: DType,
    broadcastable: SmallVec<[bool; 4]>,
    policy: DowncastPolicy,
}

impl ArrayType {
    pub fn new(dtype: DType, broadcastable: &[bool]) -> Self {
        Self::with_policy(dtype, broadcastable, config::current().default_downcast)
    }

    pub fn with_policy(dtype: DType, broadcastable: &[bool], policy: DowncastPolicy) -> Self {
        Self {
            dtype,
            broadcastable: SmallVec::from_slice(broadcastable),
            policy,
        }
    }

    /// A rank-`ndim` type with no broadcastable dimensions.
    pub fn of_rank(dtype: DType, ndim: usize) -> Self {
        Self::new(dtype, &vec![false; ndim])
    }

    pub fn canonical(dtype: DType, broadcastable: &[bool]) -> TypeRef {
        CANONICAL.intern(Self::new(dtype, broadcastable))
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn ndim(&self) -> usize {
        self.broadcastable.len()
    }

    pub fn broadcastable(&self) -> &[bool] {
        &self.broadcastable
    }

    fn structure_error(&self, shape: &[usize]) -> Option<String> {
        if shape.len() != self.ndim() {
            return Some(format!("expected rank {}, got shape {:?}", self.ndim(), shape));
        }
        self.broadcastable
            .iter()
            .zip(shape)
            .position(|(&b, &len)| b && len != 1)
            .map(|dim| {
                format!(
                    "dimension {} is broadcastable and must have length 1, got shape {:?}",
                    dim, shape
                )
            })
    }

    /// Validates `value` and returns it either unchanged (already native) or
    /// as an array whose elements still need casting to `self.dtype`.
    fn prepare(&self, value: Value, opts: FilterOptions) -> Result<Prepared, FilterError> {
        if opts.strict {
            return match value {
                Value::Array(a)
                    if a.dtype() == self.dtype && self.structure_error(a.shape()).is_none() =>
                {
                    Ok(Prepared::Native(Value::Array(a)))
                }
                other => Err(FilterError::TypeMismatch {
                    ty: self.to_string(),
                    expected: format!("a {} array of rank {}", self.dtype, self.ndim()),
                    got: other.describe(),
                }),
            };
        }
        let source = match value {
            Value::Array(a) => a,
            Value::Scalar(s) => Array::from_scalar(s),
            Value::Text(_) => {
                return Err(FilterError::incompatible(self, "cannot read text as an array"))
            }
        };
        if let Some(reason) = self.structure_error(source.shape()) {
            return Err(FilterError::incompatible(self, reason));
        }
        if source.dtype() == self.dtype {
            return Ok(Prepared::Native(Value::Array(source)));
        }
        for &element in source.elements() {
            coerce_scalar(self, element, self.dtype, opts.allow_downcast, self.policy)?;
        }
        Ok(Prepared::Convert(source))
    }
}

enum Prepared {
    Native(Value),
    Convert(Array),
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<&str> = self
            .broadcastable
            .iter()
            .map(|&b| if b { "1" } else { "?" })
            .collect();
        write!(f, "Array({}, ({}))", self.dtype, dims.join(", "))
    }
}

impl TypeDescriptor for ArrayType {
    fn filter(&self, value: Value, opts: FilterOptions) -> FilterResult {
        match self.prepare(value, opts)? {
            Prepared::Native(v) => Ok(v),
            Prepared::Convert(source) => {
                Ok(Value::Array(source.map_into(self.dtype, |s| s.cast(self.dtype))))
            }
        }
    }

    fn filter_inplace(
        &self,
        value: Value,
        storage: &mut Value,
        opts: FilterOptions,
    ) -> FilterResult {
        let source = match self.prepare(value, opts)? {
            Prepared::Native(v) => return Ok(v),
            Prepared::Convert(source) => source,
        };
        if let Value::Array(previous) = storage {
            if previous.assign_mapped(&source, self.dtype, |s| s.cast(self.dtype)) {
                tracing::trace!(
                    ty = %self,
                    shape = ?source.shape(),
                    "filtered into previous storage"
                );
                return Ok(Value::Array(previous.clone()));
            }
        }
        Ok(Value::Array(source.map_into(self.dtype, |s| s.cast(self.dtype))))
    }

    fn reuses_storage(&self) -> bool {
        true
    }

    /// All-close with the configured tolerances for this dtype. Positions
    /// that are NaN in both arrays, or the same infinity, count as equal.
    fn values_eq_approx(&self, a: &Value, b: &Value) -> bool {
        let (Some(x), Some(y)) = (a.as_array(), b.as_array()) else {
            return self.values_eq(a, b);
        };
        if x.shape() != y.shape() {
            return false;
        }
        if !self.dtype.is_float() {
            return x == y;
        }
        let tolerance = config::current().tolerance_for(self.dtype);
        x.elements()
            .iter()
            .zip(y.elements())
            .all(|(p, q)| tolerance.close(p.to_f64(), q.to_f64()))
    }

    fn type_eq(&self, other: &dyn TypeDescriptor) -> bool {
        structural_eq(self, other)
    }

    fn type_hash(&self) -> u64 {
        structural_hash(self)
    }

    /// Only the dims are captured; the dtype is known from the type.
    fn get_shape_info(&self, value: &Value) -> Option<ShapeInfo> {
        let array = value.as_array()?;
        Some(ShapeInfo::Array { dtype: self.dtype, shape: Shape::from_slice(array.shape()) })
    }

    fn get_size(&self, info: &ShapeInfo) -> Option<usize> {
        match info {
            ShapeInfo::Array { dtype, shape } => {
                Some(shape.iter().product::<usize>() * dtype.size_in_bytes())
            }
            ShapeInfo::Scalar(dtype) => Some(dtype.size_in_bytes()),
        }
    }

    fn clone_with(&self, overrides: &TypeOverrides) -> Result<TypeRef, TypeError> {
        let broadcastable = match &overrides.broadcastable {
            Some(b) => SmallVec::from_slice(b),
            None => self.broadcastable.clone(),
        };
        Ok(TypeRef::new(Self {
            dtype: overrides.dtype.unwrap_or(self.dtype),
            broadcastable,
            policy: overrides.policy.unwrap_or(self.policy),
        }))
    }
}

/// Convenience for building a `Value` array of `dtype` from plain numbers.
pub fn array_value(dtype: DType, shape: &[usize], data: &[f64]) -> Option<Value> {
    let elements = data.iter().map(|&x| Scalar::Float64(x).cast(dtype)).collect();
    Array::new(dtype, shape, elements).ok().map(Value::Array)
}
