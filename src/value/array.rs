//! Dense row-major arrays over shared, reference-counted storage.
use super::dtype::DType;
use super::scalar::Scalar;
use smallvec::SmallVec;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

/// Dimensions of an array. Most graphs stay at rank 4 or below, so these
/// never touch the heap.
pub type Shape = SmallVec<[usize; 4]>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArrayError {
    #[error("shape {shape:?} requires {expected} elements, got {got}")]
    ElementCount { shape: Vec<usize>, expected: usize, got: usize },
    #[error("element {index} has dtype {got}, array dtype is {expected}")]
    ElementDType { index: usize, expected: DType, got: DType },
    #[error("view [{start}, {end}) exceeds storage of {len} elements")]
    ViewOutOfBounds { start: usize, end: usize, len: usize },
}

/// An n-dimensional array. Cloning is cheap and aliases the same storage;
/// `view` creates a window over the storage of an existing array.
#[derive(Debug, Clone)]
pub struct Array {
    dtype: DType,
    shape: Shape,
    offset: usize,
    storage: Arc<Vec<Scalar>>,
}

impl Array {
    /// Builds an array, checking that every element already has `dtype`.
    pub fn new(dtype: DType, shape: &[usize], data: Vec<Scalar>) -> Result<Self, ArrayError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ArrayError::ElementCount {
                shape: shape.to_vec(),
                expected,
                got: data.len(),
            });
        }
        if let Some((index, bad)) = data.iter().enumerate().find(|(_, s)| s.dtype() != dtype) {
            return Err(ArrayError::ElementDType { index, expected: dtype, got: bad.dtype() });
        }
        Ok(Self {
            dtype,
            shape: Shape::from_slice(shape),
            offset: 0,
            storage: Arc::new(data),
        })
    }

    pub fn from_f64(shape: &[usize], data: Vec<f64>) -> Result<Self, ArrayError> {
        Self::new(DType::Float64, shape, data.into_iter().map(Scalar::Float64).collect())
    }

    pub fn from_f32(shape: &[usize], data: Vec<f32>) -> Result<Self, ArrayError> {
        Self::new(DType::Float32, shape, data.into_iter().map(Scalar::Float32).collect())
    }

    pub fn from_i64(shape: &[usize], data: Vec<i64>) -> Result<Self, ArrayError> {
        Self::new(DType::Int64, shape, data.into_iter().map(Scalar::Int64).collect())
    }

    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            dtype,
            shape: Shape::from_slice(shape),
            offset: 0,
            storage: Arc::new(vec![Scalar::zero(dtype); len]),
        }
    }

    /// A rank-0 array holding one element.
    pub fn from_scalar(value: Scalar) -> Self {
        Self {
            dtype: value.dtype(),
            shape: Shape::new(),
            offset: 0,
            storage: Arc::new(vec![value]),
        }
    }

    /// A window of `shape` over this array's storage, starting `offset`
    /// elements into this array. The result aliases `self`.
    pub fn view(&self, offset: usize, shape: &[usize]) -> Result<Self, ArrayError> {
        let len: usize = shape.iter().product();
        if offset + len > self.len() {
            return Err(ArrayError::ViewOutOfBounds {
                start: offset,
                end: offset + len,
                len: self.len(),
            });
        }
        Ok(Self {
            dtype: self.dtype,
            shape: Shape::from_slice(shape),
            offset: self.offset + offset,
            storage: Arc::clone(&self.storage),
        })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> &[Scalar] {
        &self.storage[self.element_range()]
    }

    /// Range of storage slots this array reads.
    pub fn element_range(&self) -> Range<usize> {
        self.offset..self.offset + self.len()
    }

    pub fn same_storage(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Conservative aliasing test: same storage and overlapping windows.
    /// Empty windows never alias.
    pub fn may_share_memory(&self, other: &Array) -> bool {
        if !self.same_storage(other) || self.is_empty() || other.is_empty() {
            return false;
        }
        let (a, b) = (self.element_range(), other.element_range());
        a.start < b.end && b.start < a.end
    }

    /// Element-wise conversion into a freshly allocated array.
    pub fn map_into(&self, dtype: DType, f: impl FnMut(&Scalar) -> Scalar) -> Self {
        let data: Vec<Scalar> = self.elements().iter().map(f).collect();
        Self {
            dtype,
            shape: self.shape.clone(),
            offset: 0,
            storage: Arc::new(data),
        }
    }

    /// Overwrites this array with `f` applied to `source`'s elements, keeping
    /// the allocation. Only possible when this handle is the sole owner of its
    /// storage; otherwise returns false and leaves `self` untouched.
    pub fn assign_mapped(
        &mut self,
        source: &Array,
        dtype: DType,
        f: impl FnMut(&Scalar) -> Scalar,
    ) -> bool {
        let Some(buffer) = Arc::get_mut(&mut self.storage) else {
            return false;
        };
        buffer.clear();
        buffer.extend(source.elements().iter().map(f));
        self.dtype = dtype;
        self.shape = source.shape.clone();
        self.offset = 0;
        true
    }

    /// Address of the storage allocation, for diagnostics.
    pub fn storage_addr(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }
}

/// Native equality: same dtype, same shape, element-wise equal.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.shape == other.shape
            && self.elements() == other.elements()
    }
}
