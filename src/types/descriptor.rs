//! The `TypeDescriptor` contract and the shared `TypeRef` handle.
use super::cast::{DowncastPolicy, FilterOptions};
use super::error::{FilterError, TypeError};
use crate::graph::Variable;
use crate::value::{DType, Shape, Value};
use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

pub type FilterResult = Result<Value, FilterError>;

/// Upcast to `Any` so descriptors can compare against concrete siblings.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Data-only footprint description of a runtime value, captured cheaply on
/// the hot path and turned into bytes later by [`TypeDescriptor::get_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeInfo {
    Scalar(DType),
    Array { dtype: DType, shape: Shape },
}

/// Structural parameters to replace when deriving a sibling type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeOverrides {
    pub dtype: Option<DType>,
    pub broadcastable: Option<Vec<bool>>,
    pub policy: Option<DowncastPolicy>,
}

/// The static contract a graph value must satisfy.
///
/// `filter` is the only mandatory operation. Every other method has a default
/// derived from it or from native value equality. Implementations must be
/// immutable once constructed: equality and hash may not change over the
/// lifetime of an instance, and nothing here takes `&mut self`.
pub trait TypeDescriptor: AsAny + fmt::Debug + fmt::Display + Send + Sync {
    /// Checks `value` against this type and returns its canonical form.
    ///
    /// In strict mode a value already in native form comes back unchanged and
    /// anything else is a `TypeMismatch`. Otherwise lossless coercions are
    /// performed and lossy ones follow `opts.allow_downcast`.
    fn filter(&self, value: Value, opts: FilterOptions) -> FilterResult;

    /// Same casting rules as `filter`, but may write the result into the
    /// memory held by `storage`. On failure `storage` is left untouched. The
    /// caller must not share `storage` with another thread during the call.
    fn filter_inplace(
        &self,
        value: Value,
        storage: &mut Value,
        opts: FilterOptions,
    ) -> FilterResult {
        let _ = storage;
        self.filter(value, opts)
    }

    /// Whether `filter_inplace` actually reuses storage. Callers holding
    /// reusable storage prefer it when this is true.
    fn reuses_storage(&self) -> bool {
        false
    }

    fn is_valid_value(&self, value: &Value) -> bool {
        self.filter(value.clone(), FilterOptions::STRICT).is_ok()
    }

    fn values_eq(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    /// Tolerant comparison used by consistency checking only.
    fn values_eq_approx(&self, a: &Value, b: &Value) -> bool {
        self.values_eq(a, b)
    }

    /// Descriptor equality. Defaults to instance identity, so two separately
    /// constructed descriptors differ even with identical parameters.
    fn type_eq(&self, other: &dyn TypeDescriptor) -> bool {
        instance_addr(self.as_any()) == instance_addr(other.as_any())
    }

    /// Must agree with `type_eq`: equal descriptors hash identically.
    fn type_hash(&self) -> u64 {
        instance_addr(self.as_any()) as u64
    }

    fn get_shape_info(&self, _value: &Value) -> Option<ShapeInfo> {
        None
    }

    fn get_size(&self, _info: &ShapeInfo) -> Option<usize> {
        None
    }

    fn clone_with(&self, _overrides: &TypeOverrides) -> Result<TypeRef, TypeError> {
        Err(TypeError::NotParametrized { ty: self.to_string() })
    }

    /// True unless `a` and `b` provably use distinct storage.
    fn may_share_memory(&self, a: &Value, b: &Value) -> bool {
        a.may_share_memory(b)
    }
}

fn instance_addr(any: &dyn Any) -> usize {
    any as *const dyn Any as *const () as usize
}

/// Equality over parameters for types that derive `PartialEq`.
pub fn structural_eq<T>(this: &T, other: &dyn TypeDescriptor) -> bool
where
    T: TypeDescriptor + PartialEq + 'static,
{
    other.as_any().downcast_ref::<T>().map_or(false, |o| o == this)
}

/// Hash over parameters, salted with the concrete type so that different
/// families with equal parameters do not collide on purpose.
pub fn structural_hash<T: Hash + 'static>(this: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    TypeId::of::<T>().hash(&mut hasher);
    this.hash(&mut hasher);
    hasher.finish()
}

/// Shared handle to a descriptor. Variables hold one of these; comparing
/// two handles goes through `type_eq`.
#[derive(Clone)]
pub struct TypeRef(Arc<dyn TypeDescriptor>);

impl TypeRef {
    pub fn new<T: TypeDescriptor + 'static>(descriptor: T) -> Self {
        Self(Arc::new(descriptor))
    }

    /// Creates a graph node typed by this descriptor.
    pub fn make_variable(&self, name: Option<&str>) -> Variable {
        Variable::new(self.clone(), name.map(str::to_string))
    }

    /// Shorthand for an unnamed `make_variable`.
    pub fn var(&self) -> Variable {
        self.make_variable(None)
    }

    pub fn downcast_ref<T: TypeDescriptor + 'static>(&self) -> Option<&T> {
        // Deref first: the Arc itself is `Any` too.
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &TypeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for TypeRef {
    type Target = dyn TypeDescriptor;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_eq(&*other.0)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.type_hash());
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}
