//! The type contract every graph value is checked against.
//!
//! A [`TypeDescriptor`] decides which raw values belong to a type, how they
//! are coerced into canonical form, and how two values or two types compare.
//! Descriptors are immutable and shared through [`TypeRef`] handles, so they
//! can be read from any number of threads without locking.

// Publicly export the primary components for use by other modules.
pub use self::array::{array_value, ArrayType};
pub use self::cast::{coerce_scalar, DowncastPolicy, FilterOptions};
pub use self::descriptor::{
    structural_eq, structural_hash, AsAny, FilterResult, ShapeInfo, TypeDescriptor, TypeOverrides,
    TypeRef,
};
pub use self::double::{double, DoubleType};
pub use self::error::{FilterError, FilterErrorKind, TypeError};
pub use self::intern::Interner;
pub use self::scalar::ScalarType;

// --- MODULE DECLARATIONS ---
mod array;
mod cast;
mod descriptor;
mod double;
mod error;
mod intern;
mod scalar;
