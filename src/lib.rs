//! Type contract for symbolic computation graphs.
//!
//! Every value entering or leaving a graph passes through a
//! [`TypeDescriptor`]: it is validated and coerced by `filter`, compared with
//! `values_eq`/`values_eq_approx`, and checked for aliasing with
//! `may_share_memory`. Graph nodes ([`Variable`]) each carry exactly one
//! descriptor for their whole lifetime.

pub mod analysis;
pub mod config;
pub mod container;
pub mod graph;
pub mod transfer;
pub mod types;
pub mod value;

pub use container::{Container, ContainerError};
pub use graph::{Graph, GraphError, Variable, VariableId};
pub use transfer::{
    register_transfer, resolve_transfer, resolve_transfer_or_err, TransferError, TransferRegistry,
};
pub use types::{
    double, ArrayType, DoubleType, DowncastPolicy, FilterError, FilterErrorKind, FilterOptions,
    ScalarType, TypeDescriptor, TypeRef,
};
pub use value::{Array, DType, Scalar, Value};
