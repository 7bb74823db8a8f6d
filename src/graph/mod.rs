//! Variables and the graph that owns them.
pub mod dag;
pub mod error;
pub mod variable;

// Re-export key types for convenient access
pub use dag::{Apply, Graph};
pub use error::GraphError;
pub use variable::{ApplyId, Owner, Variable, VariableId};
