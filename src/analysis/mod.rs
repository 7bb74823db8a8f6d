//! Consumers of the type contract used while debugging a graph: memory
//! profiling and consistency checking of rewritten graphs.
pub mod consistency;
pub mod memory;

pub use consistency::{AliasMap, ConsistencyChecker, OutputPair, Violation};
pub use memory::{MemoryEntry, MemoryProfiler, MemoryReport};
