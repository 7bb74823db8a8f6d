//! Data-footprint profiling of the values a graph produces.
use crate::graph::{Variable, VariableId};
use crate::types::{ShapeInfo, TypeRef};
use crate::value::Value;
use serde::Serialize;

/// One captured sample: cheap shape info now, bytes computed at report time.
#[derive(Debug, Clone)]
struct Sample {
    variable: VariableId,
    name: Option<String>,
    ty: TypeRef,
    info: Option<ShapeInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub variable: VariableId,
    pub name: Option<String>,
    pub type_name: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryReport {
    pub entries: Vec<MemoryEntry>,
    pub total_bytes: usize,
    /// Values whose type does not implement the profiling hooks.
    pub unsized_values: usize,
}

impl MemoryReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Records the data footprint of values produced while a graph runs.
///
/// `record` sits on the execution path and only calls `get_shape_info`;
/// `report` runs afterwards and is where `get_size` is paid for.
#[derive(Debug, Default)]
pub struct MemoryProfiler {
    samples: Vec<Sample>,
}

impl MemoryProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, variable: &Variable, value: &Value) {
        let info = variable.ty().get_shape_info(value);
        self.samples.push(Sample {
            variable: variable.id(),
            name: variable.name().map(str::to_string),
            ty: variable.ty().clone(),
            info,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn report(&self) -> MemoryReport {
        let mut entries = Vec::with_capacity(self.samples.len());
        let mut unsized_values = 0;
        for sample in &self.samples {
            let bytes = sample.info.as_ref().and_then(|info| sample.ty.get_size(info));
            match bytes {
                Some(bytes) => entries.push(MemoryEntry {
                    variable: sample.variable,
                    name: sample.name.clone(),
                    type_name: sample.ty.to_string(),
                    bytes,
                }),
                None => unsized_values += 1,
            }
        }
        let total_bytes = entries.iter().map(|e| e.bytes).sum();
        MemoryReport { entries, total_bytes, unsized_values }
    }
}
