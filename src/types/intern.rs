//! Canonical instances: one shared `TypeRef` per distinct parameter set.
use super::descriptor::{TypeDescriptor, TypeRef};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Hands out a single canonical descriptor per parameter set, so identity
/// comparison between interned handles is always safe.
#[derive(Debug, Default)]
pub struct Interner<T> {
    table: Mutex<HashMap<T, TypeRef>>,
}

impl<T> Interner<T>
where
    T: TypeDescriptor + Eq + Hash + Clone + 'static,
{
    pub fn new() -> Self {
        Self { table: Mutex::new(HashMap::new()) }
    }

    pub fn intern(&self, descriptor: T) -> TypeRef {
        let mut table = self.table.lock();
        if let Some(existing) = table.get(&descriptor) {
            return existing.clone();
        }
        tracing::trace!(ty = %descriptor, "interning type descriptor");
        let handle = TypeRef::new(descriptor.clone());
        table.insert(descriptor, handle.clone());
        handle
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
