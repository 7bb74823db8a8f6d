//! Defines the `Variable`, a typed data-flow node of the graph.
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a variable. Clones of a `Variable` share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub u64);

impl VariableId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Index of an `Apply` node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApplyId(pub(crate) petgraph::stable_graph::NodeIndex);

/// Which operation produced a variable, and at which output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner {
    pub apply: ApplyId,
    pub index: usize,
}

/// A node of the graph carrying exactly one type for its whole lifetime.
///
/// Equality and hashing use the identity only; the name is diagnostic.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VariableId,
    ty: TypeRef,
    name: Option<String>,
    owner: Option<Owner>,
}

impl Variable {
    pub(crate) fn new(ty: TypeRef, name: Option<String>) -> Self {
        Self {
            id: VariableId::next(),
            ty,
            name,
            owner: None,
        }
    }

    pub(crate) fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<{}>", self.ty),
        }
    }
}
