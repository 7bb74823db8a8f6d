//! Defines the error types for the graph module.
use super::variable::VariableId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown variable {0}")]
    UnknownVariable(VariableId),
    #[error("variable {0} is already part of the graph")]
    DuplicateVariable(VariableId),
    #[error("variable {0} already has an owner and cannot be added as an input")]
    AlreadyOwned(VariableId),
    #[error("cannot replace {old} ({old_ty}) with {new} ({new_ty}): types differ")]
    TypeMismatch {
        old: VariableId,
        new: VariableId,
        old_ty: String,
        new_ty: String,
    },
    #[error("replacing {old} with {new} would create a cycle")]
    WouldCycle { old: VariableId, new: VariableId },
    #[error("cycle detected in graph")]
    Cycle,
}
