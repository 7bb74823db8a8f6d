//! Defines the error types for the type contract.
use thiserror::Error;

/// The category of a filtering failure.
///
/// Lets callers branch on the failure without matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterErrorKind {
    /// `strict` was requested and the value is not already in native form.
    TypeMismatch,
    /// The coercion loses information and downcasting was not permitted.
    PrecisionLoss,
    /// The value cannot be read as this type at all.
    IncompatibleValue,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("type mismatch: {ty} expects {expected} in strict mode, got {got}")]
    TypeMismatch { ty: String, expected: String, got: String },
    #[error("precision loss: casting {value} ({from}) to {ty} loses information")]
    PrecisionLoss { ty: String, from: String, value: String },
    #[error("incompatible value for {ty}: {reason}")]
    IncompatibleValue { ty: String, reason: String },
}

impl FilterError {
    pub fn kind(&self) -> FilterErrorKind {
        match self {
            FilterError::TypeMismatch { .. } => FilterErrorKind::TypeMismatch,
            FilterError::PrecisionLoss { .. } => FilterErrorKind::PrecisionLoss,
            FilterError::IncompatibleValue { .. } => FilterErrorKind::IncompatibleValue,
        }
    }

    pub fn incompatible(ty: impl ToString, reason: impl Into<String>) -> Self {
        FilterError::IncompatibleValue { ty: ty.to_string(), reason: reason.into() }
    }
}

/// Errors from operations on descriptors themselves rather than on values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("{ty} is not a parametrized type family and cannot be cloned with overrides")]
    NotParametrized { ty: String },
    #[error("invalid override for {ty}: {reason}")]
    InvalidOverride { ty: String, reason: String },
}
