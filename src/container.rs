//! A typed storage cell holding the runtime value of one variable.
use crate::types::{FilterError, FilterOptions, TypeRef};
use crate::value::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContainerError {
    #[error("container '{0}' is read-only")]
    ReadOnly(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Every write goes through the type's filter, so the stored value is always
/// in canonical form. When the cell already holds storage and the type can
/// reuse it, `filter_inplace` is used instead of `filter`.
#[derive(Debug, Clone)]
pub struct Container {
    name: String,
    ty: TypeRef,
    storage: Option<Value>,
    pub options: FilterOptions,
    readonly: bool,
}

impl Container {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            storage: None,
            options: FilterOptions::default(),
            readonly: false,
        }
    }

    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Fills the container with `value`, filtered like any other write, and
    /// locks it against further `set` calls.
    pub fn readonly_with(mut self, value: Value) -> Result<Self, ContainerError> {
        self.set(value)?;
        self.readonly = true;
        Ok(self)
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Filters and stores `value`. On failure the previous value is kept.
    pub fn set(&mut self, value: Value) -> Result<(), ContainerError> {
        if self.readonly {
            return Err(ContainerError::ReadOnly(self.name.clone()));
        }
        let filtered = match self.storage.as_mut() {
            Some(previous) if self.ty.reuses_storage() => {
                self.ty.filter_inplace(value, previous, self.options)
            }
            _ => self.ty.filter(value, self.options),
        };
        let filtered = filtered.map_err(|e| {
            tracing::debug!(container = %self.name, ty = %self.ty, error = %e, "rejected value");
            e
        })?;
        self.storage = Some(filtered);
        Ok(())
    }

    /// Stores `value` without filtering it again; used for values that were
    /// produced by the graph itself and are known to be canonical.
    pub fn set_unchecked(&mut self, value: Value) {
        self.storage = Some(value);
    }

    pub fn get(&self) -> Option<&Value> {
        self.storage.as_ref()
    }

    pub fn take(&mut self) -> Option<Value> {
        self.storage.take()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }
}
