//! Pluggable resolution of "move this variable to another target".
//!
//! Transfer functions are tried in registration order and the first one that
//! returns a variable wins. Registration is append-only and is expected to
//! happen during startup, before graphs are built concurrently.
use crate::graph::{Variable, VariableId};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

/// A transfer function: `None` means it cannot move this variable to `target`.
pub type TransferFn = Arc<dyn Fn(&Variable, &str) -> Option<Variable> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("no registered transfer can move {variable} to target '{target}'")]
    NoTransferAvailable { variable: VariableId, target: String },
}

/// Ordered, append-only list of transfer functions.
///
/// Appends publish a new snapshot under a write lock; lookups clone the
/// current snapshot and run without holding any lock, so a transfer function
/// may itself resolve or register.
#[derive(Default)]
pub struct TransferRegistry {
    entries: RwLock<Arc<Vec<TransferFn>>>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, transfer: F)
    where
        F: Fn(&Variable, &str) -> Option<Variable> + Send + Sync + 'static,
    {
        let mut entries = self.entries.write();
        let mut next = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().cloned());
        next.push(Arc::new(transfer) as TransferFn);
        *entries = Arc::new(next);
        tracing::debug!(count = entries.len(), "registered transfer function");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the first result produced by a registered function, or `None`
    /// when none of them can perform the transfer.
    pub fn resolve(&self, variable: &Variable, target: &str) -> Option<Variable> {
        let snapshot = Arc::clone(&*self.entries.read());
        let resolved = snapshot.iter().enumerate().find_map(|(position, transfer)| {
            transfer(variable, target).map(|moved| (position, moved))
        });
        match resolved {
            Some((position, moved)) => {
                tracing::trace!(
                    variable = %variable.id(),
                    to = target,
                    position,
                    "resolved transfer"
                );
                Some(moved)
            }
            None => {
                tracing::debug!(variable = %variable.id(), to = target, "no transfer available");
                None
            }
        }
    }

    /// Like [`TransferRegistry::resolve`], treating absence as an error.
    pub fn resolve_or_err(
        &self,
        variable: &Variable,
        target: &str,
    ) -> Result<Variable, TransferError> {
        self.resolve(variable, target).ok_or_else(|| TransferError::NoTransferAvailable {
            variable: variable.id(),
            target: target.to_string(),
        })
    }
}

impl std::fmt::Debug for TransferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRegistry").field("entries", &self.len()).finish()
    }
}

static GLOBAL: Lazy<TransferRegistry> = Lazy::new(TransferRegistry::new);

/// The process-wide registry used by the free functions below.
pub fn global() -> &'static TransferRegistry {
    &GLOBAL
}

/// Registers `transfer` in the process-wide registry.
pub fn register_transfer<F>(transfer: F)
where
    F: Fn(&Variable, &str) -> Option<Variable> + Send + Sync + 'static,
{
    GLOBAL.register(transfer);
}

pub fn resolve_transfer(variable: &Variable, target: &str) -> Option<Variable> {
    GLOBAL.resolve(variable, target)
}

pub fn resolve_transfer_or_err(
    variable: &Variable,
    target: &str,
) -> Result<Variable, TransferError> {
    GLOBAL.resolve_or_err(variable, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{double, ArrayType, DowncastPolicy, TypeRef};
    use crate::value::DType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_non_absent_result_wins() {
        let registry = TransferRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        registry.register(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            None
        });
        let moved = double().make_variable(Some("on_device"));
        let expected = moved.clone();
        registry.register(move |_, _| Some(moved.clone()));
        registry.register(|_, _| Some(double().make_variable(Some("never"))));

        let resolved = registry.resolve(&double().var(), "device").unwrap();
        assert_eq!(resolved, expected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absent_when_nothing_applies() {
        let registry = TransferRegistry::new();
        registry.register(|_, target| (target == "gpu").then(|| double().var()));

        let x = double().var();
        assert!(registry.resolve(&x, "tpu").is_none());
        assert_eq!(
            registry.resolve_or_err(&x, "tpu"),
            Err(TransferError::NoTransferAvailable { variable: x.id(), target: "tpu".into() })
        );
        assert!(registry.resolve(&x, "gpu").is_some());
    }

    #[test]
    fn test_transfer_may_change_type() {
        fn vector(dtype: DType) -> TypeRef {
            TypeRef::new(ArrayType::with_policy(dtype, &[false], DowncastPolicy::Deny))
        }
        let registry = TransferRegistry::new();
        let single = vector(DType::Float32);
        let target_ty = single.clone();
        registry.register(move |v, target| {
            let is_array = v.ty().downcast_ref::<ArrayType>().is_some();
            (target == "f32" && is_array).then(|| target_ty.var())
        });

        let double_vec = vector(DType::Float64);
        let moved = registry.resolve(&double_vec.var(), "f32").unwrap();
        assert_eq!(moved.ty(), &single);
        assert!(registry.resolve(&double().var(), "f32").is_none());
    }

    #[test]
    fn test_transfer_can_reenter_registry() {
        let registry = Arc::new(TransferRegistry::new());
        registry.register(|_, target| (target == "inner").then(|| double().var()));
        let inner = Arc::clone(&registry);
        registry.register(move |v, target| {
            if target == "outer" {
                inner.resolve(v, "inner")
            } else {
                None
            }
        });

        assert!(registry.resolve(&double().var(), "outer").is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_registration_keeps_every_entry() {
        let registry = Arc::new(TransferRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(|_, _| None))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
