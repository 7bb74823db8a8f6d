//! Output and aliasing checks of a rewritten graph against a reference run.
use crate::types::TypeRef;
use crate::value::Value;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// One output computed twice: by the reference graph and by the rewritten one.
#[derive(Debug, Clone)]
pub struct OutputPair {
    pub ty: TypeRef,
    pub reference: Value,
    pub candidate: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// The rewritten graph computed a different value for this output.
    ValueMismatch { output: usize, ty: String, reference: String, candidate: String },
    /// An output may alias an input without being declared a view or a
    /// destructive update of it.
    IllegalAlias { output: usize, input: usize },
}

/// Declared aliasing: output position -> input positions it may share
/// storage with (views and in-place updates).
pub type AliasMap = HashMap<usize, HashSet<usize>>;

/// Cross-checks a rewritten graph against a reference run.
///
/// Only the contract's comparison and aliasing operations are used, so any
/// type implementing them can be checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self
    }

    /// Compares every pair with `values_eq_approx`, in parallel.
    pub fn compare_outputs(&self, pairs: &[OutputPair]) -> Vec<Violation> {
        let violations: Vec<Violation> = pairs
            .par_iter()
            .enumerate()
            .filter(|(_, pair)| !pair.ty.values_eq_approx(&pair.reference, &pair.candidate))
            .map(|(output, pair)| Violation::ValueMismatch {
                output,
                ty: pair.ty.to_string(),
                reference: pair.reference.to_string(),
                candidate: pair.candidate.to_string(),
            })
            .collect();
        for v in &violations {
            tracing::warn!(violation = ?v, "output differs from reference");
        }
        violations
    }

    /// Flags every output that `may_share_memory` with an input unless the
    /// pair is listed in `allowed`.
    pub fn check_aliasing(
        &self,
        inputs: &[(TypeRef, Value)],
        outputs: &[(TypeRef, Value)],
        allowed: &AliasMap,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (output, (ty, out_value)) in outputs.iter().enumerate() {
            for (input, (_, in_value)) in inputs.iter().enumerate() {
                let declared = allowed.get(&output).map_or(false, |s| s.contains(&input));
                if !declared && ty.may_share_memory(out_value, in_value) {
                    tracing::warn!(output, input, "undeclared aliasing between output and input");
                    violations.push(Violation::IllegalAlias { output, input });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{array_value, double, ArrayType, DowncastPolicy};
    use crate::value::{Array, DType};

    fn vector() -> TypeRef {
        TypeRef::new(ArrayType::with_policy(DType::Float64, &[false], DowncastPolicy::Deny))
    }

    #[test]
    fn test_rounding_noise_is_accepted() {
        let pairs = vec![
            OutputPair {
                ty: double(),
                reference: Value::from(0.3),
                candidate: Value::from(0.1 + 0.1 + 0.1),
            },
            OutputPair {
                ty: vector(),
                reference: array_value(DType::Float64, &[2], &[1.0, 2.0]).unwrap(),
                candidate: array_value(DType::Float64, &[2], &[1.0, 2.0 + 1e-12]).unwrap(),
            },
        ];
        assert!(ConsistencyChecker::new().compare_outputs(&pairs).is_empty());
    }

    #[test]
    fn test_wrong_result_is_reported() {
        let pairs = vec![
            OutputPair { ty: double(), reference: Value::from(1.0), candidate: Value::from(1.0) },
            OutputPair { ty: double(), reference: Value::from(1.0), candidate: Value::from(2.0) },
        ];
        let violations = ConsistencyChecker::new().compare_outputs(&pairs);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::ValueMismatch { output: 1, .. }));
    }

    #[test]
    fn test_undeclared_view_is_illegal() {
        let base = Array::from_f64(&[4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let inputs = vec![(vector(), Value::Array(base.clone()))];
        let outputs = vec![
            (vector(), Value::Array(base.view(1, &[2]).unwrap())),
            (vector(), Value::Array(Array::from_f64(&[2], vec![2.0, 3.0]).unwrap())),
        ];
        let checker = ConsistencyChecker::new();

        let violations = checker.check_aliasing(&inputs, &outputs, &AliasMap::new());
        assert_eq!(violations, vec![Violation::IllegalAlias { output: 0, input: 0 }]);

        let mut allowed = AliasMap::new();
        allowed.entry(0).or_default().insert(0);
        assert!(checker.check_aliasing(&inputs, &outputs, &allowed).is_empty());
    }
}
