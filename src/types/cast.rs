//! Casting options and the downcast decision shared by every concrete type.
use super::error::FilterError;
use crate::value::{cast_is_lossless, DType, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named arguments of `filter`.
///
/// `FilterOptions::default()` is the non-strict call with `allow_downcast`
/// unset, leaving lossy coercions to the type's [`DowncastPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub strict: bool,
    pub allow_downcast: Option<bool>,
}

impl FilterOptions {
    pub const STRICT: FilterOptions = FilterOptions { strict: true, allow_downcast: None };

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn allow_downcast(mut self, allow: bool) -> Self {
        self.allow_downcast = Some(allow);
        self
    }
}

/// What a type does with a lossy coercion when `allow_downcast` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DowncastPolicy {
    /// Unset behaves like `allow_downcast = false`.
    #[default]
    Deny,
    /// Unset behaves like `allow_downcast = true`.
    Allow,
    /// Unset allows lossy coercion between two float kinds only.
    WithinKind,
}

impl DowncastPolicy {
    pub fn permits(&self, from: DType, to: DType) -> bool {
        match self {
            DowncastPolicy::Deny => false,
            DowncastPolicy::Allow => true,
            DowncastPolicy::WithinKind => from.is_float() && to.is_float(),
        }
    }
}

/// Coerces one element to `target` under the non-strict casting rules.
///
/// Lossless coercions always succeed. A lossy one succeeds when
/// `allow_downcast` is `Some(true)`, fails when it is `Some(false)`, and
/// defers to `policy` when it is `None`.
pub fn coerce_scalar(
    ty: &dyn fmt::Display,
    value: Scalar,
    target: DType,
    allow_downcast: Option<bool>,
    policy: DowncastPolicy,
) -> Result<Scalar, FilterError> {
    let converted = value.cast(target);
    if value.dtype() == target || cast_is_lossless(value, converted) {
        return Ok(converted);
    }
    let allowed = allow_downcast.unwrap_or_else(|| policy.permits(value.dtype(), target));
    if allowed {
        Ok(converted)
    } else {
        Err(FilterError::PrecisionLoss {
            ty: ty.to_string(),
            from: value.dtype().to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterErrorKind;
    use rstest::rstest;

    const TY: &str = "test";

    #[rstest]
    #[case(Some(true), DowncastPolicy::Deny, true)]
    #[case(Some(false), DowncastPolicy::Allow, false)]
    #[case(None, DowncastPolicy::Deny, false)]
    #[case(None, DowncastPolicy::Allow, true)]
    #[case(None, DowncastPolicy::WithinKind, true)]
    fn test_lossy_float_narrowing(
        #[case] allow: Option<bool>,
        #[case] policy: DowncastPolicy,
        #[case] succeeds: bool,
    ) {
        let result = coerce_scalar(&TY, Scalar::Float64(0.1), DType::Float32, allow, policy);
        assert_eq!(result.is_ok(), succeeds);
        if let Err(e) = result {
            assert_eq!(e.kind(), FilterErrorKind::PrecisionLoss);
        }
    }

    #[test]
    fn test_within_kind_still_denies_truncation() {
        let policy = DowncastPolicy::WithinKind;
        let result = coerce_scalar(&TY, Scalar::Float64(3.5), DType::Int64, None, policy);
        assert_eq!(result.unwrap_err().kind(), FilterErrorKind::PrecisionLoss);
    }

    #[test]
    fn test_lossless_ignores_deny() {
        let policy = DowncastPolicy::Deny;
        let result = coerce_scalar(&TY, Scalar::Int64(3), DType::Float64, Some(false), policy);
        assert_eq!(result, Ok(Scalar::Float64(3.0)));
    }

    #[test]
    fn test_explicit_allow_performs_truncation() {
        let policy = DowncastPolicy::Deny;
        let result = coerce_scalar(&TY, Scalar::Float64(3.5), DType::Int64, Some(true), policy);
        assert_eq!(result, Ok(Scalar::Int64(3)));
    }

    #[test]
    fn test_options_builder() {
        let opts = FilterOptions::default().allow_downcast(false);
        assert!(!opts.strict);
        assert_eq!(opts.allow_downcast, Some(false));
        assert_eq!(FilterOptions::default().strict(), FilterOptions::STRICT);
    }
}
