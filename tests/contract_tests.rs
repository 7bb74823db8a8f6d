use rstest::rstest;
use symgraph_types::types::{array_value, TypeOverrides};
use symgraph_types::{
    double, register_transfer, resolve_transfer, Array, ArrayType, DType, DoubleType,
    DowncastPolicy,
    FilterErrorKind, FilterOptions, Scalar, ScalarType, TypeRef, Value,
};

fn shipped_types() -> Vec<TypeRef> {
    vec![
        double(),
        TypeRef::new(ScalarType::with_policy(DType::Int32, DowncastPolicy::Deny)),
        TypeRef::new(ScalarType::with_policy(DType::Float32, DowncastPolicy::WithinKind)),
        TypeRef::new(ArrayType::with_policy(DType::Float64, &[false], DowncastPolicy::Deny)),
        TypeRef::new(ArrayType::with_policy(DType::Int64, &[true, false], DowncastPolicy::Allow)),
    ]
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::from(3i64),
        Value::from(3.5),
        Value::from(f64::NAN),
        Value::from(0.1f32),
        Value::from(7i32),
        Value::from(true),
        Value::from("text"),
        Value::Array(Array::from_f64(&[3], vec![1.0, 2.5, f64::NAN]).unwrap()),
        Value::Array(Array::from_i64(&[1, 2], vec![4, 5]).unwrap()),
        Value::Array(Array::from_f32(&[2], vec![0.5, 1.5]).unwrap()),
    ]
}

#[test]
fn test_is_valid_value_matches_strict_filter() {
    for ty in shipped_types() {
        for value in sample_values() {
            let strict_ok = ty.filter(value.clone(), FilterOptions::STRICT).is_ok();
            assert_eq!(ty.is_valid_value(&value), strict_ok, "{} on {}", ty, value.describe());
        }
    }
}

#[test]
fn test_strict_filter_returns_native_values_unchanged() {
    for ty in shipped_types() {
        for value in sample_values() {
            match ty.filter(value.clone(), FilterOptions::STRICT) {
                Ok(out) => {
                    if let (Some(a), Some(b)) = (out.as_array(), value.as_array()) {
                        assert!(a.same_storage(b), "{} copied a native array", ty);
                    } else if !matches!(value.as_scalar(), Some(s) if s.is_nan()) {
                        assert_eq!(out, value);
                    }
                }
                Err(e) => {
                    let context = format!("{} on {}", ty, value.describe());
                    assert_eq!(e.kind(), FilterErrorKind::TypeMismatch, "{}", context)
                }
            }
        }
    }
}

#[test]
fn test_approx_equality_is_reflexive() {
    for ty in shipped_types() {
        for value in sample_values() {
            if let Ok(canonical) = ty.filter(value, FilterOptions::default().allow_downcast(true)) {
                let reflexive = ty.values_eq_approx(&canonical, &canonical);
                assert!(reflexive, "{} not reflexive on {}", ty, canonical);
            }
        }
    }
}

#[test]
fn test_explicit_downcast_always_coerces_numbers() {
    let ty = TypeRef::new(ScalarType::with_policy(DType::Int8, DowncastPolicy::Deny));
    let values = [Value::from(1e9), Value::from(-3.7), Value::from(f64::NAN), Value::from(1000i64)];
    for value in values {
        let out = ty.filter(value, FilterOptions::default().allow_downcast(true)).unwrap();
        assert_eq!(out.as_scalar().map(|s| s.dtype()), Some(DType::Int8));
    }
}

#[rstest]
#[case(Value::from(3i64), Some(true), Ok(3.0))]
#[case(Value::from(3i64), Some(false), Ok(3.0))]
#[case(Value::from(3i64), None, Ok(3.0))]
#[case(Value::from(0.25f32), Some(false), Ok(0.25))]
#[case(Value::from("3"), Some(true), Err(FilterErrorKind::IncompatibleValue))]
fn test_double_scenario(
    #[case] value: Value,
    #[case] allow_downcast: Option<bool>,
    #[case] expected: Result<f64, FilterErrorKind>,
) {
    let opts = FilterOptions { strict: false, allow_downcast };
    let result = double().filter(value, opts).map_err(|e| e.kind());
    assert_eq!(result, expected.map(Value::from));
}

#[test]
fn test_double_strict_rejects_integer() {
    let err = double().filter(Value::from(3i64), FilterOptions::STRICT).unwrap_err();
    assert_eq!(err.kind(), FilterErrorKind::TypeMismatch);
}

#[test]
fn test_fractional_float_to_integer_requires_downcast() {
    let int = TypeRef::new(ScalarType::with_policy(DType::Int64, DowncastPolicy::Deny));
    let denied = int.filter(Value::from(3.5), FilterOptions::default().allow_downcast(false));
    assert_eq!(denied.unwrap_err().kind(), FilterErrorKind::PrecisionLoss);
    let unset = int.filter(Value::from(3.5), FilterOptions::default());
    assert_eq!(unset.unwrap_err().kind(), FilterErrorKind::PrecisionLoss);
    let whole = int.filter(Value::from(3.0), FilterOptions::default().allow_downcast(false));
    assert_eq!(whole, Ok(Value::Scalar(Scalar::Int64(3))));
}

#[test]
fn test_approx_sum_of_tenths() {
    let sum = Value::from(0.1 + 0.1 + 0.1);
    let target = Value::from(0.3);
    assert!(!double().values_eq(&sum, &target));
    assert!(double().values_eq_approx(&sum, &target));
    assert!(TypeRef::new(DoubleType::with_tolerance(1e-18)).values_eq_approx(&sum, &sum));
}

#[test]
fn test_identity_versus_structural_equality() {
    // Identity equality: separate instances never compare equal.
    assert_ne!(TypeRef::new(DoubleType::new()), TypeRef::new(DoubleType::new()));
    assert_eq!(double(), double());

    // Structural equality: separate instances with equal parameters do.
    let row = || ArrayType::with_policy(DType::Float32, &[true, false], DowncastPolicy::Deny);
    let a = TypeRef::new(row());
    let b = TypeRef::new(row());
    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);

    // Same parameters, different families.
    let scalar = TypeRef::new(ScalarType::with_policy(DType::Float32, DowncastPolicy::Deny));
    let rank0 = TypeRef::new(ArrayType::with_policy(DType::Float32, &[], DowncastPolicy::Deny));
    assert_ne!(scalar, rank0);
}

#[test]
fn test_clone_with_is_not_supported_by_double() {
    assert!(double().clone_with(&TypeOverrides::default()).is_err());
}

#[test]
fn test_global_transfer_order() {
    let target = "contract-test-device";
    register_transfer(|_, _| None);
    let expected = double().make_variable(Some("transferred"));
    let returned = expected.clone();
    register_transfer(move |_, t| (t == target).then(|| returned.clone()));

    let resolved = resolve_transfer(&double().var(), target).unwrap();
    assert_eq!(resolved, expected);
    assert!(resolve_transfer(&double().var(), "unregistered-target").is_none());
}

#[test]
fn test_descriptors_are_shared_across_threads() {
    let ty = TypeRef::new(ArrayType::with_policy(DType::Float64, &[false], DowncastPolicy::Deny));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ty = ty.clone();
            std::thread::spawn(move || {
                let value = array_value(DType::Int64, &[2], &[i as f64, 1.0]).unwrap();
                ty.filter(value, FilterOptions::default()).unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().unwrap();
        assert_eq!(out, array_value(DType::Float64, &[2], &[i as f64, 1.0]).unwrap());
    }
}
