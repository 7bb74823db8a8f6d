//! A single native element and the coercions between element kinds.
use super::dtype::DType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

// Float sources saturate (NaN becomes 0), integer sources wrap, bools map to 0/1.
macro_rules! cast_int {
    ($src:expr, $t:ty) => {
        match $src {
            Scalar::Float32(f) => f as $t,
            Scalar::Float64(f) => f as $t,
            other => other.as_i64() as $t,
        }
    };
}

impl Scalar {
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int8(_) => DType::Int8,
            Scalar::Int16(_) => DType::Int16,
            Scalar::Int32(_) => DType::Int32,
            Scalar::Int64(_) => DType::Int64,
            Scalar::Float32(_) => DType::Float32,
            Scalar::Float64(_) => DType::Float64,
        }
    }

    /// The zero of a given element kind.
    pub fn zero(dtype: DType) -> Self {
        Scalar::Int64(0).cast(dtype)
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Scalar::Float32(f) => f.is_nan(),
            Scalar::Float64(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Scalar::Float32(f) => f as f64,
            Scalar::Float64(f) => f,
            other => other.as_i64() as f64,
        }
    }

    fn float_value(&self) -> Option<f64> {
        match *self {
            Scalar::Float32(f) => Some(f as f64),
            Scalar::Float64(f) => Some(f),
            _ => None,
        }
    }

    /// Integer view of the value. Floats truncate toward zero and saturate.
    fn as_i64(&self) -> i64 {
        match *self {
            Scalar::Bool(b) => b as i64,
            Scalar::Int8(i) => i as i64,
            Scalar::Int16(i) => i as i64,
            Scalar::Int32(i) => i as i64,
            Scalar::Int64(i) => i,
            Scalar::Float32(f) => f as i64,
            Scalar::Float64(f) => f as i64,
        }
    }

    fn is_nonzero(&self) -> bool {
        match *self {
            Scalar::Bool(b) => b,
            Scalar::Float32(f) => f != 0.0,
            Scalar::Float64(f) => f != 0.0,
            other => other.as_i64() != 0,
        }
    }

    /// Converts to `to`, always producing a value. Whether information was
    /// lost is answered separately by [`cast_is_lossless`].
    pub fn cast(self, to: DType) -> Scalar {
        match to {
            DType::Bool => Scalar::Bool(self.is_nonzero()),
            DType::Int8 => Scalar::Int8(cast_int!(self, i8)),
            DType::Int16 => Scalar::Int16(cast_int!(self, i16)),
            DType::Int32 => Scalar::Int32(cast_int!(self, i32)),
            DType::Int64 => Scalar::Int64(cast_int!(self, i64)),
            DType::Float32 => Scalar::Float32(match self {
                Scalar::Float32(f) => f,
                Scalar::Float64(f) => f as f32,
                other => other.as_i64() as f32,
            }),
            DType::Float64 => Scalar::Float64(self.to_f64()),
        }
    }
}

/// True when `converted` carries the same information as `source`: casting it
/// back to the source kind yields a value equal to the source under the
/// source's native equality. NaN surviving the round trip counts as lossless.
///
/// Float-to-integer casts saturate, so a float outside the integer range
/// would round-trip onto the clamped bound. Whichever side of the pair is the
/// float must therefore fit the integer side before the round trip counts.
pub fn cast_is_lossless(source: Scalar, converted: Scalar) -> bool {
    let in_range = match (source.float_value(), converted.float_value()) {
        (Some(f), None) => fits_integer(f, converted.dtype()),
        (None, Some(f)) => fits_integer(f, source.dtype()),
        _ => true,
    };
    if !in_range {
        return false;
    }
    let back = converted.cast(source.dtype());
    back == source || (source.is_nan() && back.is_nan())
}

/// NaN and infinities never fit. Non-integer kinds accept anything.
fn fits_integer(value: f64, dtype: DType) -> bool {
    match dtype.integer_bounds() {
        Some((min, end)) => value >= min && value < end,
        None => true,
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int8(i) => write!(f, "{}", i),
            Scalar::Int16(i) => write!(f, "{}", i),
            Scalar::Int32(i) => write!(f, "{}", i),
            Scalar::Int64(i) => write!(f, "{}", i),
            Scalar::Float32(x) => write!(f, "{:?}", x),
            Scalar::Float64(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float64(v)
    }
}
