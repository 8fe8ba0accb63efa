//! Element types for operand buffers
//!
//! The runtime core is generic over the element type of the matrices it
//! schedules. `DType` is the runtime tag, `Element` connects Rust's type
//! system to it. The reference kernels are real-valued, so only `f32` and
//! `f64` are supported.

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Runtime element-type tag
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit IEEE float
    F32,
    /// 64-bit IEEE float
    F64,
}

impl DType {
    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

/// Trait for types that can be elements of an operand buffer
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - basic requirements for sharing
///   operand views across worker threads
/// - `Pod + Zeroable` - safe zero-initialization and byte-level access
/// - `Add + Sub + Mul + Div` - arithmetic used by the reference kernels
/// - `PartialOrd` - positivity tests in the factorization kernels
///
/// Operations without a direct operator (negation, square root) go through
/// `to_f64`/`from_f64`.
pub trait Element:
    Copy
    + Send
    + Sync
    + Pod
    + Zeroable
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
    }

    #[test]
    fn test_element_roundtrip() {
        assert_eq!(f32::from_f64(1.5f32.to_f64()), 1.5f32);
        assert_eq!(f64::from_f64(2.25f64.to_f64()), 2.25f64);
        assert_eq!(f64::zero() + f64::one(), 1.0);
    }
}
