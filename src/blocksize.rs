//! Recursion and leaf-size thresholds for blocked algorithms
//!
//! A `Blocksize` is an immutable descriptor shared read-only by many
//! control nodes (via `Arc`). One threshold exists per operand role: the
//! row and column extents of the two principal operands plus the inner
//! (accumulation) dimension, and a remainder threshold for square
//! recursions.

/// Partition-width thresholds, one per operand role
///
/// Blocked variant bodies pick the threshold matching the dimension they
/// walk: `m` for the row dimension of the output, `n` for its column
/// dimension, `k` for the inner dimension of multiply-accumulate
/// operations, and `r` for square recursions (factorizations).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Blocksize {
    m: usize,
    n: usize,
    k: usize,
    r: usize,
}

impl Blocksize {
    /// Default thresholds used by the standard control trees
    pub const DEFAULT: Self = Self {
        m: 128,
        n: 128,
        k: 128,
        r: 128,
    };

    /// Create a blocksize with explicit per-role thresholds
    ///
    /// All thresholds must be nonzero.
    pub fn new(m: usize, n: usize, k: usize, r: usize) -> Self {
        assert!(
            m > 0 && n > 0 && k > 0 && r > 0,
            "blocksize thresholds must be nonzero"
        );
        Self { m, n, k, r }
    }

    /// Create a blocksize with the same threshold for every role
    pub fn uniform(b: usize) -> Self {
        Self::new(b, b, b, b)
    }

    /// Row-dimension threshold
    #[inline]
    pub fn m(&self) -> usize {
        self.m
    }

    /// Column-dimension threshold
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Inner-dimension threshold
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Square-recursion threshold
    #[inline]
    pub fn r(&self) -> usize {
        self.r
    }
}

impl Default for Blocksize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform() {
        let bs = Blocksize::uniform(32);
        assert_eq!(bs.m(), 32);
        assert_eq!(bs.n(), 32);
        assert_eq!(bs.k(), 32);
        assert_eq!(bs.r(), 32);
    }

    #[test]
    #[should_panic(expected = "nonzero")]
    fn test_zero_threshold_panics() {
        let _ = Blocksize::new(0, 1, 1, 1);
    }
}
