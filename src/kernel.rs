//! Reference leaf kernels
//!
//! These are the numeric bodies the dispatcher bottoms out in. Each
//! kernel touches only the operand views it is handed - the dependency
//! analyzer's correctness relies on that contract - and reports failure
//! through its return status rather than by panicking.
//!
//! All kernels work on flat row-major views. The gemm kernel parallelizes
//! over output rows with rayon when the block is large enough; every
//! output element is still produced by exactly one thread with a fixed
//! accumulation order, so results do not depend on the thread count.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::operand::Matrix;

/// Transposition of a multiply operand
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Trans {
    /// Use the operand as stored
    NoTrans,
    /// Use the operand's transpose
    Trans,
}

/// Which side a triangular factor is applied from
///
/// `Left` solves `L X = alpha B`; `Right` solves `X L^T = alpha B`. The
/// factor is lower triangular with a nonunit diagonal in both cases.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// Factor on the left, untransposed
    Left,
    /// Factor on the right, transposed
    Right,
}

/// Row count above which the gemm kernel parallelizes
#[cfg(feature = "rayon")]
const GEMM_PAR_ROWS: usize = 64;

/// A := alpha * A
///
/// # Safety
///
/// The view must honor the crate's aliasing discipline: no concurrent
/// kernel may touch an overlapping region.
pub(crate) unsafe fn scal<T: Element>(alpha: T, a: &Matrix<T>) {
    if alpha == T::one() {
        return;
    }
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            let p = a.ptr_at(i, j);
            *p = alpha * *p;
        }
    }
}

/// C := alpha * op(A) * op(B) + beta * C
///
/// Inner dimension zero degenerates to C := beta * C.
///
/// # Safety
///
/// As [`scal`]; additionally `c` must not overlap `a` or `b`.
pub(crate) unsafe fn gemm<T: Element>(
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: &Matrix<T>,
    b: &Matrix<T>,
    beta: T,
    c: &Matrix<T>,
) {
    let m = c.rows();
    let n = c.cols();
    let k = match transa {
        Trans::NoTrans => a.cols(),
        Trans::Trans => a.rows(),
    };

    // Safety: each row of C is written by exactly one invocation, and the
    // reads of A/B are shared.
    let row_body = |i: usize| unsafe {
        for j in 0..n {
            let mut acc = T::zero();
            for p in 0..k {
                let aip = match transa {
                    Trans::NoTrans => *a.ptr_at(i, p),
                    Trans::Trans => *a.ptr_at(p, i),
                };
                let bpj = match transb {
                    Trans::NoTrans => *b.ptr_at(p, j),
                    Trans::Trans => *b.ptr_at(j, p),
                };
                acc = acc + aip * bpj;
            }
            let cp = c.ptr_at(i, j);
            *cp = alpha * acc + beta * *cp;
        }
    };

    #[cfg(feature = "rayon")]
    if m >= GEMM_PAR_ROWS {
        use rayon::prelude::*;
        (0..m).into_par_iter().for_each(row_body);
        return;
    }

    for i in 0..m {
        row_body(i);
    }
}

/// B := alpha * inv(L) * B (left) or alpha * B * inv(L)^T (right)
///
/// `l` is lower triangular with a nonunit diagonal; the solve is in
/// place in `b`.
///
/// # Safety
///
/// As [`scal`]; `l` and `b` must not overlap.
pub(crate) unsafe fn trsm<T: Element>(side: Side, alpha: T, l: &Matrix<T>, b: &Matrix<T>) {
    let m = b.rows();
    let n = b.cols();
    match side {
        Side::Left => {
            for j in 0..n {
                for i in 0..m {
                    let mut x = alpha * *b.ptr_at(i, j);
                    for p in 0..i {
                        x = x - *l.ptr_at(i, p) * *b.ptr_at(p, j);
                    }
                    *b.ptr_at(i, j) = x / *l.ptr_at(i, i);
                }
            }
        }
        Side::Right => {
            for j in 0..n {
                for i in 0..m {
                    let mut x = alpha * *b.ptr_at(i, j);
                    for p in 0..j {
                        x = x - *b.ptr_at(i, p) * *l.ptr_at(j, p);
                    }
                    *b.ptr_at(i, j) = x / *l.ptr_at(j, j);
                }
            }
        }
    }
}

/// C := alpha * A * A^T + beta * C, lower triangle only
///
/// The strict upper triangle of `c` is not referenced.
///
/// # Safety
///
/// As [`scal`]; `a` and `c` must not overlap.
pub(crate) unsafe fn syrk<T: Element>(alpha: T, a: &Matrix<T>, beta: T, c: &Matrix<T>) {
    let n = c.rows();
    let k = a.cols();
    for i in 0..n {
        for j in 0..=i {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + *a.ptr_at(i, p) * *a.ptr_at(j, p);
            }
            let cp = c.ptr_at(i, j);
            *cp = alpha * acc + beta * *cp;
        }
    }
}

/// A := chol(A), lower triangle in place
///
/// The strict upper triangle is not referenced or modified. Fails when a
/// pivot is not positive (the matrix is not positive definite).
///
/// # Safety
///
/// As [`scal`].
pub(crate) unsafe fn chol<T: Element>(a: &Matrix<T>) -> Result<()> {
    let n = a.rows();
    for j in 0..n {
        let mut d = (*a.ptr_at(j, j)).to_f64();
        for p in 0..j {
            let v = (*a.ptr_at(j, p)).to_f64();
            d -= v * v;
        }
        if d <= 0.0 {
            return Err(Error::kernel(
                "chol",
                format!("matrix is not positive definite at diagonal {j}"),
            ));
        }
        let djj = T::from_f64(d.sqrt());
        *a.ptr_at(j, j) = djj;
        for i in (j + 1)..n {
            let mut x = *a.ptr_at(i, j);
            for p in 0..j {
                x = x - *a.ptr_at(i, p) * *a.ptr_at(j, p);
            }
            *a.ptr_at(i, j) = x / djj;
        }
    }
    Ok(())
}

// --- cost estimates ---------------------------------------------------------
//
// Flop counts used as task cost at enqueue time. The ready-task ranking
// treats them as relative weights; absolute accuracy does not matter.

pub(crate) fn scal_flops(m: usize, n: usize) -> f64 {
    (m * n) as f64
}

pub(crate) fn gemm_flops(m: usize, n: usize, k: usize) -> f64 {
    2.0 * (m as f64) * (n as f64) * (k as f64)
}

pub(crate) fn trsm_flops(side: Side, m: usize, n: usize) -> f64 {
    match side {
        Side::Left => (m as f64) * (m as f64) * (n as f64),
        Side::Right => (m as f64) * (n as f64) * (n as f64),
    }
}

pub(crate) fn syrk_flops(n: usize, k: usize) -> f64 {
    (n as f64) * (n as f64) * (k as f64)
}

pub(crate) fn chol_flops(n: usize) -> f64 {
    (n as f64).powi(3) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemm_small() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], 2, 2);
        let b = Matrix::from_slice(&[5.0f64, 6.0, 7.0, 8.0], 2, 2);
        let c = Matrix::<f64>::zeros(2, 2);
        unsafe { gemm(Trans::NoTrans, Trans::NoTrans, 1.0, &a, &b, 0.0, &c) };
        assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_transposed_operands() {
        let a = Matrix::from_slice(&[1.0f64, 3.0, 2.0, 4.0], 2, 2); // A^T of the above
        let b = Matrix::from_slice(&[5.0f64, 7.0, 6.0, 8.0], 2, 2); // B^T of the above
        let c = Matrix::<f64>::zeros(2, 2);
        unsafe { gemm(Trans::Trans, Trans::Trans, 1.0, &a, &b, 0.0, &c) };
        assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_trsm_left_solves() {
        // L = [[2,0],[1,4]], B = L * X with X = [[1],[2]] => B = [[2],[9]]
        let l = Matrix::from_slice(&[2.0f64, 0.0, 1.0, 4.0], 2, 2);
        let b = Matrix::from_slice(&[2.0f64, 9.0], 2, 1);
        unsafe { trsm(Side::Left, 1.0, &l, &b) };
        assert_eq!(b.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_trsm_right_solves() {
        // X L^T = B with L = [[2,0],[1,4]], X = [[1,2]] => B = [[2,9]]
        let l = Matrix::from_slice(&[2.0f64, 0.0, 1.0, 4.0], 2, 2);
        let b = Matrix::from_slice(&[2.0f64, 9.0], 1, 2);
        unsafe { trsm(Side::Right, 1.0, &l, &b) };
        assert_eq!(b.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_chol_identity_scaled() {
        let a = Matrix::from_slice(&[4.0f64, 0.0, 0.0, 9.0], 2, 2);
        unsafe { chol(&a).unwrap() };
        assert_eq!(a.get(0, 0), 2.0);
        assert_eq!(a.get(1, 1), 3.0);
    }

    #[test]
    fn test_chol_rejects_indefinite() {
        let a = Matrix::from_slice(&[-1.0f64], 1, 1);
        let err = unsafe { chol(&a).unwrap_err() };
        assert!(matches!(err, Error::Kernel { opcode: "chol", .. }));
    }

    #[test]
    fn test_syrk_lower_only() {
        let a = Matrix::from_slice(&[1.0f64, 2.0, 3.0, 4.0], 2, 2);
        let c = Matrix::from_slice(&[0.0f64, 99.0, 0.0, 0.0], 2, 2);
        unsafe { syrk(1.0, &a, 0.0, &c) };
        assert_eq!(c.get(0, 0), 5.0);
        assert_eq!(c.get(1, 0), 11.0);
        assert_eq!(c.get(1, 1), 25.0);
        // Strict upper triangle untouched.
        assert_eq!(c.get(0, 1), 99.0);
    }
}
