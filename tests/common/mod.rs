//! Common test utilities
#![allow(dead_code)]

use lamina::context::{CheckLevel, ContextConfig, RuntimeContext};
use lamina::operand::Matrix;
use lamina::prelude::Blocksize;
use lamina::Trans;

/// Context with a small blocksize so blocked paths actually recurse
pub fn test_ctx(num_threads: usize) -> RuntimeContext {
    RuntimeContext::new(ContextConfig {
        num_threads,
        blocksize: Blocksize::uniform(3),
        check: CheckLevel::Full,
    })
    .expect("context construction failed")
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Deterministic pseudo-random matrix
pub fn filled(rows: usize, cols: usize, seed: usize) -> Matrix<f64> {
    Matrix::from_fn(rows, cols, |i, j| {
        ((i * 31 + j * 17 + seed * 7) % 101) as f64 / 101.0 - 0.5
    })
}

/// Symmetric positive definite matrix: B B^T + n I
pub fn spd(n: usize, seed: usize) -> Matrix<f64> {
    let b = filled(n, n, seed);
    Matrix::from_fn(n, n, |i, j| {
        let mut acc = 0.0;
        for p in 0..n {
            acc += b.get(i, p) * b.get(j, p);
        }
        if i == j {
            acc += n as f64;
        }
        acc
    })
}

/// Reference gemm: returns alpha op(A) op(B) + beta C row-major
pub fn naive_gemm(
    transa: Trans,
    transb: Trans,
    alpha: f64,
    a: &Matrix<f64>,
    b: &Matrix<f64>,
    beta: f64,
    c: &Matrix<f64>,
) -> Vec<f64> {
    let m = c.rows();
    let n = c.cols();
    let k = match transa {
        Trans::NoTrans => a.cols(),
        Trans::Trans => a.rows(),
    };
    let mut out = Vec::with_capacity(m * n);
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                let aip = match transa {
                    Trans::NoTrans => a.get(i, p),
                    Trans::Trans => a.get(p, i),
                };
                let bpj = match transb {
                    Trans::NoTrans => b.get(p, j),
                    Trans::Trans => b.get(j, p),
                };
                acc += aip * bpj;
            }
            out.push(alpha * acc + beta * c.get(i, j));
        }
    }
    out
}

/// Lower triangle of a square matrix, row-major, upper filled with zero
pub fn lower_of(m: &Matrix<f64>) -> Vec<f64> {
    let n = m.rows();
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            out[i * n + j] = m.get(i, j);
        }
    }
    out
}
