//! Blocked gemm bodies
//!
//! Variant 1 walks the row dimension of C, variant 2 the column
//! dimension, variant 3 the inner dimension. Variants 1 and 2 fold the
//! beta scaling into their sub-gemm calls; variant 3 updates every block
//! of C once per step, so it scales C through its `sub-scal` child first
//! and accumulates with beta one.

use super::super::op::Op;
use super::super::dispatch;
use super::{cont, part_start, processed, repart, Walk};
use crate::context::RuntimeContext;
use crate::control::{ControlNode, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::Trans;
use crate::operand::{HierMatrix, Matrix};
use std::sync::Arc;

/// Physical walk direction for `op(A)` when the logical walk is over the
/// rows of `op(A)` (`true`) or its columns (`false`)
fn walk_of(trans: Trans, logical_rows: bool) -> Walk {
    match (trans, logical_rows) {
        (Trans::NoTrans, true) | (Trans::Trans, false) => Walk::Rows,
        (Trans::NoTrans, false) | (Trans::Trans, true) => Walk::Cols,
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn blocked<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: Matrix<T>,
    b: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    match cntl.variant() {
        Variant::Blocked(1) => blk_var1(ctx, cntl, transa, transb, alpha, a, b, beta, c),
        Variant::Blocked(2) => blk_var2(ctx, cntl, transa, transb, alpha, a, b, beta, c),
        Variant::Blocked(3) => blk_var3(ctx, cntl, transa, transb, alpha, a, b, beta, c),
        variant => Err(Error::UnsupportedVariant {
            op: "gemm",
            variant,
        }),
    }
}

/// C1 := alpha op(A1) op(B) + beta C1, per row panel of C
#[allow(clippy::too_many_arguments)]
fn blk_var1<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: Matrix<T>,
    b: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.m();
    let sub = cntl.require_child("sub-gemm")?.clone();
    let wa = walk_of(transa, true);

    let (mut ct, mut cb) = part_start(&c, Walk::Rows);
    let (mut af, mut al) = part_start(&a, wa);
    while processed(&ct, Walk::Rows) < c.rows() {
        let (c0, c1, c2) = repart(&ct, &cb, nb, Walk::Rows);
        let (a0, a1, a2) = repart(&af, &al, nb, wa);

        dispatch(
            ctx,
            Op::Gemm {
                transa,
                transb,
                alpha,
                a: HierMatrix::leaf(a1.clone()),
                b: HierMatrix::leaf(b.clone()),
                beta,
                c: HierMatrix::leaf(c1.clone()),
            },
            &sub,
        )?;

        (ct, cb) = cont(&c0, &c1, &c2, Walk::Rows);
        (af, al) = cont(&a0, &a1, &a2, wa);
    }
    Ok(())
}

/// C1 := alpha op(A) op(B1) + beta C1, per column panel of C
#[allow(clippy::too_many_arguments)]
fn blk_var2<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: Matrix<T>,
    b: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.n();
    let sub = cntl.require_child("sub-gemm")?.clone();
    let wb = walk_of(transb, false);

    let (mut cl, mut cr) = part_start(&c, Walk::Cols);
    let (mut bf, mut bl) = part_start(&b, wb);
    while processed(&cl, Walk::Cols) < c.cols() {
        let (c0, c1, c2) = repart(&cl, &cr, nb, Walk::Cols);
        let (b0, b1, b2) = repart(&bf, &bl, nb, wb);

        dispatch(
            ctx,
            Op::Gemm {
                transa,
                transb,
                alpha,
                a: HierMatrix::leaf(a.clone()),
                b: HierMatrix::leaf(b1.clone()),
                beta,
                c: HierMatrix::leaf(c1.clone()),
            },
            &sub,
        )?;

        (cl, cr) = cont(&c0, &c1, &c2, Walk::Cols);
        (bf, bl) = cont(&b0, &b1, &b2, wb);
    }
    Ok(())
}

/// C := beta C, then C += alpha op(A1) op(B1) per inner panel
#[allow(clippy::too_many_arguments)]
fn blk_var3<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: Matrix<T>,
    b: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.k();
    let sub_scal = cntl.require_child("sub-scal")?.clone();
    let sub = cntl.require_child("sub-gemm")?.clone();
    let wa = walk_of(transa, false);
    let wb = walk_of(transb, true);
    let k = match transa {
        Trans::NoTrans => a.cols(),
        Trans::Trans => a.rows(),
    };

    dispatch(
        ctx,
        Op::Scal {
            alpha: beta,
            a: HierMatrix::leaf(c.clone()),
        },
        &sub_scal,
    )?;

    let (mut af, mut al) = part_start(&a, wa);
    let (mut bf, mut bl) = part_start(&b, wb);
    while processed(&af, wa) < k {
        let (a0, a1, a2) = repart(&af, &al, nb, wa);
        let (b0, b1, b2) = repart(&bf, &bl, nb, wb);

        dispatch(
            ctx,
            Op::Gemm {
                transa,
                transb,
                alpha,
                a: HierMatrix::leaf(a1.clone()),
                b: HierMatrix::leaf(b1.clone()),
                beta: T::one(),
                c: HierMatrix::leaf(c.clone()),
            },
            &sub,
        )?;

        (af, al) = cont(&a0, &a1, &a2, wa);
        (bf, bl) = cont(&b0, &b1, &b2, wb);
    }
    Ok(())
}
