//! Blocked trsm body
//!
//! Walks the diagonal of the triangular factor. Each step removes the
//! contribution of the already-solved part with one sub-gemm, then solves
//! the current panel with a sub-trsm. The alpha scaling rides on the
//! first update a panel receives.

use super::super::op::Op;
use super::super::dispatch;
use crate::context::RuntimeContext;
use crate::control::{ControlNode, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::{Side, Trans};
use crate::operand::partition::{
    cont_with_1x3_to_1x2, cont_with_3x1_to_2x1, cont_with_3x3_to_2x2, part_1x2, part_2x1,
    part_2x2, repart_1x2_to_1x3, repart_2x1_to_3x1, repart_2x2_to_3x3, Cut, Quadrant,
};
use crate::operand::{HierMatrix, Matrix};
use std::sync::Arc;

fn neg_one<T: Element>() -> T {
    T::from_f64(-1.0)
}

pub(super) fn blocked<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    side: Side,
    alpha: T,
    l: Matrix<T>,
    b: Matrix<T>,
) -> Result<()> {
    match cntl.variant() {
        Variant::Blocked(1) => match side {
            Side::Left => blk_var1_left(ctx, cntl, alpha, l, b),
            Side::Right => blk_var1_right(ctx, cntl, alpha, l, b),
        },
        variant => Err(Error::UnsupportedVariant {
            op: "trsm",
            variant,
        }),
    }
}

/// B1 := inv(L11) (alpha B1 - L10 X0), walking row panels of B
fn blk_var1_left<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    l: Matrix<T>,
    b: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.m();
    let sub_trsm = cntl.require_child("sub-trsm")?.clone();
    let sub_gemm = cntl.require_child("sub-gemm")?.clone();

    let (mut ltl, mut ltr, mut lbl, mut lbr) = part_2x2(&l, 0, 0, Quadrant::TopLeft);
    let (mut bt, mut bb) = part_2x1(&b, 0, Cut::Top);
    while ltl.rows() < l.rows() {
        let l3 = repart_2x2_to_3x3(&ltl, &ltr, &lbl, &lbr, nb);
        let (b0, b1, b2) = repart_2x1_to_3x1(&bt, &bb, nb, Cut::Bottom);
        let l10 = &l3[1][0];
        let l11 = &l3[1][1];

        let first = l10.cols() == 0;
        if !first {
            dispatch(
                ctx,
                Op::Gemm {
                    transa: Trans::NoTrans,
                    transb: Trans::NoTrans,
                    alpha: neg_one(),
                    a: HierMatrix::leaf(l10.clone()),
                    b: HierMatrix::leaf(b0.clone()),
                    beta: alpha,
                    c: HierMatrix::leaf(b1.clone()),
                },
                &sub_gemm,
            )?;
        }
        dispatch(
            ctx,
            Op::Trsm {
                side: Side::Left,
                alpha: if first { alpha } else { T::one() },
                l: HierMatrix::leaf(l11.clone()),
                b: HierMatrix::leaf(b1.clone()),
            },
            &sub_trsm,
        )?;

        (ltl, ltr, lbl, lbr) = cont_with_3x3_to_2x2(&l3);
        (bt, bb) = cont_with_3x1_to_2x1(&b0, &b1, &b2, Cut::Top);
    }
    Ok(())
}

/// B1 := (alpha B1 - X0 L10^T) inv(L11)^T, walking column panels of B
fn blk_var1_right<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    l: Matrix<T>,
    b: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.n();
    let sub_trsm = cntl.require_child("sub-trsm")?.clone();
    let sub_gemm = cntl.require_child("sub-gemm")?.clone();

    let (mut ltl, mut ltr, mut lbl, mut lbr) = part_2x2(&l, 0, 0, Quadrant::TopLeft);
    let (mut bl_, mut br_) = part_1x2(&b, 0, Cut::Left);
    while ltl.rows() < l.rows() {
        let l3 = repart_2x2_to_3x3(&ltl, &ltr, &lbl, &lbr, nb);
        let (b0, b1, b2) = repart_1x2_to_1x3(&bl_, &br_, nb, Cut::Right);
        let l10 = &l3[1][0];
        let l11 = &l3[1][1];

        let first = l10.cols() == 0;
        if !first {
            dispatch(
                ctx,
                Op::Gemm {
                    transa: Trans::NoTrans,
                    transb: Trans::Trans,
                    alpha: neg_one(),
                    a: HierMatrix::leaf(b0.clone()),
                    b: HierMatrix::leaf(l10.clone()),
                    beta: alpha,
                    c: HierMatrix::leaf(b1.clone()),
                },
                &sub_gemm,
            )?;
        }
        dispatch(
            ctx,
            Op::Trsm {
                side: Side::Right,
                alpha: if first { alpha } else { T::one() },
                l: HierMatrix::leaf(l11.clone()),
                b: HierMatrix::leaf(b1.clone()),
            },
            &sub_trsm,
        )?;

        (ltl, ltr, lbl, lbr) = cont_with_3x3_to_2x2(&l3);
        (bl_, br_) = cont_with_1x3_to_1x2(&b0, &b1, &b2, Cut::Left);
    }
    Ok(())
}
