//! Blocked syrk body (lower triangle)
//!
//! Walks row panels of A against the diagonal of C: each step updates the
//! panel's off-diagonal strip with one sub-gemm and its diagonal block
//! with a sub-syrk.

use super::super::op::Op;
use super::super::dispatch;
use crate::context::RuntimeContext;
use crate::control::{ControlNode, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::Trans;
use crate::operand::partition::{
    cont_with_3x1_to_2x1, cont_with_3x3_to_2x2, part_2x1, part_2x2, repart_2x1_to_3x1,
    repart_2x2_to_3x3, Cut, Quadrant,
};
use crate::operand::{HierMatrix, Matrix};
use std::sync::Arc;

pub(super) fn blocked<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    a: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    match cntl.variant() {
        Variant::Blocked(1) => blk_var1(ctx, cntl, alpha, a, beta, c),
        variant => Err(Error::UnsupportedVariant {
            op: "syrk",
            variant,
        }),
    }
}

/// C10 := alpha A1 A0^T + beta C10; C11 := alpha A1 A1^T + beta C11
fn blk_var1<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    a: Matrix<T>,
    beta: T,
    c: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.m();
    let sub_syrk = cntl.require_child("sub-syrk")?.clone();
    let sub_gemm = cntl.require_child("sub-gemm")?.clone();

    let (mut at, mut ab) = part_2x1(&a, 0, Cut::Top);
    let (mut ctl, mut ctr, mut cbl, mut cbr) = part_2x2(&c, 0, 0, Quadrant::TopLeft);
    while at.rows() < a.rows() {
        let (a0, a1, a2) = repart_2x1_to_3x1(&at, &ab, nb, Cut::Bottom);
        let c3 = repart_2x2_to_3x3(&ctl, &ctr, &cbl, &cbr, nb);
        let c10 = &c3[1][0];
        let c11 = &c3[1][1];

        if c10.cols() > 0 {
            dispatch(
                ctx,
                Op::Gemm {
                    transa: Trans::NoTrans,
                    transb: Trans::Trans,
                    alpha,
                    a: HierMatrix::leaf(a1.clone()),
                    b: HierMatrix::leaf(a0.clone()),
                    beta,
                    c: HierMatrix::leaf(c10.clone()),
                },
                &sub_gemm,
            )?;
        }
        dispatch(
            ctx,
            Op::Syrk {
                alpha,
                a: HierMatrix::leaf(a1.clone()),
                beta,
                c: HierMatrix::leaf(c11.clone()),
            },
            &sub_syrk,
        )?;

        (at, ab) = cont_with_3x1_to_2x1(&a0, &a1, &a2, Cut::Top);
        (ctl, ctr, cbl, cbr) = cont_with_3x3_to_2x2(&c3);
    }
    Ok(())
}
