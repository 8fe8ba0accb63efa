//! Blocked Cholesky body (lower, right-looking)
//!
//! Walks the diagonal: factor the current diagonal block, solve the panel
//! below it against the new factor, update the trailing matrix with a
//! rank-k sub-syrk. Suboperations dispatch through the node's children,
//! which the standard forest wires to the blocked trsm/syrk trees.

use super::super::op::Op;
use super::super::dispatch;
use crate::context::RuntimeContext;
use crate::control::{ControlNode, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::Side;
use crate::operand::partition::{
    cont_with_3x3_to_2x2, part_2x2, repart_2x2_to_3x3, Quadrant,
};
use crate::operand::{HierMatrix, Matrix};
use std::sync::Arc;

pub(super) fn blocked<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    a: Matrix<T>,
) -> Result<()> {
    match cntl.variant() {
        Variant::Blocked(3) => blk_var3(ctx, cntl, a),
        variant => Err(Error::UnsupportedVariant {
            op: "chol",
            variant,
        }),
    }
}

/// A11 := chol(A11); A21 := A21 inv(A11)^T; A22 := A22 - A21 A21^T
fn blk_var3<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    a: Matrix<T>,
) -> Result<()> {
    let nb = cntl.require_blocksize()?.r();
    let sub_chol = cntl.require_child("sub-chol")?.clone();
    let sub_trsm = cntl.require_child("sub-trsm")?.clone();
    let sub_syrk = cntl.require_child("sub-syrk")?.clone();

    let (mut atl, mut atr, mut abl, mut abr) = part_2x2(&a, 0, 0, Quadrant::TopLeft);
    while atl.rows() < a.rows() {
        let a3 = repart_2x2_to_3x3(&atl, &atr, &abl, &abr, nb);
        let a11 = &a3[1][1];
        let a21 = &a3[2][1];
        let a22 = &a3[2][2];

        dispatch(
            ctx,
            Op::Chol {
                a: HierMatrix::leaf(a11.clone()),
            },
            &sub_chol,
        )?;
        if a21.rows() > 0 {
            dispatch(
                ctx,
                Op::Trsm {
                    side: Side::Right,
                    alpha: T::one(),
                    l: HierMatrix::leaf(a11.clone()),
                    b: HierMatrix::leaf(a21.clone()),
                },
                &sub_trsm,
            )?;
            dispatch(
                ctx,
                Op::Syrk {
                    alpha: T::from_f64(-1.0),
                    a: HierMatrix::leaf(a21.clone()),
                    beta: T::one(),
                    c: HierMatrix::leaf(a22.clone()),
                },
                &sub_syrk,
            )?;
        }

        (atl, atr, abl, abr) = cont_with_3x3_to_2x2(&a3);
    }
    Ok(())
}
