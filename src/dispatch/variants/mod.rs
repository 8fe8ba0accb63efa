//! FLAT-domain variant bodies
//!
//! The DISPATCH_VARIANT arm: a closed `match` routes each operation to
//! the blocked algorithm body its control node selects. Bodies partition
//! their flat operands with the partition kit and issue further
//! dispatcher calls for their suboperations, each through the matching
//! named child node. A variant with no body is a configuration error.

mod chol;
mod gemm;
mod syrk;
mod trsm;

use super::check;
use super::op::Op;
use crate::context::{CheckLevel, RuntimeContext};
use crate::control::{ControlNode, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::operand::partition::{
    cont_with_1x3_to_1x2, cont_with_3x1_to_2x1, part_1x2, part_2x1, repart_1x2_to_1x3,
    repart_2x1_to_3x1, Cut,
};
use crate::operand::Matrix;
use std::sync::Arc;

pub(crate) fn dispatch_variant<T: Element>(
    ctx: &RuntimeContext,
    op: Op<T>,
    cntl: &Arc<ControlNode>,
) -> Result<()> {
    if cntl.variant() == Variant::Unblocked {
        if ctx.check_level() == CheckLevel::Full {
            check::conformable(&op)?;
        }
        return op.execute_leaf();
    }
    match op {
        Op::Scal { .. } => Err(Error::UnsupportedVariant {
            op: "scal",
            variant: cntl.variant(),
        }),
        Op::Gemm {
            transa,
            transb,
            alpha,
            a,
            b,
            beta,
            c,
        } => gemm::blocked(
            ctx,
            cntl,
            transa,
            transb,
            alpha,
            a.as_leaf()?.clone(),
            b.as_leaf()?.clone(),
            beta,
            c.as_leaf()?.clone(),
        ),
        Op::Trsm { side, alpha, l, b } => trsm::blocked(
            ctx,
            cntl,
            side,
            alpha,
            l.as_leaf()?.clone(),
            b.as_leaf()?.clone(),
        ),
        Op::Syrk { alpha, a, beta, c } => syrk::blocked(
            ctx,
            cntl,
            alpha,
            a.as_leaf()?.clone(),
            beta,
            c.as_leaf()?.clone(),
        ),
        Op::Chol { a } => chol::blocked(ctx, cntl, a.as_leaf()?.clone()),
    }
}

/// Which physical dimension a body walks
#[derive(Copy, Clone, PartialEq, Eq)]
pub(super) enum Walk {
    /// Partition by rows, boundary moving downward
    Rows,
    /// Partition by columns, boundary moving rightward
    Cols,
}

pub(super) fn part_start<T: Element>(a: &Matrix<T>, w: Walk) -> (Matrix<T>, Matrix<T>) {
    match w {
        Walk::Rows => part_2x1(a, 0, Cut::Top),
        Walk::Cols => part_1x2(a, 0, Cut::Left),
    }
}

pub(super) fn repart<T: Element>(
    first: &Matrix<T>,
    last: &Matrix<T>,
    b: usize,
    w: Walk,
) -> (Matrix<T>, Matrix<T>, Matrix<T>) {
    match w {
        Walk::Rows => repart_2x1_to_3x1(first, last, b, Cut::Bottom),
        Walk::Cols => repart_1x2_to_1x3(first, last, b, Cut::Right),
    }
}

pub(super) fn cont<T: Element>(
    first: &Matrix<T>,
    mid: &Matrix<T>,
    last: &Matrix<T>,
    w: Walk,
) -> (Matrix<T>, Matrix<T>) {
    match w {
        Walk::Rows => cont_with_3x1_to_2x1(first, mid, last, Cut::Top),
        Walk::Cols => cont_with_1x3_to_1x2(first, mid, last, Cut::Left),
    }
}

pub(super) fn processed<T: Element>(first: &Matrix<T>, w: Walk) -> usize {
    match w {
        Walk::Rows => first.rows(),
        Walk::Cols => first.cols(),
    }
}
