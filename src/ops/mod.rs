//! Front-end operations
//!
//! The public entry points of the runtime. Each front end wraps its
//! operands in an operation call, selects the context's
//! default control tree for the operand's domain (FLAT for scalar-element
//! leaves, HIER for blocked hierarchies), and hands the call to the
//! dispatcher. With the queue enabled, hierarchical calls return as soon
//! as their leaves are enqueued; [`RuntimeContext::drain`] is the barrier
//! that makes their effects visible.
//!
//! The `*_with` forms take an explicit control tree instead of the
//! context default, for callers that assemble their own trees.

use crate::context::RuntimeContext;
use crate::control::ControlNode;
use crate::dispatch::{self, Op};
use crate::dtype::Element;
use crate::error::Result;
use crate::operand::HierMatrix;
use std::sync::Arc;

pub use crate::kernel::{Side, Trans};

/// A := alpha A
pub fn scal<T: Element>(ctx: &RuntimeContext, alpha: T, a: &HierMatrix<T>) -> Result<()> {
    dispatch::entry(ctx, Op::Scal {
        alpha,
        a: a.clone(),
    })
}

/// C := alpha op(A) op(B) + beta C
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Element>(
    ctx: &RuntimeContext,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: &HierMatrix<T>,
    b: &HierMatrix<T>,
    beta: T,
    c: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry(ctx, Op::Gemm {
        transa,
        transb,
        alpha,
        a: a.clone(),
        b: b.clone(),
        beta,
        c: c.clone(),
    })
}

/// B := alpha inv(L) B (left) or alpha B inv(L)^T (right)
///
/// `l` is lower triangular with a nonunit diagonal.
pub fn trsm<T: Element>(
    ctx: &RuntimeContext,
    side: Side,
    alpha: T,
    l: &HierMatrix<T>,
    b: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry(ctx, Op::Trsm {
        side,
        alpha,
        l: l.clone(),
        b: b.clone(),
    })
}

/// C := alpha A A^T + beta C, lower triangle only
pub fn syrk<T: Element>(
    ctx: &RuntimeContext,
    alpha: T,
    a: &HierMatrix<T>,
    beta: T,
    c: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry(ctx, Op::Syrk {
        alpha,
        a: a.clone(),
        beta,
        c: c.clone(),
    })
}

/// A := chol(A), lower triangle in place
pub fn chol<T: Element>(ctx: &RuntimeContext, a: &HierMatrix<T>) -> Result<()> {
    dispatch::entry(ctx, Op::Chol { a: a.clone() })
}

/// [`gemm`] through an explicit control tree
#[allow(clippy::too_many_arguments)]
pub fn gemm_with<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: &HierMatrix<T>,
    b: &HierMatrix<T>,
    beta: T,
    c: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry_with(
        ctx,
        Op::Gemm {
            transa,
            transb,
            alpha,
            a: a.clone(),
            b: b.clone(),
            beta,
            c: c.clone(),
        },
        cntl,
    )
}

/// [`trsm`] through an explicit control tree
pub fn trsm_with<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    side: Side,
    alpha: T,
    l: &HierMatrix<T>,
    b: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry_with(
        ctx,
        Op::Trsm {
            side,
            alpha,
            l: l.clone(),
            b: b.clone(),
        },
        cntl,
    )
}

/// [`syrk`] through an explicit control tree
pub fn syrk_with<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    a: &HierMatrix<T>,
    beta: T,
    c: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry_with(
        ctx,
        Op::Syrk {
            alpha,
            a: a.clone(),
            beta,
            c: c.clone(),
        },
        cntl,
    )
}

/// [`chol`] through an explicit control tree
pub fn chol_with<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    a: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry_with(ctx, Op::Chol { a: a.clone() }, cntl)
}

/// [`scal`] through an explicit control tree
pub fn scal_with<T: Element>(
    ctx: &RuntimeContext,
    cntl: &Arc<ControlNode>,
    alpha: T,
    a: &HierMatrix<T>,
) -> Result<()> {
    dispatch::entry_with(
        ctx,
        Op::Scal {
            alpha,
            a: a.clone(),
        },
        cntl,
    )
}
