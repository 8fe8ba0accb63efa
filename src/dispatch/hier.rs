//! Block-wise recursion through hierarchical operands
//!
//! This is the RECURSE_HIER arm of the dispatcher: each body walks the
//! block grid of its operands one hierarchy level down, re-dispatching a
//! sub-call per block combination. Same-operation sub-calls reuse the
//! current control node; cross-operation sub-calls go through its named
//! children. Recursion bottoms out when the sub-blocks are SCALAR-element
//! leaves, where the dispatcher either defers or executes the kernel.
//!
//! The loop orders below match the sequential blocked algorithms, so the
//! submission order seen by the dependency analyzer is a correct
//! serial schedule; the queue is then free to reorder anything without a
//! write hazard.

use super::op::Op;
use super::dispatch;
use crate::context::RuntimeContext;
use crate::control::ControlNode;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::{Side, Trans};
use crate::operand::{ElemType, HierMatrix};
use std::sync::Arc;

fn neg_one<T: Element>() -> T {
    T::from_f64(-1.0)
}

/// All operands of one call must sit at the same hierarchy level
fn require_blocked<T: Element>(op: &'static str, m: &HierMatrix<T>) -> Result<()> {
    if m.elemtype() == ElemType::Matrix {
        Ok(())
    } else {
        Err(Error::Hierarchy {
            op,
            reason: "operands must share the hierarchy depth",
        })
    }
}

/// Block extent of `op(A)` along the inner dimension
fn inner_blocks<T: Element>(trans: Trans, a: &HierMatrix<T>) -> usize {
    match trans {
        Trans::NoTrans => a.block_cols(),
        Trans::Trans => a.block_rows(),
    }
}

fn block_of<T: Element>(trans: Trans, m: &HierMatrix<T>, i: usize, j: usize) -> HierMatrix<T> {
    match trans {
        Trans::NoTrans => m.sub_block(i, j).clone(),
        Trans::Trans => m.sub_block(j, i).clone(),
    }
}

pub(crate) fn recurse<T: Element>(
    ctx: &RuntimeContext,
    op: Op<T>,
    cntl: &Arc<ControlNode>,
) -> Result<()> {
    match op {
        Op::Scal { alpha, a } => {
            for i in 0..a.block_rows() {
                for j in 0..a.block_cols() {
                    dispatch(
                        ctx,
                        Op::Scal {
                            alpha,
                            a: a.sub_block(i, j).clone(),
                        },
                        cntl,
                    )?;
                }
            }
            Ok(())
        }

        Op::Gemm {
            transa,
            transb,
            alpha,
            a,
            b,
            beta,
            c,
        } => {
            require_blocked("gemm", &a)?;
            require_blocked("gemm", &b)?;
            let kb = inner_blocks(transa, &a);
            for i in 0..c.block_rows() {
                for j in 0..c.block_cols() {
                    for p in 0..kb {
                        // beta applies once per output block, on its first update.
                        let beta_p = if p == 0 { beta } else { T::one() };
                        dispatch(
                            ctx,
                            Op::Gemm {
                                transa,
                                transb,
                                alpha,
                                a: block_of(transa, &a, i, p),
                                b: block_of(transb, &b, p, j),
                                beta: beta_p,
                                c: c.sub_block(i, j).clone(),
                            },
                            cntl,
                        )?;
                    }
                }
            }
            Ok(())
        }

        Op::Trsm { side, alpha, l, b } => {
            require_blocked("trsm", &l)?;
            let gemm_cntl = cntl.require_child("sub-gemm")?.clone();
            match side {
                // X_i = inv(L_ii) (alpha B_i - sum_{p<i} L_ip X_p)
                Side::Left => {
                    for j in 0..b.block_cols() {
                        for i in 0..b.block_rows() {
                            for p in 0..i {
                                dispatch(
                                    ctx,
                                    Op::Gemm {
                                        transa: Trans::NoTrans,
                                        transb: Trans::NoTrans,
                                        alpha: neg_one(),
                                        a: l.sub_block(i, p).clone(),
                                        b: b.sub_block(p, j).clone(),
                                        beta: if p == 0 { alpha } else { T::one() },
                                        c: b.sub_block(i, j).clone(),
                                    },
                                    &gemm_cntl,
                                )?;
                            }
                            dispatch(
                                ctx,
                                Op::Trsm {
                                    side,
                                    alpha: if i == 0 { alpha } else { T::one() },
                                    l: l.sub_block(i, i).clone(),
                                    b: b.sub_block(i, j).clone(),
                                },
                                cntl,
                            )?;
                        }
                    }
                }
                // X_j = (alpha B_j - sum_{p<j} X_p L_jp^T) inv(L_jj)^T
                Side::Right => {
                    for i in 0..b.block_rows() {
                        for j in 0..b.block_cols() {
                            for p in 0..j {
                                dispatch(
                                    ctx,
                                    Op::Gemm {
                                        transa: Trans::NoTrans,
                                        transb: Trans::Trans,
                                        alpha: neg_one(),
                                        a: b.sub_block(i, p).clone(),
                                        b: l.sub_block(j, p).clone(),
                                        beta: if p == 0 { alpha } else { T::one() },
                                        c: b.sub_block(i, j).clone(),
                                    },
                                    &gemm_cntl,
                                )?;
                            }
                            dispatch(
                                ctx,
                                Op::Trsm {
                                    side,
                                    alpha: if j == 0 { alpha } else { T::one() },
                                    l: l.sub_block(j, j).clone(),
                                    b: b.sub_block(i, j).clone(),
                                },
                                cntl,
                            )?;
                        }
                    }
                }
            }
            Ok(())
        }

        Op::Syrk { alpha, a, beta, c } => {
            require_blocked("syrk", &a)?;
            let gemm_cntl = cntl.require_child("sub-gemm")?.clone();
            let kb = a.block_cols();
            for i in 0..c.block_rows() {
                for j in 0..=i {
                    for p in 0..kb {
                        let beta_p = if p == 0 { beta } else { T::one() };
                        if i == j {
                            dispatch(
                                ctx,
                                Op::Syrk {
                                    alpha,
                                    a: a.sub_block(i, p).clone(),
                                    beta: beta_p,
                                    c: c.sub_block(i, i).clone(),
                                },
                                cntl,
                            )?;
                        } else {
                            dispatch(
                                ctx,
                                Op::Gemm {
                                    transa: Trans::NoTrans,
                                    transb: Trans::Trans,
                                    alpha,
                                    a: a.sub_block(i, p).clone(),
                                    b: a.sub_block(j, p).clone(),
                                    beta: beta_p,
                                    c: c.sub_block(i, j).clone(),
                                },
                                &gemm_cntl,
                            )?;
                        }
                    }
                }
            }
            Ok(())
        }

        // Right-looking by block column: factor the diagonal block, solve
        // the panel below it, update the trailing matrix.
        Op::Chol { a } => {
            let trsm_cntl = cntl.require_child("sub-trsm")?.clone();
            let syrk_cntl = cntl.require_child("sub-syrk")?.clone();
            let gemm_cntl = cntl.require_child("sub-gemm")?.clone();
            let nb = a.block_rows();
            for k in 0..nb {
                dispatch(
                    ctx,
                    Op::Chol {
                        a: a.sub_block(k, k).clone(),
                    },
                    cntl,
                )?;
                for i in (k + 1)..nb {
                    dispatch(
                        ctx,
                        Op::Trsm {
                            side: Side::Right,
                            alpha: T::one(),
                            l: a.sub_block(k, k).clone(),
                            b: a.sub_block(i, k).clone(),
                        },
                        &trsm_cntl,
                    )?;
                }
                for i in (k + 1)..nb {
                    dispatch(
                        ctx,
                        Op::Syrk {
                            alpha: neg_one(),
                            a: a.sub_block(i, k).clone(),
                            beta: T::one(),
                            c: a.sub_block(i, i).clone(),
                        },
                        &syrk_cntl,
                    )?;
                    for j in (k + 1)..i {
                        dispatch(
                            ctx,
                            Op::Gemm {
                                transa: Trans::NoTrans,
                                transb: Trans::Trans,
                                alpha: neg_one(),
                                a: a.sub_block(i, k).clone(),
                                b: a.sub_block(j, k).clone(),
                                beta: T::one(),
                                c: a.sub_block(i, j).clone(),
                            },
                            &gemm_cntl,
                        )?;
                    }
                }
            }
            Ok(())
        }
    }
}
