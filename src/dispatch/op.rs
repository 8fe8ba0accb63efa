//! The closed set of dispatchable operations
//!
//! `Op` is the sum type the dispatcher matches over: one variant per
//! operation the library ships, carrying the operands and scalar
//! parameters of a single call. Operand views are cheap to clone (they
//! alias shared storage), so an `Op` owns its operands and can be moved
//! into a deferred task without lifetime plumbing.

use crate::control::OpKind;
use crate::kernel::{self, Side, Trans};
use crate::dtype::Element;
use crate::error::Result;
use crate::operand::{ElemType, HierMatrix, Matrix};
use crate::queue::{Access, Task, TaskRegions};

/// One operation call: operands plus scalar parameters
pub(crate) enum Op<T: Element> {
    /// A := alpha A
    Scal { alpha: T, a: HierMatrix<T> },
    /// C := alpha op(A) op(B) + beta C
    Gemm {
        transa: Trans,
        transb: Trans,
        alpha: T,
        a: HierMatrix<T>,
        b: HierMatrix<T>,
        beta: T,
        c: HierMatrix<T>,
    },
    /// B := alpha inv(L) B (left) or alpha B inv(L)^T (right)
    Trsm {
        side: Side,
        alpha: T,
        l: HierMatrix<T>,
        b: HierMatrix<T>,
    },
    /// C := alpha A A^T + beta C, lower triangle
    Syrk {
        alpha: T,
        a: HierMatrix<T>,
        beta: T,
        c: HierMatrix<T>,
    },
    /// A := chol(A), lower triangle
    Chol { a: HierMatrix<T> },
}

impl<T: Element> Op<T> {
    /// Which operation this call is
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Scal { .. } => OpKind::Scal,
            Op::Gemm { .. } => OpKind::Gemm,
            Op::Trsm { .. } => OpKind::Trsm,
            Op::Syrk { .. } => OpKind::Syrk,
            Op::Chol { .. } => OpKind::Chol,
        }
    }

    /// Stable opcode string for diagnostics and task records
    pub fn opcode(&self) -> &'static str {
        self.kind().name()
    }

    /// The operand that carries the call's hierarchy level
    ///
    /// Conformability guarantees all operands of one call share a depth,
    /// so the output operand decides whether the dispatcher recurses.
    pub fn principal(&self) -> &HierMatrix<T> {
        match self {
            Op::Scal { a, .. } => a,
            Op::Gemm { c, .. } => c,
            Op::Trsm { b, .. } => b,
            Op::Syrk { c, .. } => c,
            Op::Chol { a } => a,
        }
    }

    /// Element type of the call's hierarchy level
    pub fn elemtype(&self) -> ElemType {
        self.principal().elemtype()
    }

    /// FLOP-based cost estimate for the ready-task ranking
    pub fn cost(&self) -> f64 {
        match self {
            Op::Scal { a, .. } => kernel::scal_flops(a.rows(), a.cols()),
            Op::Gemm {
                transa, a, c, ..
            } => {
                let k = match transa {
                    Trans::NoTrans => a.cols(),
                    Trans::Trans => a.rows(),
                };
                kernel::gemm_flops(c.rows(), c.cols(), k)
            }
            Op::Trsm { side, b, .. } => kernel::trsm_flops(*side, b.rows(), b.cols()),
            Op::Syrk { a, c, .. } => kernel::syrk_flops(c.rows(), a.cols()),
            Op::Chol { a } => kernel::chol_flops(a.rows()),
        }
    }

    /// Declared operand footprint of a leaf call
    ///
    /// Fails if any operand is not a SCALAR-element leaf.
    pub fn leaf_regions(&self) -> Result<TaskRegions> {
        let mut regions = TaskRegions::new();
        match self {
            Op::Scal { a, .. } => {
                regions.push((a.as_leaf()?.region(), Access::ReadWrite));
            }
            Op::Gemm { a, b, c, .. } => {
                regions.push((a.as_leaf()?.region(), Access::Read));
                regions.push((b.as_leaf()?.region(), Access::Read));
                regions.push((c.as_leaf()?.region(), Access::ReadWrite));
            }
            Op::Trsm { l, b, .. } => {
                regions.push((l.as_leaf()?.region(), Access::Read));
                regions.push((b.as_leaf()?.region(), Access::ReadWrite));
            }
            Op::Syrk { a, c, .. } => {
                regions.push((a.as_leaf()?.region(), Access::Read));
                regions.push((c.as_leaf()?.region(), Access::ReadWrite));
            }
            Op::Chol { a } => {
                regions.push((a.as_leaf()?.region(), Access::ReadWrite));
            }
        }
        Ok(regions)
    }

    /// Synchronously run the leaf kernel for this call
    ///
    /// All operands must be SCALAR-element leaves.
    pub fn execute_leaf(self) -> Result<()> {
        match self {
            Op::Scal { alpha, a } => {
                let a = a.as_leaf()?;
                unsafe { kernel::scal(alpha, a) };
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
                let (a, b, c) = (a.as_leaf()?, b.as_leaf()?, c.as_leaf()?);
                unsafe { kernel::gemm(transa, transb, alpha, a, b, beta, c) };
                Ok(())
            }
            Op::Trsm { side, alpha, l, b } => {
                let (l, b) = (l.as_leaf()?, b.as_leaf()?);
                unsafe { kernel::trsm(side, alpha, l, b) };
                Ok(())
            }
            Op::Syrk { alpha, a, beta, c } => {
                let (a, c) = (a.as_leaf()?, c.as_leaf()?);
                unsafe { kernel::syrk(alpha, a, beta, c) };
                Ok(())
            }
            Op::Chol { a } => {
                let a = a.as_leaf()?;
                unsafe { kernel::chol(a) }
            }
        }
    }

    /// Capture this leaf call as a deferred task
    pub fn into_task(self) -> Result<Task> {
        let opcode = self.opcode();
        let cost = self.cost();
        let regions = self.leaf_regions()?;
        let task = match self {
            Op::Scal { alpha, a } => {
                let a: Matrix<T> = a.as_leaf()?.clone();
                Task::new(opcode, cost, regions, move || {
                    unsafe { kernel::scal(alpha, &a) };
                    Ok(())
                })
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
                let a: Matrix<T> = a.as_leaf()?.clone();
                let b: Matrix<T> = b.as_leaf()?.clone();
                let c: Matrix<T> = c.as_leaf()?.clone();
                Task::new(opcode, cost, regions, move || {
                    unsafe { kernel::gemm(transa, transb, alpha, &a, &b, beta, &c) };
                    Ok(())
                })
            }
            Op::Trsm { side, alpha, l, b } => {
                let l: Matrix<T> = l.as_leaf()?.clone();
                let b: Matrix<T> = b.as_leaf()?.clone();
                Task::new(opcode, cost, regions, move || {
                    unsafe { kernel::trsm(side, alpha, &l, &b) };
                    Ok(())
                })
            }
            Op::Syrk { alpha, a, beta, c } => {
                let a: Matrix<T> = a.as_leaf()?.clone();
                let c: Matrix<T> = c.as_leaf()?.clone();
                Task::new(opcode, cost, regions, move || {
                    unsafe { kernel::syrk(alpha, &a, beta, &c) };
                    Ok(())
                })
            }
            Op::Chol { a } => {
                let a: Matrix<T> = a.as_leaf()?.clone();
                Task::new(opcode, cost, regions, move || unsafe { kernel::chol(&a) })
            }
        };
        Ok(task)
    }
}
