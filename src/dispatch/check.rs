//! Conformability checking
//!
//! Gated by the context's [`CheckLevel`](crate::context::CheckLevel):
//! `Minimal` runs these once per front-end call, `Full` additionally
//! before every leaf kernel, `Off` skips them entirely. A failed check is
//! an operand error surfaced to the caller, never an abort.

use super::op::Op;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernel::{Side, Trans};

fn op_extents<T: Element>(trans: Trans, m: &crate::operand::HierMatrix<T>) -> (usize, usize) {
    match trans {
        Trans::NoTrans => (m.rows(), m.cols()),
        Trans::Trans => (m.cols(), m.rows()),
    }
}

/// Verify that an operation's operand extents conform
pub(crate) fn conformable<T: Element>(op: &Op<T>) -> Result<()> {
    match op {
        Op::Scal { .. } => Ok(()),
        Op::Gemm {
            transa,
            transb,
            a,
            b,
            c,
            ..
        } => {
            let (am, ak) = op_extents(*transa, a);
            let (bk, bn) = op_extents(*transb, b);
            if am != c.rows() || bn != c.cols() || ak != bk {
                return Err(Error::conformability(
                    "gemm",
                    &[c.rows(), ak, c.cols()],
                    &[am, bk, bn],
                ));
            }
            Ok(())
        }
        Op::Trsm { side, l, b, .. } => {
            let need = match side {
                Side::Left => b.rows(),
                Side::Right => b.cols(),
            };
            if l.rows() != l.cols() || l.rows() != need {
                return Err(Error::conformability(
                    "trsm",
                    &[need, need],
                    &[l.rows(), l.cols()],
                ));
            }
            Ok(())
        }
        Op::Syrk { a, c, .. } => {
            if c.rows() != c.cols() || c.rows() != a.rows() {
                return Err(Error::conformability(
                    "syrk",
                    &[a.rows(), a.rows()],
                    &[c.rows(), c.cols()],
                ));
            }
            Ok(())
        }
        Op::Chol { a } => {
            if a.rows() != a.cols() {
                return Err(Error::conformability(
                    "chol",
                    &[a.rows(), a.rows()],
                    &[a.rows(), a.cols()],
                ));
            }
            Ok(())
        }
    }
}
