//! The dispatcher: one decision procedure for every operation
//!
//! Each call enters at CHECK_DOMAIN and takes exactly one of four exits,
//! evaluated in order:
//!
//! ```text
//! CHECK_DOMAIN ──┬── HIER + MATRIX elements + SUBPROBLEM ─> RECURSE_HIER
//!                ├── HIER + SCALAR elements + queue on ───> ENQUEUE
//!                ├── HIER + SCALAR elements + queue off ──> EXECUTE_LEAF
//!                └── FLAT ────────────────────────────────> DISPATCH_VARIANT
//! ```
//!
//! RECURSE_HIER re-dispatches per sub-block one hierarchy level down;
//! ENQUEUE captures the leaf call as a task and returns immediately (the
//! call is asynchronous from that point); EXECUTE_LEAF runs the kernel
//! through the node's designated leaf child; DISPATCH_VARIANT selects a
//! blocked or unblocked algorithm body by the node's variant.

mod check;
mod hier;
mod op;
mod variants;

pub(crate) use op::Op;

use crate::context::{CheckLevel, RuntimeContext};
use crate::control::{ControlNode, Domain, Variant};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::operand::ElemType;
use std::sync::Arc;
use tracing::trace;

/// Dispatch one operation call through a control node
pub(crate) fn dispatch<T: Element>(
    ctx: &RuntimeContext,
    op: Op<T>,
    cntl: &Arc<ControlNode>,
) -> Result<()> {
    ctx.note_dispatch();
    match cntl.domain() {
        Domain::Hier => match op.elemtype() {
            ElemType::Matrix if cntl.variant() == Variant::Subproblem => {
                ctx.note_hier_recursion();
                trace!(op = op.opcode(), "recursing one hierarchy level");
                hier::recurse(ctx, op, cntl)
            }
            ElemType::Matrix => Err(Error::UnsupportedVariant {
                op: op.opcode(),
                variant: cntl.variant(),
            }),
            ElemType::Scalar => {
                let leaf = cntl.require_child(op.kind().child_name())?.clone();
                if ctx.queue().is_enabled() {
                    if ctx.check_level() == CheckLevel::Full {
                        check::conformable(&op)?;
                    }
                    trace!(op = op.opcode(), "deferring leaf into the queue");
                    ctx.queue().push(op.into_task()?)?;
                    Ok(())
                } else {
                    dispatch(ctx, op, &leaf)
                }
            }
        },
        Domain::Flat => variants::dispatch_variant(ctx, op, cntl),
    }
}

/// Front-end entry: pick the context's default tree for the operand domain
pub(crate) fn entry<T: Element>(ctx: &RuntimeContext, op: Op<T>) -> Result<()> {
    let domain = match op.elemtype() {
        ElemType::Scalar => Domain::Flat,
        ElemType::Matrix => Domain::Hier,
    };
    let cntl = ctx.tree(op.kind(), domain).clone();
    entry_with(ctx, op, &cntl)
}

/// Front-end entry through an explicit control tree
pub(crate) fn entry_with<T: Element>(
    ctx: &RuntimeContext,
    op: Op<T>,
    cntl: &Arc<ControlNode>,
) -> Result<()> {
    if ctx.check_level() >= CheckLevel::Minimal {
        check::conformable(&op)?;
    }
    dispatch(ctx, op, cntl)
}
