//! # lamina
//!
//! **Control-tree driven dense linear algebra with out-of-order task
//! scheduling.**
//!
//! lamina separates *what* a matrix operation computes from *how* it is
//! computed. Every operation is dispatched through a small graph of
//! control nodes that pick, at each recursion level, an algorithmic
//! variant and a storage strategy; leaf-level kernel calls can optionally
//! be deferred into a dependency-tracked task queue and executed out of
//! order by a fixed pool of worker threads.
//!
//! ## Architecture
//!
//! ```text
//! ops (front ends)
//!  └── dispatcher ── ControlNode graph (variant + domain + blocksize)
//!        ├── RECURSE_HIER     walk a HierMatrix one level down
//!        ├── DISPATCH_VARIANT run a blocked body over flat views
//!        ├── EXECUTE_LEAF     run a kernel synchronously
//!        └── ENQUEUE ──> TaskQueue ──> WorkerPool (drain barrier)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lamina::prelude::*;
//! use lamina::ops;
//!
//! let ctx = RuntimeContext::with_defaults()?;
//! let a = Matrix::<f64>::from_slice(&data, n, n);
//! let ha = HierMatrix::from_flat(&a, &[128])?;
//!
//! ctx.queue().enable();
//! ops::chol(&ctx, &ha)?;   // leaves are enqueued, call returns
//! ctx.drain()?;            // barrier: factorization is now complete
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded reference gemm kernel

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blocksize;
pub mod context;
pub mod control;
mod dispatch;
pub mod dtype;
pub mod error;
mod kernel;
pub mod operand;
pub mod ops;
pub mod queue;

pub use kernel::{Side, Trans};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::blocksize::Blocksize;
    pub use crate::context::{CheckLevel, ContextConfig, RuntimeContext};
    pub use crate::control::{ControlForest, ControlNode, Domain, OpKind, Variant};
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::operand::{ElemType, HierMatrix, Matrix, Region, Span, Storage};
    pub use crate::queue::{Access, Task, TaskQueue};
    pub use crate::{Side, Trans};
}
