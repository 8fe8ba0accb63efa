//! Deferred execution: tasks, the dependency-tracked queue, and workers
//!
//! ```text
//! Dispatcher ── push ──> TaskQueue ── take_ready ──> WorkerPool
//!                          │  overlap scan on push       │ kernels run
//!                          │  (one coarse mutex)         │ outside the lock
//!                          └────── drain barrier <───────┘
//! ```
//!
//! The queue specializes its dependency model to matrix operand regions:
//! two tasks must be ordered exactly when their declared regions overlap
//! with at least one write involved. Everything else runs in whatever
//! order the workers reach it.

mod pool;
#[allow(clippy::module_inception)]
mod queue;
mod task;

pub use pool::WorkerPool;
pub use queue::TaskQueue;
pub use task::{Access, Task, TaskId, TaskRegions};
