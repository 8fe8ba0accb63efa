//! Operand views: shared storage, flat matrices, and block hierarchies
//!
//! This module provides the operand side of the dispatcher's contract:
//!
//! ```text
//! Storage (ref-counted flat buffer, unique id)
//! └── Matrix (strided window, zero-copy partitioning)
//!       └── HierMatrix (SCALAR leaf | MATRIX grid of sub-views)
//! ```
//!
//! Views alias; nothing here copies elements. The [`Region`] type is the
//! operand boundary consumed by the task queue's dependency analyzer.

mod hier;
mod matrix;
pub mod partition;
mod storage;

pub use hier::{ElemType, HierMatrix};
pub use matrix::{Matrix, Region, Span};
pub use storage::{Storage, StorageId};
