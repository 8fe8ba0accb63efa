//! The runtime context
//!
//! Everything the original design kept in file-scope globals lives here
//! instead: the standard control-tree forest, the task queue with its
//! worker pool, and the error-checking level. A context is constructed
//! once and passed by reference into every front-end call, so independent
//! contexts (and their tests) never interfere.
//!
//! The context doubles as the queue lifecycle: construction is
//! `queueInit` (trees built, workers spawned), drop is `queueFinalize`
//! (workers joined, trees released).

use crate::blocksize::Blocksize;
use crate::control::{ControlForest, ControlNode, Domain, OpKind};
use crate::error::Result;
use crate::queue::{TaskQueue, WorkerPool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How much conformability checking runs before kernels
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// No checks
    Off,
    /// Check once per front-end call
    #[default]
    Minimal,
    /// Check per front-end call and before every leaf kernel
    Full,
}

/// Configuration for a runtime context
#[derive(Clone, Debug)]
pub struct ContextConfig {
    /// Worker threads in the pool (clamped to at least one)
    pub num_threads: usize,
    /// Blocksize shared by the standard control trees
    pub blocksize: Blocksize,
    /// Conformability-checking level
    pub check: CheckLevel,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            blocksize: Blocksize::DEFAULT,
            check: CheckLevel::default(),
        }
    }
}

/// Owner of the control trees, the task queue, and the worker pool
pub struct RuntimeContext {
    config: ContextConfig,
    forest: ControlForest,
    queue: Arc<TaskQueue>,
    pool: WorkerPool,
    dispatches: AtomicU64,
    hier_recursions: AtomicU64,
}

impl RuntimeContext {
    /// Build a context: control trees plus a worker pool of
    /// `config.num_threads` threads
    pub fn new(config: ContextConfig) -> Result<Self> {
        let forest = ControlForest::new(Arc::new(config.blocksize))?;
        let queue = Arc::new(TaskQueue::new());
        let pool = WorkerPool::new(config.num_threads, Arc::clone(&queue));
        Ok(Self {
            config,
            forest,
            queue,
            pool,
            dispatches: AtomicU64::new(0),
            hier_recursions: AtomicU64::new(0),
        })
    }

    /// Build a context with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(ContextConfig::default())
    }

    /// The task queue (enable/disable, push, drain)
    #[inline]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Drain the queue: execute all deferred tasks and block until done
    pub fn drain(&self) -> Result<()> {
        self.queue.drain()
    }

    /// Number of worker threads in the pool
    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }

    /// The configured conformability-checking level
    #[inline]
    pub fn check_level(&self) -> CheckLevel {
        self.config.check
    }

    /// The standard control-tree forest
    #[inline]
    pub fn forest(&self) -> &ControlForest {
        &self.forest
    }

    /// Default control tree for an operation in a domain
    #[inline]
    pub fn tree(&self, op: OpKind, domain: Domain) -> &Arc<ControlNode> {
        self.forest.tree(op, domain)
    }

    /// Total dispatcher entries since the last reset
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    /// Hierarchy-recursion transitions since the last reset
    pub fn hier_recursion_count(&self) -> u64 {
        self.hier_recursions.load(Ordering::Relaxed)
    }

    /// Reset the dispatch instrumentation counters
    pub fn reset_counts(&self) {
        self.dispatches.store(0, Ordering::Relaxed);
        self.hier_recursions.store(0, Ordering::Relaxed);
    }

    pub(crate) fn note_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_hier_recursion(&self) {
        self.hier_recursions.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("num_threads", &self.pool.num_threads())
            .field("check", &self.config.check)
            .field("queue_enabled", &self.queue.is_enabled())
            .finish()
    }
}
