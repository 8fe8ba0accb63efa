//! The fixed worker-thread pool
//!
//! Workers are OS threads created once at context init and joined at
//! context finalize. Each worker loops: claim a ready task under the
//! queue lock, execute its kernel outside the lock, retire it and release
//! dependents under the lock again. Suspension happens only inside
//! [`TaskQueue::take_ready`] - never mid-kernel.

use super::queue::TaskQueue;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::trace;

/// Fixed pool of worker threads draining one task queue
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `num_threads` workers against `queue`
    ///
    /// The count is clamped to at least one so `drain` can always make
    /// progress.
    pub(crate) fn new(num_threads: usize, queue: Arc<TaskQueue>) -> Self {
        let num_threads = num_threads.max(1);
        let handles = (0..num_threads)
            .map(|id| {
                let queue = Arc::clone(&queue);
                std::thread::Builder::new()
                    .name(format!("lamina-worker-{id}"))
                    .spawn(move || worker_loop(id, &queue))
                    .expect("failed to spawn worker thread")
            })
            .collect();
        Self { queue, handles }
    }

    /// Number of worker threads in the pool
    pub fn num_threads(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.shutdown();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(worker: usize, queue: &TaskQueue) {
    while let Some((id, task)) = queue.take_ready() {
        trace!(worker, task = ?id, opcode = task.opcode(), "executing");
        let result = task.execute();
        queue.complete(id, result);
    }
    trace!(worker, "worker exiting");
}
