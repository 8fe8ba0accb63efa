//! The out-of-order task queue
//!
//! Process-wide state in the original design; here one `TaskQueue` lives
//! on each [`RuntimeContext`](crate::context::RuntimeContext). A single
//! coarse mutex guards every mutation of the task list and the per-task
//! dependency counters; kernels always run outside the lock. The
//! O(outstanding) overlap scan on every push is serialized under that
//! mutex and is the design's scalability ceiling, accepted deliberately.
//!
//! Ordering guarantee: the aggregate effect on any single operand region
//! equals executing all tasks touching that region in submission order,
//! however many workers interleave tasks on disjoint regions.

use super::task::{must_order, Task, TaskId, TaskRegions};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

struct Slot {
    /// Taken by a worker for execution; `None` while running or retired.
    task: Option<Task>,
    cost: f64,
    /// Kept past execution start so later pushes can still scan it.
    regions: TaskRegions,
    pending: usize,
    dependents: Vec<usize>,
    retired: bool,
}

struct QueueState {
    slots: Vec<Slot>,
    /// Pushed and not yet retired (includes executing tasks).
    outstanding: usize,
    draining: bool,
    shutdown: bool,
    failure: Option<Error>,
}

/// Dependency-tracked queue of deferred leaf tasks
///
/// See [`crate::queue`] module docs for the locking and ordering rules.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    /// Workers park here while no task is ready.
    ready_cv: Condvar,
    /// `drain` parks here until the graph retires.
    done_cv: Condvar,
    enabled: AtomicBool,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                slots: Vec::new(),
                outstanding: 0,
                draining: false,
                shutdown: false,
                failure: None,
            }),
            ready_cv: Condvar::new(),
            done_cv: Condvar::new(),
            enabled: AtomicBool::new(false),
        }
    }

    /// Route subsequent leaf dispatches into the queue
    ///
    /// Must be toggled before an operation sequence begins, not in the
    /// middle of one.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Route subsequent leaf dispatches to synchronous execution
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Whether leaf dispatches are currently deferred
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Number of pushed, not yet retired tasks
    pub fn num_tasks(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Push a deferred task, recording dependency edges
    ///
    /// Scans every outstanding task; each one whose declared regions
    /// overlap this task's with at least one write involved becomes a
    /// predecessor. Returns the task's id. Fails with a queue-state error
    /// if the queue is disabled or finalized - falling back to synchronous
    /// execution here would silently break the caller's asynchrony
    /// expectations.
    pub fn push(&self, task: Task) -> Result<TaskId> {
        if !self.is_enabled() {
            return Err(Error::QueueState { state: "disabled" });
        }
        let mut s = self.state.lock();
        if s.shutdown {
            return Err(Error::QueueState {
                state: "finalized",
            });
        }

        let id = s.slots.len();
        let mut pending = 0;
        for (pred_id, pred) in s.slots.iter_mut().enumerate() {
            if !pred.retired && must_order(&pred.regions, task.regions()) {
                pred.dependents.push(id);
                pending += 1;
                trace!(task = id, predecessor = pred_id, "dependency edge");
            }
        }

        debug!(
            task = id,
            opcode = task.opcode(),
            cost = task.cost(),
            pending,
            "task enqueued"
        );
        let slot = Slot {
            cost: task.cost(),
            regions: task.regions().iter().cloned().collect(),
            task: Some(task),
            pending,
            dependents: Vec::new(),
            retired: false,
        };
        s.slots.push(slot);
        s.outstanding += 1;
        if pending == 0 && s.draining {
            self.ready_cv.notify_one();
        }
        Ok(TaskId(id))
    }

    /// Unresolved predecessor count of a pushed task
    ///
    /// `None` once the queue has emptied and recycled its slots.
    pub fn pending_dependencies(&self, id: TaskId) -> Option<usize> {
        self.state.lock().slots.get(id.0).map(|slot| slot.pending)
    }

    /// Execute everything in the queue and block until it is empty
    ///
    /// Engages the worker pool and acts as a barrier: returns only once
    /// every task has retired and all workers are idle again. The first
    /// kernel failure (in retire order) is returned; a failed task still
    /// releases its dependents, so the graph always retires fully.
    pub fn drain(&self) -> Result<()> {
        let mut s = self.state.lock();
        debug!(outstanding = s.outstanding, "drain started");
        s.draining = true;
        self.ready_cv.notify_all();
        while s.outstanding > 0 {
            self.done_cv.wait(&mut s);
        }
        s.draining = false;
        let failure = s.failure.take();
        drop(s);
        debug!("drain finished");
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Worker side: block until a task is ready, then claim it
    ///
    /// Among ready tasks the one with the highest cost estimate wins, so
    /// large work is front-loaded for load balance. Returns `None` on
    /// shutdown.
    pub(crate) fn take_ready(&self) -> Option<(TaskId, Task)> {
        let mut s = self.state.lock();
        loop {
            if s.shutdown {
                return None;
            }
            if s.draining {
                if let Some(id) = Self::best_ready(&s) {
                    let task = s.slots[id].task.take().expect("ready slot has a task");
                    return Some((TaskId(id), task));
                }
            }
            self.ready_cv.wait(&mut s);
        }
    }

    /// Highest-cost ready task; ties go to the earliest submission.
    fn best_ready(s: &QueueState) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (id, slot) in s.slots.iter().enumerate() {
            if slot.task.is_some() && slot.pending == 0 {
                match best {
                    Some(b) if s.slots[b].cost >= slot.cost => {}
                    _ => best = Some(id),
                }
            }
        }
        best
    }

    /// Worker side: retire an executed task and release its dependents
    pub(crate) fn complete(&self, id: TaskId, result: Result<()>) {
        let mut s = self.state.lock();
        let dependents = std::mem::take(&mut s.slots[id.0].dependents);
        s.slots[id.0].retired = true;
        s.slots[id.0].regions.clear();
        s.outstanding -= 1;

        let mut newly_ready = 0;
        for dep in dependents {
            let slot = &mut s.slots[dep];
            slot.pending -= 1;
            if slot.pending == 0 && slot.task.is_some() {
                newly_ready += 1;
            }
        }
        if let Err(err) = result {
            warn!(task = id.0, %err, "task failed");
            if s.failure.is_none() {
                s.failure = Some(err);
            }
        } else {
            trace!(task = id.0, "task retired");
        }

        if s.outstanding == 0 {
            // The whole graph has retired; recycle the slot list so ids
            // restart and the scan stays proportional to live tasks.
            s.slots.clear();
            self.done_cv.notify_all();
        } else if newly_ready > 0 {
            if newly_ready == 1 {
                self.ready_cv.notify_one();
            } else {
                self.ready_cv.notify_all();
            }
        }
    }

    /// Stop the worker pool; called once at context finalize
    pub(crate) fn shutdown(&self) {
        let mut s = self.state.lock();
        s.shutdown = true;
        self.ready_cv.notify_all();
    }
}
