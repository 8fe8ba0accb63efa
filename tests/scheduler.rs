//! Integration tests for the out-of-order scheduler
//!
//! The core guarantee: for any task set, the effect on each operand
//! region equals submission-order execution, however many workers drain
//! the queue.

mod common;

use lamina::operand::Matrix;
use lamina::queue::{Access, Task};

/// Submit a chain/diamond task set over shared regions and drain it
///
/// Region layout over an 8x8 matrix: the left half and right half are
/// disjoint; tasks alternate between touching the left half and the whole
/// matrix, forcing a mix of chains and independent work.
fn run_mixed_workload(num_threads: usize) -> Vec<f64> {
    let ctx = common::test_ctx(num_threads);
    let m = Matrix::<f64>::zeros(8, 8);
    let left = m.view(0, 0, 8, 4);
    let right = m.view(0, 4, 8, 4);

    ctx.queue().enable();
    // T0: fill left with 1.
    let l = left.clone();
    ctx.queue()
        .push(Task::new(
            "fill-left",
            10.0,
            [(left.region(), Access::Write)],
            move || {
                for i in 0..l.rows() {
                    for j in 0..l.cols() {
                        l.set(i, j, 1.0);
                    }
                }
                Ok(())
            },
        ))
        .unwrap();
    // T1: fill right with 2 (independent of T0).
    let r = right.clone();
    ctx.queue()
        .push(Task::new(
            "fill-right",
            1.0,
            [(right.region(), Access::Write)],
            move || {
                for i in 0..r.rows() {
                    for j in 0..r.cols() {
                        r.set(i, j, 2.0);
                    }
                }
                Ok(())
            },
        ))
        .unwrap();
    // T2: whole-matrix update, depends on both fills.
    let w = m.clone();
    ctx.queue()
        .push(Task::new(
            "scale-all",
            5.0,
            [(m.region(), Access::ReadWrite)],
            move || {
                for i in 0..w.rows() {
                    for j in 0..w.cols() {
                        w.set(i, j, w.get(i, j) * 3.0 + 1.0);
                    }
                }
                Ok(())
            },
        ))
        .unwrap();
    // T3: another left-half update, depends on T2.
    let l2 = left.clone();
    ctx.queue()
        .push(Task::new(
            "bump-left",
            2.0,
            [(left.region(), Access::ReadWrite)],
            move || {
                for i in 0..l2.rows() {
                    for j in 0..l2.cols() {
                        l2.set(i, j, l2.get(i, j) + 0.5);
                    }
                }
                Ok(())
            },
        ))
        .unwrap();

    ctx.drain().unwrap();
    assert_eq!(ctx.queue().num_tasks(), 0);
    m.to_vec()
}

#[test]
fn test_determinism_across_worker_counts() {
    let sequential = run_mixed_workload(1);
    for threads in [2, 8] {
        for _ in 0..10 {
            let parallel = run_mixed_workload(threads);
            assert_eq!(
                sequential, parallel,
                "drain with {threads} workers diverged from sequential order"
            );
        }
    }
    // Left half: (1*3+1)+0.5 = 4.5; right half: 2*3+1 = 7.
    assert_eq!(sequential[0], 4.5);
    assert_eq!(sequential[4], 7.0);
}

#[test]
fn test_write_chain_orders_disjoint_floats() {
    // T1 writes R1, T2 writes R1 (must follow T1), T3 writes disjoint R2.
    // With 4 workers, T1 before T2 always; T3 whenever.
    for _ in 0..25 {
        let ctx = common::test_ctx(4);
        let m = Matrix::<f64>::zeros(2, 6);
        let r1 = m.view(0, 0, 2, 3);
        let r2 = m.view(0, 3, 2, 3);

        ctx.queue().enable();
        let a = r1.clone();
        ctx.queue()
            .push(Task::new(
                "t1",
                1.0,
                [(r1.region(), Access::Write)],
                move || {
                    a.set(0, 0, 1.0);
                    Ok(())
                },
            ))
            .unwrap();
        let b = r1.clone();
        let t2 = ctx
            .queue()
            .push(Task::new(
                "t2",
                1.0,
                [(r1.region(), Access::ReadWrite)],
                move || {
                    // Sees T1's write iff ordered after it.
                    b.set(0, 0, b.get(0, 0) * 2.0 + 1.0);
                    Ok(())
                },
            ))
            .unwrap();
        let c = r2.clone();
        let t3 = ctx
            .queue()
            .push(Task::new(
                "t3",
                1.0,
                [(r2.region(), Access::Write)],
                move || {
                    c.set(0, 0, 9.0);
                    Ok(())
                },
            ))
            .unwrap();

        assert_eq!(ctx.queue().pending_dependencies(t2), Some(1));
        // T3 overlaps nothing outstanding: ready immediately upon push.
        assert_eq!(ctx.queue().pending_dependencies(t3), Some(0));

        ctx.drain().unwrap();
        assert_eq!(m.get(0, 0), 3.0, "T2 ran before T1");
        assert_eq!(m.get(0, 3), 9.0);
    }
}

#[test]
fn test_failed_task_releases_dependents() {
    let ctx = common::test_ctx(2);
    let m = Matrix::<f64>::zeros(2, 2);

    ctx.queue().enable();
    ctx.queue()
        .push(Task::new(
            "fails",
            1.0,
            [(m.region(), Access::Write)],
            || Err(lamina::error::Error::kernel("fails", "synthetic failure")),
        ))
        .unwrap();
    let w = m.clone();
    ctx.queue()
        .push(Task::new(
            "dependent",
            1.0,
            [(m.region(), Access::ReadWrite)],
            move || {
                w.set(1, 1, 42.0);
                Ok(())
            },
        ))
        .unwrap();

    let err = ctx.drain().unwrap_err();
    assert!(matches!(
        err,
        lamina::error::Error::Kernel { opcode: "fails", .. }
    ));
    // The graph retired fully: the dependent still executed.
    assert_eq!(ctx.queue().num_tasks(), 0);
    assert_eq!(m.get(1, 1), 42.0);
}

#[test]
fn test_panicking_task_is_a_kernel_error() {
    let ctx = common::test_ctx(2);
    let m = Matrix::<f64>::zeros(1, 1);

    ctx.queue().enable();
    ctx.queue()
        .push(Task::new(
            "panics",
            1.0,
            [(m.region(), Access::Write)],
            || panic!("kernel bug"),
        ))
        .unwrap();
    let err = ctx.drain().unwrap_err();
    assert!(matches!(err, lamina::error::Error::Kernel { .. }));
}

#[test]
fn test_drain_empty_queue_is_noop() {
    let ctx = common::test_ctx(2);
    ctx.queue().enable();
    ctx.drain().unwrap();
    ctx.drain().unwrap();
}

#[test]
fn test_push_against_disabled_queue_fails() {
    let ctx = common::test_ctx(1);
    let m = Matrix::<f64>::zeros(1, 1);
    let err = ctx
        .queue()
        .push(Task::new(
            "t",
            1.0,
            [(m.region(), Access::Write)],
            || Ok(()),
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        lamina::error::Error::QueueState { state: "disabled" }
    ));
}

#[test]
fn test_queue_reusable_across_drains() {
    let ctx = common::test_ctx(2);
    let m = Matrix::<f64>::zeros(1, 1);
    ctx.queue().enable();
    for round in 1..=3 {
        let w = m.clone();
        ctx.queue()
            .push(Task::new(
                "inc",
                1.0,
                [(m.region(), Access::ReadWrite)],
                move || {
                    w.set(0, 0, w.get(0, 0) + 1.0);
                    Ok(())
                },
            ))
            .unwrap();
        ctx.drain().unwrap();
        assert_eq!(m.get(0, 0), round as f64);
    }
}
