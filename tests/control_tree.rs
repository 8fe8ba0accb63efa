//! Integration tests for control-tree construction and teardown
//!
//! Control nodes are shared via `Arc`, so teardown balance means every
//! node's strong count returns to its baseline once the trees referencing
//! it are dropped, regardless of how many parents shared it.

use lamina::blocksize::Blocksize;
use lamina::control::{ControlForest, ControlNode, Domain, OpKind, Variant};
use lamina::error::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn leaves() -> [(OpKind, Arc<ControlNode>); 5] {
    [
        (OpKind::Scal, ControlNode::leaf(OpKind::Scal)),
        (OpKind::Gemm, ControlNode::leaf(OpKind::Gemm)),
        (OpKind::Trsm, ControlNode::leaf(OpKind::Trsm)),
        (OpKind::Syrk, ControlNode::leaf(OpKind::Syrk)),
        (OpKind::Chol, ControlNode::leaf(OpKind::Chol)),
    ]
}

#[test]
fn test_build_validates_required_children() {
    let bs = Arc::new(Blocksize::uniform(4));
    let gemm_leaf = ControlNode::leaf(OpKind::Gemm);
    let syrk_leaf = ControlNode::leaf(OpKind::Syrk);

    // All children present: ok.
    assert!(ControlNode::build(
        OpKind::Syrk,
        Domain::Flat,
        Variant::Blocked(1),
        Some(bs.clone()),
        &[("sub-syrk", &syrk_leaf), ("sub-gemm", &gemm_leaf)],
    )
    .is_ok());

    // Required child absent: configuration error naming the child.
    let err = ControlNode::build(
        OpKind::Syrk,
        Domain::Flat,
        Variant::Blocked(1),
        Some(bs),
        &[("sub-syrk", &syrk_leaf)],
    )
    .unwrap_err();
    match err {
        Error::MissingChild { op, child } => {
            assert_eq!(op, "syrk");
            assert_eq!(child, "sub-gemm");
        }
        other => panic!("expected MissingChild, got {other:?}"),
    }
}

#[test]
fn test_child_lookup_by_name() {
    let bs = Arc::new(Blocksize::uniform(4));
    let trsm_leaf = ControlNode::leaf(OpKind::Trsm);
    let gemm_leaf = ControlNode::leaf(OpKind::Gemm);
    let node = ControlNode::build(
        OpKind::Trsm,
        Domain::Flat,
        Variant::Blocked(1),
        Some(bs),
        &[("sub-trsm", &trsm_leaf), ("sub-gemm", &gemm_leaf)],
    )
    .unwrap();

    assert!(Arc::ptr_eq(node.child("sub-trsm").unwrap(), &trsm_leaf));
    assert!(Arc::ptr_eq(node.child("sub-gemm").unwrap(), &gemm_leaf));
    assert!(node.child("sub-chol").is_none());
}

#[test]
fn test_randomized_build_teardown_balance() {
    let mut rng = StdRng::seed_from_u64(0x1a71);
    let bs = Arc::new(Blocksize::uniform(4));
    let pool = leaves();
    let variants = [
        Variant::Unblocked,
        Variant::Subproblem,
        Variant::Blocked(1),
        Variant::Blocked(2),
        Variant::Blocked(3),
    ];

    let baseline: Vec<usize> = pool.iter().map(|(_, n)| Arc::strong_count(n)).collect();
    let bs_baseline = Arc::strong_count(&bs);

    for _ in 0..200 {
        let op = pool[rng.gen_range(0..pool.len())].0;
        let variant = variants[rng.gen_range(0..variants.len())];
        let domain = match variant {
            Variant::Subproblem => Domain::Hier,
            _ => Domain::Flat,
        };
        // Offer every possible child so only variant semantics decide.
        let children: Vec<(&'static str, &Arc<ControlNode>)> = pool
            .iter()
            .map(|(k, n)| (k.child_name(), n))
            .collect();
        let built = ControlNode::build(op, domain, variant, Some(bs.clone()), &children);
        // With all children present, every known pair builds.
        if let Ok(node) = built {
            assert_eq!(node.op(), op);
            drop(node);
        }
        // Teardown balance after each trial.
        for ((_, n), &base) in pool.iter().zip(&baseline) {
            assert_eq!(Arc::strong_count(n), base, "leaked child reference");
        }
        assert_eq!(Arc::strong_count(&bs), bs_baseline, "leaked blocksize");
    }
}

#[test]
fn test_forest_shares_and_releases_subtrees() {
    let bs = Arc::new(Blocksize::uniform(4));
    assert_eq!(Arc::strong_count(&bs), 1);

    let forest = ControlForest::new(bs.clone()).unwrap();
    let shared_gemm = forest.tree(OpKind::Gemm, Domain::Hier).clone();
    // Shared by the forest field plus trsm, syrk, and chol trees, and our clone.
    assert!(Arc::strong_count(&shared_gemm) >= 4);

    drop(forest);
    // Only our clone remains; every parent released exactly once.
    assert_eq!(Arc::strong_count(&shared_gemm), 1);
    assert_eq!(Arc::strong_count(&bs), 1);
}

#[test]
fn test_unknown_variant_builds_but_is_flagged_later() {
    // Pairs outside the algorithm table have no required children; the
    // defect surfaces as UnsupportedVariant at first dispatch instead.
    let bs = Arc::new(Blocksize::uniform(4));
    let node = ControlNode::build(OpKind::Gemm, Domain::Flat, Variant::Blocked(9), Some(bs), &[]);
    assert!(node.is_ok());
}
