//! The standard control-tree forest
//!
//! One instance of every `(operation, variant)` node the library uses,
//! built once per context. Subtrees are shared: the hierarchical gemm
//! node, for example, is referenced by the trsm, syrk, and chol trees as
//! their `"sub-gemm"` child, and `Arc` sharing releases it exactly once.

use super::{ControlNode, Domain, OpKind, Variant};
use crate::blocksize::Blocksize;
use crate::error::Result;
use std::sync::Arc;

/// Default control trees for every shipped operation, per domain
///
/// The FLAT trees run blocked bodies over strided buffers; the HIER trees
/// recurse block-wise and bottom out in the FLAT leaves.
pub struct ControlForest {
    scal_leaf: Arc<ControlNode>,
    gemm_leaf: Arc<ControlNode>,
    trsm_leaf: Arc<ControlNode>,
    syrk_leaf: Arc<ControlNode>,
    chol_leaf: Arc<ControlNode>,

    gemm_flat: Arc<ControlNode>,
    trsm_flat: Arc<ControlNode>,
    syrk_flat: Arc<ControlNode>,
    chol_flat: Arc<ControlNode>,

    scal_hier: Arc<ControlNode>,
    gemm_hier: Arc<ControlNode>,
    trsm_hier: Arc<ControlNode>,
    syrk_hier: Arc<ControlNode>,
    chol_hier: Arc<ControlNode>,
}

impl ControlForest {
    /// Build the standard forest around one shared blocksize
    pub fn new(blocksize: Arc<Blocksize>) -> Result<Self> {
        let scal_leaf = ControlNode::leaf(OpKind::Scal);
        let gemm_leaf = ControlNode::leaf(OpKind::Gemm);
        let trsm_leaf = ControlNode::leaf(OpKind::Trsm);
        let syrk_leaf = ControlNode::leaf(OpKind::Syrk);
        let chol_leaf = ControlNode::leaf(OpKind::Chol);

        // FLAT blocked trees. chol nests the blocked trees of its
        // suboperations; the others bottom out in leaves directly.
        let gemm_flat = ControlNode::build(
            OpKind::Gemm,
            Domain::Flat,
            Variant::Blocked(1),
            Some(blocksize.clone()),
            &[("sub-gemm", &gemm_leaf)],
        )?;
        let trsm_flat = ControlNode::build(
            OpKind::Trsm,
            Domain::Flat,
            Variant::Blocked(1),
            Some(blocksize.clone()),
            &[("sub-trsm", &trsm_leaf), ("sub-gemm", &gemm_leaf)],
        )?;
        let syrk_flat = ControlNode::build(
            OpKind::Syrk,
            Domain::Flat,
            Variant::Blocked(1),
            Some(blocksize.clone()),
            &[("sub-syrk", &syrk_leaf), ("sub-gemm", &gemm_leaf)],
        )?;
        let chol_flat = ControlNode::build(
            OpKind::Chol,
            Domain::Flat,
            Variant::Blocked(3),
            Some(blocksize.clone()),
            &[
                ("sub-chol", &chol_leaf),
                ("sub-trsm", &trsm_flat),
                ("sub-syrk", &syrk_flat),
            ],
        )?;

        // HIER subproblem trees. Same-operation recursion reuses the node
        // itself; cross-operation recursion goes through these children,
        // and the SCALAR leaf case executes through the `sub-<op>` leaf.
        let scal_hier = ControlNode::build(
            OpKind::Scal,
            Domain::Hier,
            Variant::Subproblem,
            None,
            &[("sub-scal", &scal_leaf)],
        )?;
        let gemm_hier = ControlNode::build(
            OpKind::Gemm,
            Domain::Hier,
            Variant::Subproblem,
            None,
            &[("sub-gemm", &gemm_leaf)],
        )?;
        let trsm_hier = ControlNode::build(
            OpKind::Trsm,
            Domain::Hier,
            Variant::Subproblem,
            None,
            &[("sub-trsm", &trsm_leaf), ("sub-gemm", &gemm_hier)],
        )?;
        let syrk_hier = ControlNode::build(
            OpKind::Syrk,
            Domain::Hier,
            Variant::Subproblem,
            None,
            &[("sub-syrk", &syrk_leaf), ("sub-gemm", &gemm_hier)],
        )?;
        let chol_hier = ControlNode::build(
            OpKind::Chol,
            Domain::Hier,
            Variant::Subproblem,
            None,
            &[
                ("sub-chol", &chol_leaf),
                ("sub-trsm", &trsm_hier),
                ("sub-syrk", &syrk_hier),
                ("sub-gemm", &gemm_hier),
            ],
        )?;

        Ok(Self {
            scal_leaf,
            gemm_leaf,
            trsm_leaf,
            syrk_leaf,
            chol_leaf,
            gemm_flat,
            trsm_flat,
            syrk_flat,
            chol_flat,
            scal_hier,
            gemm_hier,
            trsm_hier,
            syrk_hier,
            chol_hier,
        })
    }

    /// The default tree for an operation in a domain
    pub fn tree(&self, op: OpKind, domain: Domain) -> &Arc<ControlNode> {
        match (op, domain) {
            (OpKind::Scal, Domain::Flat) => &self.scal_leaf,
            (OpKind::Gemm, Domain::Flat) => &self.gemm_flat,
            (OpKind::Trsm, Domain::Flat) => &self.trsm_flat,
            (OpKind::Syrk, Domain::Flat) => &self.syrk_flat,
            (OpKind::Chol, Domain::Flat) => &self.chol_flat,
            (OpKind::Scal, Domain::Hier) => &self.scal_hier,
            (OpKind::Gemm, Domain::Hier) => &self.gemm_hier,
            (OpKind::Trsm, Domain::Hier) => &self.trsm_hier,
            (OpKind::Syrk, Domain::Hier) => &self.syrk_hier,
            (OpKind::Chol, Domain::Hier) => &self.chol_hier,
        }
    }

    /// The FLAT unblocked leaf node for an operation
    pub fn leaf(&self, op: OpKind) -> &Arc<ControlNode> {
        match op {
            OpKind::Scal => &self.scal_leaf,
            OpKind::Gemm => &self.gemm_leaf,
            OpKind::Trsm => &self.trsm_leaf,
            OpKind::Syrk => &self.syrk_leaf,
            OpKind::Chol => &self.chol_leaf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forest_builds() {
        let forest = ControlForest::new(Arc::new(Blocksize::uniform(8))).unwrap();
        let chol = forest.tree(OpKind::Chol, Domain::Hier);
        assert_eq!(chol.variant(), Variant::Subproblem);
        // chol's gemm child is the shared hierarchical gemm tree.
        let gemm = chol.child("sub-gemm").unwrap();
        assert_eq!(gemm.domain(), Domain::Hier);
        assert!(Arc::ptr_eq(
            gemm,
            forest.tree(OpKind::Gemm, Domain::Hier)
        ));
    }

    #[test]
    fn test_flat_chol_nests_blocked_subtrees() {
        let forest = ControlForest::new(Arc::new(Blocksize::uniform(8))).unwrap();
        let chol = forest.tree(OpKind::Chol, Domain::Flat);
        let trsm = chol.child("sub-trsm").unwrap();
        assert_eq!(trsm.variant(), Variant::Blocked(1));
        assert!(trsm.blocksize().is_some());
    }
}
