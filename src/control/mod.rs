//! Control trees: which algorithm runs where
//!
//! A `ControlNode` pins down, for one operation, the storage domain it
//! expects (FLAT or HIER), the algorithmic variant to run, the blocksize
//! blocked variants partition with, and name-addressed references to the
//! control nodes its suboperations dispatch through (`"sub-gemm"`,
//! `"sub-trsm"`, ...).
//!
//! Nodes are immutable after construction and shared via `Arc`: a node
//! referenced by several parents is released exactly once, when its last
//! referent drops, so no teardown ordering exists to get wrong.
//!
//! Construction validates that every child the `(operation, variant)`
//! pair requires is present; a missing child is a configuration defect
//! reported immediately rather than a latent null dereference at
//! dispatch time.

mod standard;

pub use standard::ControlForest;

use crate::blocksize::Blocksize;
use crate::error::{Error, Result};
use std::sync::Arc;

/// The operations the crate ships control trees for
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Scale a matrix in place
    Scal,
    /// General matrix multiply: C := alpha op(A) op(B) + beta C
    Gemm,
    /// Triangular solve with a lower factor
    Trsm,
    /// Symmetric rank-k update (lower): C := alpha A A^T + beta C
    Syrk,
    /// Cholesky factorization (lower)
    Chol,
}

impl OpKind {
    /// Stable lowercase name, used as opcode and in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            OpKind::Scal => "scal",
            OpKind::Gemm => "gemm",
            OpKind::Trsm => "trsm",
            OpKind::Syrk => "syrk",
            OpKind::Chol => "chol",
        }
    }

    /// The child-reference name suboperations of this kind dispatch through
    pub const fn child_name(self) -> &'static str {
        match self {
            OpKind::Scal => "sub-scal",
            OpKind::Gemm => "sub-gemm",
            OpKind::Trsm => "sub-trsm",
            OpKind::Syrk => "sub-syrk",
            OpKind::Chol => "sub-chol",
        }
    }
}

/// Storage domain a control node expects its operands in
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Flat strided buffers
    Flat,
    /// Hierarchical blocks-of-blocks
    Hier,
}

/// Algorithmic variant a control node selects
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Recurse block-wise through a hierarchical operand
    Subproblem,
    /// Invoke the leaf kernel directly
    Unblocked,
    /// A numbered blocked algorithm body
    Blocked(u8),
}

/// One node of a control tree
///
/// See the module docs for the sharing and validation rules.
pub struct ControlNode {
    op: OpKind,
    domain: Domain,
    variant: Variant,
    blocksize: Option<Arc<Blocksize>>,
    children: Vec<(&'static str, Arc<ControlNode>)>,
}

/// Children required by each known `(operation, variant)` pair
///
/// Returns `None` for pairs with no algorithm body; building such a node
/// succeeds only to fail with `UnsupportedVariant` at first dispatch,
/// matching the "detected at construction or first use" contract.
fn required_children(op: OpKind, variant: Variant) -> Option<&'static [&'static str]> {
    use OpKind::*;
    use Variant::*;
    match (op, variant) {
        (_, Unblocked) => Some(&[]),
        (Scal, Subproblem) => Some(&["sub-scal"]),
        (Gemm, Subproblem) => Some(&["sub-gemm"]),
        (Gemm, Blocked(1) | Blocked(2)) => Some(&["sub-gemm"]),
        (Gemm, Blocked(3)) => Some(&["sub-gemm", "sub-scal"]),
        (Trsm, Subproblem | Blocked(1)) => Some(&["sub-trsm", "sub-gemm"]),
        (Syrk, Subproblem | Blocked(1)) => Some(&["sub-syrk", "sub-gemm"]),
        (Chol, Subproblem) => Some(&["sub-chol", "sub-trsm", "sub-syrk", "sub-gemm"]),
        (Chol, Blocked(3)) => Some(&["sub-chol", "sub-trsm", "sub-syrk"]),
        _ => None,
    }
}

impl ControlNode {
    /// Build a control node, validating its configuration
    ///
    /// Fails with a configuration error when the domain and variant are
    /// incoherent, a blocked variant has no blocksize, or a child the
    /// `(op, variant)` pair requires is absent.
    pub fn build(
        op: OpKind,
        domain: Domain,
        variant: Variant,
        blocksize: Option<Arc<Blocksize>>,
        children: &[(&'static str, &Arc<ControlNode>)],
    ) -> Result<Arc<Self>> {
        match (domain, variant) {
            (Domain::Hier, Variant::Subproblem)
            | (Domain::Flat, Variant::Unblocked)
            | (Domain::Flat, Variant::Blocked(_)) => {}
            _ => {
                return Err(Error::UnsupportedVariant {
                    op: op.name(),
                    variant,
                });
            }
        }
        if matches!(variant, Variant::Blocked(_)) && blocksize.is_none() {
            return Err(Error::MissingChild {
                op: op.name(),
                child: "blocksize",
            });
        }
        if let Some(required) = required_children(op, variant) {
            for &name in required {
                if !children.iter().any(|(n, _)| *n == name) {
                    return Err(Error::MissingChild {
                        op: op.name(),
                        child: name,
                    });
                }
            }
        }
        Ok(Arc::new(Self {
            op,
            domain,
            variant,
            blocksize,
            children: children
                .iter()
                .map(|&(name, node)| (name, Arc::clone(node)))
                .collect(),
        }))
    }

    /// Build the FLAT leaf node for an operation (unblocked kernel body)
    pub fn leaf(op: OpKind) -> Arc<Self> {
        Arc::new(Self {
            op,
            domain: Domain::Flat,
            variant: Variant::Unblocked,
            blocksize: None,
            children: Vec::new(),
        })
    }

    /// The operation this node selects a variant for
    #[inline]
    pub fn op(&self) -> OpKind {
        self.op
    }

    /// Storage domain the node expects
    #[inline]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Algorithmic variant the node selects
    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Blocksize for blocked variant bodies
    #[inline]
    pub fn blocksize(&self) -> Option<&Arc<Blocksize>> {
        self.blocksize.as_ref()
    }

    /// Look up a child control node by reference name
    pub fn child(&self, name: &str) -> Option<&Arc<ControlNode>> {
        self.children
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, node)| node)
    }

    /// Look up a child, failing with a configuration error if absent
    pub(crate) fn require_child(&self, name: &'static str) -> Result<&Arc<ControlNode>> {
        self.child(name).ok_or(Error::MissingChild {
            op: self.op.name(),
            child: name,
        })
    }

    /// The blocksize, failing with a configuration error if absent
    pub(crate) fn require_blocksize(&self) -> Result<&Arc<Blocksize>> {
        self.blocksize.as_ref().ok_or(Error::MissingChild {
            op: self.op.name(),
            child: "blocksize",
        })
    }
}

impl std::fmt::Debug for ControlNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlNode")
            .field("op", &self.op)
            .field("domain", &self.domain)
            .field("variant", &self.variant)
            .field(
                "children",
                &self.children.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_node() {
        let n = ControlNode::leaf(OpKind::Gemm);
        assert_eq!(n.op(), OpKind::Gemm);
        assert_eq!(n.domain(), Domain::Flat);
        assert_eq!(n.variant(), Variant::Unblocked);
        assert!(n.child("sub-gemm").is_none());
    }

    #[test]
    fn test_missing_child_rejected() {
        let bs = Arc::new(Blocksize::uniform(8));
        let err = ControlNode::build(
            OpKind::Trsm,
            Domain::Flat,
            Variant::Blocked(1),
            Some(bs),
            &[("sub-trsm", &ControlNode::leaf(OpKind::Trsm))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingChild {
                op: "trsm",
                child: "sub-gemm"
            }
        ));
    }

    #[test]
    fn test_blocked_without_blocksize_rejected() {
        let gemm = ControlNode::leaf(OpKind::Gemm);
        let err = ControlNode::build(
            OpKind::Gemm,
            Domain::Flat,
            Variant::Blocked(1),
            None,
            &[("sub-gemm", &gemm)],
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_incoherent_domain_variant_rejected() {
        let err = ControlNode::build(
            OpKind::Gemm,
            Domain::Flat,
            Variant::Subproblem,
            None,
            &[("sub-gemm", &ControlNode::leaf(OpKind::Gemm))],
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVariant { op: "gemm", .. }));
    }

    #[test]
    fn test_shared_child_refcount() {
        let bs = Arc::new(Blocksize::uniform(8));
        let gemm = ControlNode::leaf(OpKind::Gemm);
        let a = ControlNode::build(
            OpKind::Gemm,
            Domain::Flat,
            Variant::Blocked(1),
            Some(bs.clone()),
            &[("sub-gemm", &gemm)],
        )
        .unwrap();
        let b = ControlNode::build(
            OpKind::Gemm,
            Domain::Flat,
            Variant::Blocked(2),
            Some(bs),
            &[("sub-gemm", &gemm)],
        )
        .unwrap();
        assert_eq!(Arc::strong_count(&gemm), 3);
        drop(a);
        assert_eq!(Arc::strong_count(&gemm), 2);
        drop(b);
        assert_eq!(Arc::strong_count(&gemm), 1);
    }
}
