//! Error types for lamina

use crate::control::Variant;
use thiserror::Error;

/// Result type alias using lamina's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building control trees, dispatching
/// operations, or draining the task queue
///
/// The first two variants are configuration errors: they indicate a defect
/// in how a control tree was assembled, not a runtime data condition.
/// Operand errors are produced only when the context's
/// [`CheckLevel`](crate::context::CheckLevel) requires the corresponding
/// check. Queue-state errors are unconditional.
#[derive(Error, Debug)]
pub enum Error {
    /// A control node was built without a child its variant requires
    #[error("control tree for '{op}' is missing required child '{child}'")]
    MissingChild {
        /// The operation the node selects a variant for
        op: &'static str,
        /// Name of the absent child reference
        child: &'static str,
    },

    /// A dispatch site has no algorithm body for the node's variant
    #[error("operation '{op}' has no body for variant {variant:?}")]
    UnsupportedVariant {
        /// The operation being dispatched
        op: &'static str,
        /// The variant the control node selected
        variant: Variant,
    },

    /// Operand dimensions do not conform for an operation
    #[error("operand mismatch in '{op}': expected extents {expected:?}, got {got:?}")]
    Conformability {
        /// The operation whose check failed
        op: &'static str,
        /// Expected extents
        expected: Vec<usize>,
        /// Actual extents
        got: Vec<usize>,
    },

    /// An operand had the wrong hierarchy shape for its dispatch site
    ///
    /// A FLAT-domain control node reached with a blocked operand, or a
    /// blocked operand whose siblings are not congruent.
    #[error("operand for '{op}' has the wrong hierarchy shape: {reason}")]
    Hierarchy {
        /// The operation being dispatched
        op: &'static str,
        /// What was wrong with the hierarchy
        reason: &'static str,
    },

    /// An enqueue was attempted against a disabled or finalized queue
    #[error("task queue is {state}")]
    QueueState {
        /// Current queue state ("disabled" or "finalized")
        state: &'static str,
    },

    /// A leaf kernel reported failure
    #[error("kernel '{opcode}' failed: {reason}")]
    Kernel {
        /// Opcode of the failing task
        opcode: &'static str,
        /// Kernel-reported reason
        reason: String,
    },
}

impl Error {
    /// Create a conformability error
    pub fn conformability(op: &'static str, expected: &[usize], got: &[usize]) -> Self {
        Self::Conformability {
            op,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a kernel error
    pub fn kernel(opcode: &'static str, reason: impl Into<String>) -> Self {
        Self::Kernel {
            opcode,
            reason: reason.into(),
        }
    }

    /// Whether this error indicates a build-time/configuration defect
    /// rather than a runtime data condition
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingChild { .. } | Self::UnsupportedVariant { .. }
        )
    }
}
