//! Deferred leaf operations
//!
//! A `Task` is one leaf kernel call captured for later execution: the
//! opcode, the kernel invocation itself, the operand regions it will
//! touch with their access modes, and a FLOP-based cost estimate the
//! ready-task ranking uses. Tasks are created when the dispatcher defers
//! a leaf call and destroyed once executed and their dependents notified.

use crate::error::{Error, Result};
use crate::operand::Region;
use smallvec::SmallVec;

/// How a task touches one of its operand regions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// The region is only read
    Read,
    /// The region is only written
    Write,
    /// The region is read and written
    ReadWrite,
}

impl Access {
    /// Whether this access mode writes the region
    #[inline]
    pub fn involves_write(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// Operand footprint of a task: regions with their access modes
pub type TaskRegions = SmallVec<[(Region, Access); 4]>;

type KernelCall = Box<dyn FnOnce() -> Result<()> + Send>;

/// Identifier of a pushed task, valid until the queue empties
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

/// A deferred leaf operation
pub struct Task {
    opcode: &'static str,
    cost: f64,
    regions: TaskRegions,
    kernel: KernelCall,
}

impl Task {
    /// Capture a leaf call for deferred execution
    ///
    /// The kernel must touch only the declared regions; the dependency
    /// analyzer's correctness relies on that contract.
    pub fn new(
        opcode: &'static str,
        cost: f64,
        regions: impl IntoIterator<Item = (Region, Access)>,
        kernel: impl FnOnce() -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            opcode,
            cost,
            regions: regions.into_iter().collect(),
            kernel: Box::new(kernel),
        }
    }

    /// Opcode of the deferred call
    #[inline]
    pub fn opcode(&self) -> &'static str {
        self.opcode
    }

    /// Estimated cost in floating-point operations
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The regions this task declared, with access modes
    #[inline]
    pub fn regions(&self) -> &[(Region, Access)] {
        &self.regions
    }

    /// Run the captured kernel, converting panics into kernel errors
    pub(crate) fn execute(self) -> Result<()> {
        let opcode = self.opcode;
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(self.kernel)) {
            Ok(result) => result,
            Err(_) => Err(Error::kernel(opcode, "kernel panicked")),
        }
    }
}

/// Whether two footprints must be ordered
///
/// True when any region pair overlaps with at least one write involved
/// (write-after-write, write-after-read, read-after-write). Two reads of
/// the same region never force an ordering.
pub(crate) fn must_order(earlier: &[(Region, Access)], later: &[(Region, Access)]) -> bool {
    earlier.iter().any(|(r1, a1)| {
        later
            .iter()
            .any(|(r2, a2)| (a1.involves_write() || a2.involves_write()) && r1.overlaps(r2))
    })
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("opcode", &self.opcode)
            .field("cost", &self.cost)
            .field("regions", &self.regions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::Matrix;

    fn region_of(m: &Matrix<f64>) -> Region {
        m.region()
    }

    #[test]
    fn test_read_read_never_orders() {
        let m = Matrix::<f64>::zeros(4, 4);
        let a = [(region_of(&m), Access::Read)];
        let b = [(region_of(&m), Access::Read)];
        assert!(!must_order(&a, &b));
    }

    #[test]
    fn test_write_orders_all_hazards() {
        let m = Matrix::<f64>::zeros(4, 4);
        let r = region_of(&m);
        for (a1, a2) in [
            (Access::Write, Access::Write),
            (Access::Write, Access::Read),
            (Access::Read, Access::ReadWrite),
        ] {
            assert!(must_order(&[(r.clone(), a1)], &[(r.clone(), a2)]));
        }
    }

    #[test]
    fn test_disjoint_regions_never_order() {
        let m = Matrix::<f64>::zeros(4, 4);
        let top = m.view(0, 0, 2, 4).region();
        let bottom = m.view(2, 0, 2, 4).region();
        assert!(!must_order(
            &[(top, Access::Write)],
            &[(bottom, Access::Write)]
        ));
    }
}
