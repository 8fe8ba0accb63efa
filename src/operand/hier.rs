//! Hierarchical operands: blocks of blocks over one flat buffer
//!
//! A `HierMatrix` is either a leaf (element type SCALAR: a flat strided
//! view) or an interior node (element type MATRIX: a grid of sub-views).
//! Every level of the hierarchy aliases the one root buffer; building a
//! hierarchy is pure partitioning, never a copy.
//!
//! Invariant: all sibling blocks at one level are congruent, except that
//! the trailing block row/column may be smaller (the remainder of the
//! extent divided by the block size). The dispatcher relies on this when
//! it recurses block-wise.

use super::matrix::Matrix;
use crate::dtype::Element;
use crate::error::{Error, Result};

/// What the elements of a hierarchy level are
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElemType {
    /// Elements are scalars: the operand is a flat strided view
    Scalar,
    /// Elements are matrices: the operand is a grid of sub-operands
    Matrix,
}

/// Recursive operand view consumed by the dispatcher
///
/// Constructed per user call and dropped per user call; all levels alias
/// the storage of the flat matrix the hierarchy was built over.
pub struct HierMatrix<T: Element> {
    repr: Repr<T>,
}

enum Repr<T: Element> {
    Leaf(Matrix<T>),
    Blocked {
        brows: usize,
        bcols: usize,
        blocks: Vec<HierMatrix<T>>,
        rows: usize,
        cols: usize,
    },
}

impl<T: Element> HierMatrix<T> {
    /// Wrap a flat matrix as a SCALAR-element leaf
    pub fn leaf(m: Matrix<T>) -> Self {
        Self {
            repr: Repr::Leaf(m),
        }
    }

    /// Build a hierarchy over a flat matrix
    ///
    /// `blocksizes` gives the block extent per level, outermost first; its
    /// length is the hierarchy depth. Zero depth yields a leaf. Each level
    /// partitions into `ceil(extent / b)` congruent blocks with a smaller
    /// trailing block when the extent is not divisible.
    pub fn from_flat(m: &Matrix<T>, blocksizes: &[usize]) -> Result<Self> {
        match blocksizes.split_first() {
            None => Ok(Self::leaf(m.clone())),
            Some((&b, rest)) => {
                if b == 0 {
                    return Err(Error::Hierarchy {
                        op: "from_flat",
                        reason: "block extent must be nonzero",
                    });
                }
                let brows = m.rows().div_ceil(b).max(1);
                let bcols = m.cols().div_ceil(b).max(1);
                let mut blocks = Vec::with_capacity(brows * bcols);
                for bi in 0..brows {
                    let i = bi * b;
                    let nrows = b.min(m.rows() - i.min(m.rows()));
                    for bj in 0..bcols {
                        let j = bj * b;
                        let ncols = b.min(m.cols() - j.min(m.cols()));
                        blocks.push(Self::from_flat(&m.view(i, j, nrows, ncols), rest)?);
                    }
                }
                Ok(Self {
                    repr: Repr::Blocked {
                        brows,
                        bcols,
                        blocks,
                        rows: m.rows(),
                        cols: m.cols(),
                    },
                })
            }
        }
    }

    /// What the elements at this level are
    #[inline]
    pub fn elemtype(&self) -> ElemType {
        match self.repr {
            Repr::Leaf(_) => ElemType::Scalar,
            Repr::Blocked { .. } => ElemType::Matrix,
        }
    }

    /// Total row extent in scalar elements
    pub fn rows(&self) -> usize {
        match &self.repr {
            Repr::Leaf(m) => m.rows(),
            Repr::Blocked { rows, .. } => *rows,
        }
    }

    /// Total column extent in scalar elements
    pub fn cols(&self) -> usize {
        match &self.repr {
            Repr::Leaf(m) => m.cols(),
            Repr::Blocked { cols, .. } => *cols,
        }
    }

    /// Scalar extent along a mode (0 = rows, 1 = columns)
    pub fn extent(&self, mode: usize) -> usize {
        match mode {
            0 => self.rows(),
            1 => self.cols(),
            _ => 1,
        }
    }

    /// Element stride along a mode of a SCALAR-element leaf
    ///
    /// Interior levels have no single stride; they return `None`.
    pub fn stride(&self, mode: usize) -> Option<usize> {
        match &self.repr {
            Repr::Leaf(m) => Some(m.stride(mode)),
            Repr::Blocked { .. } => None,
        }
    }

    /// Number of hierarchy levels above the scalar leaf
    pub fn depth(&self) -> usize {
        match &self.repr {
            Repr::Leaf(_) => 0,
            Repr::Blocked { blocks, .. } => 1 + blocks.first().map_or(0, HierMatrix::depth),
        }
    }

    /// Number of block rows at this level (1 for a leaf)
    pub fn block_rows(&self) -> usize {
        match &self.repr {
            Repr::Leaf(_) => 1,
            Repr::Blocked { brows, .. } => *brows,
        }
    }

    /// Number of block columns at this level (1 for a leaf)
    pub fn block_cols(&self) -> usize {
        match &self.repr {
            Repr::Leaf(_) => 1,
            Repr::Blocked { bcols, .. } => *bcols,
        }
    }

    /// Sub-operand at block position `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics on a leaf or an out-of-range block index.
    pub fn sub_block(&self, i: usize, j: usize) -> &HierMatrix<T> {
        match &self.repr {
            Repr::Leaf(_) => panic!("sub_block on a SCALAR-element operand"),
            Repr::Blocked {
                brows,
                bcols,
                blocks,
                ..
            } => {
                assert!(i < *brows && j < *bcols, "block index out of range");
                &blocks[i * bcols + j]
            }
        }
    }

    /// The flat view of a SCALAR-element leaf
    pub fn as_leaf(&self) -> Result<&Matrix<T>> {
        match &self.repr {
            Repr::Leaf(m) => Ok(m),
            Repr::Blocked { .. } => Err(Error::Hierarchy {
                op: "as_leaf",
                reason: "expected a SCALAR-element operand",
            }),
        }
    }
}

impl<T: Element> Clone for HierMatrix<T> {
    fn clone(&self) -> Self {
        match &self.repr {
            Repr::Leaf(m) => Self::leaf(m.clone()),
            Repr::Blocked {
                brows,
                bcols,
                blocks,
                rows,
                cols,
            } => Self {
                repr: Repr::Blocked {
                    brows: *brows,
                    bcols: *bcols,
                    blocks: blocks.clone(),
                    rows: *rows,
                    cols: *cols,
                },
            },
        }
    }
}

impl<T: Element> std::fmt::Debug for HierMatrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repr {
            Repr::Leaf(m) => write!(f, "HierMatrix::Leaf({m:?})"),
            Repr::Blocked { brows, bcols, .. } => write!(
                f,
                "HierMatrix::Blocked {{ {}x{} blocks, {}x{} elements, depth {} }}",
                brows,
                bcols,
                self.rows(),
                self.cols(),
                self.depth()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_is_scalar() {
        let h = HierMatrix::leaf(Matrix::<f64>::zeros(3, 3));
        assert_eq!(h.elemtype(), ElemType::Scalar);
        assert_eq!(h.depth(), 0);
        assert_eq!(h.block_rows(), 1);
    }

    #[test]
    fn test_from_flat_remainder_blocks() {
        let m = Matrix::<f64>::zeros(7, 5);
        let h = HierMatrix::from_flat(&m, &[3]).unwrap();
        assert_eq!(h.elemtype(), ElemType::Matrix);
        assert_eq!(h.block_rows(), 3);
        assert_eq!(h.block_cols(), 2);
        // Interior blocks are congruent; trailing blocks carry the remainder.
        assert_eq!(h.sub_block(0, 0).rows(), 3);
        assert_eq!(h.sub_block(2, 0).rows(), 1);
        assert_eq!(h.sub_block(0, 1).cols(), 2);
        assert_eq!(h.rows(), 7);
        assert_eq!(h.cols(), 5);
    }

    #[test]
    fn test_three_level_depth() {
        let m = Matrix::<f64>::zeros(8, 8);
        let h = HierMatrix::from_flat(&m, &[4, 2, 1]).unwrap();
        assert_eq!(h.depth(), 3);
        assert_eq!(h.sub_block(0, 0).depth(), 2);
        assert_eq!(
            h.sub_block(0, 0).sub_block(0, 0).sub_block(0, 0).elemtype(),
            ElemType::Scalar
        );
    }

    #[test]
    fn test_blocks_alias_root() {
        let m = Matrix::<f64>::zeros(4, 4);
        let h = HierMatrix::from_flat(&m, &[2]).unwrap();
        h.sub_block(1, 1).as_leaf().unwrap().set(0, 0, 9.0);
        assert_eq!(m.get(2, 2), 9.0);
    }

    #[test]
    fn test_zero_block_extent_rejected() {
        let m = Matrix::<f64>::zeros(4, 4);
        assert!(HierMatrix::from_flat(&m, &[0]).is_err());
    }
}
