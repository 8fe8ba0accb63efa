//! Flat matrix views over shared storage
//!
//! A `Matrix` is a rectangular window into a row-major root buffer. Views
//! produced by partitioning keep the root's leading dimension and record
//! their origin in root coordinates, so the whole lineage of a view is
//! just index arithmetic: no partition ever copies data.
//!
//! Mutation happens through raw pointers handed to kernels. Two views may
//! alias the same elements; it is the task queue's dependency analysis
//! (driven by [`Region`]) that keeps concurrent kernels from racing.

use super::storage::{Storage, StorageId};
use crate::dtype::Element;
use smallvec::SmallVec;
use std::fmt;

/// Half-open index interval along one mode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// First index covered
    pub start: usize,
    /// One past the last index covered
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of indices covered
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether two spans share at least one index
    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// The footprint of a view in root-storage coordinates
///
/// This is what the dependency analyzer sees: which buffer, and which
/// half-open interval along each mode. Two regions overlap iff they name
/// the same buffer and their spans intersect along every mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    /// Buffer the view aliases
    pub buffer: StorageId,
    /// One span per mode (rows, then columns)
    pub spans: SmallVec<[Span; 2]>,
}

impl Region {
    /// Whether two regions share at least one element
    pub fn overlaps(&self, other: &Region) -> bool {
        self.buffer == other.buffer
            && self
                .spans
                .iter()
                .zip(other.spans.iter())
                .all(|(a, b)| a.overlaps(b))
    }

    /// Whether the region covers no elements
    pub fn is_empty(&self) -> bool {
        self.spans.iter().any(Span::is_empty)
    }
}

/// Rectangular view into a shared row-major buffer
///
/// All views derived from one root share the root's leading dimension and
/// unit column stride; partitioning adjusts only the origin and extents.
/// That invariant is what lets [`Matrix::region`] report the view's
/// footprint in root coordinates for the dependency analyzer.
pub struct Matrix<T: Element> {
    storage: Storage<T>,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
    ld: usize,
}

impl<T: Element> Matrix<T> {
    /// Allocate a zero-filled `rows x cols` matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::root(Storage::zeroed(rows * cols), rows, cols)
    }

    /// Allocate a matrix holding a row-major copy of `data`
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_slice(data: &[T], rows: usize, cols: usize) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Matrix::from_slice: data length does not match extents"
        );
        Self::root(Storage::from_slice(data), rows, cols)
    }

    /// Allocate a matrix whose element `(i, j)` is `f(i, j)`
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self::from_slice(&data, rows, cols)
    }

    fn root(storage: Storage<T>, rows: usize, cols: usize) -> Self {
        Self {
            storage,
            row0: 0,
            col0: 0,
            rows,
            cols,
            ld: cols,
        }
    }

    /// Row extent
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column extent
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Extent along a mode (0 = rows, 1 = columns)
    #[inline]
    pub fn extent(&self, mode: usize) -> usize {
        match mode {
            0 => self.rows,
            1 => self.cols,
            _ => 1,
        }
    }

    /// Element stride along a mode (0 = rows, 1 = columns)
    #[inline]
    pub fn stride(&self, mode: usize) -> usize {
        match mode {
            0 => self.ld,
            _ => 1,
        }
    }

    /// Leading dimension of the root buffer
    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    /// Whether the view covers no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// The shared storage this view aliases
    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// The view's footprint in root coordinates
    pub fn region(&self) -> Region {
        Region {
            buffer: self.storage.id(),
            spans: SmallVec::from_slice(&[
                Span::new(self.row0, self.row0 + self.rows),
                Span::new(self.col0, self.col0 + self.cols),
            ]),
        }
    }

    /// Sub-view of `nrows x ncols` elements starting at `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if the requested window exceeds the view's extents.
    pub fn view(&self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        assert!(
            i + nrows <= self.rows && j + ncols <= self.cols,
            "view ({i},{j})+{nrows}x{ncols} exceeds {}x{}",
            self.rows,
            self.cols
        );
        Self {
            storage: self.storage.clone(),
            row0: self.row0 + i,
            col0: self.col0 + j,
            rows: nrows,
            cols: ncols,
            ld: self.ld,
        }
    }

    /// Whether two views have identical base pointer and extents
    ///
    /// Used by the partition/merge round-trip property: merging a
    /// partition must restore a view for which this holds against the
    /// original.
    pub fn same_view(&self, other: &Self) -> bool {
        self.storage.id() == other.storage.id()
            && self.row0 == other.row0
            && self.col0 == other.col0
            && self.rows == other.rows
            && self.cols == other.cols
    }

    /// Whether `other` is adjacent below this view (for merge checks)
    pub(crate) fn abuts_below(&self, other: &Self) -> bool {
        self.storage.id() == other.storage.id()
            && other.row0 == self.row0 + self.rows
            && other.col0 == self.col0
            && other.cols == self.cols
    }

    /// Whether `other` is adjacent to the right of this view
    pub(crate) fn abuts_right(&self, other: &Self) -> bool {
        self.storage.id() == other.storage.id()
            && other.col0 == self.col0 + self.cols
            && other.row0 == self.row0
            && other.rows == self.rows
    }

    pub(crate) fn with_extent(&self, rows: usize, cols: usize) -> Self {
        Self {
            storage: self.storage.clone(),
            row0: self.row0,
            col0: self.col0,
            rows,
            cols,
            ld: self.ld,
        }
    }

    /// Raw pointer to element `(i, j)` of this view
    ///
    /// # Safety
    ///
    /// `(i, j)` must lie within the view's extents, and any dereference
    /// must honor the crate's aliasing discipline: writes to a region are
    /// serialized against overlapping reads/writes by the dependency
    /// analyzer (or by program order on the synchronous path).
    #[inline]
    pub unsafe fn ptr_at(&self, i: usize, j: usize) -> *mut T {
        debug_assert!(i < self.rows && j < self.cols);
        self.storage
            .ptr()
            .add((self.row0 + i) * self.ld + self.col0 + j)
    }

    /// Read element `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.rows && j < self.cols, "index out of bounds");
        unsafe { *self.ptr_at(i, j) }
    }

    /// Write element `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set(&self, i: usize, j: usize, v: T) {
        assert!(i < self.rows && j < self.cols, "index out of bounds");
        unsafe { *self.ptr_at(i, j) = v }
    }

    /// Copy the view out row-major
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.push(self.get(i, j));
            }
        }
        out
    }
}

impl<T: Element> Clone for Matrix<T> {
    /// Clone aliases the same storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            row0: self.row0,
            col0: self.col0,
            rows: self.rows,
            cols: self.cols,
            ld: self.ld,
        }
    }
}

impl<T: Element> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matrix {{ {}x{} at ({},{}), ld {}, buffer {:?} }}",
            self.rows,
            self.cols,
            self.row0,
            self.col0,
            self.ld,
            self.storage.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_layout() {
        let m = Matrix::from_fn(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(m.to_vec(), vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(m.stride(0), 3);
        assert_eq!(m.stride(1), 1);
    }

    #[test]
    fn test_view_aliases_parent() {
        let m = Matrix::<f64>::zeros(4, 4);
        let v = m.view(1, 1, 2, 2);
        v.set(0, 0, 7.0);
        assert_eq!(m.get(1, 1), 7.0);
        assert_eq!(v.ld(), m.ld());
    }

    #[test]
    fn test_region_overlap() {
        let m = Matrix::<f64>::zeros(4, 4);
        let a = m.view(0, 0, 2, 2).region();
        let b = m.view(1, 1, 2, 2).region();
        let c = m.view(2, 2, 2, 2).region();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_region_distinct_buffers() {
        let a = Matrix::<f64>::zeros(2, 2).region();
        let b = Matrix::<f64>::zeros(2, 2).region();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_same_view() {
        let m = Matrix::<f64>::zeros(4, 4);
        assert!(m.same_view(&m.clone()));
        assert!(!m.same_view(&m.view(0, 0, 4, 3)));
    }
}
