//! Storage: reference-counted operand buffers
//!
//! A `Storage` owns one flat allocation shared by every view partitioned
//! out of it. Views alias the buffer, never copy it; the allocation is
//! freed exactly once, when the last reference drops. Each storage carries
//! a unique id that the task queue's dependency analyzer uses to decide
//! whether two operand regions can touch the same memory at all.

use crate::dtype::Element;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for unique storage IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one operand buffer
///
/// Regions over different buffers never overlap, so the dependency
/// analyzer compares ids before comparing spans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageId(u64);

impl StorageId {
    fn new() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Reference-counted flat buffer backing matrix views
///
/// Kernels access the buffer through raw pointers handed out by views;
/// the borrow discipline for concurrent access is enforced by the task
/// queue's dependency analysis, not by the type system. See
/// [`Matrix`](super::Matrix) for the aliasing contract.
pub struct Storage<T: Element> {
    inner: Arc<StorageInner<T>>,
}

struct StorageInner<T: Element> {
    ptr: *mut T,
    len: usize,
    id: StorageId,
}

// The raw pointer is only dereferenced through kernel calls whose mutual
// exclusion the dependency analyzer guarantees.
unsafe impl<T: Element> Send for StorageInner<T> {}
unsafe impl<T: Element> Sync for StorageInner<T> {}

impl<T: Element> Storage<T> {
    /// Allocate a zero-initialized buffer of `len` elements
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![T::zero(); len])
    }

    /// Allocate a buffer holding a copy of `data`
    pub fn from_slice(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    fn from_vec(v: Vec<T>) -> Self {
        let boxed = v.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut T;
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                id: StorageId::new(),
            }),
        }
    }

    /// Get the unique id of this buffer
    #[inline]
    pub fn id(&self) -> StorageId {
        self.inner.id
    }

    /// Get the raw buffer pointer
    #[inline]
    pub fn ptr(&self) -> *mut T {
        self.inner.ptr
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Copy the whole buffer out to a Vec
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::zero(); self.inner.len];
        // Safety: ptr/len describe a live allocation owned by inner.
        unsafe {
            std::ptr::copy_nonoverlapping(self.inner.ptr, out.as_mut_ptr(), self.inner.len);
        }
        out
    }
}

impl<T: Element> Clone for Storage<T> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element> Drop for StorageInner<T> {
    fn drop(&mut self) {
        // Safety: ptr/len came from Box::into_raw of a boxed slice.
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                self.ptr, self.len,
            )));
        }
    }
}

impl<T: Element> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("id", &self.inner.id)
            .field("len", &self.inner.len)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let s = Storage::<f64>::zeroed(16);
        assert_eq!(s.len(), 16);
        assert!(s.to_vec().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_slice_roundtrip() {
        let data = [1.0f64, 2.0, 3.0];
        let s = Storage::from_slice(&data);
        assert_eq!(s.to_vec(), data);
    }

    #[test]
    fn test_ids_unique() {
        let a = Storage::<f32>::zeroed(4);
        let b = Storage::<f32>::zeroed(4);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_ref_count() {
        let a = Storage::<f64>::zeroed(4);
        assert_eq!(a.ref_count(), 1);
        let b = a.clone();
        assert_eq!(a.ref_count(), 2);
        drop(b);
        assert_eq!(a.ref_count(), 1);
    }
}
