//! Parallel indexed access to slices.

use crate::{ParallelIndexedAccess, ParallelIndexedCollection};
use std::marker::PhantomData;

/// Unsynchronized access to the elements of a slice.
///
/// The access hands out references to arbitrary elements without borrow
/// checking. Soundness is the consumer's responsibility: a mutable reference
/// to an element must never coexist with any other reference to the same
/// element, on any thread. [`crate::DisjointBatch`] upholds this by
/// construction when cells of a batch are processed independently.
pub struct ParallelSliceAccess<'a, T> {
    ptr: *mut T,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T> Clone for ParallelSliceAccess<'a, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Copy for ParallelSliceAccess<'a, T> {}

unsafe impl<'a, T: Sync> Sync for ParallelSliceAccess<'a, T> {}
unsafe impl<'a, T: Send> Send for ParallelSliceAccess<'a, T> {}

unsafe impl<'a, 'record, T: 'record + Sync + Send> ParallelIndexedAccess<'record>
    for ParallelSliceAccess<'a, T>
where
    'a: 'record,
{
    type Record = &'record T;
    type RecordMut = &'record mut T;

    unsafe fn get_unchecked(&self, index: usize) -> Self::Record {
        &*self.ptr.add(index)
    }

    unsafe fn get_unchecked_mut(&self, index: usize) -> Self::RecordMut {
        &mut *self.ptr.add(index)
    }
}

unsafe impl<'a, T: 'a + Sync + Send> ParallelIndexedCollection<'a> for [T] {
    type Access = ParallelSliceAccess<'a, T>;

    unsafe fn create_access(&'a mut self) -> Self::Access {
        ParallelSliceAccess {
            ptr: self.as_mut_ptr(),
            marker: PhantomData,
        }
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }
}
