//! gungnir-paradis
//! ===============
//!
//! Parallel processing of disjoint cell batches.
//!
//! Finite element assembly scatters per-cell contributions into overlapping
//! locations of a shared global buffer. Cells whose global index rows are
//! pairwise disjoint can be processed concurrently with plain unsynchronized
//! writes. This crate provides the coloring pre-pass that partitions cells
//! into such batches, together with the access abstractions needed to drive
//! a batch as a `rayon` parallel iterator.
//!
//! Unlike general subset collections, every cell in a batch references the
//! same number of global indices, so a batch stores its rows as a single
//! flat vector with a uniform stride.

pub mod coloring;
pub mod slice;

use rayon::iter::plumbing::{bridge, Consumer, Producer, ProducerCallback, UnindexedConsumer};
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fmt::Debug;

/// Access to the records of a single cell inside a batch.
///
/// Obtained from [`DisjointBatch::cells_par_iter`]. Records are addressed by
/// the cell's *local* index `0 .. stride`; the mapping to global indices is
/// the cell's row in the batch.
pub struct CellAccess<'data, Access> {
    cell: usize,
    global_indices: &'data [usize],
    access: Access,
}

impl<'data, Access> CellAccess<'data, Access> {
    /// The global indices referenced by this cell, in local order.
    pub fn global_indices(&self) -> &[usize] {
        self.global_indices
    }

    /// The index of the cell in the original cell set.
    pub fn cell(&self) -> usize {
        self.cell
    }

    pub fn len(&self) -> usize {
        self.global_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_indices.is_empty()
    }

    pub fn get<'b>(&'b self, local_index: usize) -> <Access as ParallelIndexedAccess<'b>>::Record
    where
        'data: 'b,
        Access: ParallelIndexedAccess<'b>,
    {
        let global_index = self.global_indices[local_index];
        unsafe { self.access.get_unchecked(global_index) }
    }

    pub fn get_mut<'b>(&'b mut self, local_index: usize) -> <Access as ParallelIndexedAccess<'b>>::RecordMut
    where
        'data: 'b,
        Access: ParallelIndexedAccess<'b>,
    {
        let global_index = self.global_indices[local_index];
        unsafe { self.access.get_unchecked_mut(global_index) }
    }
}

/// Facilitates parallel access to (mutable) records stored in a collection.
///
/// # Safety
///
/// An implementor must ensure that it is sound for multiple threads to access
/// a single record immutably, provided that no thread accesses the same
/// record mutably, and that it is sound for multiple threads to access
/// disjoint records mutably.
///
/// It is the responsibility of the consumer that a mutable record is always
/// exclusive, across threads and within a single thread.
pub unsafe trait ParallelIndexedAccess<'record>: Sync + Send + Clone {
    type Record;
    type RecordMut;

    unsafe fn get_unchecked(&self, index: usize) -> Self::Record;
    unsafe fn get_unchecked_mut(&self, index: usize) -> Self::RecordMut;
}

/// An indexed collection that exposes parallel indexed access to its contents.
///
/// # Safety
///
/// The soundness of consuming code relies on the correctness of
/// [`ParallelIndexedCollection::len`]: consumers are permitted to access
/// records with indices in `[0, len)` through the access object, so an
/// incorrect length may lead to out-of-bounds access.
pub unsafe trait ParallelIndexedCollection<'a> {
    type Access;

    unsafe fn create_access(&'a mut self) -> Self::Access;
    fn len(&self) -> usize;
}

/// A batch of cells whose global index rows are pairwise disjoint.
///
/// Each cell references `stride` global indices. Indices may repeat *within*
/// a cell's row, but no index appears in the rows of two different cells of
/// the same batch. This is exactly the property that makes it sound to
/// process all cells of a batch concurrently with unsynchronized writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisjointBatch {
    // Largest global index referenced by any cell in the batch. Needed to
    // bounds-check a storage before handing out unchecked access.
    max_index: Option<usize>,
    stride: usize,
    // Row-major rows of global indices, one row of length `stride` per cell.
    indices: Vec<usize>,
    // Original cell index per row.
    cells: Vec<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowsNotDisjointError;

impl fmt::Display for RowsNotDisjointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "two cell rows in the batch share a global index")
    }
}

impl std::error::Error for RowsNotDisjointError {}

impl DisjointBatch {
    /// Builds a batch from row-major index rows, verifying disjointness.
    ///
    /// `indices` must hold one row of length `stride` per entry in `cells`.
    pub fn try_from_rows(
        stride: usize,
        indices: Vec<usize>,
        cells: Vec<usize>,
    ) -> Result<Self, RowsNotDisjointError> {
        assert!(stride > 0, "stride must be positive");
        assert_eq!(
            indices.len(),
            stride * cells.len(),
            "must have exactly one row of length stride per cell"
        );

        let mut max_index = None;
        let mut batch_index_set = HashSet::new();
        // Rows may contain duplicate entries, so indices of each row are
        // deduplicated locally before checking against the batch-wide set.
        let mut row_index_set = HashSet::new();

        for row in indices.chunks_exact(stride) {
            row_index_set.clear();
            for &idx in row {
                max_index = Some(max_index.map_or(idx, |current: usize| current.max(idx)));
                row_index_set.insert(idx);
            }
            for &idx in &row_index_set {
                if !batch_index_set.insert(idx) {
                    return Err(RowsNotDisjointError);
                }
            }
        }

        Ok(DisjointBatch {
            max_index,
            stride,
            indices,
            cells,
        })
    }

    /// Builds a batch without verifying that the rows are disjoint.
    ///
    /// # Safety
    ///
    /// The rows must be pairwise disjoint and `max_index` must be the largest
    /// index present in `indices` (or `None` if there are no cells).
    pub unsafe fn from_rows_unchecked(
        stride: usize,
        indices: Vec<usize>,
        cells: Vec<usize>,
        max_index: Option<usize>,
    ) -> Self {
        assert!(stride > 0, "stride must be positive");
        assert_eq!(
            indices.len(),
            stride * cells.len(),
            "must have exactly one row of length stride per cell"
        );
        Self {
            max_index,
            stride,
            indices,
            cells,
        }
    }

    /// Number of cells in the batch.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of global indices referenced by each cell.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Original cell index of each row.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// The global index row of the `i`-th cell in the batch.
    pub fn row(&self, i: usize) -> &[usize] {
        &self.indices[i * self.stride..(i + 1) * self.stride]
    }

    pub fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    /// Creates a parallel iterator over the cells of the batch, fetching
    /// records from the provided storage.
    ///
    /// Panics if any row contains an index that exceeds the length reported
    /// by `storage`.
    pub fn cells_par_iter<'a, Storage>(
        &'a self,
        storage: &'a mut Storage,
    ) -> DisjointBatchParIter<'a, Storage::Access>
    where
        Storage: ?Sized + ParallelIndexedCollection<'a>,
    {
        assert!(
            self.max_index.map_or(true, |max| storage.len() > max),
            "batch contains indices out of bounds for the storage"
        );
        let access = unsafe { storage.create_access() };

        DisjointBatchParIter {
            access,
            stride: self.stride,
            indices: &self.indices,
            cells: &self.cells,
        }
    }
}

/// Parallel iterator over the cells of a [`DisjointBatch`].
pub struct DisjointBatchParIter<'a, Access> {
    access: Access,
    stride: usize,
    indices: &'a [usize],
    cells: &'a [usize],
}

impl<'a, Access: Send + Clone> ParallelIterator for DisjointBatchParIter<'a, Access> {
    type Item = CellAccess<'a, Access>;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        bridge(self, consumer)
    }

    fn opt_len(&self) -> Option<usize> {
        Some(self.cells.len())
    }
}

impl<'a, Access: Send + Clone> IndexedParallelIterator for DisjointBatchParIter<'a, Access> {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn drive<C: Consumer<Self::Item>>(self, consumer: C) -> C::Result {
        bridge(self, consumer)
    }

    fn with_producer<CB: ProducerCallback<Self::Item>>(self, callback: CB) -> CB::Output {
        callback.callback(DisjointBatchProducer {
            access: self.access,
            stride: self.stride,
            indices: self.indices,
            cells: self.cells,
        })
    }
}

struct DisjointBatchProducer<'a, Access> {
    access: Access,
    stride: usize,
    indices: &'a [usize],
    cells: &'a [usize],
}

impl<'a, Access> Debug for DisjointBatchProducer<'a, Access> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisjointBatchProducer")
            .field("stride", &self.stride)
            .field("cells", &self.cells)
            .finish()
    }
}

impl<'a, Access: Send + Clone> Producer for DisjointBatchProducer<'a, Access> {
    type Item = CellAccess<'a, Access>;
    type IntoIter = DisjointBatchIter<'a, Access>;

    fn into_iter(self) -> Self::IntoIter {
        DisjointBatchIter {
            access: self.access,
            stride: self.stride,
            indices: self.indices,
            cells: self.cells,
        }
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        let (cells_left, cells_right) = self.cells.split_at(index);
        let (indices_left, indices_right) = self.indices.split_at(index * self.stride);

        let left = DisjointBatchProducer {
            access: self.access.clone(),
            stride: self.stride,
            indices: indices_left,
            cells: cells_left,
        };
        let right = DisjointBatchProducer {
            access: self.access,
            stride: self.stride,
            indices: indices_right,
            cells: cells_right,
        };
        (left, right)
    }
}

/// Sequential iterator over the cells of a batch (or a sub-range produced by
/// splitting the parallel iterator).
pub struct DisjointBatchIter<'a, Access> {
    access: Access,
    stride: usize,
    indices: &'a [usize],
    cells: &'a [usize],
}

impl<'a, Access: Clone> Iterator for DisjointBatchIter<'a, Access> {
    type Item = CellAccess<'a, Access>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&cell, cells_rest) = self.cells.split_first()?;
        let (row, indices_rest) = self.indices.split_at(self.stride);
        self.cells = cells_rest;
        self.indices = indices_rest;
        Some(CellAccess {
            cell,
            global_indices: row,
            access: self.access.clone(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cells.len(), Some(self.cells.len()))
    }
}

impl<'a, Access: Clone> ExactSizeIterator for DisjointBatchIter<'a, Access> {}

impl<'a, Access: Clone> DoubleEndedIterator for DisjointBatchIter<'a, Access> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (&cell, cells_rest) = self.cells.split_last()?;
        let (indices_rest, row) = self.indices.split_at(self.indices.len() - self.stride);
        self.cells = cells_rest;
        self.indices = indices_rest;
        Some(CellAccess {
            cell,
            global_indices: row,
            access: self.access.clone(),
        })
    }
}
