//! Greedy coloring of cells into disjoint batches.

use crate::DisjointBatch;
use std::mem;

/// Partitions cells into batches with pairwise disjoint index rows.
///
/// `rows` holds one row of `stride` global indices per cell, row-major, so
/// that cell `c` references `rows[c * stride .. (c + 1) * stride]`. The
/// returned batches together contain every cell exactly once, and within a
/// batch no two cells share a global index.
///
/// The coloring is greedy: cells are visited in order and assigned to the
/// first batch whose index set they do not intersect. For meshes this tends
/// to produce a small number of large batches, which is what the parallel
/// application drivers want.
pub fn greedy_batch_coloring(rows: &[usize], stride: usize) -> Vec<DisjointBatch> {
    assert!(stride > 0, "stride must be positive");
    assert_eq!(
        rows.len() % stride,
        0,
        "rows must contain a whole number of cells"
    );
    let num_cells = rows.len() / stride;

    let mut batches = Vec::new();
    let mut postponed_cells = Vec::new();
    let mut current_cells: Vec<usize> = (0..num_cells).collect();

    // Keep a table of the color of the last batch to visit any given index.
    // The number of global indices is not known up front, so the table grows
    // as new out-of-bounds indices are encountered.
    const UNVISITED: usize = usize::MAX;
    let mut last_visited_color = vec![UNVISITED; 0];

    let mut color = 0;
    while !current_cells.is_empty() {
        let mut batch_indices = Vec::new();
        let mut batch_cells = Vec::new();
        let mut max_index = None;

        for &cell in &current_cells {
            let row = &rows[cell * stride..(cell + 1) * stride];
            let is_blocked = row.iter().any(|&idx| {
                last_visited_color
                    .get(idx)
                    .map_or(false, |&visitor| visitor == color)
            });
            if is_blocked {
                postponed_cells.push(cell);
            } else {
                for &idx in row {
                    max_index = Some(max_index.map_or(idx, |current: usize| current.max(idx)));
                    if let Some(visitor) = last_visited_color.get_mut(idx) {
                        *visitor = color;
                    } else {
                        // Amortize resizes by growing the table beyond the
                        // index that triggered the resize
                        last_visited_color.resize(2 * idx + 1, UNVISITED);
                        last_visited_color[idx] = color;
                    }
                }
                batch_indices.extend_from_slice(row);
                batch_cells.push(cell);
            }
        }

        // Expensive consistency check in debug builds only
        debug_assert!(DisjointBatch::try_from_rows(
            stride,
            batch_indices.clone(),
            batch_cells.clone()
        )
        .is_ok());

        // Rows are disjoint by construction, so skip the verification
        let batch =
            unsafe { DisjointBatch::from_rows_unchecked(stride, batch_indices, batch_cells, max_index) };
        batches.push(batch);

        mem::swap(&mut postponed_cells, &mut current_cells);
        postponed_cells.clear();
        color += 1;
        assert_ne!(color, UNVISITED, "number of colors exhausted the color space");
    }

    batches
}
