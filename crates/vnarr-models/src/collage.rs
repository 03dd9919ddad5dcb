//! Collage batches and grid layout.
//!
//! A collage is one raster image holding up to [`BATCH_SIZE`] images laid
//! out on a [`GRID_COLUMNS`] x [`GRID_ROWS`] grid. Member order decides the
//! grid cell, so members are never reordered once a batch is formed.

use serde::{Deserialize, Serialize};

/// Number of images per collage.
pub const BATCH_SIZE: usize = 6;

/// Grid columns per collage.
pub const GRID_COLUMNS: usize = 3;

/// Grid rows per collage.
pub const GRID_ROWS: usize = 2;

/// Cell of the collage grid occupied by a batch member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub column: usize,
    pub row: usize,
}

impl GridPosition {
    /// Pixel offset of the cell's top-left corner.
    pub fn offset(&self, cell_width: u32, cell_height: u32) -> (u32, u32) {
        (
            self.column as u32 * cell_width,
            self.row as u32 * cell_height,
        )
    }
}

/// Grid cell for the batch member at `member_index`.
pub fn grid_position(member_index: usize) -> GridPosition {
    GridPosition {
        column: member_index % GRID_COLUMNS,
        row: member_index / GRID_COLUMNS,
    }
}

/// Number of collages needed for `item_count` images.
pub fn batch_count(item_count: usize) -> usize {
    item_count.div_ceil(BATCH_SIZE)
}

/// A contiguous group of at most [`BATCH_SIZE`] images rendered as one collage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollageBatch<T> {
    /// 0-based batch index; batch `i` holds items `[6i, 6i + 6)`
    pub batch_index: usize,
    /// Members in grid order
    pub members: Vec<T>,
}

/// Split items into batches of [`BATCH_SIZE`] preserving their order.
pub fn partition_batches<T>(items: Vec<T>) -> Vec<CollageBatch<T>> {
    let mut batches = Vec::with_capacity(batch_count(items.len()));
    let mut members = Vec::with_capacity(BATCH_SIZE);

    for item in items {
        members.push(item);
        if members.len() == BATCH_SIZE {
            batches.push(CollageBatch {
                batch_index: batches.len(),
                members: std::mem::replace(&mut members, Vec::with_capacity(BATCH_SIZE)),
            });
        }
    }

    if !members.is_empty() {
        batches.push(CollageBatch {
            batch_index: batches.len(),
            members,
        });
    }

    batches
}
