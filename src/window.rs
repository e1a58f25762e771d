use std::ops::Range;

/// Upper bound on queued conversion tasks; the channel preallocates its slots.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Entry range `[start, end)` that has to be ready for a view starting at `first_row`.
pub fn compute_range(
    first_row: usize,
    rows_visible: usize,
    columns: usize,
    prefetch_rows: usize,
    total_entries: usize,
) -> Range<usize> {
    let end = first_row
        .saturating_add(rows_visible)
        .saturating_add(prefetch_rows)
        .saturating_mul(columns)
        .min(total_entries);
    let start = if first_row >= prefetch_rows {
        (first_row - prefetch_rows).saturating_mul(columns)
    } else {
        0
    };
    start.min(end)..end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub rows: usize,
    pub columns: usize,
    /// Rows kept rendered above and below the visible area.
    pub prefetch_rows: usize,
}

impl Geometry {
    pub fn new(rows: usize, columns: usize, prefetch_rows: usize) -> Self {
        Self {
            rows,
            columns,
            prefetch_rows,
        }
    }

    pub fn display_range(&self, first_row: usize, total: usize) -> Range<usize> {
        compute_range(first_row, self.rows, self.columns, self.prefetch_rows, total)
    }

    /// Twice the display margin, so thumbnails exist before they scroll into view.
    pub fn conversion_range(&self, first_row: usize, total: usize) -> Range<usize> {
        compute_range(
            first_row,
            self.rows,
            self.columns,
            self.prefetch_rows.saturating_mul(2),
            total,
        )
    }

    pub fn debounce_rows(&self) -> usize {
        self.rows.div_ceil(2)
    }

    /// Five screens of tasks, or `None` if that does not fit in a `usize`.
    pub fn checked_queue_capacity(&self) -> Option<usize> {
        self.rows.checked_mul(self.columns)?.checked_mul(5)
    }

    pub fn queue_capacity(&self) -> usize {
        self.checked_queue_capacity()
            .unwrap_or(MAX_QUEUE_CAPACITY)
            .clamp(1, MAX_QUEUE_CAPACITY)
    }
}
