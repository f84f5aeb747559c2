use crate::foundation::error::{TexlapseError, TexlapseResult};

/// Row/column layout and per-cell pixel size used to tile one document's pages into one frame.
///
/// Computed once per run from the largest page count in the series and reused read-only for
/// every frame. `frame_width == cell_width * col_count` and
/// `frame_height == cell_height * row_count` always hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GridPlan {
    pub row_count: u32,
    pub col_count: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl GridPlan {
    /// Number of cells in the grid.
    pub fn capacity(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.col_count)
    }

    /// Pixel origin of cell `index` in row-major order, or `None` past the last cell.
    pub fn cell_origin(&self, index: u32) -> Option<(u32, u32)> {
        if u64::from(index) >= self.capacity() {
            return None;
        }
        let row = index / self.col_count;
        let col = index % self.col_count;
        Some((col * self.cell_width, row * self.cell_height))
    }

    /// Width/height of the grid measured in pages, before rounding cells to whole pixels.
    pub fn grid_aspect_ratio(&self, page_aspect_ratio: f64) -> f64 {
        f64::from(self.col_count) * page_aspect_ratio / f64::from(self.row_count)
    }
}

/// Plan the grid that fits `max_page_count` pages of `page_aspect_ratio` into a frame
/// `target_width` pixels wide whose aspect ratio does not exceed `target_aspect_ratio`.
///
/// The row count is the smallest one whose grid aspect ratio fits the target. The search is
/// bounded by `max(max_page_count, ceil(page_aspect_ratio / target_aspect_ratio))`: at or past
/// `max_page_count` rows there is a single column, so the grid ratio is
/// `page_aspect_ratio / rows`, which fits once `rows >= page_aspect_ratio / target_aspect_ratio`.
pub fn plan_grid(
    max_page_count: u32,
    page_aspect_ratio: f64,
    target_width: u32,
    target_aspect_ratio: f64,
) -> TexlapseResult<GridPlan> {
    if max_page_count == 0 {
        return Err(TexlapseError::validation(
            "max page count must be at least 1 (no document rendered a page)",
        ));
    }
    if !(page_aspect_ratio.is_finite() && page_aspect_ratio > 0.0) {
        return Err(TexlapseError::validation(format!(
            "page aspect ratio must be positive and finite, got {page_aspect_ratio}"
        )));
    }
    if target_width == 0 {
        return Err(TexlapseError::validation("target width must be non-zero"));
    }
    if !(target_aspect_ratio.is_finite() && target_aspect_ratio > 0.0) {
        return Err(TexlapseError::validation(format!(
            "target aspect ratio must be positive and finite, got {target_aspect_ratio}"
        )));
    }

    let single_column_rows = (page_aspect_ratio / target_aspect_ratio).ceil();
    if single_column_rows > f64::from(u32::MAX) {
        return Err(TexlapseError::validation(format!(
            "page aspect ratio {page_aspect_ratio} is too extreme for target {target_aspect_ratio}"
        )));
    }
    let bound = max_page_count.max(single_column_rows as u32).max(1);

    let fits = |rows: u32| {
        let cols = max_page_count.div_ceil(rows);
        f64::from(cols) * page_aspect_ratio / f64::from(rows) <= target_aspect_ratio
    };
    // `bound` satisfies `fits` up to float rounding, so it is also the fallback.
    let row_count = (1..=bound).find(|&rows| fits(rows)).unwrap_or(bound);
    let col_count = max_page_count.div_ceil(row_count);

    let cell_width = target_width / col_count;
    if cell_width == 0 {
        return Err(TexlapseError::validation(format!(
            "target width {target_width}px is too narrow for {col_count} columns"
        )));
    }
    let cell_height = (f64::from(cell_width) / page_aspect_ratio).ceil();
    let frame_height = cell_height * f64::from(row_count);
    if frame_height > f64::from(u32::MAX) {
        return Err(TexlapseError::validation(format!(
            "frame height {frame_height}px does not fit the pixel range"
        )));
    }
    let cell_height = cell_height as u32;

    Ok(GridPlan {
        row_count,
        col_count,
        cell_width,
        cell_height,
        frame_width: cell_width * col_count,
        frame_height: cell_height * row_count,
    })
}
