use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::layout::grid::GridPlan;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Tile `pages` row-major into a frame sized by `plan`.
///
/// Each page is resized to exactly `cell_width x cell_height` with a bicubic filter; cells
/// without a page stay [`BACKGROUND`]. Pages past the grid's capacity are dropped.
pub fn compose_frame(pages: &[RgbImage], plan: &GridPlan) -> RgbImage {
    let mut frame = RgbImage::from_pixel(plan.frame_width, plan.frame_height, BACKGROUND);

    let capacity = usize::try_from(plan.capacity()).unwrap_or(usize::MAX);
    if pages.len() > capacity {
        tracing::warn!(
            pages = pages.len(),
            capacity,
            "document has more pages than the grid holds; dropping the rest"
        );
    }

    for (j, page) in pages.iter().take(capacity).enumerate() {
        let Some((x, y)) = u32::try_from(j).ok().and_then(|j| plan.cell_origin(j)) else {
            break;
        };
        let cell = if page.dimensions() == (plan.cell_width, plan.cell_height) {
            page.clone()
        } else {
            imageops::resize(page, plan.cell_width, plan.cell_height, FilterType::CatmullRom)
        };
        imageops::replace(&mut frame, &cell, i64::from(x), i64::from(y));
    }
    frame
}
