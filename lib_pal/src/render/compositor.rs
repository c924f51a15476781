use log::{debug, error};

use super::RenderError;
use crate::constants::CANVAS_SIZE;
use crate::image::DecodedImage;

/// One visible scanline segment. Height is always a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub color_index: u8,
}

/// Splits the draw runs of `image` into row-bounded rectangles in scan order.
///
/// The cursor starts at `(left, top)` and wraps back to `left` each time it
/// reaches `right`. Transparent runs move the cursor without emitting anything.
/// With `strict` set, the runs must cover the bounds exactly.
pub fn composite(image: &DecodedImage, strict: bool) -> Result<Vec<Rect>, RenderError> {
    let bounds = image.bounds;

    if strict {
        let expected = bounds.area();
        let actual = image.run_pixels();
        if expected != actual {
            error!(
                "Runs cover {} pixels but bounds {:?} hold {}",
                actual, bounds, expected
            );
            return Err(RenderError::PixelCountMismatch { expected, actual });
        }
    }

    let mut rects = Vec::with_capacity(image.draws.len());
    let (mut x, mut y) = (bounds.left, bounds.top);

    for run in &image.draws {
        let mut remaining = run.length;
        while remaining > 0 {
            if y >= CANVAS_SIZE {
                error!("Run continues past the last canvas row");
                return Err(RenderError::RowOverflow { row: y });
            }

            let segment = remaining.min(bounds.right - x);
            if !run.is_transparent() {
                rects.push(Rect {
                    x,
                    y,
                    width: segment,
                    color_index: run.color_index,
                });
            }

            x += segment;
            if x == bounds.right {
                x = bounds.left;
                y += 1;
            }
            remaining -= segment;
        }
    }

    debug!(
        "Composited {} runs into {} rects",
        image.draws.len(),
        rects.len()
    );
    Ok(rects)
}
