use log::{debug, error, info};
use thiserror::Error;

use super::format::{ContentBounds, DecodedImage};
use crate::constants::{CANVAS_PIXELS, CANVAS_SIZE, TRANSPARENT_INDEX};

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Expected {expected} palette indices for a full canvas, got {actual}")]
    InvalidGridSize { expected: usize, actual: usize },
    #[error("Image has no visible pixels")]
    EmptyImage,
}

/// Run-length encodes a full canvas of palette indices, row-major.
///
/// Only the tight bounding box of non-transparent pixels is stored. Runs may
/// continue across row ends within that box and are split at 255 pixels.
pub fn encode(format: u8, indices: &[u8]) -> Result<Vec<u8>, EncodeError> {
    info!("Starting image encoding");

    if indices.len() != CANVAS_PIXELS {
        error!(
            "Index grid has {} entries, expected {}",
            indices.len(),
            CANVAS_PIXELS
        );
        return Err(EncodeError::InvalidGridSize {
            expected: CANVAS_PIXELS,
            actual: indices.len(),
        });
    }

    let bounds = content_bounds(indices).ok_or_else(|| {
        error!("Refusing to encode a fully transparent image");
        EncodeError::EmptyImage
    })?;
    debug!("Content bounds: {:?}", bounds);

    let mut encoded = vec![format, bounds.top, bounds.right, bounds.bottom, bounds.left];

    let region = (bounds.top..bounds.bottom).flat_map(|y| {
        let row = y as usize * CANVAS_SIZE as usize;
        indices[row + bounds.left as usize..row + bounds.right as usize].iter().copied()
    });

    let mut current: Option<(u8, u8)> = None;
    for color in region {
        current = match current {
            Some((length, run_color)) if run_color == color && length < u8::MAX => {
                Some((length + 1, run_color))
            }
            Some((length, run_color)) => {
                encoded.extend_from_slice(&[length, run_color]);
                Some((1, color))
            }
            None => Some((1, color)),
        };
    }
    if let Some((length, color)) = current {
        encoded.extend_from_slice(&[length, color]);
    }

    debug!(
        "Encoded {} runs",
        (encoded.len() - DecodedImage::HEADER_SIZE) / DecodedImage::RUN_SIZE
    );
    info!("Image encoding completed: {} bytes", encoded.len());
    Ok(encoded)
}

fn content_bounds(indices: &[u8]) -> Option<ContentBounds> {
    let size = CANVAS_SIZE as usize;
    let mut bounds: Option<ContentBounds> = None;

    for (i, &color) in indices.iter().enumerate() {
        if color == TRANSPARENT_INDEX {
            continue;
        }
        let (x, y) = ((i % size) as u8, (i / size) as u8);
        bounds = Some(match bounds {
            None => ContentBounds {
                top: y,
                right: x + 1,
                bottom: y + 1,
                left: x,
            },
            Some(b) => ContentBounds {
                top: b.top.min(y),
                right: b.right.max(x + 1),
                bottom: b.bottom.max(y + 1),
                left: b.left.min(x),
            },
        });
    }

    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::decode;

    fn canvas() -> Vec<u8> {
        vec![0; CANVAS_PIXELS]
    }

    fn set(grid: &mut [u8], x: usize, y: usize, color: u8) {
        grid[y * CANVAS_SIZE as usize + x] = color;
    }

    #[test]
    fn test_encode_single_pixel() {
        let mut grid = canvas();
        set(&mut grid, 10, 20, 4);
        let encoded = encode(1, &grid).unwrap();
        assert_eq!(encoded, vec![1, 20, 11, 21, 10, 1, 4]);
    }

    #[test]
    fn test_encode_runs_cross_rows() {
        let mut grid = canvas();
        // 2x2 block of color 3 with a hole at the bottom right
        set(&mut grid, 0, 0, 3);
        set(&mut grid, 1, 0, 3);
        set(&mut grid, 0, 1, 3);
        let encoded = encode(0, &grid).unwrap();
        assert_eq!(encoded, vec![0, 0, 2, 2, 0, 3, 3, 1, 0]);
    }

    #[test]
    fn test_encode_long_runs_split() {
        let grid = vec![5; CANVAS_PIXELS];
        let image = decode(&encode(0, &grid).unwrap()).unwrap();
        assert_eq!(image.run_pixels(), CANVAS_PIXELS);
        assert!(image.draws.iter().all(|run| run.color_index == 5));
        assert_eq!(image.draws[0].length, 255);
    }

    #[test]
    fn test_encode_empty_image() {
        assert!(matches!(encode(0, &canvas()), Err(EncodeError::EmptyImage)));
    }

    #[test]
    fn test_encode_wrong_grid_size() {
        assert!(matches!(
            encode(0, &[1, 2, 3]),
            Err(EncodeError::InvalidGridSize { actual: 3, .. })
        ));
    }
}
