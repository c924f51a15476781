use super::format::{ContentBounds, DecodedImage, DrawRun};
use crate::constants::CANVAS_SIZE;
use log::{debug, error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed image: {0} bytes is shorter than the 5 byte header")]
    TruncatedHeader(usize),
    #[error("Malformed image: {0} bytes after the header is not a whole number of runs")]
    OddRunBytes(usize),
    #[error("Malformed image: run #{position} has zero length")]
    ZeroLengthRun { position: usize },
    #[error("Bounds {0:?} fall outside the {size}x{size} canvas", size = CANVAS_SIZE)]
    BoundsOutOfCanvas(ContentBounds),
    #[error("Bounds {0:?} are empty or inverted")]
    InvertedBounds(ContentBounds),
}

/// Parses `[format][top][right][bottom][left]([length][color])*` into bounds and runs.
pub fn decode(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    if data.len() < DecodedImage::HEADER_SIZE {
        error!("Image buffer of {} bytes has no complete header", data.len());
        return Err(DecodeError::TruncatedHeader(data.len()));
    }

    let format = data[0];
    let bounds = ContentBounds {
        top: data[1],
        right: data[2],
        bottom: data[3],
        left: data[4],
    };
    validate_bounds(&bounds)?;
    debug!("Image format {} with bounds {:?}", format, bounds);

    let body = &data[DecodedImage::HEADER_SIZE..];
    if body.len() % DecodedImage::RUN_SIZE != 0 {
        error!("Run section has odd length {}", body.len());
        return Err(DecodeError::OddRunBytes(body.len()));
    }

    let draws = body
        .chunks_exact(DecodedImage::RUN_SIZE)
        .enumerate()
        .map(|(position, pair)| {
            if pair[0] == 0 {
                error!("Run #{} has zero length", position);
                return Err(DecodeError::ZeroLengthRun { position });
            }
            Ok(DrawRun {
                length: pair[0],
                color_index: pair[1],
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Decoded {} draw runs", draws.len());

    Ok(DecodedImage {
        format,
        bounds,
        draws,
    })
}

fn validate_bounds(bounds: &ContentBounds) -> Result<(), DecodeError> {
    if bounds.right > CANVAS_SIZE || bounds.bottom > CANVAS_SIZE {
        error!("Bounds {:?} exceed the canvas", bounds);
        return Err(DecodeError::BoundsOutOfCanvas(*bounds));
    }
    if bounds.left >= bounds.right || bounds.top >= bounds.bottom {
        error!("Bounds {:?} do not enclose any pixel", bounds);
        return Err(DecodeError::InvertedBounds(*bounds));
    }
    Ok(())
}
