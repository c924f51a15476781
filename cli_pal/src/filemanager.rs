use std::fs;
use std::io;
use std::path::Path;

use image::ImageError;
use lib_pxsvg::constants::CANVAS_SIZE;
use lib_pxsvg::image::EncodeError;
use lib_pxsvg::palette::PaletteError;
use lib_pxsvg::StoreError;
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Image store error: {0}")]
    Store(#[from] StoreError),

    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    #[error("Palette error: {0}")]
    Palette(#[from] PaletteError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{path} is {width}x{height}, expected {size}x{size}", size = CANVAS_SIZE)]
    InvalidDimensions {
        path: String,
        width: u32,
        height: u32,
    },

    #[error("Invalid part {0:?}: expected <trait>:<index>")]
    InvalidPart(String),
}

/// Loads a canvas-sized image as straight RGBA bytes.
pub fn load_rgba(path: &Path) -> Result<Vec<u8>, CliError> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    if width != CANVAS_SIZE as u32 || height != CANVAS_SIZE as u32 {
        return Err(CliError::InvalidDimensions {
            path: path.display().to_string(),
            width,
            height,
        });
    }
    info!("Loaded {}", path.display());
    Ok(image.into_raw())
}

/// Writes `svg` to `out`, or to stdout when no path is given.
pub fn save_svg(out: Option<&Path>, svg: &str) -> Result<(), CliError> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, svg)?;
            info!("SVG saved to {}", path.display());
        }
        None => println!("{}", svg),
    }
    Ok(())
}
