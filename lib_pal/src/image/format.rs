use serde::{Deserialize, Serialize};

/// Populated sub-rectangle of the canvas. `right` and `bottom` are exclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBounds {
    pub top: u8,
    pub right: u8,
    pub bottom: u8,
    pub left: u8,
}

impl ContentBounds {
    pub fn width(&self) -> u8 {
        self.right - self.left
    }

    pub fn height(&self) -> u8 {
        self.bottom - self.top
    }

    /// Number of pixels the draw runs must cover.
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRun {
    pub length: u8,
    pub color_index: u8,
}

impl DrawRun {
    pub fn is_transparent(&self) -> bool {
        self.color_index == crate::constants::TRANSPARENT_INDEX
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Byte 0 of the buffer. The codec carries it through untouched.
    pub format: u8,
    pub bounds: ContentBounds,
    pub draws: Vec<DrawRun>,
}

impl DecodedImage {
    pub const HEADER_SIZE: usize = 5;
    pub const RUN_SIZE: usize = 2;

    /// Total pixels described by the draw runs, transparent ones included.
    pub fn run_pixels(&self) -> usize {
        self.draws.iter().map(|run| run.length as usize).sum()
    }
}
