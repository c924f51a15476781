#![allow(dead_code)]

use lib_pxsvg::constants::{CANVAS_PIXELS, CANVAS_SIZE};

/// Index 0 transparent, then red, green, blue.
pub const RGB_PALETTE: [u8; 12] = [
    0x00, 0x00, 0x00, // Transparent
    0xFF, 0x00, 0x00, // Red
    0x00, 0xFF, 0x00, // Green
    0x00, 0x00, 0xFF, // Blue
];

/// 2x2 at the origin: transparent, transparent, red, transparent.
pub const SMALL_IMAGE: [u8; 11] = [0x00, 0, 2, 2, 0, 0x02, 0x00, 0x01, 0x01, 0x01, 0x00];

pub fn blank_grid() -> Vec<u8> {
    vec![0; CANVAS_PIXELS]
}

/// Diagonal stripes of colors 1..=3 inside a 20x12 box at (8, 30).
pub fn striped_grid() -> Vec<u8> {
    let mut grid = blank_grid();
    for y in 30..42 {
        for x in 8..28 {
            grid[y * CANVAS_SIZE as usize + x] = ((x + y) % 4) as u8;
        }
    }
    grid
}

/// Rasterizes `<rect>` elements back onto a canvas of palette indices.
pub fn rasterize(markup: &str, palette: &[u8]) -> Vec<u8> {
    let mut grid = blank_grid();
    for rect in markup.split("<rect ").skip(1) {
        if attr(rect, "width") == "100%" {
            continue;
        }
        let width: usize = attr(rect, "width").parse().unwrap();
        let x: usize = attr(rect, "x").parse().unwrap();
        let y: usize = attr(rect, "y").parse().unwrap();
        let fill = attr(rect, "fill").trim_start_matches('#');
        let index = palette
            .chunks(3)
            .position(|rgb| format!("{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]) == fill)
            .unwrap() as u8;
        for dx in 0..width {
            grid[y * CANVAS_SIZE as usize + x + dx] = index;
        }
    }
    grid
}

fn attr<'a>(rect: &'a str, name: &str) -> &'a str {
    let start = rect.find(&format!("{}=\"", name)).unwrap() + name.len() + 2;
    let end = start + rect[start..].find('"').unwrap();
    &rect[start..end]
}
