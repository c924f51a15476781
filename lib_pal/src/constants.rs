pub const FORMAT_NAME: &str = "PXSVG image store";
pub const FILE_EXT: &str = "blob";

/// Width and height of every image canvas, in pixels.
pub const CANVAS_SIZE: u8 = 64;
pub const CANVAS_PIXELS: usize = CANVAS_SIZE as usize * CANVAS_SIZE as usize;

pub const PALETTE_ENTRY_SIZE: usize = 3;
pub const MAX_PALETTE_BYTES: usize = 256 * PALETTE_ENTRY_SIZE;

/// Color index that is never drawn.
pub const TRANSPARENT_INDEX: u8 = 0;

pub const MANIFEST_FILE: &str = "manifest.bin";
pub const BLOB_DIR: &str = "blobs";
