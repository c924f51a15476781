use std::collections::HashMap;

use log::{debug, error};
use thiserror::Error;

use crate::constants::{MAX_PALETTE_BYTES, PALETTE_ENTRY_SIZE, TRANSPARENT_INDEX};

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Palette is empty")]
    EmptyPalette,
    #[error("Invalid palette length: expected a multiple of 3 up to 768 bytes, got {0}")]
    BadPaletteLength(usize),
    #[error("Color index {index} is out of range for a palette of {len} bytes")]
    PaletteIndexOutOfRange { index: u8, len: usize },
    #[error("Palette overflow: maximum 256 colors supported, attempted to add color #{0}")]
    PaletteOverflow(usize),
    #[error("Invalid pixel data length: expected multiple of 4 bytes, got {0}")]
    InvalidPixelDataLength(usize),
    #[error("Invalid hex color {0:?}: expected six hex digits")]
    InvalidHexColor(String),
}

/// Flat sequence of RGB triples, addressed by color index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    bytes: Vec<u8>,
}

impl Palette {
    pub fn new(bytes: Vec<u8>) -> Result<Self, PaletteError> {
        validate_palette_bytes(&bytes)?;
        Ok(Self { bytes })
    }

    /// Builds a palette from `RRGGBB` strings, with or without a leading `#`.
    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Result<Self, PaletteError> {
        let mut bytes = Vec::with_capacity(colors.len() * PALETTE_ENTRY_SIZE);
        for color in colors {
            bytes.extend_from_slice(&parse_hex_color(color.as_ref())?);
        }
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / PALETTE_ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn rgb(&self, index: u8) -> Result<[u8; 3], PaletteError> {
        let start = index as usize * PALETTE_ENTRY_SIZE;
        match self.bytes.get(start..start + PALETTE_ENTRY_SIZE) {
            Some(rgb) => Ok([rgb[0], rgb[1], rgb[2]]),
            None => {
                error!(
                    "Color index {} is past the end of a {} byte palette",
                    index,
                    self.bytes.len()
                );
                Err(PaletteError::PaletteIndexOutOfRange {
                    index,
                    len: self.bytes.len(),
                })
            }
        }
    }
}

/// Length rules applied whenever a palette is registered.
pub fn validate_palette_bytes(bytes: &[u8]) -> Result<(), PaletteError> {
    if bytes.is_empty() {
        error!("Rejecting empty palette");
        return Err(PaletteError::EmptyPalette);
    }
    if bytes.len() % PALETTE_ENTRY_SIZE != 0 || bytes.len() > MAX_PALETTE_BYTES {
        error!("Rejecting palette of {} bytes", bytes.len());
        return Err(PaletteError::BadPaletteLength(bytes.len()));
    }
    Ok(())
}

pub fn parse_hex_color(hex: &str) -> Result<[u8; 3], PaletteError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PaletteError::InvalidHexColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| PaletteError::InvalidHexColor(hex.to_string()))
    };
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Per-render memo of resolved `RRGGBB` strings.
///
/// Scoped to one image part: create a fresh cache for every part rendered.
#[derive(Debug)]
pub struct ColorCache {
    colors: Vec<Option<String>>,
    misses: usize,
}

impl ColorCache {
    pub fn new(palette: &Palette) -> Self {
        Self {
            colors: vec![None; palette.len()],
            misses: 0,
        }
    }

    /// Lowercase hex for `index`, reading the palette only on the first request.
    pub fn resolve(&mut self, palette: &Palette, index: u8) -> Result<&str, PaletteError> {
        let slot = index as usize;
        if slot >= self.colors.len() {
            self.colors.resize(slot + 1, None);
        }
        if self.colors[slot].is_none() {
            let [r, g, b] = palette.rgb(index)?;
            self.misses += 1;
            self.colors[slot] = Some(format!("{:02x}{:02x}{:02x}", r, g, b));
        }
        Ok(self.colors[slot].as_deref().unwrap_or_default())
    }

    /// Palette reads performed so far.
    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Collects the distinct colors of RGBA pixel data into a palette.
///
/// Index 0 is reserved for transparency; fully transparent pixels map to it.
pub struct PaletteBuilder {
    palette: Vec<[u8; 3]>,
    lookup: HashMap<[u8; 3], u8>,
}

impl Default for PaletteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteBuilder {
    pub fn new() -> Self {
        Self {
            palette: vec![[0, 0, 0]],
            lookup: HashMap::new(),
        }
    }

    /// Starts from an existing palette so previously assigned indices stay put.
    pub fn extend(existing: &Palette) -> Self {
        let mut palette = Vec::with_capacity(existing.len());
        let mut lookup = HashMap::new();
        for (index, rgb) in existing.as_bytes().chunks_exact(PALETTE_ENTRY_SIZE).enumerate() {
            let color = [rgb[0], rgb[1], rgb[2]];
            palette.push(color);
            if index != TRANSPARENT_INDEX as usize {
                lookup.entry(color).or_insert(index as u8);
            }
        }
        Self { palette, lookup }
    }

    /// Maps every RGBA pixel to a palette index, adding new colors as needed.
    pub fn index_pixels(&mut self, pixels: &[u8]) -> Result<Vec<u8>, PaletteError> {
        if pixels.len() % 4 != 0 {
            return Err(PaletteError::InvalidPixelDataLength(pixels.len()));
        }

        let mut indices = Vec::with_capacity(pixels.len() / 4);
        for pixel in pixels.chunks_exact(4) {
            if pixel[3] == 0 {
                indices.push(TRANSPARENT_INDEX);
                continue;
            }
            let color = [pixel[0], pixel[1], pixel[2]];
            let index = match self.lookup.get(&color) {
                Some(&index) => index,
                None => self.push(color)?,
            };
            indices.push(index);
        }

        debug!(
            "Indexed {} pixels against {} palette colors",
            indices.len(),
            self.palette.len()
        );
        Ok(indices)
    }

    fn push(&mut self, color: [u8; 3]) -> Result<u8, PaletteError> {
        if self.palette.len() >= MAX_PALETTE_BYTES / PALETTE_ENTRY_SIZE {
            error!("Palette is full, cannot add {:?}", color);
            return Err(PaletteError::PaletteOverflow(self.palette.len() + 1));
        }
        let index = self.palette.len() as u8;
        self.palette.push(color);
        self.lookup.insert(color, index);
        Ok(index)
    }

    pub fn build(self) -> Result<Palette, PaletteError> {
        Palette::new(self.palette.concat())
    }
}
