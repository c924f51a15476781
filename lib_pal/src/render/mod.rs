pub mod compositor;
pub mod svg;

use log::{debug, info};
use thiserror::Error;

use crate::image::{decode, DecodeError};
use crate::palette::{parse_hex_color, ColorCache, Palette, PaletteError};
pub use compositor::{composite, Rect};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image decoding failed")]
    Decode(#[from] DecodeError),
    #[error("Palette lookup failed")]
    Palette(#[from] PaletteError),
    #[error("Draw runs cover {actual} pixels, bounds require {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("Draw runs continue past the canvas at row {row}")]
    RowOverflow { row: u8 },
    #[error("Failed to write markup")]
    Format(#[from] std::fmt::Error),
}

/// One layer of a composed image: RLE bytes plus the palette they index.
#[derive(Debug, Clone)]
pub struct Part {
    pub image: Vec<u8>,
    pub palette: Palette,
}

impl Part {
    pub fn new(image: Vec<u8>, palette: Palette) -> Self {
        Self { image, palette }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// `RRGGBB` fill for a full-canvas rect drawn beneath every part.
    pub background: Option<String>,
    /// Reject images whose runs do not exactly fill their bounds.
    pub strict_coverage: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: None,
            strict_coverage: true,
        }
    }
}

impl RenderOptions {
    pub fn with_background(background: impl Into<String>) -> Self {
        Self {
            background: Some(background.into()),
            ..Self::default()
        }
    }
}

/// Renders `parts` into a complete 64x64 SVG document.
pub fn render_full(parts: &[Part], background: Option<&str>) -> Result<String, RenderError> {
    let options = RenderOptions {
        background: background.map(str::to_string),
        ..RenderOptions::default()
    };
    render_document(parts, &options)
}

pub fn render_document(parts: &[Part], options: &RenderOptions) -> Result<String, RenderError> {
    info!("Rendering document with {} parts", parts.len());

    let mut out = String::from(svg::SVG_HEADER);
    if let Some(background) = options.background.as_deref().filter(|b| !b.is_empty()) {
        let [r, g, b] = parse_hex_color(background)?;
        svg::write_background(&mut out, &format!("{:02x}{:02x}{:02x}", r, g, b))?;
    }
    for part in parts {
        write_part(&mut out, part, options.strict_coverage)?;
    }
    out.push_str(svg::SVG_FOOTER);

    info!("Rendered document: {} bytes", out.len());
    Ok(out)
}

/// Rect markup for a single part, without the document envelope.
pub fn render_part(part: &Part) -> Result<String, RenderError> {
    render_part_with(part, &RenderOptions::default())
}

/// Like [`render_part`]; `options.background` is ignored since fragments have no canvas.
pub fn render_part_with(part: &Part, options: &RenderOptions) -> Result<String, RenderError> {
    render_parts_with(std::slice::from_ref(part), options)
}

/// Rect markup for several parts in order, without the document envelope.
pub fn render_parts(parts: &[Part]) -> Result<String, RenderError> {
    render_parts_with(parts, &RenderOptions::default())
}

pub fn render_parts_with(
    parts: &[Part],
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let mut out = String::new();
    for part in parts {
        write_part(&mut out, part, options.strict_coverage)?;
    }
    Ok(out)
}

fn write_part(out: &mut String, part: &Part, strict: bool) -> Result<(), RenderError> {
    let image = decode(&part.image)?;
    let rects = composite(&image, strict)?;

    // Colors are memoized per part only.
    let mut cache = ColorCache::new(&part.palette);
    svg::write_rects(out, &rects, &part.palette, &mut cache)?;
    debug!(
        "Part wrote {} rects using {} distinct colors",
        rects.len(),
        cache.misses()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Palette {
        Palette::new(vec![0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00]).unwrap()
    }

    #[test]
    fn test_render_part_fragment_only() {
        let part = Part::new(vec![0, 0, 2, 2, 0, 2, 0, 1, 1, 1, 0], palette());
        assert_eq!(
            render_part(&part).unwrap(),
            r##"<rect width="1" height="1" x="0" y="1" fill="#00ff00" />"##
        );
    }

    #[test]
    fn test_render_fragments_permissive_coverage() {
        // Runs cover 3 of the 4 pixels in bounds
        let short = Part::new(vec![0, 0, 2, 2, 0, 2, 0, 1, 1], palette());
        let expected = r##"<rect width="1" height="1" x="0" y="1" fill="#00ff00" />"##;
        let permissive = RenderOptions {
            strict_coverage: false,
            ..RenderOptions::default()
        };

        assert_eq!(render_part_with(&short, &permissive).unwrap(), expected);
        assert_eq!(
            render_parts_with(std::slice::from_ref(&short), &permissive).unwrap(),
            expected
        );
        assert!(matches!(
            render_part(&short),
            Err(RenderError::PixelCountMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_render_full_envelope_and_background() {
        let part = Part::new(vec![0, 0, 2, 1, 0, 2, 1], palette());
        let svg = render_full(&[part], Some("#D5D7E1")).unwrap();
        assert_eq!(
            svg,
            concat!(
                r#"<svg width="64" height="64" viewBox="0 0 64 64" xmlns="http://www.w3.org/2000/svg" shape-rendering="crispEdges">"#,
                r##"<rect width="100%" height="100%" fill="#d5d7e1" />"##,
                r##"<rect width="2" height="1" x="0" y="0" fill="#00ff00" />"##,
                "</svg>"
            )
        );
    }

    #[test]
    fn test_render_empty_background_is_skipped() {
        let svg = render_full(&[], Some("")).unwrap();
        assert_eq!(svg, format!("{}{}", svg::SVG_HEADER, svg::SVG_FOOTER));
    }

    #[test]
    fn test_render_parts_in_order() {
        let first = Part::new(vec![0, 0, 1, 1, 0, 1, 1], palette());
        let second = Part::new(vec![0, 5, 4, 6, 3, 1, 1], palette());
        let markup = render_parts(&[first, second]).unwrap();
        let x0 = markup.find(r#"x="0""#).unwrap();
        let x3 = markup.find(r#"x="3""#).unwrap();
        assert!(x0 < x3);
    }

    #[test]
    fn test_render_failure_returns_no_markup() {
        let good = Part::new(vec![0, 0, 1, 1, 0, 1, 1], palette());
        let bad = Part::new(vec![0, 0, 1, 1, 0, 1, 7], palette());
        assert!(matches!(
            render_full(&[good, bad], None),
            Err(RenderError::Palette(PaletteError::PaletteIndexOutOfRange {
                index: 7,
                ..
            }))
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let part = Part::new(vec![0, 0, 2, 2, 0, 3, 1, 1, 0], palette());
        let a = render_full(std::slice::from_ref(&part), Some("ffffff")).unwrap();
        let b = render_full(std::slice::from_ref(&part), Some("ffffff")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_rejects_bad_background() {
        assert!(matches!(
            render_full(&[], Some("white")),
            Err(RenderError::Palette(PaletteError::InvalidHexColor(_)))
        ));
    }
}
