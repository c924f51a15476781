use std::fmt::Write;

use super::compositor::Rect;
use super::RenderError;
use crate::palette::{ColorCache, Palette};

pub const SVG_HEADER: &str = r#"<svg width="64" height="64" viewBox="0 0 64 64" xmlns="http://www.w3.org/2000/svg" shape-rendering="crispEdges">"#;
pub const SVG_FOOTER: &str = "</svg>";

/// Appends one `<rect>` per rectangle, resolving colors through `cache`.
pub fn write_rects(
    out: &mut String,
    rects: &[Rect],
    palette: &Palette,
    cache: &mut ColorCache,
) -> Result<(), RenderError> {
    for rect in rects {
        let fill = cache.resolve(palette, rect.color_index)?;
        write!(
            out,
            r##"<rect width="{}" height="1" x="{}" y="{}" fill="#{}" />"##,
            rect.width, rect.x, rect.y, fill
        )?;
    }
    Ok(())
}

pub fn write_background(out: &mut String, color: &str) -> Result<(), RenderError> {
    write!(
        out,
        r##"<rect width="100%" height="100%" fill="#{}" />"##,
        color
    )?;
    Ok(())
}
