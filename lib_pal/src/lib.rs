pub mod compression;
pub mod constants;
pub mod image;
pub mod palette;
pub mod render;
pub mod store;

use log::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub use crate::image::{decode, encode, ContentBounds, DecodedImage, DrawRun};
pub use crate::palette::{ColorCache, Palette, PaletteBuilder};
pub use crate::render::{
    render_document, render_full, render_part, render_part_with, render_parts,
    render_parts_with, Part, RenderOptions,
};
pub use crate::store::{ImageStore, PageMismatch, Seed, StoreError};

/// Sends debug logs for `lib_pxsvg` to `log_file`. Without a file, logs go
/// to stderr filtered by `RUST_LOG` (warnings by default).
pub fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {}:{}] {}",
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    if let Some(path) = log_file {
        let target = Box::new(File::create(path)?);
        builder
            .filter(Some("lib_pxsvg"), LevelFilter::Debug)
            .target(env_logger::Target::Pipe(target));
    }

    builder.init();
    Ok(())
}
