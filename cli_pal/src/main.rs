mod filemanager;

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use lib_pxsvg::palette::PaletteBuilder;
use lib_pxsvg::store::DirBlobStore;
use lib_pxsvg::{encode, render_full, ImageStore, Palette, StoreError};
use log::{error, info};

use filemanager::{load_rgba, save_svg, CliError};

type Store = ImageStore<DirBlobStore>;

#[derive(Parser, Debug)]
#[command(name = "pxsvg", version, about = "Pixel-art image store and SVG renderer")]
struct Cli {
    /// Store directory (created on first use)
    #[arg(short, long, default_value = "store")]
    store: PathBuf,

    /// Write library logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode 64x64 PNGs and append them to a trait as one page
    Import {
        #[arg(short, long = "trait")]
        trait_name: String,

        /// Palette the images are indexed against; new colors are appended to it
        #[arg(short, long, default_value_t = 0)]
        palette: u8,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Register or replace a palette from RRGGBB colors
    Palette {
        #[arg(short, long)]
        index: u8,

        #[arg(required = true)]
        colors: Vec<String>,
    },

    /// Register a background color
    Background { color: String },

    /// Render stored parts, bottom layer first
    Render {
        /// Part to draw, as <trait>:<index>
        #[arg(short, long = "part", required = true)]
        parts: Vec<PartSpec>,

        /// Background as RRGGBB
        #[arg(short, long, conflicts_with = "background_index")]
        background: Option<String>,

        /// Background by registered index
        #[arg(long)]
        background_index: Option<usize>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show traits, pages and palettes
    Info,
}

#[derive(Clone, Debug)]
struct PartSpec {
    trait_name: String,
    index: u32,
}

impl FromStr for PartSpec {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (trait_name, index) = s
            .rsplit_once(':')
            .ok_or_else(|| CliError::InvalidPart(s.to_string()))?;
        let index = index
            .parse()
            .map_err(|_| CliError::InvalidPart(s.to_string()))?;
        Ok(Self {
            trait_name: trait_name.to_string(),
            index,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = lib_pxsvg::init_logging(cli.log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut store = Store::open(&cli.store)?;

    match cli.command {
        Command::Import {
            trait_name,
            palette,
            files,
        } => {
            import(&mut store, &trait_name, palette, &files)?;
            store.save(&cli.store)?;
        }
        Command::Palette { index, colors } => {
            let palette = Palette::from_hex(colors.as_slice())?;
            store.set_palette(index, palette.as_bytes())?;
            store.save(&cli.store)?;
            println!("Palette {} set with {} colors", index, palette.len());
        }
        Command::Background { color } => {
            let index = store.add_background(&color)?;
            store.save(&cli.store)?;
            println!("Background {} = {}", index, store.background(index)?);
        }
        Command::Render {
            parts,
            background,
            background_index,
            out,
        } => {
            let parts = parts
                .iter()
                .map(|p| store.part(&p.trait_name, p.index))
                .collect::<Result<Vec<_>, _>>()?;
            let background = match background_index {
                Some(i) => Some(store.background(i)?.to_string()),
                None => background,
            };
            let svg = render_full(&parts, background.as_deref()).map_err(StoreError::from)?;
            save_svg(out.as_deref(), &svg)?;
        }
        Command::Info => print_info(&store),
    }

    Ok(())
}

fn import(
    store: &mut Store,
    trait_name: &str,
    palette_index: u8,
    files: &[PathBuf],
) -> Result<(), CliError> {
    let mut builder = match store.palette(palette_index) {
        Ok(existing) => PaletteBuilder::extend(&existing),
        Err(StoreError::PaletteNotFound(_)) => PaletteBuilder::new(),
        Err(e) => return Err(e.into()),
    };

    let mut images = Vec::with_capacity(files.len());
    for path in files {
        let indices = builder.index_pixels(&load_rgba(path)?)?;
        images.push(encode(palette_index, &indices)?);
    }

    let palette = builder.build()?;
    store.set_palette(palette_index, palette.as_bytes())?;
    let first = store.image_count(trait_name);
    store.add_images(trait_name, &images)?;

    info!(
        "Imported {} images into {:?} with palette {} ({} colors)",
        images.len(),
        trait_name,
        palette_index,
        palette.len()
    );
    println!(
        "{}: added images {}..{}",
        trait_name,
        first,
        store.image_count(trait_name)
    );
    Ok(())
}

fn print_info(store: &Store) {
    for name in store.trait_names() {
        println!(
            "trait {:<16} {:>3} pages {:>6} images",
            name,
            store.page_count(name),
            store.image_count(name)
        );
    }
    for (index, blob) in store.manifest().palettes() {
        let colors = store
            .palette(*index)
            .map(|p| p.len().to_string())
            .unwrap_or_else(|e| format!("unreadable: {}", e));
        println!("palette {:>3} blob {:>6} colors {}", index, blob.0, colors);
    }
    for (index, color) in store.manifest().backgrounds().iter().enumerate() {
        println!("background {:>3} #{}", index, color);
    }
}
