//! Paginated image storage.
//!
//! Images are grouped by trait into pages. Each page is a batch of RLE image
//! buffers, compressed and written once to a [`BlobStore`]. Lookups walk the
//! page list to find the batch holding a global index, then expand only that
//! page.

pub mod batch;
pub mod blob;
pub mod page;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compression::{
    CompressionError, Compressor, DecompressionError, Decompressor, LzwCodec,
};
use crate::constants::{BLOB_DIR, MANIFEST_FILE};
use crate::image::decode;
use crate::palette::{parse_hex_color, validate_palette_bytes, Palette, PaletteError};
use crate::render::{render_document, Part, RenderError, RenderOptions};
pub use batch::{decode_batch, encode_batch, BatchError};
pub use blob::{BlobRef, BlobStore, DirBlobStore, MemoryBlobStore};
pub use page::{StoragePage, Trait};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid page metadata: {image_count} images, {decompressed_len} decompressed bytes")]
    InvalidPageMetadata {
        image_count: u32,
        decompressed_len: u32,
    },
    #[error("Image index {index} not found, trait holds {total} images")]
    ImageIndexNotFound { index: u32, total: u32 },
    #[error("Unknown trait {0:?}")]
    TraitNotFound(String),
    #[error("No palette registered at index {0}")]
    PaletteNotFound(u8),
    #[error("No background registered at index {0}")]
    BackgroundNotFound(usize),
    #[error("Blob {0:?} not found")]
    BlobNotFound(BlobRef),
    #[error("Page of {0} bytes exceeds the maximum page size")]
    PageTooLarge(usize),

    #[error("Stored page did not match its metadata")]
    DecompressionMismatch(#[from] PageMismatch),
    #[error("Page batch encoding failed")]
    BatchEncoding(#[source] BatchError),
    #[error("Page compression failed")]
    Compression(#[from] CompressionError),
    #[error("Invalid palette")]
    Palette(#[from] PaletteError),
    #[error("Rendering failed")]
    Render(#[from] RenderError),
    #[error("Manifest serialization failed")]
    Manifest(#[from] bincode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ways a stored page can disagree with its `decompressed_len` and `image_count`.
#[derive(Error, Debug)]
pub enum PageMismatch {
    #[error(transparent)]
    Length(#[from] DecompressionError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Everything needed to locate stored images and palettes, minus the blobs themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    traits: BTreeMap<String, Trait>,
    palettes: BTreeMap<u8, BlobRef>,
    backgrounds: Vec<String>,
}

impl Manifest {
    pub fn traits(&self) -> &BTreeMap<String, Trait> {
        &self.traits
    }

    pub fn palettes(&self) -> &BTreeMap<u8, BlobRef> {
        &self.palettes
    }

    pub fn backgrounds(&self) -> &[String] {
        &self.backgrounds
    }
}

/// Selection of one image per trait, drawn in order, plus an optional background.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub background: Option<usize>,
    pub parts: Vec<(String, u32)>,
}

pub struct ImageStore<B, C = LzwCodec> {
    blobs: B,
    codec: C,
    manifest: Manifest,
}

impl<B: BlobStore, C: Compressor + Decompressor> ImageStore<B, C> {
    pub fn new(blobs: B, codec: C) -> Self {
        Self::with_manifest(blobs, codec, Manifest::default())
    }

    pub fn with_manifest(blobs: B, codec: C, manifest: Manifest) -> Self {
        Self {
            blobs,
            codec,
            manifest,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Appends a page whose compressed batch is already in blob storage.
    pub fn append_page(
        &mut self,
        trait_name: &str,
        blob: BlobRef,
        decompressed_len: u32,
        image_count: u32,
    ) -> Result<(), StoreError> {
        self.manifest
            .traits
            .entry(trait_name.to_string())
            .or_default()
            .append(StoragePage {
                blob,
                decompressed_len,
                image_count,
            })?;
        info!(
            "Trait {:?}: appended page of {} images from blob {}",
            trait_name, image_count, blob.0
        );
        Ok(())
    }

    /// Writes already compressed batch bytes and appends them as a page.
    pub fn append_page_bytes(
        &mut self,
        trait_name: &str,
        compressed: &[u8],
        decompressed_len: u32,
        image_count: u32,
    ) -> Result<BlobRef, StoreError> {
        // Check before writing so a rejected page leaves no orphan blob.
        if image_count == 0 || decompressed_len == 0 {
            error!("Rejecting page for trait {:?}: empty metadata", trait_name);
            return Err(StoreError::InvalidPageMetadata {
                image_count,
                decompressed_len,
            });
        }
        let blob = self.blobs.write(compressed)?;
        self.append_page(trait_name, blob, decompressed_len, image_count)?;
        Ok(blob)
    }

    /// Batches, compresses, stores and appends `images` as a single page.
    pub fn add_images(
        &mut self,
        trait_name: &str,
        images: &[Vec<u8>],
    ) -> Result<BlobRef, StoreError> {
        let image_count =
            u32::try_from(images.len()).map_err(|_| StoreError::PageTooLarge(images.len()))?;
        let batch = encode_batch(images).map_err(StoreError::BatchEncoding)?;
        let decompressed_len =
            u32::try_from(batch.len()).map_err(|_| StoreError::PageTooLarge(batch.len()))?;
        let compressed = self.codec.compress(&batch)?;
        debug!(
            "Page batch for {:?}: {} bytes, {} compressed",
            trait_name,
            batch.len(),
            compressed.len()
        );
        self.append_page_bytes(trait_name, &compressed, decompressed_len, image_count)
    }

    fn trait_pages(&self, trait_name: &str) -> Result<&Trait, StoreError> {
        self.manifest.traits.get(trait_name).ok_or_else(|| {
            error!("Trait {:?} has no pages", trait_name);
            StoreError::TraitNotFound(trait_name.to_string())
        })
    }

    pub fn locate(
        &self,
        trait_name: &str,
        index: u32,
    ) -> Result<(&StoragePage, u32), StoreError> {
        self.trait_pages(trait_name)?.locate(index)
    }

    /// Raw RLE bytes of image `index` within `trait_name`.
    pub fn fetch_image(&self, trait_name: &str, index: u32) -> Result<Vec<u8>, StoreError> {
        let (page, local) = self.locate(trait_name, index)?;
        debug!(
            "Trait {:?} image {} is #{} of blob {}",
            trait_name, index, local, page.blob.0
        );

        let compressed = self.blobs.read(page.blob)?;
        let batch = self
            .codec
            .decompress(&compressed, page.decompressed_len as usize)
            .map_err(PageMismatch::from)?;
        let mut images =
            decode_batch(&batch, page.image_count as usize).map_err(PageMismatch::from)?;

        info!("Fetched {:?} image {}", trait_name, index);
        Ok(images.swap_remove(local as usize))
    }

    /// Registers or replaces the palette at `index`.
    pub fn set_palette(&mut self, index: u8, bytes: &[u8]) -> Result<BlobRef, StoreError> {
        validate_palette_bytes(bytes)?;
        let blob = self.blobs.write(bytes)?;
        self.manifest.palettes.insert(index, blob);
        info!("Palette {} now points at blob {}", index, blob.0);
        Ok(blob)
    }

    /// Re-points palette `index` at an existing blob after validating its contents.
    pub fn set_palette_ref(&mut self, index: u8, blob: BlobRef) -> Result<(), StoreError> {
        validate_palette_bytes(&self.blobs.read(blob)?)?;
        self.manifest.palettes.insert(index, blob);
        info!("Palette {} now points at blob {}", index, blob.0);
        Ok(())
    }

    pub fn fetch_palette(&self, index: u8) -> Result<Vec<u8>, StoreError> {
        let blob = self.manifest.palettes.get(&index).ok_or_else(|| {
            error!("No palette registered at index {}", index);
            StoreError::PaletteNotFound(index)
        })?;
        self.blobs.read(*blob)
    }

    pub fn palette(&self, index: u8) -> Result<Palette, StoreError> {
        Ok(Palette::new(self.fetch_palette(index)?)?)
    }

    pub fn add_background(&mut self, color: &str) -> Result<usize, StoreError> {
        let [r, g, b] = parse_hex_color(color)?;
        self.manifest
            .backgrounds
            .push(format!("{:02x}{:02x}{:02x}", r, g, b));
        Ok(self.manifest.backgrounds.len() - 1)
    }

    pub fn background(&self, index: usize) -> Result<&str, StoreError> {
        self.manifest
            .backgrounds
            .get(index)
            .map(String::as_str)
            .ok_or(StoreError::BackgroundNotFound(index))
    }

    /// Loads an image together with the palette named by its first byte.
    pub fn part(&self, trait_name: &str, index: u32) -> Result<Part, StoreError> {
        let image = self.fetch_image(trait_name, index)?;
        let palette_index = decode(&image).map_err(RenderError::from)?.format;
        Ok(Part::new(image, self.palette(palette_index)?))
    }

    pub fn render_seed(&self, seed: &Seed) -> Result<String, StoreError> {
        let parts = seed
            .parts
            .iter()
            .map(|(trait_name, index)| self.part(trait_name, *index))
            .collect::<Result<Vec<_>, _>>()?;
        let options = RenderOptions {
            background: seed
                .background
                .map(|i| self.background(i).map(str::to_string))
                .transpose()?,
            ..RenderOptions::default()
        };
        Ok(render_document(&parts, &options)?)
    }

    pub fn image_count(&self, trait_name: &str) -> u32 {
        self.manifest
            .traits
            .get(trait_name)
            .map_or(0, Trait::image_count)
    }

    pub fn page_count(&self, trait_name: &str) -> usize {
        self.manifest
            .traits
            .get(trait_name)
            .map_or(0, |t| t.pages().len())
    }

    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.traits.keys().map(String::as_str)
    }

    pub fn palette_count(&self) -> usize {
        self.manifest.palettes.len()
    }

    pub fn background_count(&self) -> usize {
        self.manifest.backgrounds.len()
    }
}

impl ImageStore<DirBlobStore, LzwCodec> {
    /// Opens the store rooted at `root`, creating an empty one if needed.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let blobs = DirBlobStore::open(root.join(BLOB_DIR))?;
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            bincode::deserialize_from(BufReader::new(File::open(&manifest_path)?))?
        } else {
            Manifest::default()
        };
        info!(
            "Opened store {} with {} traits",
            root.display(),
            manifest.traits.len()
        );
        Ok(Self::with_manifest(blobs, LzwCodec, manifest))
    }

    pub fn save(&self, root: &Path) -> Result<(), StoreError> {
        let tmp = root.join(format!("{}.tmp", MANIFEST_FILE));
        bincode::serialize_into(BufWriter::new(File::create(&tmp)?), &self.manifest)?;
        fs::rename(&tmp, root.join(MANIFEST_FILE))?;
        info!("Saved manifest to {}", root.display());
        Ok(())
    }
}
