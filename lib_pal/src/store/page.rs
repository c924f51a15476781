use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::blob::BlobRef;
use super::StoreError;

/// One compressed batch of images. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePage {
    pub blob: BlobRef,
    pub decompressed_len: u32,
    pub image_count: u32,
}

/// Append-only sequence of pages forming one global image index space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pages: Vec<StoragePage>,
    image_count: u32,
}

impl Trait {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, page: StoragePage) -> Result<(), StoreError> {
        if page.image_count == 0 || page.decompressed_len == 0 {
            error!("Rejecting page with invalid metadata: {:?}", page);
            return Err(StoreError::InvalidPageMetadata {
                image_count: page.image_count,
                decompressed_len: page.decompressed_len,
            });
        }
        let total = self
            .image_count
            .checked_add(page.image_count)
            .ok_or(StoreError::InvalidPageMetadata {
                image_count: page.image_count,
                decompressed_len: page.decompressed_len,
            })?;

        self.pages.push(page);
        self.image_count = total;
        debug!(
            "Appended page #{} with {} images, total now {}",
            self.pages.len() - 1,
            page.image_count,
            total
        );
        Ok(())
    }

    /// Finds the page holding `index` and the image's position within it.
    pub fn locate(&self, index: u32) -> Result<(&StoragePage, u32), StoreError> {
        let mut seen = 0u32;
        for page in &self.pages {
            // A manifest read from disk may carry counts that sum past u32::MAX
            let Some(end) = seen.checked_add(page.image_count) else {
                break;
            };
            if index < end {
                return Ok((page, index - seen));
            }
            seen = end;
        }
        error!(
            "Image index {} is past the {} stored images",
            index, self.image_count
        );
        Err(StoreError::ImageIndexNotFound {
            index,
            total: self.image_count,
        })
    }

    pub fn pages(&self) -> &[StoragePage] {
        &self.pages
    }

    pub fn image_count(&self) -> u32 {
        self.image_count
    }
}
