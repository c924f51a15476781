use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::constants::FILE_EXT;

/// Opaque handle returned by [`BlobStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlobRef(pub u64);

/// Write-once byte storage.
pub trait BlobStore {
    fn write(&mut self, bytes: &[u8]) -> Result<BlobRef, StoreError>;
    fn read(&self, blob: BlobRef) -> Result<Vec<u8>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Vec<Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&mut self, bytes: &[u8]) -> Result<BlobRef, StoreError> {
        self.blobs.push(bytes.to_vec());
        Ok(BlobRef(self.blobs.len() as u64 - 1))
    }

    fn read(&self, blob: BlobRef) -> Result<Vec<u8>, StoreError> {
        usize::try_from(blob.0)
            .ok()
            .and_then(|i| self.blobs.get(i))
            .cloned()
            .ok_or(StoreError::BlobNotFound(blob))
    }
}

/// One file per blob under a directory, named by reference number.
#[derive(Debug)]
pub struct DirBlobStore {
    root: PathBuf,
    next: u64,
}

impl DirBlobStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        let mut next = 0;
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXT) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok())
            {
                next = next.max(id + 1);
            }
        }
        debug!("Opened blob directory {} at ref {}", root.display(), next);

        Ok(Self { root, next })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, blob: BlobRef) -> PathBuf {
        self.root.join(format!("{}.{}", blob.0, FILE_EXT))
    }
}

impl BlobStore for DirBlobStore {
    fn write(&mut self, bytes: &[u8]) -> Result<BlobRef, StoreError> {
        let blob = BlobRef(self.next);
        // create_new keeps existing blobs immutable
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(blob))?;
        file.write_all(bytes)?;
        self.next += 1;
        debug!("Wrote blob {} ({} bytes)", blob.0, bytes.len());
        Ok(blob)
    }

    fn read(&self, blob: BlobRef) -> Result<Vec<u8>, StoreError> {
        let path = self.path(blob);
        if !path.exists() {
            error!("Blob {} is missing from {}", blob.0, self.root.display());
            return Err(StoreError::BlobNotFound(blob));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_refs_are_sequential() {
        let mut store = MemoryBlobStore::new();
        assert_eq!(store.write(b"a").unwrap(), BlobRef(0));
        assert_eq!(store.write(b"bc").unwrap(), BlobRef(1));
        assert_eq!(store.read(BlobRef(1)).unwrap(), b"bc");
        assert!(matches!(
            store.read(BlobRef(2)),
            Err(StoreError::BlobNotFound(BlobRef(2)))
        ));
    }

    #[test]
    fn test_dir_store_resumes_numbering() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = DirBlobStore::open(dir.path()).unwrap();
            store.write(b"first").unwrap();
            store.write(b"second").unwrap();
        }
        let mut store = DirBlobStore::open(dir.path()).unwrap();
        assert_eq!(store.write(b"third").unwrap(), BlobRef(2));
        assert_eq!(store.read(BlobRef(0)).unwrap(), b"first");
        assert!(matches!(
            store.read(BlobRef(9)),
            Err(StoreError::BlobNotFound(_))
        ));
    }
}
