pub mod lzw;

use thiserror::Error;

pub use lzw::LzwCodec;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Invalid input length: data is empty")]
    EmptyInput,
}

#[derive(Error, Debug)]
pub enum DecompressionError {
    #[error("Decompressed {actual} bytes, page declares {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Incomplete code at position {position}")]
    IncompleteCode { position: usize },
    #[error("Code value {code} exceeds dictionary size {dict_size}")]
    InvalidCode { code: usize, dict_size: usize },
}

/// Packs a page batch before it is written to blob storage.
pub trait Compressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// Restores a page batch, checking it against the length recorded at append time.
pub trait Decompressor {
    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, DecompressionError>;
}
