use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to encode image batch")]
    Encode(#[source] bincode::Error),
    #[error("Failed to decode image batch")]
    Decode(#[source] bincode::Error),
    #[error("Batch holds {actual} images, page declares {expected}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Serializes the images of one page as a length-prefixed sequence.
pub fn encode_batch(images: &[Vec<u8>]) -> Result<Vec<u8>, BatchError> {
    bincode::serialize(images).map_err(BatchError::Encode)
}

pub fn decode_batch(data: &[u8], expected_count: usize) -> Result<Vec<Vec<u8>>, BatchError> {
    let images: Vec<Vec<u8>> = bincode::deserialize(data).map_err(BatchError::Decode)?;
    if images.len() != expected_count {
        error!(
            "Batch decoded to {} images, expected {}",
            images.len(),
            expected_count
        );
        return Err(BatchError::CountMismatch {
            expected: expected_count,
            actual: images.len(),
        });
    }
    Ok(images)
}
