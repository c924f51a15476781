pub mod decoder;
pub mod encoder;
pub mod format;

pub use decoder::{decode, DecodeError};
pub use encoder::{encode, EncodeError};
pub use format::{ContentBounds, DecodedImage, DrawRun};
