//! Model and codec error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Slot {slot} is outside a container of {size} slots")]
    SlotOutOfRange { slot: usize, size: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Empty item payload")]
    Empty,

    #[error("Failed to encode item: {0}")]
    Encode(String),

    #[error("Failed to decode item: {0}")]
    Decode(String),

    #[error("Unsupported payload format version: {0}")]
    UnsupportedVersion(u8),
}
