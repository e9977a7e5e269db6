//! Item codecs
//!
//! A codec turns one caller-defined item into a self-contained byte payload
//! and back. Payloads are stored as-is by every backend, so the same bytes
//! round-trip through SQLite, MySQL and PostgreSQL alike.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

pub trait ItemCodec {
    type Item;

    fn encode(&self, item: &Self::Item) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Item, CodecError>;

    /// Items the codec treats as an empty slot are never stored
    fn is_empty(&self, _item: &Self::Item) -> bool {
        false
    }

    /// Decode one stored slot; empty or malformed payloads become "no item"
    fn decode_or_absent(&self, bytes: &[u8]) -> Option<Self::Item> {
        match self.decode(bytes) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(error = %e, bytes = bytes.len(), "Treating payload as absent");
                None
            }
        }
    }
}

const JSON_FORMAT_VERSION: u8 = 1;

/// Codec for serde types: one format-version byte followed by the JSON body
pub struct JsonItemCodec<T> {
    empty_when: fn(&T) -> bool,
}

impl<T> JsonItemCodec<T> {
    pub fn new() -> Self {
        Self {
            empty_when: |_| false,
        }
    }

    /// Treat items matching `predicate` as empty slots (e.g. an "air" stack)
    pub fn with_empty_check(predicate: fn(&T) -> bool) -> Self {
        Self {
            empty_when: predicate,
        }
    }
}

impl<T> Default for JsonItemCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonItemCodec<T> {
    fn clone(&self) -> Self {
        Self {
            empty_when: self.empty_when,
        }
    }
}

impl<T> std::fmt::Debug for JsonItemCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonItemCodec")
            .field("format_version", &JSON_FORMAT_VERSION)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> ItemCodec for JsonItemCodec<T> {
    type Item = T;

    fn encode(&self, item: &T) -> Result<Vec<u8>, CodecError> {
        let mut out = vec![JSON_FORMAT_VERSION];
        serde_json::to_writer(&mut out, item).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match bytes.split_first() {
            None => Err(CodecError::Empty),
            Some((&version, _)) if version != JSON_FORMAT_VERSION => {
                Err(CodecError::UnsupportedVersion(version))
            }
            Some((_, body)) => {
                serde_json::from_slice(body).map_err(|e| CodecError::Decode(e.to_string()))
            }
        }
    }

    fn is_empty(&self, item: &T) -> bool {
        (self.empty_when)(item)
    }
}

/// Pass-through codec for callers that serialize items themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl ItemCodec for BytesCodec {
    type Item = Vec<u8>;

    fn encode(&self, item: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(item.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(bytes.to_vec())
    }

    fn is_empty(&self, item: &Vec<u8>) -> bool {
        item.is_empty()
    }
}
