//! Vault Model
//!
//! In-memory representation of a player's vault:
//! - `VaultModel` is built fresh on every open and never cached across sessions
//! - `Container` is the live slot grid handed back on close
//! - `ItemCodec` turns caller items into opaque payloads and back

mod codec;
mod container;
mod error;
mod owner;
mod vault;

pub use codec::{BytesCodec, ItemCodec, JsonItemCodec};
pub use container::Container;
pub use error::{CodecError, ModelError};
pub use owner::OwnerId;
pub use vault::{clamp_rows, rows_for_size, VaultModel, DEFAULT_TITLE, MAX_ROWS, MIN_ROWS, SLOTS_PER_ROW};

pub type Result<T> = std::result::Result<T, ModelError>;
