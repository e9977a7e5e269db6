//! Vault Session Tracking
//!
//! A session runs from a vault being opened until its first close event:
//! - Each player is either Idle or Open
//! - Only the first close of an Open session leads to a save
//! - Closes observed while Idle are ignored

mod state;
mod tracker;

pub use state::SessionState;
pub use tracker::{OpenSession, SessionTracker};
