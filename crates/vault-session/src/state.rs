//! Session State Machine
//!
//! ```text
//! Idle
//!   ↓ open request
//! Open
//!   ↓ first close event (flag cleared before saving)
//! Idle
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No vault container is open for the player
    #[default]
    Idle,
    /// A vault container is open and must be captured on close
    Open,
}

impl SessionState {
    /// Whether a close event in this state should capture and save
    pub fn captures_on_close(&self) -> bool {
        matches!(self, SessionState::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Open => "open",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
