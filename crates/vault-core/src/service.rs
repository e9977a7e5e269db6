//! Vault Service
//!
//! Entry points for the UI / command layer:
//! - `open` loads the vault, builds the live container and marks the session Open
//! - `on_close` saves only for the first close of an Open session
//! - `clear` wipes a player's vault for administrative use

use serde::{Deserialize, Serialize};

use vault_model::{clamp_rows, Container, ItemCodec, OwnerId};
use vault_session::{SessionState, SessionTracker};

use crate::config::Config;
use crate::repository::{VaultRepository, DEFAULT_PAGE};
use crate::Result;

/// Caller overrides for one open request, e.g. from a "set rows" command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub rows: Option<u8>,
    pub title: Option<String>,
}

impl OpenRequest {
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// What a container-close event led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The player had no open vault session; nothing was saved
    NotTracked,
    Saved { slots: usize },
    Failed,
}

impl CloseOutcome {
    /// Message for the acting player, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            CloseOutcome::NotTracked => None,
            CloseOutcome::Saved { .. } => Some("Vault saved."),
            CloseOutcome::Failed => Some("Vault could not be saved. Please contact an admin."),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, CloseOutcome::Saved { .. })
    }
}

/// A freshly opened vault, ready to be rendered
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedVault<I> {
    pub container: Container<I>,
}

impl<I> OpenedVault<I> {
    /// Message for the acting player
    pub fn message(&self) -> String {
        format!("Vault opened ({} slots).", self.container.size())
    }

    pub fn into_container(self) -> Container<I> {
        self.container
    }
}

pub struct VaultService<C> {
    repository: VaultRepository<C>,
    sessions: SessionTracker,
    default_rows: u8,
    default_title: String,
}

impl<C: ItemCodec> VaultService<C>
where
    C::Item: Clone,
{
    pub fn new(repository: VaultRepository<C>, config: &Config) -> Self {
        Self {
            repository,
            sessions: SessionTracker::new(),
            default_rows: clamp_rows(i64::from(config.default_rows)),
            default_title: config.default_title.clone(),
        }
    }

    /// Open the configured backend and make sure the schema exists.
    ///
    /// A schema failure is logged and the service still starts; operations
    /// against missing tables then fail individually.
    pub fn start(config: &Config, codec: C) -> Result<Self> {
        let db = config.open_database()?;
        let repository = VaultRepository::new(db, codec);

        if let Err(e) = repository.ensure_schema() {
            tracing::error!(error = %e, "Continuing without a verified vault schema");
        }

        tracing::info!(
            backend = %repository.database().backend(),
            default_rows = config.default_rows,
            default_title = %config.default_title,
            "Vault service started"
        );

        Ok(Self::new(repository, config))
    }

    pub fn repository(&self) -> &VaultRepository<C> {
        &self.repository
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Load the player's vault into a fresh container and mark the session Open
    pub fn open(&self, owner_id: OwnerId, request: OpenRequest) -> OpenedVault<C::Item> {
        let rows = request
            .rows
            .map(|rows| clamp_rows(i64::from(rows)))
            .unwrap_or(self.default_rows);
        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.default_title.clone());

        let model = self.repository.load(owner_id, rows, &title);
        let container = Container::for_vault(&model);
        self.sessions.mark_open(owner_id);

        tracing::debug!(
            owner_id = %owner_id,
            slots = container.size(),
            items = model.item_count(),
            "Opened vault"
        );
        OpenedVault { container }
    }

    /// Handle a container-close event for `owner_id`.
    ///
    /// Only the first close of an Open session is captured; the session is
    /// back to Idle before anything is written.
    pub fn on_close(&self, owner_id: OwnerId, container: &Container<C::Item>) -> CloseOutcome {
        if self.sessions.take_open(&owner_id).is_none() {
            return CloseOutcome::NotTracked;
        }

        let model = container.capture(owner_id, DEFAULT_PAGE);
        match self.repository.try_save(&model, container) {
            Ok(slots) => {
                tracing::info!(
                    owner_id = %owner_id,
                    slots = container.size(),
                    stored = slots,
                    "Persisted vault"
                );
                CloseOutcome::Saved { slots }
            }
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Failed to persist vault");
                CloseOutcome::Failed
            }
        }
    }

    pub fn clear(&self, owner_id: OwnerId) -> bool {
        self.repository.clear(owner_id)
    }

    pub fn session_state(&self, owner_id: &OwnerId) -> SessionState {
        self.sessions.state(owner_id)
    }

    /// Drop an open session without saving, e.g. when the player disconnects
    pub fn forget(&self, owner_id: &OwnerId) -> bool {
        self.sessions.forget(owner_id)
    }
}
