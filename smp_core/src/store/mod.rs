//! Read side of the participant capability tree.
//!
//! The resolver only ever talks to a [`CapabilityStore`], so the sea-orm
//! backed [`DbStore`] can be swapped for the in-memory [`MemoryStore`] in
//! tests or embedded setups.

pub mod db;
pub mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::{
    capability::MetadataRow, entity::managed_participant::Model as ManagedParticipantModel,
    identifier::DocumentIdentifier,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("participant {0} is not registered")]
    UnknownParticipant(String),
}

impl From<DbErr> for StoreError {
    fn from(error: DbErr) -> Self {
        match error {
            DbErr::ConnectionAcquire(e) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Parameterized lookups the resolver needs. Implementations must be safe to
/// share between concurrent requests.
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Exact match on the canonical `scheme::value` participant identifier.
    async fn find_participant(
        &self,
        participant_id: &str,
    ) -> Result<Option<ManagedParticipantModel>, StoreError>;

    /// Document identifiers linked to the participant, in registration
    /// order. May contain duplicates.
    async fn document_rows(&self, participant_id: &str)
        -> Result<Vec<DocumentIdentifier>, StoreError>;

    /// One row per (process, endpoint) for the participant's document,
    /// ordered by process position then endpoint position.
    async fn metadata_rows(
        &self,
        participant_id: &str,
        doc_scheme: &str,
        doc_value: &str,
    ) -> Result<Vec<MetadataRow>, StoreError>;
}
