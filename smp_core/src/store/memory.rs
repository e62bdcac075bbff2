//! In-memory capability store.
//!
//! Holds the participant tree in a `RwLock` and answers the same queries as
//! the database store. Used by tests and for embedding without SQLite.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use super::{CapabilityStore, StoreError};
use crate::{
    capability::{MetadataRow, ServiceRegistration},
    entity::managed_participant::{Model as ManagedParticipantModel, ParticipantStatus},
    identifier::{DocumentIdentifier, ParticipantIdentifier},
    ids::ParticipantRecordId,
};

#[derive(Debug)]
struct Entry {
    participant: ManagedParticipantModel,
    services: Vec<ServiceRegistration>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<Entry>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active participant with no services yet.
    pub fn insert_participant(
        &self,
        participant_id: &ParticipantIdentifier,
        name: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let participant = ManagedParticipantModel {
            id: ParticipantRecordId::new(),
            participant_id: participant_id.to_string(),
            name: name.to_owned(),
            smp_identifier: String::new(),
            status: ParticipantStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        };

        self.write()?.push(Entry {
            participant,
            services: Vec::new(),
        });
        Ok(())
    }

    /// Appends a service to a participant previously added with
    /// [`MemoryStore::insert_participant`].
    pub fn add_service(
        &self,
        participant_id: &ParticipantIdentifier,
        registration: ServiceRegistration,
    ) -> Result<(), StoreError> {
        let mut entries = self.write()?;
        let key = participant_id.to_string();
        let entry = entries
            .iter_mut()
            .find(|e| e.participant.participant_id == key)
            .ok_or(StoreError::UnknownParticipant(key))?;
        entry.services.push(registration);
        Ok(())
    }

    /// Makes every subsequent query fail, to exercise store error paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Entry>>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        self.entries.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Entry>>, StoreError> {
        self.entries.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

#[async_trait]
impl CapabilityStore for MemoryStore {
    async fn find_participant(
        &self,
        participant_id: &str,
    ) -> Result<Option<ManagedParticipantModel>, StoreError> {
        let entries = self.read()?;
        Ok(entries
            .iter()
            .find(|e| e.participant.participant_id == participant_id)
            .map(|e| e.participant.clone()))
    }

    async fn document_rows(
        &self,
        participant_id: &str,
    ) -> Result<Vec<DocumentIdentifier>, StoreError> {
        let entries = self.read()?;
        Ok(entries
            .iter()
            .filter(|e| e.participant.participant_id == participant_id)
            .flat_map(|e| e.services.iter().map(|s| s.document.clone()))
            .collect())
    }

    async fn metadata_rows(
        &self,
        participant_id: &str,
        doc_scheme: &str,
        doc_value: &str,
    ) -> Result<Vec<MetadataRow>, StoreError> {
        let entries = self.read()?;
        let mut rows = Vec::new();

        let services = entries
            .iter()
            .filter(|e| e.participant.participant_id == participant_id)
            .flat_map(|e| e.services.iter())
            .filter(|s| s.document.scheme() == doc_scheme && s.document.value() == doc_value);

        for service in services {
            for group in &service.processes {
                if group.endpoints.is_empty() {
                    rows.push(MetadataRow {
                        process: group.process.clone(),
                        endpoint: None,
                    });
                }
                for endpoint in &group.endpoints {
                    rows.push(MetadataRow {
                        process: group.process.clone(),
                        endpoint: Some(endpoint.clone()),
                    });
                }
            }
        }

        Ok(rows)
    }
}
