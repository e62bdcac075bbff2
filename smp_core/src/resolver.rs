use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    capability::{MetadataRow, ProcessGroup},
    error::SmpError,
    identifier::{DocumentIdentifier, ParticipantIdentifier},
    store::CapabilityStore,
};

/// Answers "what can this participant receive" from a [`CapabilityStore`].
/// Holds no state of its own; every call reads the store afresh.
#[derive(Clone)]
pub struct CapabilityResolver {
    store: Arc<dyn CapabilityStore>,
}

impl CapabilityResolver {
    pub fn new(store: Arc<dyn CapabilityStore>) -> Self {
        Self { store }
    }

    /// Distinct document identifiers of a registered participant, in first
    /// registered order.
    pub async fn list_documents(
        &self,
        participant: &ParticipantIdentifier,
    ) -> Result<Vec<DocumentIdentifier>, SmpError> {
        let participant_id = participant.to_string();

        if self.store.find_participant(&participant_id).await?.is_none() {
            return Err(SmpError::ParticipantNotFound { participant_id });
        }

        let rows = self.store.document_rows(&participant_id).await?;
        let row_count = rows.len();

        let mut documents: Vec<DocumentIdentifier> = Vec::with_capacity(row_count);
        for document in rows {
            if !documents.contains(&document) {
                documents.push(document);
            }
        }

        debug!(
            participant = %participant_id,
            rows = row_count,
            documents = documents.len(),
            "resolved service group"
        );
        Ok(documents)
    }

    /// Processes and endpoints a participant exposes for one document type.
    ///
    /// Fails with [`SmpError::ServiceMetadataNotFound`] unless at least one
    /// endpoint exists for the pair.
    pub async fn resolve_metadata(
        &self,
        participant: &ParticipantIdentifier,
        document: &DocumentIdentifier,
    ) -> Result<Vec<ProcessGroup>, SmpError> {
        let participant_id = participant.to_string();
        let rows = self
            .store
            .metadata_rows(&participant_id, document.scheme(), document.value())
            .await?;

        if rows.iter().all(|row| row.endpoint.is_none()) {
            return Err(SmpError::ServiceMetadataNotFound {
                participant_id,
                document_id: document.to_string(),
            });
        }

        let row_count = rows.len();
        let groups = group_by_process(rows);

        debug!(
            participant = %participant_id,
            document = %document,
            rows = row_count,
            processes = groups.len(),
            "resolved service metadata"
        );
        Ok(groups)
    }
}

/// Groups rows under their process in first-seen order. Endpoint order within
/// a process follows row order.
pub fn group_by_process(rows: Vec<MetadataRow>) -> Vec<ProcessGroup> {
    let mut groups: Vec<ProcessGroup> = Vec::new();
    let mut index = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.process.clone()).or_insert_with(|| {
            groups.push(ProcessGroup {
                process: row.process.clone(),
                endpoints: Vec::new(),
            });
            groups.len() - 1
        });

        if let Some(endpoint) = row.endpoint {
            groups[slot].endpoints.push(endpoint);
        }
    }

    groups
}
