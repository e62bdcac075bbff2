use chrono::{SecondsFormat, Utc};
use sea_orm::{DatabaseConnection, PaginatorTrait, TransactionTrait};
use thiserror::Error;
use tracing::info;
use zel_core::prelude::*;

use crate::{
    capability::{ProcessGroup, ServiceRegistration},
    entity::prelude::*,
    identifier::ParticipantIdentifier,
    ids::{EndpointId, ParticipantRecordId, ProcessId, ServiceGroupId},
};

#[derive(Debug, Error)]
pub enum ParticipantsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("invalid participant identifier: {0}")]
    InvalidIdentifier(String),

    #[error("participant not found")]
    ParticipantNotFound,

    #[error("participant {0} already exists")]
    ParticipantAlreadyExists(String),

    #[error("document {0} already registered for this participant")]
    DocumentAlreadyRegistered(String),
}

impl From<ParticipantsServiceError> for ResourceError {
    fn from(error: ParticipantsServiceError) -> Self {
        match error {
            ParticipantsServiceError::DbError(error) => ResourceError::infra(error),
            ParticipantsServiceError::InvalidIdentifier(_)
            | ParticipantsServiceError::ParticipantNotFound
            | ParticipantsServiceError::ParticipantAlreadyExists(_)
            | ParticipantsServiceError::DocumentAlreadyRegistered(_) => ResourceError::app(error),
        }
    }
}

// Fixed width so lexical order matches chronological order
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Administrative write path for the participant capability tree.
#[derive(Clone)]
pub struct ParticipantsService {
    db: DatabaseConnection,
}

impl ParticipantsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new managed participant
    pub async fn _create_participant(
        &self,
        participant_id: String,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ParticipantsServiceError> {
        let participant = ParticipantIdentifier::parse(&participant_id)
            .map_err(|_| ParticipantsServiceError::InvalidIdentifier(participant_id.clone()))?;
        let canonical = participant.to_string();

        let exists = ManagedParticipant::find()
            .filter(ManagedParticipantColumn::ParticipantId.eq(canonical.as_str()))
            .one(&self.db)
            .await?
            .is_some();

        if exists {
            return Err(ParticipantsServiceError::ParticipantAlreadyExists(canonical));
        }

        let now = timestamp();
        let model = ManagedParticipantActiveModel {
            id: Set(ParticipantRecordId::new()),
            participant_id: Set(canonical),
            name: Set(name),
            smp_identifier: Set(smp_identifier),
            status: Set(status),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let created = ManagedParticipant::insert(model)
            .exec_with_returning(&self.db)
            .await?;

        info!(participant = %created.participant_id, "participant created");
        Ok(created)
    }

    /// List participants, most recently updated first
    pub async fn _list_participants(
        &self,
    ) -> Result<Vec<ManagedParticipantModel>, ParticipantsServiceError> {
        let participants = ManagedParticipant::find()
            .order_by_desc(ManagedParticipantColumn::UpdatedAt)
            .order_by_desc(ManagedParticipantColumn::Id)
            .all(&self.db)
            .await?;

        Ok(participants)
    }

    pub async fn _get_participant(
        &self,
        id: ParticipantRecordId,
    ) -> Result<ManagedParticipantModel, ParticipantsServiceError> {
        ManagedParticipant::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ParticipantsServiceError::ParticipantNotFound)
    }

    /// Update the descriptive fields of a participant. The participant
    /// identifier itself is immutable.
    pub async fn _update_participant(
        &self,
        id: ParticipantRecordId,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ParticipantsServiceError> {
        let existing = self._get_participant(id).await?;

        let mut model: ManagedParticipantActiveModel = existing.into();
        model.name = Set(name);
        model.smp_identifier = Set(smp_identifier);
        model.status = Set(status);
        model.updated_at = Set(timestamp());

        let updated = model.update(&self.db).await?;

        info!(participant = %updated.participant_id, "participant updated");
        Ok(updated)
    }

    /// Delete a participant and everything registered under it
    pub async fn _delete_participant(
        &self,
        id: ParticipantRecordId,
    ) -> Result<(), ParticipantsServiceError> {
        let existing = self._get_participant(id).await?;

        // Cascades through service_group, process and endpoint via FK constraints
        ManagedParticipant::delete_by_id(id).exec(&self.db).await?;

        info!(participant = %existing.participant_id, "participant deleted");
        Ok(())
    }

    /// Register one document type with its processes and endpoints.
    /// Positions follow input order.
    pub async fn _register_service(
        &self,
        participant_id: String,
        registration: ServiceRegistration,
    ) -> Result<ServiceGroupModel, ParticipantsServiceError> {
        let participant = ParticipantIdentifier::parse(&participant_id)
            .map_err(|_| ParticipantsServiceError::InvalidIdentifier(participant_id.clone()))?;

        let owner = ManagedParticipant::find()
            .filter(ManagedParticipantColumn::ParticipantId.eq(participant.to_string()))
            .one(&self.db)
            .await?
            .ok_or(ParticipantsServiceError::ParticipantNotFound)?;

        let document = &registration.document;
        let txn = self.db.begin().await?;

        let already_registered = ServiceGroup::find()
            .filter(ServiceGroupColumn::LookupId.eq(owner.id))
            .filter(ServiceGroupColumn::DocScheme.eq(document.scheme()))
            .filter(ServiceGroupColumn::DocValue.eq(document.value()))
            .one(&txn)
            .await?
            .is_some();

        if already_registered {
            return Err(ParticipantsServiceError::DocumentAlreadyRegistered(
                document.to_string(),
            ));
        }

        let position = ServiceGroup::find()
            .filter(ServiceGroupColumn::LookupId.eq(owner.id))
            .count(&txn)
            .await?;

        let group = ServiceGroupActiveModel {
            id: Set(ServiceGroupId::new()),
            lookup_id: Set(owner.id),
            doc_scheme: Set(document.scheme().to_owned()),
            doc_value: Set(document.value().to_owned()),
            position: Set(position as i32),
        };
        let group = ServiceGroup::insert(group).exec_with_returning(&txn).await?;

        for (process_position, ProcessGroup { process, endpoints }) in
            registration.processes.iter().enumerate()
        {
            let process_id = ProcessId::new();
            let process_model = ProcessActiveModel {
                id: Set(process_id),
                service_group_id: Set(group.id),
                process_scheme: Set(process.scheme().to_owned()),
                process_value: Set(process.value().to_owned()),
                position: Set(process_position as i32),
            };
            Process::insert(process_model).exec(&txn).await?;

            for (endpoint_position, endpoint) in endpoints.iter().enumerate() {
                let endpoint_model = EndpointActiveModel {
                    id: Set(EndpointId::new()),
                    process_id: Set(process_id),
                    transport_profile: Set(endpoint.transport_profile.clone()),
                    endpoint_reference: Set(endpoint.endpoint_reference.clone()),
                    require_business_level_signature: Set(
                        endpoint.require_business_level_signature
                    ),
                    certificate_details: Set(endpoint.certificate.clone()),
                    position: Set(endpoint_position as i32),
                };
                Endpoint::insert(endpoint_model).exec(&txn).await?;
            }
        }

        txn.commit().await?;

        info!(
            participant = %owner.participant_id,
            document = %document,
            processes = registration.processes.len(),
            "service registered"
        );
        Ok(group)
    }
}

#[zel_service(name = "participants")]
trait Participants {
    #[doc = "Register a new managed participant"]
    #[method(name = "create_participant")]
    async fn create_participant(
        &self,
        participant_id: String,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ResourceError>;

    #[doc = "List participants, most recently updated first"]
    #[method(name = "list_participants")]
    async fn list_participants(&self) -> Result<Vec<ManagedParticipantModel>, ResourceError>;

    #[doc = "Get a participant by record ID"]
    #[method(name = "get_participant")]
    async fn get_participant(
        &self,
        id: ParticipantRecordId,
    ) -> Result<ManagedParticipantModel, ResourceError>;

    #[doc = "Update a participant's name, SMP identifier and status"]
    #[method(name = "update_participant")]
    async fn update_participant(
        &self,
        id: ParticipantRecordId,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ResourceError>;

    #[doc = "Delete a participant and its registered services"]
    #[method(name = "delete_participant")]
    async fn delete_participant(&self, id: ParticipantRecordId) -> Result<(), ResourceError>;

    #[doc = "Register a document type with its processes and endpoints"]
    #[method(name = "register_service")]
    async fn register_service(
        &self,
        participant_id: String,
        registration: ServiceRegistration,
    ) -> Result<ServiceGroupModel, ResourceError>;
}

#[async_trait]
impl ParticipantsServer for ParticipantsService {
    async fn create_participant(
        &self,
        _ctx: RequestContext,
        participant_id: String,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ResourceError> {
        Ok(self
            ._create_participant(participant_id, name, smp_identifier, status)
            .await?)
    }

    async fn list_participants(
        &self,
        _ctx: RequestContext,
    ) -> Result<Vec<ManagedParticipantModel>, ResourceError> {
        Ok(self._list_participants().await?)
    }

    async fn get_participant(
        &self,
        _ctx: RequestContext,
        id: ParticipantRecordId,
    ) -> Result<ManagedParticipantModel, ResourceError> {
        Ok(self._get_participant(id).await?)
    }

    async fn update_participant(
        &self,
        _ctx: RequestContext,
        id: ParticipantRecordId,
        name: String,
        smp_identifier: String,
        status: ParticipantStatus,
    ) -> Result<ManagedParticipantModel, ResourceError> {
        Ok(self
            ._update_participant(id, name, smp_identifier, status)
            .await?)
    }

    async fn delete_participant(
        &self,
        _ctx: RequestContext,
        id: ParticipantRecordId,
    ) -> Result<(), ResourceError> {
        Ok(self._delete_participant(id).await?)
    }

    async fn register_service(
        &self,
        _ctx: RequestContext,
        participant_id: String,
        registration: ServiceRegistration,
    ) -> Result<ServiceGroupModel, ResourceError> {
        Ok(self._register_service(participant_id, registration).await?)
    }
}
