use async_trait::async_trait;
use sea_orm::{DatabaseConnection, FromQueryResult};

use super::{CapabilityStore, StoreError};
use crate::{
    capability::{MetadataRow, ServiceEndpoint},
    entity::{self, prelude::*},
    identifier::{DocumentIdentifier, ProcessIdentifier},
};

/// [`CapabilityStore`] over a sea-orm connection pool. Each query checks a
/// connection out of the pool and returns it when the query completes.
#[derive(Clone, Debug)]
pub struct DbStore {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct DocumentQueryRow {
    doc_scheme: String,
    doc_value: String,
}

// Endpoint columns are null when a process has no endpoints (left join)
#[derive(Debug, FromQueryResult)]
struct MetadataQueryRow {
    process_scheme: String,
    process_value: String,
    transport_profile: Option<String>,
    endpoint_reference: Option<String>,
    require_business_level_signature: Option<bool>,
    certificate_details: Option<String>,
}

impl From<MetadataQueryRow> for MetadataRow {
    fn from(row: MetadataQueryRow) -> Self {
        let endpoint = match (
            row.transport_profile,
            row.endpoint_reference,
            row.require_business_level_signature,
            row.certificate_details,
        ) {
            (Some(transport_profile), Some(endpoint_reference), Some(require), Some(certificate)) => {
                Some(ServiceEndpoint {
                    transport_profile,
                    endpoint_reference,
                    require_business_level_signature: require,
                    certificate,
                })
            }
            _ => None,
        };

        MetadataRow {
            process: ProcessIdentifier::new(row.process_scheme, row.process_value),
            endpoint,
        }
    }
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl CapabilityStore for DbStore {
    async fn find_participant(
        &self,
        participant_id: &str,
    ) -> Result<Option<ManagedParticipantModel>, StoreError> {
        let participant = ManagedParticipant::find()
            .filter(ManagedParticipantColumn::ParticipantId.eq(participant_id))
            .one(&self.db)
            .await?;

        Ok(participant)
    }

    async fn document_rows(
        &self,
        participant_id: &str,
    ) -> Result<Vec<DocumentIdentifier>, StoreError> {
        let rows = ServiceGroup::find()
            .select_only()
            .column_as(ServiceGroupColumn::DocScheme, "doc_scheme")
            .column_as(ServiceGroupColumn::DocValue, "doc_value")
            .join(
                JoinType::InnerJoin,
                entity::service_group::Relation::ManagedParticipant.def(),
            )
            .filter(ManagedParticipantColumn::ParticipantId.eq(participant_id))
            .order_by_asc(ServiceGroupColumn::Position)
            .into_model::<DocumentQueryRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DocumentIdentifier::new(row.doc_scheme, row.doc_value))
            .collect())
    }

    async fn metadata_rows(
        &self,
        participant_id: &str,
        doc_scheme: &str,
        doc_value: &str,
    ) -> Result<Vec<MetadataRow>, StoreError> {
        let rows = Process::find()
            .select_only()
            .column_as(ProcessColumn::ProcessScheme, "process_scheme")
            .column_as(ProcessColumn::ProcessValue, "process_value")
            .column_as(EndpointColumn::TransportProfile, "transport_profile")
            .column_as(EndpointColumn::EndpointReference, "endpoint_reference")
            .column_as(
                EndpointColumn::RequireBusinessLevelSignature,
                "require_business_level_signature",
            )
            .column_as(EndpointColumn::CertificateDetails, "certificate_details")
            .join(
                JoinType::LeftJoin,
                entity::process::Relation::Endpoint.def(),
            )
            .join(
                JoinType::InnerJoin,
                entity::process::Relation::ServiceGroup.def(),
            )
            .join(
                JoinType::InnerJoin,
                entity::service_group::Relation::ManagedParticipant.def(),
            )
            .filter(ManagedParticipantColumn::ParticipantId.eq(participant_id))
            .filter(ServiceGroupColumn::DocScheme.eq(doc_scheme))
            .filter(ServiceGroupColumn::DocValue.eq(doc_value))
            .order_by_asc(ProcessColumn::Position)
            .order_by_asc(EndpointColumn::Position)
            .into_model::<MetadataQueryRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(MetadataRow::from).collect())
    }
}
