use crate::ids::{ParticipantRecordId, ServiceGroupId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One supported document type of a participant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ServiceGroupId,
    pub lookup_id: ParticipantRecordId,
    pub doc_scheme: String,
    pub doc_value: String,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::managed_participant::Entity",
        from = "Column::LookupId",
        to = "super::managed_participant::Column::Id"
    )]
    ManagedParticipant,
    #[sea_orm(has_many = "super::process::Entity")]
    Process,
}

impl Related<super::managed_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManagedParticipant.def()
    }
}

impl Related<super::process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Process.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
