use crate::ids::ParticipantRecordId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

// participant_id holds the canonical `scheme::value` form
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "managed_participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ParticipantRecordId,
    #[sea_orm(unique)]
    pub participant_id: String,
    pub name: String,
    pub smp_identifier: String,
    pub status: ParticipantStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::service_group::Entity")]
    ServiceGroup,
}

impl Related<super::service_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
