use crate::ids::{ProcessId, ServiceGroupId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "process")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ProcessId,
    pub service_group_id: ServiceGroupId,
    pub process_scheme: String,
    pub process_value: String,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_group::Entity",
        from = "Column::ServiceGroupId",
        to = "super::service_group::Column::Id"
    )]
    ServiceGroup,
    #[sea_orm(has_many = "super::endpoint::Entity")]
    Endpoint,
}

impl Related<super::service_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceGroup.def()
    }
}

impl Related<super::endpoint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Endpoint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
