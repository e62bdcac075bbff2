// SeaORM entities for the participant capability tree:
// managed_participant -> service_group -> process -> endpoint

pub mod endpoint;
pub mod managed_participant;
pub mod process;
pub mod service_group;


pub mod prelude {
    pub use super::endpoint::{
        ActiveModel as EndpointActiveModel, Column as EndpointColumn, Entity as Endpoint,
        Model as EndpointModel,
    };
    pub use super::managed_participant::{
        ActiveModel as ManagedParticipantActiveModel, Column as ManagedParticipantColumn,
        Entity as ManagedParticipant, Model as ManagedParticipantModel, ParticipantStatus,
    };
    pub use super::process::{
        ActiveModel as ProcessActiveModel, Column as ProcessColumn, Entity as Process,
        Model as ProcessModel,
    };
    pub use super::service_group::{
        ActiveModel as ServiceGroupActiveModel, Column as ServiceGroupColumn,
        Entity as ServiceGroup, Model as ServiceGroupModel,
    };

    pub use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, JoinType, ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
        Set, TransactionTrait,
    };
}
