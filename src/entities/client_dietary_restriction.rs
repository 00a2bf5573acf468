use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link row; existence is the only attribute.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_dietary_restrictions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub client_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub dietary_restriction_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::dietary_restriction::Entity",
        from = "Column::DietaryRestrictionId",
        to = "super::dietary_restriction::Column::Id",
        on_delete = "Cascade"
    )]
    DietaryRestriction,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::dietary_restriction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DietaryRestriction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
