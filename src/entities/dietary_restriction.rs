use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dietary_restrictions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::client_dietary_restriction::Entity")]
    ClientDietaryRestriction,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        super::client_dietary_restriction::Relation::Client.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::client_dietary_restriction::Relation::DietaryRestriction
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
