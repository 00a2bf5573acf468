use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "eligibility_criteria")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::client_eligibility_criterion::Entity")]
    ClientEligibilityCriterion,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        super::client_eligibility_criterion::Relation::Client.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::client_eligibility_criterion::Relation::EligibilityCriterion
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
