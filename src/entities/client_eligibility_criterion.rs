use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_eligibility_criteria")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub client_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub eligibility_criterion_id: i32,
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
        belongs_to = "super::eligibility_criterion::Entity",
        from = "Column::EligibilityCriterionId",
        to = "super::eligibility_criterion::Column::Id",
        on_delete = "Cascade"
    )]
    EligibilityCriterion,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::eligibility_criterion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EligibilityCriterion.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
