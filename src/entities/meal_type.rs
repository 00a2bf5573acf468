use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of meal a schedule detail delivers ("Regular", "Vegetarian", ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::schedule_detail::Entity")]
    ScheduleDetail,
}

impl Related<super::schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
