use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: Option<String>,
    /// Optional reference; clients can exist before they are placed on a route.
    pub route_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id"
    )]
    Route,
    #[sea_orm(has_many = "super::client_dietary_restriction::Entity")]
    ClientDietaryRestriction,
    #[sea_orm(has_many = "super::client_eligibility_criterion::Entity")]
    ClientEligibilityCriterion,
    #[sea_orm(has_many = "super::service_authorization::Entity")]
    ServiceAuthorization,
    #[sea_orm(has_many = "super::recurring_delivery_schedule::Entity")]
    RecurringDeliverySchedule,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::service_authorization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceAuthorization.def()
    }
}

impl Related<super::recurring_delivery_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringDeliverySchedule.def()
    }
}

impl Related<super::dietary_restriction::Entity> for Entity {
    fn to() -> RelationDef {
        super::client_dietary_restriction::Relation::DietaryRestriction.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::client_dietary_restriction::Relation::Client.def().rev())
    }
}

impl Related<super::eligibility_criterion::Entity> for Entity {
    fn to() -> RelationDef {
        super::client_eligibility_criterion::Relation::EligibilityCriterion.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::client_eligibility_criterion::Relation::Client.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
