use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::schedule_detail::{self, DayOfWeek};

/// A client's standing delivery order; at most one per client.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_delivery_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub client_id: i32,
    /// Free-form tag such as "Weekly" or "Biweekly".
    pub recurrence_pattern: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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
    #[sea_orm(has_many = "super::schedule_detail::Entity")]
    ScheduleDetail,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::schedule_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduleDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True when `date` falls inside the schedule's active date range.
    pub fn is_in_effect(&self, date: NaiveDate) -> bool {
        self.is_active
            && date >= self.start_date
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Detail rows due on `date`, in schedule order.
    pub fn deliveries_on<'a>(
        &self,
        details: &'a [schedule_detail::Model],
        date: NaiveDate,
    ) -> Vec<&'a schedule_detail::Model> {
        if !self.is_in_effect(date) {
            return Vec::new();
        }
        let day = DayOfWeek::from(date.weekday());
        let mut due: Vec<_> = details
            .iter()
            .filter(|d| d.schedule_id == self.id && d.day_of_week == day)
            .collect();
        due.sort_by_key(|d| d.position);
        due
    }
}
