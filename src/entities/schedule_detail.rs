use chrono::Weekday;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DayOfWeek {
    #[sea_orm(string_value = "Monday")]
    Monday,
    #[sea_orm(string_value = "Tuesday")]
    Tuesday,
    #[sea_orm(string_value = "Wednesday")]
    Wednesday,
    #[sea_orm(string_value = "Thursday")]
    Thursday,
    #[sea_orm(string_value = "Friday")]
    Friday,
    #[sea_orm(string_value = "Saturday")]
    Saturday,
    #[sea_orm(string_value = "Sunday")]
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// One (weekday, meal type, quantity) line of a recurring schedule.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub schedule_id: i32,
    /// Zero-based order within the schedule as submitted.
    pub position: i32,
    pub day_of_week: DayOfWeek,
    pub meal_type_id: i32,
    /// 1..=10, also enforced by a CHECK constraint.
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recurring_delivery_schedule::Entity",
        from = "Column::ScheduleId",
        to = "super::recurring_delivery_schedule::Column::Id",
        on_delete = "Cascade"
    )]
    RecurringDeliverySchedule,
    #[sea_orm(
        belongs_to = "super::meal_type::Entity",
        from = "Column::MealTypeId",
        to = "super::meal_type::Column::Id"
    )]
    MealType,
}

impl Related<super::recurring_delivery_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringDeliverySchedule.def()
    }
}

impl Related<super::meal_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MealType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn weekday_mapping_covers_the_week() {
        assert_eq!(DayOfWeek::from(Weekday::Mon), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
        assert_eq!(DayOfWeek::from_str("Wednesday").unwrap(), DayOfWeek::Wednesday);
        assert_eq!(DayOfWeek::Friday.to_string(), "Friday");
    }
}
