use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::entities::{meal_type, recurring_delivery_schedule, schedule_detail};
use crate::errors::ServiceError;
use crate::services::owned_collections::{
    OwnedCollectionReplacer, ReplaceOutcome, ScheduleDetailInput, ScheduleDetails,
};

/// Full desired state of a client's recurring schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule_dates"))]
pub struct RecurringScheduleInput {
    #[validate(length(min = 1, max = 50))]
    pub recurrence_pattern: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub details: Vec<ScheduleDetailInput>,
}

fn default_active() -> bool {
    true
}

fn validate_schedule_dates(input: &RecurringScheduleInput) -> Result<(), ValidationError> {
    match input.end_date {
        Some(end) if end < input.start_date => {
            let mut err = ValidationError::new("end_date");
            err.message = Some("end_date must not be before start_date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl RecurringScheduleInput {
    /// Validates the schedule and every detail line.
    pub fn validate_all(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for (index, detail) in self.details.iter().enumerate() {
            detail.validate().map_err(|e| {
                ServiceError::ValidationError(format!("details[{}]: {}", index, e))
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleWithDetails {
    pub schedule: recurring_delivery_schedule::Model,
    pub details: Vec<schedule_detail::Model>,
}

impl ScheduleWithDetails {
    pub fn deliveries_on(&self, date: NaiveDate) -> Vec<&schedule_detail::Model> {
        self.schedule.deliveries_on(&self.details, date)
    }
}

/// Fails with `NotFound` naming the first meal type id that does not exist.
pub async fn ensure_meal_types_exist<C, I>(conn: &C, ids: I) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let wanted: BTreeSet<i32> = ids.into_iter().collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let found: BTreeSet<i32> = meal_type::Entity::find()
        .select_only()
        .column(meal_type::Column::Id)
        .filter(meal_type::Column::Id.is_in(wanted.iter().copied()))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    match wanted.difference(&found).next() {
        Some(missing) => Err(ServiceError::NotFound(format!(
            "Meal type {} not found",
            missing
        ))),
        None => Ok(()),
    }
}

/// Loads the client's schedule together with its ordered details.
pub async fn load_schedule<C>(
    conn: &C,
    client_id: i32,
) -> Result<Option<ScheduleWithDetails>, ServiceError>
where
    C: ConnectionTrait,
{
    let schedule = recurring_delivery_schedule::Entity::find()
        .filter(recurring_delivery_schedule::Column::ClientId.eq(client_id))
        .one(conn)
        .await?;
    match schedule {
        Some(schedule) => {
            let details =
                OwnedCollectionReplacer::list::<ScheduleDetails, C>(conn, schedule.id).await?;
            Ok(Some(ScheduleWithDetails { schedule, details }))
        }
        None => Ok(None),
    }
}

/// Deletes the client's schedule and its detail rows. Returns the number of
/// schedules removed.
pub async fn remove_schedule<C>(conn: &C, client_id: i32) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    let schedule_ids: Vec<i32> = recurring_delivery_schedule::Entity::find()
        .select_only()
        .column(recurring_delivery_schedule::Column::Id)
        .filter(recurring_delivery_schedule::Column::ClientId.eq(client_id))
        .into_tuple()
        .all(conn)
        .await?;
    if schedule_ids.is_empty() {
        return Ok(0);
    }
    schedule_detail::Entity::delete_many()
        .filter(schedule_detail::Column::ScheduleId.is_in(schedule_ids.iter().copied()))
        .exec(conn)
        .await?;
    let removed = recurring_delivery_schedule::Entity::delete_many()
        .filter(recurring_delivery_schedule::Column::Id.is_in(schedule_ids))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(removed)
}

/// Writes the client's schedule: an existing row is updated in place, keeping
/// its id and `created_at`, and its details are replaced in input order.
pub async fn write_schedule<C>(
    conn: &C,
    client_id: i32,
    input: &RecurringScheduleInput,
    now: DateTime<Utc>,
) -> Result<(recurring_delivery_schedule::Model, ReplaceOutcome), ServiceError>
where
    C: ConnectionTrait,
{
    input.validate_all()?;
    let existing = recurring_delivery_schedule::Entity::find()
        .filter(recurring_delivery_schedule::Column::ClientId.eq(client_id))
        .one(conn)
        .await?;

    let schedule = match existing {
        Some(current) => {
            let mut schedule = current.into_active_model();
            schedule.recurrence_pattern = Set(input.recurrence_pattern.clone());
            schedule.start_date = Set(input.start_date);
            schedule.end_date = Set(input.end_date);
            schedule.is_active = Set(input.is_active);
            schedule.updated_at = Set(now);
            schedule.update(conn).await?
        }
        None => {
            recurring_delivery_schedule::ActiveModel {
                id: NotSet,
                client_id: Set(client_id),
                recurrence_pattern: Set(input.recurrence_pattern.clone()),
                start_date: Set(input.start_date),
                end_date: Set(input.end_date),
                is_active: Set(input.is_active),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?
        }
    };

    let outcome =
        OwnedCollectionReplacer::replace::<ScheduleDetails, C>(conn, schedule.id, &input.details)
            .await?;
    Ok((schedule, outcome))
}
