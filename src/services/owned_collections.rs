//! Wholesale replacement of child rows that have no identity outside their
//! owner. Callers always hand over the complete desired list; existing rows
//! are hard-deleted and the list is re-inserted, stamped with the owner's key.

use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, NotSet, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use validator::{Validate, ValidationError};

use crate::entities::schedule_detail::DayOfWeek;
use crate::entities::{client, recurring_delivery_schedule, schedule_detail, service_authorization};
use crate::errors::ServiceError;
use crate::repositories;
use crate::services::schedules::ensure_meal_types_exist;

/// One kind of exclusively-owned collection.
#[async_trait]
pub trait OwnedCollection: Send + Sync {
    type Owner: EntityTrait;
    type Child: EntityTrait;
    type Item: Validate + Send + Sync;

    const NAME: &'static str;
    const OWNER: &'static str;

    fn owner_id_column() -> <Self::Owner as EntityTrait>::Column;
    /// Foreign key on the child pointing at the owner.
    fn owner_column() -> <Self::Child as EntityTrait>::Column;
    /// Column that restores submission order when reading back.
    fn order_column() -> <Self::Child as EntityTrait>::Column;
    fn build(
        owner_id: i32,
        position: i32,
        item: &Self::Item,
    ) -> <Self::Child as EntityTrait>::ActiveModel;

    /// Checks references the items carry beyond the owner itself.
    async fn check_references<C>(_conn: &C, _items: &[Self::Item]) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_authorization_dates"))]
pub struct ServiceAuthorizationInput {
    #[validate(length(min = 1, max = 100))]
    pub service_type: String,
    #[validate(range(min = 0))]
    pub authorized_units: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub authorization_number: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

fn validate_authorization_dates(input: &ServiceAuthorizationInput) -> Result<(), ValidationError> {
    match input.end_date {
        Some(end) if end < input.start_date => {
            let mut err = ValidationError::new("end_date");
            err.message = Some("end_date must not be before start_date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ScheduleDetailInput {
    pub day_of_week: DayOfWeek,
    pub meal_type_id: i32,
    #[validate(range(min = 1, max = 10))]
    pub quantity: i32,
}

pub struct ServiceAuthorizations;

#[async_trait]
impl OwnedCollection for ServiceAuthorizations {
    type Owner = client::Entity;
    type Child = service_authorization::Entity;
    type Item = ServiceAuthorizationInput;

    const NAME: &'static str = "service_authorizations";
    const OWNER: &'static str = "Client";

    fn owner_id_column() -> client::Column {
        client::Column::Id
    }

    fn owner_column() -> service_authorization::Column {
        service_authorization::Column::ClientId
    }

    fn order_column() -> service_authorization::Column {
        service_authorization::Column::Id
    }

    fn build(owner_id: i32, _position: i32, item: &ServiceAuthorizationInput) -> service_authorization::ActiveModel {
        service_authorization::ActiveModel {
            id: NotSet,
            client_id: Set(owner_id),
            service_type: Set(item.service_type.clone()),
            authorized_units: Set(item.authorized_units),
            start_date: Set(item.start_date),
            end_date: Set(item.end_date),
            authorization_number: Set(item.authorization_number.clone()),
            notes: Set(item.notes.clone()),
        }
    }
}

pub struct ScheduleDetails;

#[async_trait]
impl OwnedCollection for ScheduleDetails {
    type Owner = recurring_delivery_schedule::Entity;
    type Child = schedule_detail::Entity;
    type Item = ScheduleDetailInput;

    const NAME: &'static str = "schedule_details";
    const OWNER: &'static str = "Recurring delivery schedule";

    fn owner_id_column() -> recurring_delivery_schedule::Column {
        recurring_delivery_schedule::Column::Id
    }

    fn owner_column() -> schedule_detail::Column {
        schedule_detail::Column::ScheduleId
    }

    fn order_column() -> schedule_detail::Column {
        schedule_detail::Column::Position
    }

    fn build(owner_id: i32, position: i32, item: &ScheduleDetailInput) -> schedule_detail::ActiveModel {
        schedule_detail::ActiveModel {
            id: NotSet,
            schedule_id: Set(owner_id),
            position: Set(position),
            day_of_week: Set(item.day_of_week),
            meal_type_id: Set(item.meal_type_id),
            quantity: Set(item.quantity),
        }
    }

    async fn check_references<C>(conn: &C, items: &[ScheduleDetailInput]) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        ensure_meal_types_exist(conn, items.iter().map(|d| d.meal_type_id)).await
    }
}

/// Collection kinds a caller can name at runtime, with their payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnedCollectionItems {
    ServiceAuthorizations(Vec<ServiceAuthorizationInput>),
    ScheduleDetails(Vec<ScheduleDetailInput>),
}

impl OwnedCollectionItems {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceAuthorizations(_) => ServiceAuthorizations::NAME,
            Self::ScheduleDetails(_) => ScheduleDetails::NAME,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    pub removed: u64,
    pub inserted: usize,
}

pub struct OwnedCollectionReplacer;

impl OwnedCollectionReplacer {
    /// Validates `items`, then swaps the owner's rows for them.
    #[instrument(skip(conn, items), fields(collection = K::NAME, items = items.len()))]
    pub async fn replace<K, C>(
        conn: &C,
        owner_id: i32,
        items: &[K::Item],
    ) -> Result<ReplaceOutcome, ServiceError>
    where
        K: OwnedCollection,
        C: ConnectionTrait,
        <K::Child as EntityTrait>::Model: IntoActiveModel<<K::Child as EntityTrait>::ActiveModel>,
    {
        for (index, item) in items.iter().enumerate() {
            item.validate().map_err(|e| {
                ServiceError::ValidationError(format!("{}[{}]: {}", K::NAME, index, e))
            })?;
        }
        repositories::require::<K::Owner, C>(conn, K::owner_id_column(), owner_id, K::OWNER)
            .await?;
        K::check_references(conn, items).await?;

        let removed = K::Child::delete_many()
            .filter(K::owner_column().eq(owner_id))
            .exec(conn)
            .await?
            .rows_affected;

        if !items.is_empty() {
            let rows = items
                .iter()
                .enumerate()
                .map(|(position, item)| K::build(owner_id, position as i32, item));
            K::Child::insert_many(rows)
                .exec_without_returning(conn)
                .await?;
        }

        counter!("meal_delivery.owned_collections.replaced", 1, "collection" => K::NAME);
        debug!(owner_id, removed, inserted = items.len(), "Replaced owned collection");
        Ok(ReplaceOutcome {
            removed,
            inserted: items.len(),
        })
    }

    /// The owner's rows in submission order.
    pub async fn list<K, C>(
        conn: &C,
        owner_id: i32,
    ) -> Result<Vec<<K::Child as EntityTrait>::Model>, ServiceError>
    where
        K: OwnedCollection,
        C: ConnectionTrait,
    {
        Ok(K::Child::find()
            .filter(K::owner_column().eq(owner_id))
            .order_by_asc(K::order_column())
            .all(conn)
            .await?)
    }
}
