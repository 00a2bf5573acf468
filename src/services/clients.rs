use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use crate::clock::Clock;
use crate::db::DbPool;
use crate::entities::{
    client, client_dietary_restriction, client_eligibility_criterion, route,
    service_authorization,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories;
use crate::services::associations::{
    AssociationReconciler, ClientAssociation, DietaryRestrictions, EligibilityCriteria,
    ReconcileOutcome,
};
use crate::services::owned_collections::{
    OwnedCollection, OwnedCollectionItems, OwnedCollectionReplacer, ReplaceOutcome,
    ScheduleDetails, ServiceAuthorizationInput, ServiceAuthorizations,
};
use crate::services::schedules::{self, RecurringScheduleInput, ScheduleWithDetails};

/// Complete desired state of a client: scalar fields, association targets,
/// and the exclusively-owned collections.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub route_id: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub dietary_restriction_ids: Vec<i32>,
    #[serde(default)]
    pub eligibility_criterion_ids: Vec<i32>,
    #[serde(default)]
    pub service_authorizations: Vec<ServiceAuthorizationInput>,
    pub recurring_schedule: Option<RecurringScheduleInput>,
}

fn default_active() -> bool {
    true
}

impl ClientInput {
    /// Validates the client and everything nested in it.
    pub fn validate_all(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for (index, authorization) in self.service_authorizations.iter().enumerate() {
            authorization.validate().map_err(|e| {
                ServiceError::ValidationError(format!("service_authorizations[{}]: {}", index, e))
            })?;
        }
        if let Some(schedule) = &self.recurring_schedule {
            schedule.validate_all()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientProfile {
    pub client: client::Model,
    pub dietary_restriction_ids: Vec<i32>,
    pub eligibility_criterion_ids: Vec<i32>,
    pub service_authorizations: Vec<service_authorization::Model>,
    pub schedule: Option<ScheduleWithDetails>,
}

/// What one client write changed, for event publishing.
#[derive(Debug, Default)]
struct ClientWriteOutcome {
    dietary_restrictions: ReconcileOutcome,
    eligibility_criteria: ReconcileOutcome,
    service_authorizations: ReplaceOutcome,
    schedule_details: Option<(i32, ReplaceOutcome)>,
}

/// Service for the client aggregate
#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    clock: Arc<dyn Clock>,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, clock: Arc<dyn Clock>) -> Self {
        Self {
            db_pool,
            event_sender,
            clock,
        }
    }

    #[instrument(skip(self, input), fields(last_name = %input.last_name))]
    pub async fn create_client(&self, input: ClientInput) -> Result<ClientProfile, ServiceError> {
        input.validate_all()?;
        let now = self.clock.now();

        let txn = self.db_pool.begin().await?;
        Self::check_route(&txn, input.route_id).await?;
        let created = client::ActiveModel {
            id: NotSet,
            first_name: Set(input.first_name.clone()),
            last_name: Set(input.last_name.clone()),
            address: Set(input.address.clone()),
            phone: Set(input.phone.clone()),
            route_id: Set(input.route_id),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        let outcome = Self::write_owned_state(&txn, created.id, &input, now).await?;
        txn.commit().await?;

        info!(client_id = created.id, "Client created");
        self.event_sender
            .send_or_log(Event::ClientCreated(created.id))
            .await;
        self.publish_outcome(created.id, outcome).await;
        self.get_client_profile(created.id).await
    }

    /// Rewrites the client to match `input`. Associations are reconciled
    /// incrementally; authorizations and the schedule are replaced. All of it
    /// commits together or not at all.
    #[instrument(skip(self, input))]
    pub async fn update_client(
        &self,
        client_id: i32,
        input: ClientInput,
    ) -> Result<ClientProfile, ServiceError> {
        input.validate_all()?;
        let now = self.clock.now();

        let txn = self.db_pool.begin().await?;
        let existing =
            repositories::find_required::<client::Entity, _>(&txn, client_id, "Client").await?;
        Self::check_route(&txn, input.route_id).await?;

        let mut active: client::ActiveModel = existing.into();
        active.first_name = Set(input.first_name.clone());
        active.last_name = Set(input.last_name.clone());
        active.address = Set(input.address.clone());
        active.phone = Set(input.phone.clone());
        active.route_id = Set(input.route_id);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        let outcome = Self::write_owned_state(&txn, client_id, &input, now).await?;
        txn.commit().await?;

        info!(client_id, "Client updated");
        self.event_sender
            .send_or_log(Event::ClientUpdated(client_id))
            .await;
        self.publish_outcome(client_id, outcome).await;
        self.get_client_profile(client_id).await
    }

    /// Removes the client with its links, authorizations and schedule.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, client_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        repositories::require::<client::Entity, _>(&txn, client::Column::Id, client_id, "Client")
            .await?;

        client_dietary_restriction::Entity::delete_many()
            .filter(client_dietary_restriction::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await?;
        client_eligibility_criterion::Entity::delete_many()
            .filter(client_eligibility_criterion::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await?;
        service_authorization::Entity::delete_many()
            .filter(service_authorization::Column::ClientId.eq(client_id))
            .exec(&txn)
            .await?;
        schedules::remove_schedule(&txn, client_id).await?;
        client::Entity::delete_by_id(client_id).exec(&txn).await?;
        txn.commit().await?;

        info!(client_id, "Client deleted");
        self.event_sender
            .send_or_log(Event::ClientDeleted(client_id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_client_profile(&self, client_id: i32) -> Result<ClientProfile, ServiceError> {
        let db = &*self.db_pool;
        let client =
            repositories::find_required::<client::Entity, _>(db, client_id, "Client").await?;

        Ok(ClientProfile {
            client,
            dietary_restriction_ids: AssociationReconciler::current_ids::<DietaryRestrictions, _>(
                db, client_id,
            )
            .await?
            .into_iter()
            .collect(),
            eligibility_criterion_ids: AssociationReconciler::current_ids::<EligibilityCriteria, _>(
                db, client_id,
            )
            .await?
            .into_iter()
            .collect(),
            service_authorizations: OwnedCollectionReplacer::list::<ServiceAuthorizations, _>(
                db, client_id,
            )
            .await?,
            schedule: schedules::load_schedule(db, client_id).await?,
        })
    }

    /// Reconciles one association kind of a client to `desired`.
    #[instrument(skip(self, desired))]
    pub async fn reconcile_associations(
        &self,
        client_id: i32,
        kind: ClientAssociation,
        desired: Vec<i32>,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let txn = self.db_pool.begin().await?;
        repositories::require::<client::Entity, _>(&txn, client::Column::Id, client_id, "Client")
            .await?;
        let outcome = match kind {
            ClientAssociation::DietaryRestrictions => {
                AssociationReconciler::reconcile::<DietaryRestrictions, _>(&txn, client_id, &desired)
                    .await?
            }
            ClientAssociation::EligibilityCriteria => {
                AssociationReconciler::reconcile::<EligibilityCriteria, _>(&txn, client_id, &desired)
                    .await?
            }
        };
        txn.commit().await?;

        self.publish_reconciled(client_id, &kind.to_string(), &outcome)
            .await;
        Ok(outcome)
    }

    /// Replaces one exclusively-owned collection. `owner_id` is the client for
    /// authorizations and the schedule for schedule details.
    #[instrument(skip(self, items), fields(collection = items.name()))]
    pub async fn replace_owned_collection(
        &self,
        owner_id: i32,
        items: OwnedCollectionItems,
    ) -> Result<ReplaceOutcome, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let outcome = match &items {
            OwnedCollectionItems::ServiceAuthorizations(list) => {
                OwnedCollectionReplacer::replace::<ServiceAuthorizations, _>(&txn, owner_id, list)
                    .await?
            }
            OwnedCollectionItems::ScheduleDetails(list) => {
                OwnedCollectionReplacer::replace::<ScheduleDetails, _>(&txn, owner_id, list).await?
            }
        };
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OwnedCollectionReplaced {
                owner_id,
                collection: items.name().to_string(),
                removed: outcome.removed,
                inserted: outcome.inserted,
            })
            .await;
        Ok(outcome)
    }

    async fn check_route<C: ConnectionTrait>(
        conn: &C,
        route_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        match route_id {
            Some(id) => {
                repositories::require::<route::Entity, _>(conn, route::Column::Id, id, "Route").await
            }
            None => Ok(()),
        }
    }

    async fn write_owned_state<C: ConnectionTrait>(
        conn: &C,
        client_id: i32,
        input: &ClientInput,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<ClientWriteOutcome, ServiceError> {
        let dietary_restrictions = AssociationReconciler::reconcile::<DietaryRestrictions, C>(
            conn,
            client_id,
            &input.dietary_restriction_ids,
        )
        .await?;
        let eligibility_criteria = AssociationReconciler::reconcile::<EligibilityCriteria, C>(
            conn,
            client_id,
            &input.eligibility_criterion_ids,
        )
        .await?;
        let service_authorizations = OwnedCollectionReplacer::replace::<ServiceAuthorizations, C>(
            conn,
            client_id,
            &input.service_authorizations,
        )
        .await?;
        let schedule_details = match &input.recurring_schedule {
            Some(schedule) => {
                let (written, outcome) =
                    schedules::write_schedule(conn, client_id, schedule, now).await?;
                Some((written.id, outcome))
            }
            None => {
                schedules::remove_schedule(conn, client_id).await?;
                None
            }
        };

        Ok(ClientWriteOutcome {
            dietary_restrictions,
            eligibility_criteria,
            service_authorizations,
            schedule_details,
        })
    }

    async fn publish_reconciled(&self, client_id: i32, association: &str, outcome: &ReconcileOutcome) {
        if !outcome.changed() {
            return;
        }
        self.event_sender
            .send_or_log(Event::AssociationsReconciled {
                client_id,
                association: association.to_string(),
                added: outcome.added.clone(),
                removed: outcome.removed.clone(),
            })
            .await;
    }

    async fn publish_outcome(&self, client_id: i32, outcome: ClientWriteOutcome) {
        self.publish_reconciled(
            client_id,
            &ClientAssociation::DietaryRestrictions.to_string(),
            &outcome.dietary_restrictions,
        )
        .await;
        self.publish_reconciled(
            client_id,
            &ClientAssociation::EligibilityCriteria.to_string(),
            &outcome.eligibility_criteria,
        )
        .await;
        self.event_sender
            .send_or_log(Event::OwnedCollectionReplaced {
                owner_id: client_id,
                collection: ServiceAuthorizations::NAME.to_string(),
                removed: outcome.service_authorizations.removed,
                inserted: outcome.service_authorizations.inserted,
            })
            .await;
        if let Some((schedule_id, details)) = outcome.schedule_details {
            self.event_sender
                .send_or_log(Event::OwnedCollectionReplaced {
                    owner_id: schedule_id,
                    collection: ScheduleDetails::NAME.to_string(),
                    removed: details.removed,
                    inserted: details.inserted,
                })
                .await;
        }
    }
}
