use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::{Validate, ValidationError};

use crate::clock::Clock;
use crate::db::DbPool;
use crate::entities::volunteer_assignment::{self, AssignmentStatus};
use crate::entities::{route, volunteer};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAssignmentCommand {
    pub volunteer_id: i32,
    pub route_id: i32,
    pub scheduled_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 50), custom = "validate_shift_type")]
    pub shift_type: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn validate_shift_type(shift_type: &str) -> Result<(), ValidationError> {
    if shift_type.trim().is_empty() {
        let mut err = ValidationError::new("shift_type");
        err.message = Some("shift_type must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Double-booking check: a volunteer holds at most one non-cancelled
/// assignment per calendar day and shift type. Shift types are compared
/// literally; different shifts on the same day never collide.
pub struct AssignmentConflictGuard;

impl AssignmentConflictGuard {
    pub async fn check<C>(
        conn: &C,
        volunteer_id: i32,
        day: NaiveDate,
        shift_type: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut query = volunteer_assignment::Entity::find()
            .select_only()
            .column(volunteer_assignment::Column::Id)
            .filter(volunteer_assignment::Column::VolunteerId.eq(volunteer_id))
            .filter(volunteer_assignment::Column::ScheduledDay.eq(day))
            .filter(volunteer_assignment::Column::ShiftType.eq(shift_type))
            .filter(volunteer_assignment::Column::Status.ne(AssignmentStatus::Cancelled));
        if let Some(id) = exclude_id {
            query = query.filter(volunteer_assignment::Column::Id.ne(id));
        }

        let existing: Option<i32> = query.into_tuple().one(conn).await?;
        match existing {
            Some(existing_id) => {
                counter!("meal_delivery.assignments.conflicts", 1);
                warn!(
                    volunteer_id,
                    %day,
                    shift_type,
                    existing_id,
                    "Rejected double booking"
                );
                Err(Self::conflict(volunteer_id, day, shift_type))
            }
            None => Ok(()),
        }
    }

    fn conflict(volunteer_id: i32, day: NaiveDate, shift_type: &str) -> ServiceError {
        ServiceError::Conflict(format!(
            "Volunteer {} is already assigned to the {} shift on {}",
            volunteer_id, shift_type, day
        ))
    }
}

/// Service for scheduling volunteers onto routes
#[derive(Clone)]
pub struct AssignmentService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    clock: Arc<dyn Clock>,
}

impl AssignmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, clock: Arc<dyn Clock>) -> Self {
        Self {
            db_pool,
            event_sender,
            clock,
        }
    }

    /// Creates a `Scheduled` assignment unless the volunteer is already booked
    /// for that day and shift.
    #[instrument(skip(self))]
    pub async fn create_assignment(
        &self,
        command: CreateAssignmentCommand,
    ) -> Result<volunteer_assignment::Model, ServiceError> {
        command.validate()?;
        let shift_type = command.shift_type.trim().to_string();
        let day = command.scheduled_date.date_naive();
        let now = self.clock.now();

        let txn = self.db_pool.begin().await?;
        repositories::require::<volunteer::Entity, _>(
            &txn,
            volunteer::Column::Id,
            command.volunteer_id,
            "Volunteer",
        )
        .await?;
        repositories::require::<route::Entity, _>(&txn, route::Column::Id, command.route_id, "Route")
            .await?;
        AssignmentConflictGuard::check(&txn, command.volunteer_id, day, &shift_type, None).await?;

        let assignment = volunteer_assignment::ActiveModel {
            id: NotSet,
            volunteer_id: Set(command.volunteer_id),
            route_id: Set(command.route_id),
            scheduled_date: Set(command.scheduled_date),
            scheduled_day: Set(day),
            shift_type: Set(shift_type.clone()),
            status: Set(AssignmentStatus::Scheduled),
            notes: Set(command.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            ServiceError::from_unique_violation(
                e,
                format!(
                    "Volunteer {} is already assigned to the {} shift on {}",
                    command.volunteer_id, shift_type, day
                ),
            )
        })?;
        txn.commit().await?;

        counter!("meal_delivery.assignments.created", 1);
        info!(
            assignment_id = assignment.id,
            volunteer_id = assignment.volunteer_id,
            route_id = assignment.route_id,
            "Assignment created"
        );
        self.event_sender
            .send_or_log(Event::AssignmentCreated {
                assignment_id: assignment.id,
                volunteer_id: assignment.volunteer_id,
                route_id: assignment.route_id,
                scheduled_date: assignment.scheduled_date,
                shift_type: assignment.shift_type.clone(),
            })
            .await;

        Ok(assignment)
    }

    /// Changes status and, when given, notes. Bringing a cancelled assignment
    /// back re-checks the volunteer's slot.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        assignment_id: i32,
        status: AssignmentStatus,
        notes: Option<String>,
    ) -> Result<volunteer_assignment::Model, ServiceError> {
        if notes.as_ref().map_or(false, |n| n.chars().count() > 500) {
            return Err(ServiceError::ValidationError(
                "notes must be at most 500 characters".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let existing = repositories::find_required::<volunteer_assignment::Entity, _>(
            &txn,
            assignment_id,
            "Assignment",
        )
        .await?;
        let old_status = existing.status;

        if !old_status.holds_slot() && status.holds_slot() {
            AssignmentConflictGuard::check(
                &txn,
                existing.volunteer_id,
                existing.scheduled_day,
                &existing.shift_type,
                Some(existing.id),
            )
            .await?;
        }

        let (volunteer_id, day, shift_type) = (
            existing.volunteer_id,
            existing.scheduled_day,
            existing.shift_type.clone(),
        );
        let mut active: volunteer_assignment::ActiveModel = existing.into();
        active.status = Set(status);
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(self.clock.now()));
        let updated = active.update(&txn).await.map_err(|e| {
            ServiceError::from_unique_violation(
                e,
                format!(
                    "Volunteer {} is already assigned to the {} shift on {}",
                    volunteer_id, shift_type, day
                ),
            )
        })?;
        txn.commit().await?;

        if old_status != status {
            info!(assignment_id, %old_status, new_status = %status, "Assignment status changed");
            self.event_sender
                .send_or_log(Event::AssignmentStatusChanged {
                    assignment_id,
                    old_status,
                    new_status: status,
                })
                .await;
        }

        Ok(updated)
    }

    /// The volunteer's assignments with `from <= day <= to`, earliest first.
    #[instrument(skip(self))]
    pub async fn list_for_volunteer(
        &self,
        volunteer_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<volunteer_assignment::Model>, ServiceError> {
        if to < from {
            return Err(ServiceError::ValidationError(format!(
                "range end {} is before start {}",
                to, from
            )));
        }
        let db = &*self.db_pool;
        repositories::require::<volunteer::Entity, _>(db, volunteer::Column::Id, volunteer_id, "Volunteer")
            .await?;

        Ok(volunteer_assignment::Entity::find()
            .filter(volunteer_assignment::Column::VolunteerId.eq(volunteer_id))
            .filter(volunteer_assignment::Column::ScheduledDay.between(from, to))
            .order_by_asc(volunteer_assignment::Column::ScheduledDate)
            .order_by_asc(volunteer_assignment::Column::Id)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn command(shift_type: &str) -> CreateAssignmentCommand {
        CreateAssignmentCommand {
            volunteer_id: 5,
            route_id: 1,
            scheduled_date: Utc.with_ymd_and_hms(2025, 4, 24, 9, 0, 0).unwrap(),
            shift_type: shift_type.into(),
            notes: None,
        }
    }

    #[test]
    fn shift_type_must_be_present() {
        assert!(command("Morning").validate().is_ok());
        assert!(command("").validate().is_err());
        assert!(command("   ").validate().is_err());
        assert!(command(&"a".repeat(51)).validate().is_err());
    }

    #[test]
    fn conflict_message_names_the_slot() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 24).unwrap();
        let err = AssignmentConflictGuard::conflict(5, day, "Morning");
        assert_eq!(
            err.to_string(),
            "Conflict: Volunteer 5 is already assigned to the Morning shift on 2025-04-24"
        );
    }
}
