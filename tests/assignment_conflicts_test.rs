mod common;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use common::TestContext;
use meal_delivery_core::{
    entities::volunteer_assignment::{self, AssignmentStatus},
    events::Event,
    services::assignments::CreateAssignmentCommand,
    ServiceError,
};
use rstest::rstest;
use sea_orm::{ActiveModelTrait, EntityTrait, NotSet, PaginatorTrait, Set};

fn command(volunteer_id: i32, route_id: i32, hour: u32, shift: &str) -> CreateAssignmentCommand {
    CreateAssignmentCommand {
        volunteer_id,
        route_id,
        scheduled_date: Utc.with_ymd_and_hms(2025, 4, 24, hour, 0, 0).unwrap(),
        shift_type: shift.to_string(),
        notes: None,
    }
}

async fn assignment_count(ctx: &TestContext) -> u64 {
    volunteer_assignment::Entity::find()
        .count(ctx.db.as_ref())
        .await
        .unwrap()
}

#[tokio::test]
async fn second_booking_of_the_same_slot_conflicts() {
    let mut ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    let first = service
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await
        .expect("first booking");
    assert_eq!(first.status, AssignmentStatus::Scheduled);
    assert_eq!(first.scheduled_day, NaiveDate::from_ymd_opt(2025, 4, 24).unwrap());

    let second = service
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await;
    assert_matches!(second, Err(ServiceError::Conflict(msg)) if msg.contains("Morning"));
    assert_eq!(assignment_count(&ctx).await, 1);

    let events = ctx.drain_events();
    assert_eq!(events.len(), 1);
    assert_matches!(&events[0], Event::AssignmentCreated { assignment_id, .. } if *assignment_id == first.id);
}

#[tokio::test]
async fn same_day_and_shift_conflicts_regardless_of_time_or_route() {
    let ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let north = ctx.route("North").await;
    let south = ctx.route("South").await;
    let service = ctx.assignments();

    service
        .create_assignment(command(volunteer.id, north.id, 8, "Morning"))
        .await
        .unwrap();
    let result = service
        .create_assignment(command(volunteer.id, south.id, 11, "  Morning "))
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));
}

#[rstest]
#[case("Afternoon")]
#[case("Evening")]
#[case("morning")]
#[tokio::test]
async fn different_shift_labels_do_not_conflict(#[case] other_shift: &str) {
    let ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    service
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await
        .unwrap();
    service
        .create_assignment(command(volunteer.id, route.id, 14, other_shift))
        .await
        .expect("different shift is a different slot");
    assert_eq!(assignment_count(&ctx).await, 2);
}

#[tokio::test]
async fn other_volunteers_may_share_a_slot() {
    let ctx = TestContext::new().await;
    let dana = ctx.volunteer("Dana").await;
    let eli = ctx.volunteer("Eli").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    service
        .create_assignment(command(dana.id, route.id, 9, "Morning"))
        .await
        .unwrap();
    service
        .create_assignment(command(eli.id, route.id, 9, "Morning"))
        .await
        .unwrap();
    assert_eq!(assignment_count(&ctx).await, 2);
}

#[tokio::test]
async fn cancelling_frees_the_slot_and_reactivation_is_checked() {
    let mut ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    let original = service
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await
        .unwrap();
    let cancelled = service
        .update_status(original.id, AssignmentStatus::Cancelled, Some("sick".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, AssignmentStatus::Cancelled);
    assert_eq!(cancelled.notes.as_deref(), Some("sick"));

    let replacement = service
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await
        .expect("cancelled assignment no longer holds the slot");

    let reactivated = service
        .update_status(original.id, AssignmentStatus::Scheduled, None)
        .await;
    assert_matches!(reactivated, Err(ServiceError::Conflict(_)));

    service
        .update_status(replacement.id, AssignmentStatus::Confirmed, None)
        .await
        .expect("moving between live states keeps the slot");

    let events = ctx.drain_events();
    let status_changes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::AssignmentStatusChanged {
                old_status,
                new_status,
                ..
            } => Some((*old_status, *new_status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        status_changes,
        vec![
            (AssignmentStatus::Scheduled, AssignmentStatus::Cancelled),
            (AssignmentStatus::Scheduled, AssignmentStatus::Confirmed),
        ]
    );
}

#[tokio::test]
async fn storage_rejects_double_booking_that_skips_the_guard() {
    let ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    ctx.assignments()
        .create_assignment(command(volunteer.id, route.id, 9, "Morning"))
        .await
        .unwrap();

    let scheduled_date = Utc.with_ymd_and_hms(2025, 4, 24, 15, 0, 0).unwrap();
    let raw = volunteer_assignment::ActiveModel {
        id: NotSet,
        volunteer_id: Set(volunteer.id),
        route_id: Set(route.id),
        scheduled_date: Set(scheduled_date),
        scheduled_day: Set(scheduled_date.date_naive()),
        shift_type: Set("Morning".into()),
        status: Set(AssignmentStatus::Confirmed),
        notes: Set(None),
        created_at: Set(scheduled_date),
        updated_at: Set(None),
    }
    .insert(ctx.db.as_ref())
    .await
    .map_err(|e| ServiceError::from_unique_violation(e, "double booking"));
    assert_matches!(raw, Err(ServiceError::Conflict(_)));
    assert_eq!(assignment_count(&ctx).await, 1);
}

#[tokio::test]
async fn unknown_volunteer_or_route_is_not_found() {
    let ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    let missing_volunteer = service
        .create_assignment(command(volunteer.id + 100, route.id, 9, "Morning"))
        .await;
    assert_matches!(missing_volunteer, Err(ServiceError::NotFound(msg)) if msg.starts_with("Volunteer"));

    let missing_route = service
        .create_assignment(command(volunteer.id, route.id + 100, 9, "Morning"))
        .await;
    assert_matches!(missing_route, Err(ServiceError::NotFound(msg)) if msg.starts_with("Route"));

    let missing_assignment = service
        .update_status(999, AssignmentStatus::Completed, None)
        .await;
    assert_matches!(missing_assignment, Err(ServiceError::NotFound(_)));
    assert_eq!(assignment_count(&ctx).await, 0);
}

#[tokio::test]
async fn blank_shift_is_rejected_before_touching_storage() {
    let ctx = TestContext::new().await;
    let result = ctx
        .assignments()
        .create_assignment(command(1, 1, 9, "   "))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn listing_is_bounded_by_day_and_ordered() {
    let ctx = TestContext::new().await;
    let volunteer = ctx.volunteer("Dana").await;
    let route = ctx.route("North").await;
    let service = ctx.assignments();

    for (day, shift) in [(26, "Morning"), (24, "Evening"), (24, "Morning"), (30, "Morning")] {
        service
            .create_assignment(CreateAssignmentCommand {
                volunteer_id: volunteer.id,
                route_id: route.id,
                scheduled_date: Utc
                    .with_ymd_and_hms(2025, 4, day, if shift == "Morning" { 9 } else { 18 }, 0, 0)
                    .unwrap(),
                shift_type: shift.into(),
                notes: None,
            })
            .await
            .unwrap();
    }

    let from = NaiveDate::from_ymd_opt(2025, 4, 24).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 4, 26).unwrap();
    let listed = service.list_for_volunteer(volunteer.id, from, to).await.unwrap();
    let slots: Vec<_> = listed
        .iter()
        .map(|a| (a.scheduled_day.to_string(), a.shift_type.as_str()))
        .collect();
    assert_eq!(
        slots,
        vec![
            ("2025-04-24".to_string(), "Morning"),
            ("2025-04-24".to_string(), "Evening"),
            ("2025-04-26".to_string(), "Morning"),
        ]
    );

    assert_matches!(
        service.list_for_volunteer(volunteer.id, to, from).await,
        Err(ServiceError::ValidationError(_))
    );
}
