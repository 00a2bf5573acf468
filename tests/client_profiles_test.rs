mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestContext;
use meal_delivery_core::{
    entities::{
        client_dietary_restriction, recurring_delivery_schedule, schedule_detail,
        schedule_detail::DayOfWeek, service_authorization,
    },
    events::Event,
    services::{
        clients::ClientInput,
        owned_collections::{OwnedCollectionItems, ScheduleDetailInput, ServiceAuthorizationInput},
        schedules::RecurringScheduleInput,
    },
    ServiceError,
};
use sea_orm::{EntityTrait, PaginatorTrait};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn base_input() -> ClientInput {
    ClientInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address: "10 Analytical Way".into(),
        phone: Some("555-0100".into()),
        route_id: None,
        is_active: true,
        dietary_restriction_ids: vec![],
        eligibility_criterion_ids: vec![],
        service_authorizations: vec![],
        recurring_schedule: None,
    }
}

fn schedule(details: Vec<ScheduleDetailInput>) -> RecurringScheduleInput {
    RecurringScheduleInput {
        recurrence_pattern: "Weekly".into(),
        start_date: date(4, 1),
        end_date: None,
        is_active: true,
        details,
    }
}

fn meals(day_of_week: DayOfWeek, meal_type_id: i32, quantity: i32) -> ScheduleDetailInput {
    ScheduleDetailInput {
        day_of_week,
        meal_type_id,
        quantity,
    }
}

fn home_delivery(units: i32) -> ServiceAuthorizationInput {
    ServiceAuthorizationInput {
        service_type: "Home delivery".into(),
        authorized_units: units,
        start_date: date(1, 1),
        end_date: None,
        authorization_number: Some("AUTH-1".into()),
        notes: None,
    }
}

async fn count<E>(ctx: &TestContext) -> u64
where
    E: EntityTrait,
    E::Model: Sync,
{
    E::find().count(ctx.db.as_ref()).await.unwrap()
}

#[tokio::test]
async fn create_writes_the_whole_profile() {
    let mut ctx = TestContext::new().await;
    let route = ctx.route("North").await;
    let regular = ctx.meal_type("Regular").await;
    let restrictions = ctx.dietary_restrictions(2).await;
    let criterion = ctx.eligibility_criterion("Homebound").await;

    let profile = ctx
        .clients()
        .create_client(ClientInput {
            route_id: Some(route.id),
            dietary_restriction_ids: restrictions.clone(),
            eligibility_criterion_ids: vec![criterion.id],
            service_authorizations: vec![home_delivery(60)],
            recurring_schedule: Some(schedule(vec![
                meals(DayOfWeek::Monday, regular.id, 2),
                meals(DayOfWeek::Thursday, regular.id, 1),
            ])),
            ..base_input()
        })
        .await
        .unwrap();

    assert_eq!(profile.client.full_name(), "Ada Lovelace");
    assert_eq!(profile.client.route_id, Some(route.id));
    assert_eq!(profile.dietary_restriction_ids, restrictions);
    assert_eq!(profile.eligibility_criterion_ids, vec![criterion.id]);
    assert_eq!(profile.service_authorizations.len(), 1);
    let schedule = profile.schedule.expect("schedule");
    assert_eq!(schedule.details.len(), 2);

    // 2025-04-28 is a Monday
    let monday = schedule.deliveries_on(date(4, 28));
    assert_eq!(monday.len(), 1);
    assert_eq!(monday[0].quantity, 2);
    assert!(schedule.deliveries_on(date(4, 29)).is_empty());

    let events = ctx.drain_events();
    assert_eq!(events[0], Event::ClientCreated(profile.client.id));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OwnedCollectionReplaced { collection, inserted: 2, .. } if collection == "schedule_details"
    )));
}

#[tokio::test]
async fn update_reconciles_links_and_replaces_collections() {
    let ctx = TestContext::new().await;
    let regular = ctx.meal_type("Regular").await;
    let vegetarian = ctx.meal_type("Vegetarian").await;
    let restrictions = ctx.dietary_restrictions(3).await;
    let service = ctx.clients();

    let created = service
        .create_client(ClientInput {
            dietary_restriction_ids: vec![restrictions[0], restrictions[1]],
            service_authorizations: vec![home_delivery(60), home_delivery(30)],
            recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Monday, regular.id, 1)])),
            ..base_input()
        })
        .await
        .unwrap();
    let original_schedule = created.schedule.clone().unwrap().schedule;

    let updated = service
        .update_client(
            created.client.id,
            ClientInput {
                last_name: "King".into(),
                dietary_restriction_ids: vec![restrictions[1], restrictions[2]],
                service_authorizations: vec![home_delivery(90)],
                recurring_schedule: Some(RecurringScheduleInput {
                    recurrence_pattern: "Biweekly".into(),
                    ..schedule(vec![meals(DayOfWeek::Friday, vegetarian.id, 3)])
                }),
                ..base_input()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.client.last_name, "King");
    assert_eq!(
        updated.dietary_restriction_ids,
        vec![restrictions[1], restrictions[2]]
    );
    assert_eq!(updated.service_authorizations.len(), 1);
    assert_eq!(updated.service_authorizations[0].authorized_units, 90);

    let schedule = updated.schedule.unwrap();
    assert_eq!(schedule.schedule.client_id, created.client.id);
    assert_eq!(schedule.schedule.recurrence_pattern, "Biweekly");
    assert_eq!(schedule.schedule.id, original_schedule.id);
    assert_eq!(schedule.schedule.created_at, original_schedule.created_at);
    let details: Vec<_> = schedule
        .details
        .iter()
        .map(|d| (d.day_of_week, d.meal_type_id, d.quantity))
        .collect();
    assert_eq!(details, vec![(DayOfWeek::Friday, vegetarian.id, 3)]);
    assert_eq!(count::<recurring_delivery_schedule::Entity>(&ctx).await, 1);

    let replaced = service
        .replace_owned_collection(
            original_schedule.id,
            OwnedCollectionItems::ScheduleDetails(vec![meals(DayOfWeek::Tuesday, regular.id, 2)]),
        )
        .await
        .unwrap();
    assert_eq!(replaced.removed, 1);
    assert_eq!(replaced.inserted, 1);
}

#[tokio::test]
async fn update_without_schedule_removes_it() {
    let ctx = TestContext::new().await;
    let regular = ctx.meal_type("Regular").await;
    let service = ctx.clients();
    let created = service
        .create_client(ClientInput {
            recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Monday, regular.id, 1)])),
            ..base_input()
        })
        .await
        .unwrap();

    let updated = service
        .update_client(created.client.id, base_input())
        .await
        .unwrap();

    assert!(updated.schedule.is_none());
    assert_eq!(count::<recurring_delivery_schedule::Entity>(&ctx).await, 0);
    assert_eq!(count::<schedule_detail::Entity>(&ctx).await, 0);
}

#[tokio::test]
async fn failed_update_leaves_the_prior_state_intact() {
    let ctx = TestContext::new().await;
    let regular = ctx.meal_type("Regular").await;
    let restrictions = ctx.dietary_restrictions(2).await;
    let service = ctx.clients();
    let created = service
        .create_client(ClientInput {
            dietary_restriction_ids: vec![restrictions[0]],
            service_authorizations: vec![home_delivery(60)],
            recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Monday, regular.id, 1)])),
            ..base_input()
        })
        .await
        .unwrap();

    // associations and authorizations are written before the schedule fails
    let result = service
        .update_client(
            created.client.id,
            ClientInput {
                last_name: "Changed".into(),
                dietary_restriction_ids: vec![restrictions[1]],
                service_authorizations: vec![],
                recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Tuesday, 4_242, 1)])),
                ..base_input()
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Meal type 4242 not found");

    let after = service.get_client_profile(created.client.id).await.unwrap();
    assert_eq!(after, created);
}

#[tokio::test]
async fn invalid_nested_input_is_rejected() {
    let ctx = TestContext::new().await;
    let service = ctx.clients();

    let result = service
        .create_client(ClientInput {
            recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Monday, 1, 0)])),
            ..base_input()
        })
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(msg)) if msg.starts_with("details[0]"));

    let result = service
        .create_client(ClientInput {
            route_id: Some(31),
            ..base_input()
        })
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Route 31 not found");
    assert_eq!(count::<meal_delivery_core::entities::client::Entity>(&ctx).await, 0);
}

#[tokio::test]
async fn delete_removes_everything_the_client_owns() {
    let mut ctx = TestContext::new().await;
    let regular = ctx.meal_type("Regular").await;
    let restrictions = ctx.dietary_restrictions(2).await;
    let service = ctx.clients();
    let created = service
        .create_client(ClientInput {
            dietary_restriction_ids: restrictions.clone(),
            service_authorizations: vec![home_delivery(60)],
            recurring_schedule: Some(schedule(vec![meals(DayOfWeek::Monday, regular.id, 1)])),
            ..base_input()
        })
        .await
        .unwrap();
    ctx.drain_events();

    service.delete_client(created.client.id).await.unwrap();

    assert_eq!(ctx.drain_events(), vec![Event::ClientDeleted(created.client.id)]);
    assert_eq!(count::<client_dietary_restriction::Entity>(&ctx).await, 0);
    assert_eq!(count::<service_authorization::Entity>(&ctx).await, 0);
    assert_eq!(count::<recurring_delivery_schedule::Entity>(&ctx).await, 0);
    assert_eq!(count::<schedule_detail::Entity>(&ctx).await, 0);
    // reference rows survive
    assert_eq!(
        count::<meal_delivery_core::entities::dietary_restriction::Entity>(&ctx).await,
        2
    );

    assert_matches!(
        service.get_client_profile(created.client.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        service.delete_client(created.client.id).await,
        Err(ServiceError::NotFound(_))
    );
}
