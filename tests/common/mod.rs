#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use meal_delivery_core::{
    clock::{Clock, FixedClock},
    config::AppConfig,
    db::{self, DbPool},
    entities::{
        client, dietary_restriction, eligibility_criterion, inventory_category, inventory_item,
        meal_type, route, volunteer,
    },
    events::{Event, EventSender},
    services::{
        assignments::AssignmentService,
        clients::ClientService,
        factory::ServiceFactory,
        inventory_ledger::{InventoryLedger, NewInventoryItem},
    },
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, NotSet, Set};
use tokio::sync::mpsc;

/// Harness backed by a fresh, migrated in-memory SQLite database and a
/// clock that only moves when told.
pub struct TestContext {
    pub db: Arc<DbPool>,
    pub clock: Arc<FixedClock>,
    pub config: Arc<AppConfig>,
    events: mpsc::Receiver<Event>,
    factory: ServiceFactory,
}

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 24, 8, 0, 0).unwrap()
}

impl TestContext {
    pub async fn new() -> Self {
        let db = db::in_memory_pool().await.expect("in-memory database");
        let clock = Arc::new(FixedClock::new(start_instant()));
        let config = Arc::new(AppConfig::new("sqlite::memory:".into(), "test".into()));
        let (event_sender, events) = EventSender::channel(1024);
        let shared_clock: Arc<dyn Clock> = clock.clone();
        let factory = ServiceFactory::new(db.clone(), event_sender, shared_clock, config.clone());
        Self {
            db,
            clock,
            config,
            events,
            factory,
        }
    }

    pub fn assignments(&self) -> AssignmentService {
        self.factory.assignment_service()
    }

    pub fn clients(&self) -> ClientService {
        self.factory.client_service()
    }

    pub fn ledger(&self) -> InventoryLedger {
        self.factory.inventory_ledger()
    }

    /// Events published so far, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub async fn route(&self, name: &str) -> route::Model {
        route::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            description: Set(None),
            is_active: Set(true),
            created_at: Set(self.clock.now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert route")
    }

    pub async fn volunteer(&self, first_name: &str) -> volunteer::Model {
        volunteer::ActiveModel {
            id: NotSet,
            first_name: Set(first_name.to_string()),
            last_name: Set("Volunteer".to_string()),
            email: Set(None),
            phone: Set(None),
            is_active: Set(true),
            created_at: Set(self.clock.now()),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert volunteer")
    }

    pub async fn meal_type(&self, name: &str) -> meal_type::Model {
        meal_type::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            is_active: Set(true),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert meal type")
    }

    pub async fn dietary_restriction(&self, name: &str) -> dietary_restriction::Model {
        dietary_restriction::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            description: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert dietary restriction")
    }

    pub async fn dietary_restrictions(&self, count: usize) -> Vec<i32> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            ids.push(self.dietary_restriction(&format!("Restriction {}", i)).await.id);
        }
        ids
    }

    pub async fn eligibility_criterion(&self, name: &str) -> eligibility_criterion::Model {
        eligibility_criterion::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            description: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert eligibility criterion")
    }

    pub async fn client(&self, last_name: &str) -> client::Model {
        let now = self.clock.now();
        client::ActiveModel {
            id: NotSet,
            first_name: Set("Test".to_string()),
            last_name: Set(last_name.to_string()),
            address: Set("1 Main St".to_string()),
            phone: Set(None),
            route_id: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .expect("insert client")
    }

    pub async fn category(&self, name: &str) -> inventory_category::Model {
        self.ledger()
            .create_category(name.to_string(), None)
            .await
            .expect("create category")
    }

    /// Item in `category_id` whose ledger opens with `opening` units.
    pub async fn item(
        &self,
        category_id: i32,
        name: &str,
        opening: i32,
        reorder_threshold: i32,
    ) -> inventory_item::Model {
        self.ledger()
            .create_item(NewInventoryItem {
                category_id,
                name: name.to_string(),
                unit: "each".to_string(),
                reorder_threshold,
                reorder_quantity: 24,
                unit_cost: Decimal::new(250, 2),
                opening_quantity: opening,
                user_id: "seed".to_string(),
            })
            .await
            .expect("create item")
    }
}
