use std::sync::Arc;

use crate::{
    clock::Clock,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        assignments::AssignmentService, clients::ClientService, inventory_ledger::InventoryLedger,
    },
};

/// Factory for creating service instances with shared dependencies
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl ServiceFactory {
    /// Creates a new service factory with the given dependencies
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        clock: Arc<dyn Clock>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            clock,
            config,
        }
    }

    /// Creates an assignment service instance
    pub fn assignment_service(&self) -> AssignmentService {
        AssignmentService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            self.clock.clone(),
        )
    }

    /// Creates a client service instance
    pub fn client_service(&self) -> ClientService {
        ClientService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            self.clock.clone(),
        )
    }

    /// Creates an inventory ledger instance
    pub fn inventory_ledger(&self) -> InventoryLedger {
        InventoryLedger::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            self.clock.clone(),
            self.config.inventory_top_users_limit,
        )
    }

    /// Gets a reference to the database pool
    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }

    /// Gets a reference to the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Service container holding all service instances
#[derive(Clone)]
pub struct ServiceContainer {
    pub assignments: Arc<AssignmentService>,
    pub clients: Arc<ClientService>,
    pub inventory: Arc<InventoryLedger>,
}

impl ServiceContainer {
    /// Creates a new service container with all services initialized
    pub fn new(factory: &ServiceFactory) -> Self {
        Self {
            assignments: Arc::new(factory.assignment_service()),
            clients: Arc::new(factory.client_service()),
            inventory: Arc::new(factory.inventory_ledger()),
        }
    }
}
