// Reconciliation building blocks
pub mod associations;
pub mod owned_collections;
pub mod schedules;

// Core services
pub mod assignments;
pub mod clients;
pub mod inventory_ledger;

// Service factory for dependency injection
pub mod factory;
