// Clients and their associations
pub mod client;
pub mod client_dietary_restriction;
pub mod client_eligibility_criterion;
pub mod dietary_restriction;
pub mod eligibility_criterion;
pub mod service_authorization;

// Recurring delivery schedules
pub mod meal_type;
pub mod recurring_delivery_schedule;
pub mod schedule_detail;

// Routes and volunteers
pub mod route;
pub mod volunteer;
pub mod volunteer_assignment;

// Inventory ledger
pub mod inventory_category;
pub mod inventory_item;
pub mod inventory_transaction;
