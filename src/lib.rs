//! Meal Delivery Core
//!
//! Scheduling, volunteer assignment, client association reconciliation and
//! the inventory ledger for a meal-delivery program, on top of sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod repositories;
pub mod services;

pub use errors::ServiceError;
