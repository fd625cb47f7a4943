//! Shared types and domain logic for the Warehouse Management System
//!
//! Everything here is free of I/O: the backend crate owns the database and
//! HTTP layers and calls into these modules for the rules.

pub mod import;
pub mod ledger;
pub mod models;
pub mod numbering;
pub mod table;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
