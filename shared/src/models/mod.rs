//! Domain models for the Warehouse Management System

mod movement;
mod stock;
mod user;

pub use movement::*;
pub use stock::*;
pub use user::*;
