//! HTTP handlers

pub mod auth;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod import;
pub mod inbound;
pub mod item;
pub mod outbound;
pub mod partner;
pub mod shelf_code;
pub mod stock;
pub mod stock_count;
pub mod transfer;
pub mod user;
pub mod warehouse;

pub use auth::*;
pub use dashboard::*;
pub use export::*;
pub use health::*;
pub use import::*;
pub use inbound::*;
pub use item::*;
pub use outbound::*;
pub use partner::*;
pub use shelf_code::*;
pub use stock::*;
pub use stock_count::*;
pub use transfer::*;
pub use user::*;
pub use warehouse::*;
