//! Clover Inventory
//!
//! Inventory dashboard core for small retailers on top of the Clover POS:
//! catalog reconciliation, an operational ledger of deliveries and sales,
//! derived metrics, and a polling scheduler.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod app;
pub mod commands;
pub mod config;
pub mod demo;
pub mod errors;
pub mod events;
pub mod models;
pub mod pos;
pub mod scheduler;
pub mod services;
pub mod state;

pub use app::Dashboard;
pub use commands::InventoryCommand;
pub use errors::ServiceError;
pub use events::{Event, EventSender, Notification, NotificationKind};
pub use state::{Inventory, InventoryStore};
