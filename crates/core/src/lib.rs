//! Core types and shared functionality for traccia.
//!
//! This crate provides:
//! - The domain model (orders, signals, status hierarchy)
//! - The SQLite-backed order store
//! - The reconciliation engine (signal matching, merge policy, duplicates)
//! - Configuration structures
//! - Unified error types

pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use model::{Order, OrderSignal, Status};
pub use store::{OrderFilter, StoreDb};
