//! SQLite-backed order store.
//!
//! Persistent storage for order rows using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Filtered listings for the sync and import workflows

pub mod connection;
pub mod migrations;
pub mod orders;
pub mod stats;

pub use crate::Error;

pub use connection::StoreDb;
pub use orders::OrderFilter;
pub use stats::{OrderStats, compute_stats};
