//! Email-driven order updates for traccia.
//!
//! This crate provides:
//! - The mailbox session boundary (`MailboxSession`)
//! - The folder selection policy
//! - Per-message signal extraction
//! - The sync workflow that folds signals into the order store

pub mod extract;
pub mod folders;
pub mod session;
pub mod sync;

pub use extract::{extract_signal, is_relevant};
pub use folders::{format_since_date, select_folders};
pub use session::{MailboxSession, MessageHeader};
pub use sync::{SyncEngine, SyncReport};
