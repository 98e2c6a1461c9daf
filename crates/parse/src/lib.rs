//! HTML order-page parsing for traccia.
//!
//! This crate provides the heuristic extraction pipeline: markup
//! normalization, storefront/page-kind detection, and per-platform order-id,
//! tracking, date and line-item extraction, assembled into order signals.

pub mod dates;
pub mod items;
pub mod normalize;
pub mod order_id;
pub mod parser;
pub mod platform;
pub mod tracking;

pub use items::{LineItem, extract_items};
pub use normalize::normalize;
pub use parser::{HtmlOrderParser, ParseOutcome};
pub use platform::{PageKind, Platform, detect_page_kind};
