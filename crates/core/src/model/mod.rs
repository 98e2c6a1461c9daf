//! Domain records shared across the workspace.
//!
//! `Order` is the persisted entity, owned by the store. `OrderSignal` is the
//! transient fact extracted from an HTML page or an email, consumed by the
//! reconciliation engine and then discarded.

mod status;

pub use status::Status;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trackable purchase/line-item row.
///
/// Text columns use the empty string as "blank"; the merge policy treats a
/// blank field as fillable and a populated one as untouchable. Calendar
/// dates are ISO `YYYY-MM-DD` strings, timestamps RFC3339.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_date: String,
    pub platform: String,
    pub seller: String,
    pub destination: String,
    pub description: String,
    pub link: String,
    pub quantity: u32,
    pub estimated_delivery: String,
    pub alarm_enabled: bool,
    pub is_delivered: bool,
    pub position: String,
    pub notes: String,
    pub category: String,
    pub last_email_id: String,
    pub last_sync_at: String,
    pub tracking_number: String,
    pub carrier: String,
    pub last_mile_carrier: String,
    pub site_order_id: String,
    pub status: Status,
    pub price: Option<f64>,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// Set the status and re-derive the `is_delivered` flag.
    ///
    /// The two fields must agree on every status-changing write:
    /// `is_delivered` is true iff the status is `Consegnato`.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.is_delivered = status == Status::Delivered;
    }
}

/// A transient extracted fact about an order's state.
///
/// Produced fresh per parse call by the HTML parser or the email extractor,
/// matched against stored orders, folded into a mutation and discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSignal {
    pub platform: String,
    pub seller: String,
    pub description: String,
    pub quantity: u32,
    pub site_order_id: String,
    pub tracking_number: String,
    pub carrier: String,
    pub last_mile_carrier: String,
    pub status: Option<Status>,
    pub estimated_delivery: Option<NaiveDate>,
    pub order_date: Option<NaiveDate>,
    /// Opaque identity of the source message (`folder_messageid`), used for
    /// idempotence. Empty for HTML imports.
    pub source_id: String,
    /// Subject line of the source email, empty for HTML imports.
    pub subject: String,
    /// Leading slice of the source body, used for the note log and the
    /// description-fallback match.
    pub excerpt: String,
    /// Ready-made annotation for the order's note log. Set by the HTML
    /// import path; email signals build their note from subject + timestamp.
    pub note: String,
}
