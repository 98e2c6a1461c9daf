//! Aggregate statistics over the order table.

use super::connection::StoreDb;
use super::orders::OrderFilter;
use crate::Error;
use crate::model::Order;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Days ahead within which a delivery counts as "upcoming".
const UPCOMING_WINDOW_DAYS: i64 = 2;

/// Snapshot of the store for the stats report.
#[derive(Debug, Clone, Default)]
pub struct OrderStats {
    pub total: usize,
    pub delivered: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub upcoming: usize,
    pub per_platform: BTreeMap<String, usize>,
}

impl OrderStats {
    /// Delivered share in percent, 0 when the store is empty.
    pub fn delivery_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.delivered as f64 / self.total as f64 * 100.0
    }
}

/// Compute statistics from a snapshot of orders.
///
/// Date buckets (overdue / due today / upcoming) only consider undelivered
/// orders with a parseable estimated delivery date.
pub fn compute_stats(orders: &[Order], today: NaiveDate) -> OrderStats {
    let mut stats = OrderStats { total: orders.len(), ..Default::default() };

    for order in orders {
        let platform = if order.platform.is_empty() { "Sconosciuto" } else { order.platform.as_str() };
        *stats.per_platform.entry(platform.to_string()).or_insert(0) += 1;

        if order.is_delivered {
            stats.delivered += 1;
            continue;
        }
        stats.pending += 1;

        let Ok(est) = NaiveDate::parse_from_str(&order.estimated_delivery, "%Y-%m-%d") else {
            continue;
        };
        let days = (est - today).num_days();
        if days < 0 {
            stats.overdue += 1;
        } else if days == 0 {
            stats.due_today += 1;
        } else if days <= UPCOMING_WINDOW_DAYS {
            stats.upcoming += 1;
        }
    }

    stats
}

impl StoreDb {
    /// Statistics over the whole store as of `today`.
    pub async fn order_stats(&self, today: NaiveDate) -> Result<OrderStats, Error> {
        let orders = self.list_orders(OrderFilter::all()).await?;
        Ok(compute_stats(&orders, today))
    }
}
