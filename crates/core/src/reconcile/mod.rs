//! Reconciliation of extracted signals against stored orders.
//!
//! Pure transforms: every function takes a signal plus a snapshot of
//! candidate orders and returns the mutations to persist. Nothing here
//! touches the store, so callers control transaction boundaries and
//! serialization of concurrent sync runs.
//!
//! Merge policy, in one line: automated signals corroborate, they never
//! overwrite — fill blanks, upgrade status monotonically, append notes.

pub mod similarity;

pub use similarity::{DESCRIPTION_ONLY_THRESHOLD, ID_MATCH_THRESHOLD, find_duplicate, similarity, tokens};

use crate::model::{Order, OrderSignal, Status};
use chrono::{DateTime, Utc};

/// Result of applying one signal against a candidate set.
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Orders the signal matched (before idempotence filtering).
    pub matched: usize,
    /// Mutated copies to persist, keyed by their `id`.
    pub updated: Vec<Order>,
    /// Matches skipped because this signal was already applied to them.
    pub skipped: usize,
    /// Status values dropped by the hierarchy gate.
    pub rejected_status: usize,
}

/// Collect every stored order a signal refers to.
///
/// Order ids and tracking numbers are matched symmetrically (a tracking
/// number pasted into the order-id column still matches) and
/// case-insensitively. Several rows may share one purchase, so id/tracking
/// steps return every hit. The description fallback runs only when both id
/// steps come up empty and returns at most one order, since substring
/// matching is the low-confidence path.
pub fn match_candidates<'a>(signal: &OrderSignal, orders: &'a [Order]) -> Vec<&'a Order> {
    let mut matched: Vec<&Order> = Vec::new();
    let mut matched_ids: Vec<i64> = Vec::new();

    let signal_id = signal.site_order_id.trim().to_lowercase();
    if !signal_id.is_empty() {
        for order in orders {
            if matched_ids.contains(&order.id) {
                continue;
            }
            let sid = order.site_order_id.trim().to_lowercase();
            let trk = order.tracking_number.trim().to_lowercase();
            if signal_id == sid || signal_id == trk {
                matched.push(order);
                matched_ids.push(order.id);
            }
        }
    }

    let signal_tracking = signal.tracking_number.trim().to_lowercase();
    if !signal_tracking.is_empty() {
        for order in orders {
            if matched_ids.contains(&order.id) {
                continue;
            }
            let sid = order.site_order_id.trim().to_lowercase();
            let trk = order.tracking_number.trim().to_lowercase();
            if signal_tracking == trk || signal_tracking == sid {
                matched.push(order);
                matched_ids.push(order.id);
            }
        }
    }

    if matched.is_empty() {
        let subject = signal.subject.to_lowercase();
        let excerpt = signal.excerpt.to_lowercase();
        for order in orders {
            let desc = order.description.trim().to_lowercase();
            if !desc.is_empty() && (subject.contains(&desc) || excerpt.contains(&desc)) {
                tracing::debug!(order_id = order.id, "matched by description substring");
                matched.push(order);
                break;
            }
        }
    }

    matched
}

fn fill_if_blank(target: &mut String, value: &str) {
    if target.trim().is_empty() && !value.trim().is_empty() {
        *target = value.to_string();
    }
}

/// Apply a signal to every order it matches, non-destructively.
///
/// Each matched order becomes one mutated copy in the report, unless the
/// signal was already applied to it (`last_email_id` equality). The caller
/// persists each copy as its own unit; there is no cross-order transaction.
pub fn apply_signal(signal: &OrderSignal, orders: &[Order], now: DateTime<Utc>) -> MergeReport {
    let mut report = MergeReport::default();
    let matches = match_candidates(signal, orders);
    report.matched = matches.len();

    for matched in matches {
        if !signal.source_id.is_empty() && matched.last_email_id == signal.source_id {
            report.skipped += 1;
            continue;
        }

        let mut out = matched.clone();
        out.last_email_id = signal.source_id.clone();
        out.last_sync_at = now.to_rfc3339();

        if let Some(new_status) = signal.status {
            if Status::is_upgrade(Some(matched.status), Some(new_status)) {
                out.set_status(new_status);
                tracing::info!(
                    order_id = matched.id,
                    from = matched.status.as_label(),
                    to = new_status.as_label(),
                    "status advanced"
                );
            } else {
                report.rejected_status += 1;
                tracing::info!(
                    order_id = matched.id,
                    current = matched.status.as_label(),
                    candidate = new_status.as_label(),
                    "status regression dropped"
                );
            }
        }

        fill_if_blank(&mut out.site_order_id, &signal.site_order_id);
        fill_if_blank(&mut out.tracking_number, &signal.tracking_number);
        fill_if_blank(&mut out.carrier, &signal.carrier);
        fill_if_blank(&mut out.last_mile_carrier, &signal.last_mile_carrier);

        if !out.is_delivered
            && let Some(est) = signal.estimated_delivery
        {
            let est = est.format("%Y-%m-%d").to_string();
            if est != matched.estimated_delivery {
                out.estimated_delivery = est;
            }
        }

        if !signal.subject.is_empty() {
            out.notes
                .push_str(&format!("\n[Aggiornamento Email {}]: {}", now.format("%d/%m/%Y"), signal.subject));
        } else if !signal.note.is_empty() && !matched.notes.contains(&signal.note) {
            if !out.notes.is_empty() {
                out.notes.push('\n');
            }
            out.notes.push_str(&signal.note);
        }

        report.updated.push(out);
    }

    report
}

/// Merge an HTML-import signal into the stored order it duplicates.
///
/// Unlike [`apply_signal`] this never touches the status hierarchy beyond
/// letting a concrete status replace an untouched `In Attesa`, and raises
/// the quantity only upward. Returns None when nothing would change.
pub fn merge_import(existing: &Order, signal: &OrderSignal) -> Option<Order> {
    let mut out = existing.clone();
    let mut changed = false;

    for (target, value) in [
        (&mut out.seller, signal.seller.as_str()),
        (&mut out.site_order_id, signal.site_order_id.as_str()),
        (&mut out.tracking_number, signal.tracking_number.as_str()),
        (&mut out.carrier, signal.carrier.as_str()),
        (&mut out.last_mile_carrier, signal.last_mile_carrier.as_str()),
    ] {
        if target.trim().is_empty() && !value.trim().is_empty() {
            *target = value.to_string();
            changed = true;
        }
    }

    if out.estimated_delivery.trim().is_empty()
        && let Some(est) = signal.estimated_delivery
    {
        out.estimated_delivery = est.format("%Y-%m-%d").to_string();
        changed = true;
    }

    if let Some(status) = signal.status
        && status != Status::Pending
        && existing.status == Status::Pending
    {
        out.set_status(status);
        changed = true;
    }

    if signal.quantity > existing.quantity {
        out.quantity = signal.quantity;
        changed = true;
    }

    let note = signal.note.trim();
    if !note.is_empty() && !existing.notes.contains(note) {
        if !out.notes.is_empty() {
            out.notes.push('\n');
        }
        out.notes.push_str(note);
        changed = true;
    }

    if changed { Some(out) } else { None }
}
