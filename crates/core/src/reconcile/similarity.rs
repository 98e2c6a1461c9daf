//! Token-overlap duplicate detection for the HTML import path.
//!
//! An incoming parsed order may already exist in the store (the same page
//! imported twice, or one item of a multi-item purchase). Matching is
//! two-tier: an id/tracking match only needs a weak description overlap to
//! break ties between sibling line items, while a description-only match has
//! to clear a much higher bar to avoid false positives.

use crate::model::{Order, OrderSignal};
use std::collections::HashSet;

/// Minimum description overlap among id/tracking-matched candidates.
pub const ID_MATCH_THRESHOLD: f64 = 0.2;

/// Minimum overlap for a match on description alone.
pub const DESCRIPTION_ONLY_THRESHOLD: f64 = 0.6;

/// Lowercased alphanumeric tokens of length > 1.
pub fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1)
        .map(str::to_string)
        .collect()
}

/// Overlap ratio `|a ∩ b| / max(|a|, |b|)`; 0 when either side is empty.
pub fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / a.len().max(b.len()) as f64
}

/// Find the stored order an incoming parsed order duplicates, if any.
///
/// Phase 1 narrows to orders sharing the signal's site_order_id or tracking
/// number and picks the best description overlap at the weak threshold.
/// Phase 2 runs only when phase 1 found no id/tracking candidate at all: a
/// full scan by description at the strict threshold.
pub fn find_duplicate<'a>(signal: &OrderSignal, orders: &'a [Order]) -> Option<&'a Order> {
    let new_site_id = signal.site_order_id.trim();
    let new_tracking = signal.tracking_number.trim();
    let new_tokens = tokens(&signal.description);

    let candidates: Vec<&Order> = orders
        .iter()
        .filter(|existing| {
            let ex_site_id = existing.site_order_id.trim();
            let ex_tracking = existing.tracking_number.trim();
            let match_id = !new_site_id.is_empty() && !ex_site_id.is_empty() && new_site_id == ex_site_id;
            let match_track = !new_tracking.is_empty() && !ex_tracking.is_empty() && new_tracking == ex_tracking;
            match_id || match_track
        })
        .collect();

    if !candidates.is_empty() {
        let mut best: Option<&Order> = None;
        let mut max_sim = -1.0;
        for cand in candidates {
            let sim = similarity(&new_tokens, &tokens(&cand.description));
            if sim > max_sim {
                max_sim = sim;
                best = Some(cand);
            }
        }
        // Below the weak threshold this is likely a different line item of
        // the same purchase, not a duplicate row.
        return if max_sim >= ID_MATCH_THRESHOLD { best } else { None };
    }

    if new_tokens.is_empty() {
        return None;
    }

    let mut best: Option<&Order> = None;
    let mut max_sim = 0.0;
    for existing in orders {
        let sim = similarity(&new_tokens, &tokens(&existing.description));
        if sim > max_sim {
            max_sim = sim;
            best = Some(existing);
        }
    }
    if max_sim >= DESCRIPTION_ONLY_THRESHOLD { best } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(site_order_id: &str, tracking: &str, description: &str) -> Order {
        Order {
            site_order_id: site_order_id.to_string(),
            tracking_number: tracking.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn signal(site_order_id: &str, tracking: &str, description: &str) -> OrderSignal {
        OrderSignal {
            site_order_id: site_order_id.to_string(),
            tracking_number: tracking.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tokens_drop_short_words() {
        let t = tokens("Cavo USB-C da 2m, nero");
        assert!(t.contains("cavo"));
        assert!(t.contains("usb"));
        assert!(t.contains("nero"));
        assert!(t.contains("2m"));
        assert!(!t.contains("c"));
    }

    #[test]
    fn test_similarity_identical() {
        let a = tokens("tastiera meccanica retroilluminata");
        assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_similarity_empty() {
        let a = tokens("qualcosa interessante");
        let b = tokens("");
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_id_match_weak_description_is_duplicate() {
        let orders = vec![order("407-1234567-1234567", "", "Tastiera meccanica USB con cavo lungo")];
        let incoming = signal("407-1234567-1234567", "", "Tastiera wireless compatta");
        // Shares the id and at least some description tokens.
        assert!(find_duplicate(&incoming, &orders).is_some());
    }

    #[test]
    fn test_id_match_disjoint_description_is_new_line_item() {
        let orders = vec![order("407-1234567-1234567", "", "Tastiera meccanica retroilluminata")];
        let incoming = signal("407-1234567-1234567", "", "Borraccia termica acciaio");
        assert!(find_duplicate(&incoming, &orders).is_none());
    }

    #[test]
    fn test_description_only_needs_strict_overlap() {
        let orders = vec![order("", "", "Supporto monitor regolabile in alluminio")];

        let near_identical = signal("", "", "Supporto monitor regolabile in alluminio nero");
        assert!(find_duplicate(&near_identical, &orders).is_some());

        let loosely_related = signal("", "", "Supporto per telefono da auto");
        assert!(find_duplicate(&loosely_related, &orders).is_none());
    }

    #[test]
    fn test_tracking_match_counts_as_candidate() {
        let orders = vec![order("", "1Z999AA10123456784", "Scarpe da corsa uomo 43")];
        let incoming = signal("", "1Z999AA10123456784", "Scarpe da corsa uomo taglia 43");
        assert!(find_duplicate(&incoming, &orders).is_some());
    }

    #[test]
    fn test_best_candidate_wins() {
        let orders = vec![
            order("PO-211-12345678901234", "", "Set cacciaviti precisione 24 pezzi"),
            order("PO-211-12345678901234", "", "Lampada LED da lettura"),
        ];
        let incoming = signal("PO-211-12345678901234", "", "Set cacciaviti di precisione 24 pezzi con custodia");
        let best = find_duplicate(&incoming, &orders).unwrap();
        assert!(best.description.contains("cacciaviti"));
    }
}
