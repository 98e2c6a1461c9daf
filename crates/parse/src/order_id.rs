//! Platform-native order number extraction.

use crate::platform::Platform;
use regex::Regex;
use std::sync::LazyLock;

static AMAZON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{3}-\d{7}-\d{7})\b").expect("valid regex"));
static TEMU_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(PO-\d{3}-\d{10,20})\b").expect("valid regex"));
static TEMU_COMPACT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(PO\d{10,20})\b").expect("valid regex"));
static EBAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{2}-\d{5}-\d{5})\b").expect("valid regex"));
// AliExpress ids are 15-20 digits; browser-captured markup doesn't always
// put word boundaries around them.
static ALIEXPRESS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{15,20})").expect("valid regex"));
static ALIEXPRESS_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)tradeOrderId[:\s'"]*(\d{15,20})"#).expect("valid regex"));
static GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:ordine|order|n[°.]?\s*ordine|order\s*#|ordine\s*n\.?)\s*[:\s]?\s*([A-Z0-9]*[0-9][-A-Z0-9]{3,30})")
        .expect("valid regex")
});

/// UI words that the generic pattern tends to pick up next to "ordine".
const GENERIC_BLACKLIST: &[&str] = &["aiuto", "help", "account", "login", "accedi", "resi", "rimborsi", "dettagli"];

fn collect(re: &Regex, haystack: &str) -> Vec<String> {
    re.captures_iter(haystack).map(|c| c[1].to_string()).collect()
}

/// Extract all order ids from the normalized text (and, for a few
/// platforms, the raw markup), deduplicated preserving first-seen order.
pub fn extract_order_ids(text: &str, platform: Platform, html: &str) -> Vec<String> {
    let mut ids = match platform {
        Platform::Amazon => collect(&AMAZON_RE, text),
        Platform::Temu => {
            let mut ids = collect(&TEMU_RE, text);
            if ids.is_empty() {
                ids = collect(&TEMU_COMPACT_RE, text);
            }
            ids
        }
        Platform::Ebay => collect(&EBAY_RE, text),
        Platform::AliExpress => {
            let mut ids = collect(&ALIEXPRESS_RE, text);
            if ids.is_empty() && !html.is_empty() {
                ids = collect(&ALIEXPRESS_JSON_RE, html);
            }
            ids
        }
        _ => Vec::new(),
    };

    // Generic fallback: a label followed by a token with at least one digit,
    // filtered through the UI-word blacklist.
    if ids.is_empty() {
        ids = GENERIC_RE
            .captures_iter(text)
            .map(|c| c[1].trim().to_string())
            .filter(|id| !id.is_empty() && !GENERIC_BLACKLIST.contains(&id.to_lowercase().as_str()))
            .collect();
    }

    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amazon_id() {
        let ids = extract_order_ids("Ordine n. 407-1234567-1234567 del 12 gennaio", Platform::Amazon, "");
        assert_eq!(ids, vec!["407-1234567-1234567"]);
    }

    #[test]
    fn test_temu_id_with_compact_fallback() {
        let ids = extract_order_ids("ordine PO-211-12345678901234", Platform::Temu, "");
        assert_eq!(ids, vec!["PO-211-12345678901234"]);

        let ids = extract_order_ids("ordine PO12345678901", Platform::Temu, "");
        assert_eq!(ids, vec!["PO12345678901"]);
    }

    #[test]
    fn test_ebay_id() {
        let ids = extract_order_ids("Order 12-34567-89012 confirmed", Platform::Ebay, "");
        assert_eq!(ids, vec!["12-34567-89012"]);
    }

    #[test]
    fn test_aliexpress_digits_and_json_fallback() {
        let ids = extract_order_ids("ordine 8123456789012345", Platform::AliExpress, "");
        assert_eq!(ids, vec!["8123456789012345"]);

        let ids = extract_order_ids("nessun id qui", Platform::AliExpress, r#"{"tradeOrderId":"8123456789012345"}"#);
        assert_eq!(ids, vec!["8123456789012345"]);
    }

    #[test]
    fn test_generic_fallback_requires_digit() {
        let ids = extract_order_ids("Ordine: ABC12345", Platform::Other, "");
        assert_eq!(ids, vec!["ABC12345"]);

        // Purely alphabetic tokens can't match the pattern.
        let ids = extract_order_ids("ordine spedito presto", Platform::Other, "");
        assert!(ids.is_empty());
    }

    #[test]
    fn test_generic_blacklist() {
        // Would match the shape, but it's a UI word next to "ordine".
        let ids = extract_order_ids("ordine: resi4you", Platform::Other, "");
        assert_eq!(ids, vec!["resi4you"]); // not blacklisted: contains digit and differs from bare word
        let ids = extract_order_ids("il tuo ordine X99-ABC arriva", Platform::Other, "");
        assert_eq!(ids, vec!["X99-ABC"]);
    }

    #[test]
    fn test_dedup_preserves_first_seen() {
        let text = "ordine 407-1234567-1234567 e ancora 407-1234567-1234567 poi 408-7654321-7654321";
        let ids = extract_order_ids(text, Platform::Amazon, "");
        assert_eq!(ids, vec!["407-1234567-1234567", "408-7654321-7654321"]);
    }

    #[test]
    fn test_no_cross_platform_leak() {
        // An Amazon-shaped id on a Temu page doesn't count.
        let ids = extract_order_ids("407-1234567-1234567", Platform::Temu, "");
        assert!(ids.is_empty());
    }
}
