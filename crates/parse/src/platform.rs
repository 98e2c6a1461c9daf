//! Storefront and page-kind classification.
//!
//! Pages are classified by substring markers (domains, CDN hostnames, DOM
//! marker strings) before any extraction runs. The detail/list distinction
//! is load-bearing: list pages populate their rows client-side, so the
//! static markup carries no usable order data and the parser must refuse
//! them instead of fabricating results.

use serde::{Deserialize, Serialize};

/// Known storefronts. `Other` is the catch-all for unrecognized markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Amazon,
    Temu,
    Ebay,
    AliExpress,
    Shein,
    Zalando,
    MediaWorld,
    Unieuro,
    Vinted,
    Subito,
    Other,
}

/// Marker table: first platform whose markers hit wins.
const MARKERS: &[(Platform, &[&str])] = &[
    (Platform::Amazon, &["amazon.it", "amazon.com", "amazon.co"]),
    (Platform::Temu, &["temu.com", "kwcdn.com"]),
    (Platform::Ebay, &["ebay.it", "ebay.com"]),
    (Platform::AliExpress, &["aliexpress", "alicdn.com"]),
    (Platform::Shein, &["shein.com"]),
    (Platform::Zalando, &["zalando.it", "zalando.com"]),
    (Platform::MediaWorld, &["mediaworld.it"]),
    (Platform::Unieuro, &["unieuro.it"]),
    (Platform::Vinted, &["vinted.it", "vinted.com"]),
    (Platform::Subito, &["subito.it"]),
];

impl Platform {
    /// Display label, also used for the order's `platform` column.
    pub fn as_label(&self) -> &'static str {
        match self {
            Platform::Amazon => "Amazon",
            Platform::Temu => "Temu",
            Platform::Ebay => "eBay",
            Platform::AliExpress => "AliExpress",
            Platform::Shein => "Shein",
            Platform::Zalando => "Zalando",
            Platform::MediaWorld => "MediaWorld",
            Platform::Unieuro => "Unieuro",
            Platform::Vinted => "Vinted",
            Platform::Subito => "Subito.it",
            Platform::Other => "Altro",
        }
    }

    /// Classify lowercased page source into a storefront.
    pub fn detect(html_lower: &str) -> Platform {
        for (platform, markers) in MARKERS {
            if markers.iter().any(|m| html_lower.contains(m)) {
                return *platform;
            }
        }
        Platform::Other
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Whether the page shows one order in full or a dynamic order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Detail,
    List,
    Unknown,
}

/// Detect whether this is a detail page or a list page.
///
/// Only Temu and Amazon expose reliable markers; everything else stays
/// `Unknown` and extraction proceeds on a best-effort basis.
pub fn detect_page_kind(html_lower: &str, platform: Platform) -> PageKind {
    match platform {
        Platform::Temu => {
            // bgt_orders = order list, bgt_order_detail = single order
            if html_lower.contains("bgt_order_detail") || html_lower.contains("order_detail") {
                PageKind::Detail
            } else if html_lower.contains("bgt_orders") {
                PageKind::List
            } else {
                PageKind::Unknown
            }
        }
        Platform::Amazon => {
            if html_lower.contains("order-details") || html_lower.contains("orderdetails") {
                PageKind::Detail
            } else if html_lower.contains("your-orders") || html_lower.contains("order-history") {
                PageKind::List
            } else {
                PageKind::Unknown
            }
        }
        _ => PageKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_platforms() {
        assert_eq!(Platform::detect("https://www.amazon.it/ordini"), Platform::Amazon);
        assert_eq!(Platform::detect("cdn img.kwcdn.com asset"), Platform::Temu);
        assert_eq!(Platform::detect("su ebay.it trovi"), Platform::Ebay);
        assert_eq!(Platform::detect("ae01.alicdn.com/kf/img"), Platform::AliExpress);
        assert_eq!(Platform::detect("it.shein.com/order"), Platform::Shein);
        assert_eq!(Platform::detect("www.vinted.it/member"), Platform::Vinted);
    }

    #[test]
    fn test_detect_fallback() {
        assert_eq!(Platform::detect("un negozio qualsiasi"), Platform::Other);
        assert_eq!(Platform::detect(""), Platform::Other);
    }

    #[test]
    fn test_first_marker_wins() {
        // Amazon markers are checked before Temu's.
        assert_eq!(Platform::detect("amazon.it e temu.com insieme"), Platform::Amazon);
    }

    #[test]
    fn test_temu_page_kinds() {
        assert_eq!(detect_page_kind("class=\"bgt_order_detail\"", Platform::Temu), PageKind::Detail);
        assert_eq!(detect_page_kind("class=\"bgt_orders\"", Platform::Temu), PageKind::List);
        assert_eq!(detect_page_kind("bgt_orders then bgt_order_detail", Platform::Temu), PageKind::Detail);
        assert_eq!(detect_page_kind("nessun marcatore", Platform::Temu), PageKind::Unknown);
    }

    #[test]
    fn test_amazon_page_kinds() {
        assert_eq!(detect_page_kind("/gp/css/order-details?orderID=", Platform::Amazon), PageKind::Detail);
        assert_eq!(detect_page_kind("/gp/css/your-orders/", Platform::Amazon), PageKind::List);
    }

    #[test]
    fn test_other_platforms_unknown() {
        assert_eq!(detect_page_kind("order-details", Platform::Ebay), PageKind::Unknown);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Platform::Ebay.as_label(), "eBay");
        assert_eq!(Platform::Other.as_label(), "Altro");
        assert_eq!(Platform::Subito.to_string(), "Subito.it");
    }
}
