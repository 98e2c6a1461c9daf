//! Amazon order-detail item extraction.
//!
//! Precision ladder: the `data-component="itemTitle"` anchors Amazon renders
//! for each shipment item, then the item image alt text, then a line-shape
//! heuristic over the normalized text.

use super::LineItem;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-component="itemTitle"] a"#).expect("valid selector"));
static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-component="itemImage"] img"#).expect("valid selector"));

static SELLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:venduto\s+da|sold\s+by|venditore)[:\s]+([^\n<]{2,60})").expect("valid regex"));
static QTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:quantit[àa]|qty|q\.t[àa]\.?|pz\.?)[:\s]*(\d+)").expect("valid regex"));
static NUMERIC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s€.,/-]+$").expect("valid regex"));

/// Navigation chrome that shows up among the anchored titles.
const TITLE_NOISE: &[&str] = &["mio account", "miei ordini", "accedi", " prime"];

/// UI words that disqualify a heuristic line.
const LINE_NOISE: &[&str] = &[
    "accedi",
    "account",
    "carrello",
    "ordini",
    "resi",
    "aiuto",
    "cerca",
    "amazon",
    "prime",
    "offerte",
    "copyright",
    "privacy",
    "condizioni",
    "cookie",
    "pubblicità",
    "preferenze",
];

const HEURISTIC_CAP: usize = 5;

pub(crate) fn extract(text: &str, html: &str) -> Vec<LineItem> {
    let document = Html::parse_document(html);
    let mut items: Vec<LineItem> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for element in document.select(&TITLE_SELECTOR) {
        let title = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
        if title.chars().count() <= 10 || seen.contains(&title) {
            continue;
        }
        let lower = title.to_lowercase();
        if TITLE_NOISE.iter().any(|kw| lower.contains(kw)) {
            continue;
        }
        seen.push(title.clone());
        items.push(LineItem::new(title, 1, ""));
    }

    if items.is_empty() {
        for element in document.select(&IMAGE_SELECTOR) {
            let Some(alt) = element.value().attr("alt") else { continue };
            let alt = alt.trim().to_string();
            let len = alt.chars().count();
            if len < 10 || len > 250 || seen.contains(&alt) {
                continue;
            }
            seen.push(alt.clone());
            items.push(LineItem::new(alt, 1, ""));
        }
    }

    // Last resort: product names tend to be mid-length mixed-content lines.
    if items.is_empty() {
        for line in text.split('\n').map(str::trim) {
            let len = line.chars().count();
            if len <= 15 || len >= 200 || NUMERIC_LINE_RE.is_match(line) {
                continue;
            }
            let lower = line.to_lowercase();
            if LINE_NOISE.iter().any(|kw| lower.contains(kw)) {
                continue;
            }
            if seen.contains(&line.to_string()) {
                continue;
            }
            seen.push(line.to_string());
            items.push(LineItem::new(line, 1, ""));
            if items.len() >= HEURISTIC_CAP {
                break;
            }
        }
    }

    let seller = SELLER_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    for item in &mut items {
        if item.seller.is_empty() {
            item.seller = seller.clone();
        }
        if let Some(qty) = QTY_RE.captures(&item.description).and_then(|c| c[1].parse().ok()) {
            item.quantity = qty;
        }
    }

    if items.is_empty() {
        return vec![LineItem::new("Articolo Amazon (da completare)", 1, seller)];
    }
    items
}
