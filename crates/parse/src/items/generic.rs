//! Fallback item extraction for unrecognized storefronts.

use super::LineItem;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[class*="product-name"], [class*="product_name"], [class*="item-name"], [class*="item_name"],
           [class*="product-title"], [class*="product_title"], [class*="goods-name"], [class*="goods_name"]"#,
    )
    .expect("valid selector")
});
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3, h4").expect("valid selector"));

static SELLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:venduto\s+da|sold\s+by|venditore|seller)[:\s]+([^\n<]{2,60})").expect("valid regex")
});

const MAX_ITEMS: usize = 5;

pub(crate) fn extract(text: &str, html: &str) -> Vec<LineItem> {
    let document = Html::parse_document(html);
    let mut items: Vec<LineItem> = Vec::new();

    for element in document.select(&NAME_SELECTOR) {
        let name = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
        if name.chars().count() > 5 {
            items.push(LineItem::new(name, 1, ""));
        }
        if items.len() >= MAX_ITEMS {
            break;
        }
    }

    if items.is_empty() {
        for element in document.select(&HEADING_SELECTOR) {
            let name = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
            let len = name.chars().count();
            if len > 10 && len < 120 {
                items.push(LineItem::new(name, 1, ""));
            }
            if items.len() >= MAX_ITEMS {
                break;
            }
        }
    }

    let seller = SELLER_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    for item in &mut items {
        item.seller = seller.clone();
    }

    if items.is_empty() {
        return vec![LineItem::new("Articolo (da completare)", 1, seller)];
    }
    items
}
