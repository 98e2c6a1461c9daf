//! Temu order-detail item extraction.
//!
//! Temu pages captured from the browser embed their data as JSON blobs in
//! the markup, so the primary source is `goodsList`-shaped arrays, with a
//! context check to skip the "recommended for you" blocks that share the
//! same shape. Direct DOM scraping in the window after the PO number is the
//! fallback.

use super::{LineItem, floor_char_boundary};
use regex::Regex;
use std::sync::LazyLock;

static PO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bPO-\d{3}-\d{10,25}\b").expect("valid regex"));
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\\?["'](?:package|goods|order|item)_?_?list\\?["']\s*:\s*\[(.*?)\]"#).expect("valid regex")
});
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\\?["'](?:goods|product|item)(?:Name|_name|Title|_title)\\?["']\s*[:=]\s*\\?["']([^"'\\]{5,200})\\?["']"#)
        .expect("valid regex")
});
static QTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\\?["'](?:quantity|qty|goodsNum|goods_num)\\?["']\s*:\s*(\d+)"#).expect("valid regex"));
static OBJECT_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\}\s*,\s*\{").expect("valid regex"));

static SCRAP_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)class="[^"]*goods-name[^"]*"[^>]*>([^<]{10,150})<"#,
        r#"(?i)class="[^"]*item-title[^"]*"[^>]*>([^<]{10,150})<"#,
        r#"(?i)class="[^"]*product-title[^"]*"[^>]*>([^<]{10,150})<"#,
        r#"(?i)alt=["']([^"'<>]{10,120})["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Markers that flag a `goodsList`-shaped block as a recommendation strip.
const CONTEXT_NOISE: &[&str] = &["suggest", "recommend", "rec_list", "recently", "visti", "piacere", "recent_view"];

/// Junk that survives the JSON name filter.
const NAME_NOISE: &[&str] = &["privacy", "cookie", "copyright", "javascript", "localeswitch"];

/// Navigation chrome caught by the DOM fallback.
const NAV_NOISE: &[&str] = &["home", "cart", "search", "back", "temu", "logo", "help", "account", "sign in"];

/// Window after the PO number scanned by the DOM fallback.
const SCRAP_WINDOW: usize = 200_000;

fn unescape(name: &str) -> String {
    name.replace("\\u002F", "/").replace("\\\"", "\"")
}

pub(crate) fn extract(_text: &str, html: &str) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let po_match = PO_RE.find(html);
    if po_match.is_none() {
        tracing::warn!("no Temu order id in page source");
    }

    for list_match in LIST_RE.captures_iter(html) {
        let Some(whole) = list_match.get(0) else { continue };
        // Peek around the block: recommendation strips use the same keys.
        let ctx_start = floor_char_boundary(html, whole.start().saturating_sub(100));
        let ctx_end = floor_char_boundary(html, whole.end() + 100);
        let context = html[ctx_start..ctx_end].to_lowercase();
        if CONTEXT_NOISE.iter().any(|m| context.contains(m)) {
            continue;
        }

        let block = &list_match[1];
        for object in OBJECT_SPLIT_RE.split(block) {
            let Some(name_match) = NAME_RE.captures(object) else { continue };
            let name = unescape(name_match[1].trim());
            if seen.contains(&name) {
                continue;
            }
            let lower = name.to_lowercase();
            if NAME_NOISE.iter().any(|k| lower.contains(k)) {
                continue;
            }

            let quantity = QTY_RE.captures(object).and_then(|c| c[1].parse().ok()).unwrap_or(1);
            seen.push(name.clone());
            items.push(LineItem::new(name, quantity, "Temu"));
        }
    }

    // JSON extraction came up dry: scrape the DOM after the order id, where
    // the purchased items live (recommendations render before it or far
    // below the window).
    if items.is_empty() {
        let start = po_match.map(|m| m.start()).unwrap_or(0);
        let end = floor_char_boundary(html, start.saturating_add(SCRAP_WINDOW));
        let search_area = &html[floor_char_boundary(html, start)..end];

        for re in SCRAP_RES.iter() {
            for captures in re.captures_iter(search_area) {
                let name = captures[1].trim().to_string();
                if name.chars().count() <= 10 || seen.contains(&name) {
                    continue;
                }
                let lower = name.to_lowercase();
                if NAV_NOISE.iter().any(|k| lower.contains(k)) {
                    continue;
                }
                seen.push(name.clone());
                items.push(LineItem::new(name, 1, "Temu"));
            }
        }
    }

    if items.is_empty() {
        return vec![LineItem::new("Articolo Temu (da completare)", 1, "Temu")];
    }
    items
}
