//! AliExpress order-detail item extraction.
//!
//! Candidates are collected from every source the page offers and scored:
//! JSON product fields highest, DOM title/alt attributes lower, raw
//! heuristic lines last. The best-scoring unique descriptions win, capped at
//! two because an AliExpress detail page shows at most a couple of items per
//! shipment.

use super::LineItem;
use regex::Regex;
use std::sync::LazyLock;

/// Recommendation strips below the order; everything after them is ignored.
const STOP_WORDS: &[&str] = &[
    "più da amare",
    "more to love",
    "consigliati per te",
    "recommended for you",
    "visti di recente",
    "recently viewed",
    "prodotti sponsorizzati",
    "might also like",
];

/// UI and service vocabulary that disqualifies a candidate outright.
const BLACKLIST: &[&str] = &[
    "aiuto",
    "account",
    "registrati",
    "carrello",
    "lista",
    "privacy",
    "copyright",
    "assistenza",
    "supporto",
    "shipping",
    "payment",
    "order detail",
    "checkout",
    "aliexpress",
    "customer service",
    "store name",
    "contact seller",
    "dettagli",
    "riepilogo",
    "totale",
    "iva",
    "metodo di pagamento",
    "spedizione",
    "indirizzo",
    "impostazioni",
    "notifiche",
    "messaggi",
    "coupon",
    "monete",
    "centro",
];

/// A detail page shows one or two items per shipment, never more.
const MAX_ITEMS: usize = 2;

const SCORE_JSON_PRODUCT: u32 = 100;
const SCORE_JSON_NAME: u32 = 70;
const SCORE_HEURISTIC: u32 = 10;

static JSON_RES: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r#""(?:product|goods)Name"\s*:\s*"([^"]{10,250})""#).expect("valid regex"), SCORE_JSON_PRODUCT),
        (Regex::new(r#""name"\s*:\s*"([^"]{20,250})""#).expect("valid regex"), SCORE_JSON_NAME),
    ]
});

static DOM_RES: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r#"(?i)data-pl="product-title"[^>]*>([^<]{10,250})<"#).expect("valid regex"), 80),
        (
            Regex::new(r#"(?i)class="[^"]*(?:product-name|item-title|product-title|title--line-one)[^"]*"[^>]*>([^<]{10,250})<"#)
                .expect("valid regex"),
            60,
        ),
        (Regex::new(r#"(?i)<a[^>]*title=["']([^"'<>]{20,250})["']"#).expect("valid regex"), 50),
        (Regex::new(r#"(?i)<img[^>]*alt=["']([^"'<>]{20,250})["']"#).expect("valid regex"), 40),
    ]
});

static NUMERIC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s€.,/|:()+-]+$").expect("valid regex"));
static QTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:quantit[àa]|qty|q\.t[àa])[:\s]*(\d+)").expect("valid regex"));
static UNICODE_ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("valid regex"));

struct Candidate {
    description: String,
    score: u32,
}

fn decode_unicode_escapes(s: &str) -> String {
    if !s.contains("\\u") {
        return s.to_string();
    }
    UNICODE_ESCAPE_RE
        .replace_all(s, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn blacklisted(name_lower: &str) -> bool {
    BLACKLIST.iter().any(|kw| name_lower.contains(kw))
}

pub(crate) fn extract(_text: &str, html: &str) -> Vec<LineItem> {
    // Truncate at the first recommendation strip so "more to love" products
    // can't outscore the actual purchase.
    let lower = html.to_lowercase();
    let cut = STOP_WORDS.iter().filter_map(|sw| lower.find(sw)).min().unwrap_or(html.len());
    let search_html = html.get(..cut).unwrap_or(html);

    let mut candidates: Vec<Candidate> = Vec::new();

    for (re, score) in JSON_RES.iter() {
        for captures in re.captures_iter(search_html) {
            let name = decode_unicode_escapes(&captures[1]);
            let name = crate::normalize::normalize(&name).trim().to_string();
            let len = name.chars().count();
            if len <= 20 || len >= 255 {
                continue;
            }
            if blacklisted(&name.to_lowercase()) || NUMERIC_LINE_RE.is_match(&name) {
                continue;
            }
            candidates.push(Candidate { description: name, score: *score });
        }
    }

    for (re, score) in DOM_RES.iter() {
        for captures in re.captures_iter(search_html) {
            let name = crate::normalize::normalize(&captures[1]).trim().to_string();
            let len = name.chars().count();
            if len <= 25 || len >= 250 {
                continue;
            }
            if blacklisted(&name.to_lowercase()) || NUMERIC_LINE_RE.is_match(&name) {
                continue;
            }
            candidates.push(Candidate { description: name, score: *score });
        }
    }

    if candidates.is_empty() {
        let clean = crate::normalize::normalize(search_html);
        for line in clean.split('\n').map(str::trim) {
            let len = line.chars().count();
            if len <= 30 || len >= 180 || NUMERIC_LINE_RE.is_match(line) {
                continue;
            }
            let lower = line.to_lowercase();
            if blacklisted(&lower) || lower.contains("ordine") || lower.contains("tracking") {
                continue;
            }
            candidates.push(Candidate { description: line.to_string(), score: SCORE_HEURISTIC });
        }
    }

    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    let mut items: Vec<LineItem> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for candidate in candidates {
        if seen.contains(&candidate.description) {
            continue;
        }
        seen.push(candidate.description.clone());
        items.push(LineItem::new(candidate.description, 1, "AliExpress"));
        if items.len() >= MAX_ITEMS {
            break;
        }
    }

    if let Some(qty) = QTY_RE.captures(search_html).and_then(|c| c[1].parse().ok()) {
        for item in &mut items {
            item.quantity = qty;
        }
    }

    if items.is_empty() {
        return vec![LineItem::new("Articolo AliExpress (da completare)", 1, "AliExpress")];
    }
    items
}
