//! Tracking number and carrier extraction.
//!
//! An ordered cascade of (pattern, carrier) pairs, specific carrier formats
//! first and the permissive alphanumeric fallback last. Adding a carrier
//! means adding one table row. A search anchored to an explicit tracking
//! label runs before the full-text scan, and anything shaped like an Amazon
//! ASIN is rejected everywhere to keep product codes out of the tracking
//! column.

use regex::Regex;
use std::sync::LazyLock;

/// Carrier-specific shapes and JSON tracking keys, highest confidence first.
const SPECIFIC_PATTERNS: &[(&str, Option<&str>)] = &[
    (r"\b(9C[A-Z0-9]{10,12})\b", Some("Temu Carrier")),
    (r"\b(950C[A-Z0-9]{8,15})\b", Some("Poste Italiane / SDA")),
    (r"\b(RTZ[A-Z0-9]{10,15})\b", Some("AliExpress / Cainiao")),
    (r#"["']tracking(?:No|Number|_no|_number)["']\s*:\s*["']([A-Z0-9]+)["']"#, None),
    (r#"["']express(?:No|Number|_no|_number)["']\s*:\s*["']([A-Z0-9]+)["']"#, None),
    (r#"["']shipping(?:No|Number|_no|_number)["']\s*:\s*["']([A-Z0-9]+)["']"#, None),
];

/// Generic shapes tried after the labelled search, broadest last.
const FALLBACK_PATTERNS: &[(&str, Option<&str>)] = &[
    (r"(1Z[A-Z0-9]{16})", Some("UPS")),
    (r"\b([0-9]{10,12})\b", None),
    (r"\b(0034\d{16})\b", Some("Poste Italiane")),
    (r"\b(JD\d{18})\b", Some("DHL")),
    (r"\b(GM\d{16,18})\b", Some("GLS")),
    (r"\b(BRT\d{10,14})\b", Some("BRT")),
    (r"\b([A-Z]{2}\d{9}[A-Z]{2})\b", Some("Poste/Generic")),
    (r"\b(\d{12,14})\b", None),
    (r"\b([A-Z0-9]{10,25})\b", None),
];

static SPECIFIC: LazyLock<Vec<(Regex, Option<&'static str>)>> = LazyLock::new(|| compile(SPECIFIC_PATTERNS));
static FALLBACK: LazyLock<Vec<(Regex, Option<&'static str>)>> = LazyLock::new(|| compile(FALLBACK_PATTERNS));

fn compile(table: &[(&str, Option<&'static str>)]) -> Vec<(Regex, Option<&'static str>)> {
    table
        .iter()
        .map(|(pattern, carrier)| (Regex::new(pattern).expect("valid regex"), *carrier))
        .collect()
}

static CONTEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:tracking|tracciamento|codice\s+spedizione)\W*([A-Z0-9]{8,30})").expect("valid regex"));

static LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:spedizione|tracking|vettore|codice|n\.|nr\.)(?:\s+di)?[:\s]+([A-Z]*[0-9][A-Z0-9]{7,25})")
        .expect("valid regex")
});

static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]*[0-9][A-Z0-9]{9,25})\s+(?:tracciare|traking|visualizza|copia)").expect("valid regex"));

static ASIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^B0[A-Z0-9]{8}$").expect("valid regex"));

/// Product-code labels that must not feed the labelled tracking pattern.
const LABEL_NOISE: &[&str] = &["produttore", "modello", "articolo", "prodotto", "referenza", "asin"];

fn looks_like_asin(candidate: &str) -> bool {
    ASIN_RE.is_match(candidate)
}

fn full_match(re: &Regex, candidate: &str) -> bool {
    re.find(candidate).is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

fn scan_one(re: &Regex, carrier: Option<&'static str>, text: &str, html: &str) -> Option<(String, Option<&'static str>)> {
    let captures = re.captures(text).or_else(|| if html.is_empty() { None } else { re.captures(html) })?;
    let candidate = captures[1].to_string();
    if looks_like_asin(&candidate) {
        return None;
    }
    Some((candidate, carrier))
}

/// Extract (tracking number, carrier) from the normalized text and, when the
/// text yields nothing, the raw markup.
///
/// The carrier is None when only a generic shape matched; callers may still
/// infer it from platform or folder context.
pub fn extract_tracking(text: &str, html: &str) -> Option<(String, Option<&'static str>)> {
    // A candidate sitting right after an explicit tracking label beats any
    // full-text pattern hit.
    if let Some(captures) = CONTEXT_RE.captures(text) {
        let candidate = &captures[1];
        if !looks_like_asin(candidate) {
            for (re, carrier) in SPECIFIC.iter().chain(FALLBACK.iter()) {
                if full_match(re, candidate) {
                    return Some((candidate.to_string(), *carrier));
                }
            }
            if candidate.len() >= 10 {
                return Some((candidate.to_string(), None));
            }
        }
    }

    for (re, carrier) in SPECIFIC.iter() {
        if let Some(hit) = scan_one(re, *carrier, text, html) {
            return Some(hit);
        }
    }

    // Labelled generic: the label must not actually belong to a product-code
    // field ("codice articolo", "n. modello", ...).
    for haystack in [text, html] {
        for captures in LABELED_RE.captures_iter(haystack) {
            let start = captures.get(0).map(|m| m.start()).unwrap_or(0);
            let before = &haystack[..start];
            if LABEL_NOISE.iter().any(|w| before.to_lowercase().trim_end().ends_with(w)) {
                continue;
            }
            let candidate = captures[1].to_string();
            if !looks_like_asin(&candidate) {
                return Some((candidate, None));
            }
        }
    }

    for haystack in [text, html] {
        if let Some(captures) = SUFFIX_RE.captures(haystack) {
            let candidate = captures[1].to_string();
            if !looks_like_asin(&candidate) {
                return Some((candidate, None));
            }
        }
    }

    for (re, carrier) in FALLBACK.iter() {
        if let Some(hit) = scan_one(re, *carrier, text, html) {
            return Some(hit);
        }
    }

    None
}
