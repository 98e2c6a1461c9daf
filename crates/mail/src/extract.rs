//! Per-message signal extraction.
//!
//! The same layered regex heuristics as the HTML parser, tuned for carrier
//! and platform emails. Subject-line matches outrank body matches: subjects
//! say what happened, bodies routinely say what *will* happen ("your order
//! will be delivered on..."), which must never read as a delivery event.

use crate::session::MessageHeader;
use regex::Regex;
use std::sync::LazyLock;
use traccia_core::{OrderSignal, Status};

/// Header-pass relevance filter: any hit and the body is worth fetching.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "spedito",
    "consegnato",
    "tracking",
    "delivery",
    "shipped",
    "ordine",
    "order",
    "acquisto",
    "delivered",
    "dispatched",
    "transito",
    "transit",
    "partito",
    "consegna",
    "too good to go",
    "too good t go",
    "to good to go",
    "assegnazion",
    "sacchetto",
    "ritiro",
    "spedizione",
    "tgtg",
];

const TGTG_MARKERS: &[&str] = &["too good to go", "to good to go", "tgtg"];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static AMAZON_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{3}-\d{7}-\d{7})").expect("valid regex"));
static TEMU_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(PO-\d{3}-\d{15,20})").expect("valid regex"));
static EBAY_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{2}-\d{5}-\d{5})").expect("valid regex"));
static TGTG_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:ID ordine|Order ID|ordine|prenotazione|spedizione|sacchetto):?.*?\b([a-z0-9]{8,15})\b")
        .expect("valid regex")
});

static TRACKING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(1Z[A-Z0-9]{16})", r"(\d{10,14})", r"(0034\d{16})", r"([A-Z0-9]{10,25})"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Strip markup from an email body the cheap way; carrier emails are mostly
/// text with light HTML wrapping.
pub fn strip_tags(body: &str) -> String {
    TAG_RE.replace_all(body, "").into_owned()
}

/// Whether a message's subject (or its folder) makes it worth a body fetch.
pub fn is_relevant(subject: &str, folder: &str) -> bool {
    let subject_lower = subject.to_lowercase();
    if contains_any(&subject_lower, RELEVANCE_KEYWORDS) {
        return true;
    }
    // Anything filed in a TGTG folder counts even with an opaque subject.
    let folder_lower = folder.to_lowercase();
    folder_lower.contains("too good to go") || folder_lower.contains("tgtg")
}

/// Resolve the delivery status a message reports, if any.
///
/// Order of authority: subject keywords, then (suppressed for confirmation
/// emails) restrictive past-tense body phrases, then weaker body keywords,
/// then the Too-Good-To-Go remapping, and finally the problem override,
/// which beats everything.
fn extract_status(subject_lower: &str, body_lower: &str, carrier: &str) -> Option<Status> {
    let mut status = if contains_any(subject_lower, &["consegnato", "delivered", "consegna effettuata", "handed over"]) {
        Some(Status::Delivered)
    } else if contains_any(subject_lower, &["in consegna", "out for delivery", "arriverà oggi"]) {
        Some(Status::OutForDelivery)
    } else if contains_any(subject_lower, &["spedito", "shipped", "invio", "dispatched", "sent", "partito"]) {
        Some(Status::Shipped)
    } else {
        None
    };

    let is_confirmation =
        contains_any(subject_lower, &["conferma", "ricevuto", "grazie", "thank you", "confirmed", "riepilogo"]);

    if status.is_none() {
        if contains_any(
            body_lower,
            &["consegna effettuata", "consegnato il", "consegnata il", "stato consegnato", "stata consegnata", "delivered on"],
        ) {
            // Only an explicit past-tense phrase counts, and not from a
            // confirmation email ("will be delivered on...").
            if !is_confirmation {
                status = Some(Status::Delivered);
            }
        } else if contains_any(body_lower, &["in consegna", "out for delivery", "today", "oggi"]) {
            status = Some(Status::OutForDelivery);
        } else if contains_any(body_lower, &["in transito", "in transit", "at sorting", "departed", "assegnato", "assegnazione"]) {
            status = Some(Status::InTransit);
        } else if contains_any(body_lower, &["spedito", "shipped", "invio", "dispatched", "sent", "in spedizione"]) {
            status = Some(Status::Shipped);
        }
    }

    // TGTG reservations speak their own language: "saved" means picked up,
    // a booking means it's in progress, and silence still implies progress.
    if carrier == "Too Good To Go" {
        let combined_hit = |keywords: &[&str]| contains_any(subject_lower, keywords) || contains_any(body_lower, keywords);
        if combined_hit(&[
            "grazie per aver salvato",
            "ordine completato",
            "ritirato",
            "sacchetto salvato",
            "salvato del cibo",
            "consegnato",
            "consegnata",
        ]) {
            status = Some(Status::Delivered);
        } else if combined_hit(&["confermato", "prenotazione", "magico sacchetto", "non dimenticare", "ritiro", "preparato"]) {
            status = Some(Status::InTransit);
        }
        if status.is_none() {
            status = Some(Status::InTransit);
        }
    }

    if status.is_none() && is_confirmation {
        status = Some(Status::InTransit);
    }

    let problem_keywords = &["eccezione", "problema", "ritardo", "exception", "delay", "failure"];
    if contains_any(subject_lower, problem_keywords) || contains_any(body_lower, problem_keywords) {
        status = Some(Status::Problem);
    }

    status
}

/// Extract an order signal from one fetched message.
pub fn extract_signal(folder: &str, header: &MessageHeader, raw_body: &str) -> OrderSignal {
    let body = strip_tags(raw_body);
    let subject = header.subject.as_str();
    let subject_lower = subject.to_lowercase();
    let body_lower = body.to_lowercase();
    let folder_lower = folder.to_lowercase();

    let content = format!("{subject} {body}");
    let content_lower = content.to_lowercase();

    let mut carrier = if contains_any(&content_lower, TGTG_MARKERS)
        || folder_lower.contains("too good to go")
        || folder_lower.contains("tgtg")
    {
        "Too Good To Go"
    } else if content_lower.contains("amazon") {
        "Amazon"
    } else if content_lower.contains("temu") {
        "Temu"
    } else if content_lower.contains("ebay") {
        "eBay"
    } else {
        ""
    };

    let mut site_order_id = String::new();
    if let Some(captures) = AMAZON_ID_RE.captures(&content) {
        site_order_id = captures[1].to_string();
        carrier = "Amazon";
    } else if let Some(captures) = TEMU_ID_RE.captures(&content) {
        site_order_id = captures[1].to_string();
        carrier = "Temu";
    } else if let Some(captures) = EBAY_ID_RE.captures(&content) {
        site_order_id = captures[1].to_string();
        carrier = "eBay";
    } else if carrier == "Too Good To Go"
        && let Some(captures) = TGTG_ID_RE.captures(&content)
    {
        // TGTG reservation codes are plain words; without the carrier gate
        // this pattern would grab ordinary prose next to "ordine".
        site_order_id = captures[1].to_string();
    }

    let mut tracking = String::new();
    'patterns: for re in TRACKING_RES.iter() {
        for m in re.captures_iter(&content) {
            let candidate = &m[1];
            // An order id fragment is not a tracking number.
            if !site_order_id.is_empty() && site_order_id.contains(candidate) {
                continue;
            }
            // Accept only candidates the message itself vouches for.
            if subject.contains(candidate) || contains_any(&content_lower, &["tracking", "spedizione"]) {
                tracking = candidate.to_string();
                break 'patterns;
            }
        }
    }

    let status = extract_status(&subject_lower, &body_lower, carrier);

    let excerpt: String = body.chars().take(1000).collect();
    let estimated_delivery = traccia_parse::dates::extract_date(&excerpt);

    OrderSignal {
        site_order_id,
        tracking_number: tracking,
        carrier: carrier.to_string(),
        status,
        estimated_delivery,
        source_id: format!("{folder}_{}", header.id),
        subject: subject.to_string(),
        excerpt,
        ..Default::default()
    }
}
