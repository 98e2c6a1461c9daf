//! Mailbox folder selection policy.
//!
//! Scanning every folder of a mailbox is slow and some servers drop
//! connections that try. Selection is driven by what's actually in flight:
//! the inbox always comes first, then folders named after a platform with
//! undelivered orders, then anything that smells like a shipping folder,
//! capped at the configured maximum.

use chrono::{Datelike, NaiveDate};

/// Folder-name fragments per platform, lowercased.
const PLATFORM_ALIASES: &[(&str, &[&str])] = &[
    ("amazon", &["amazon"]),
    ("temu", &["temu"]),
    ("ebay", &["ebay"]),
    ("too good to go", &["too good to go", "too good t go", "tgtg", "magico sacchetto"]),
    ("aliexpress", &["aliexpress", "cainiao"]),
    ("vinted", &["vinted"]),
    ("shein", &["shein"]),
    ("poste italiane", &["poste", "sda"]),
    ("ups", &["ups"]),
    ("dhl", &["dhl"]),
    ("gls", &["gls"]),
    ("brt", &["brt"]),
];

const GENERIC_KEYWORDS: &[&str] = &["order", "ordine", "spedizion"];

/// Aliases for a platform name, falling back to the name itself.
fn aliases_for(platform_lower: &str) -> Vec<&str> {
    PLATFORM_ALIASES
        .iter()
        .find(|(name, _)| *name == platform_lower)
        .map(|(_, aliases)| aliases.to_vec())
        .unwrap_or_else(|| vec![platform_lower])
}

/// Pick which folders a sync pass will scan, inbox first, capped.
pub fn select_folders(all_folders: &[String], active_platforms: &[String], max_folders: usize) -> Vec<String> {
    let platform_lowers: Vec<String> = active_platforms.iter().map(|p| p.trim().to_lowercase()).collect();

    let mut selected: Vec<String> = Vec::new();
    for folder in all_folders {
        let lower = folder.to_lowercase();

        let platform_hit = platform_lowers
            .iter()
            .any(|platform| aliases_for(platform).iter().any(|alias| lower.contains(alias)));
        if platform_hit {
            selected.push(folder.clone());
            continue;
        }

        // Generic shipping folders, but not inbox subfolders (those get
        // covered by the inbox scan itself).
        if GENERIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) && !lower.contains("inbox/") {
            selected.push(folder.clone());
        }
    }

    // Inbox always first: most platforms deliver there.
    let inbox = all_folders
        .iter()
        .find(|f| f.to_lowercase().contains("inbox"))
        .cloned()
        .unwrap_or_else(|| "INBOX".to_string());
    selected.retain(|f| *f != inbox);
    selected.insert(0, inbox);

    selected.truncate(max_folders);
    selected
}

const MONTHS_EN: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Format a date as an IMAP SINCE token.
///
/// IMAP requires English month abbreviations; locale-dependent formatting
/// breaks on non-English hosts, so the month table is fixed here.
pub fn format_since_date(date: NaiveDate) -> String {
    format!("{:02}-{}-{}", date.day(), MONTHS_EN[date.month0() as usize], date.year())
}
