//! Locale-aware date extraction.
//!
//! Order pages and carrier emails mix Italian and English month names with
//! numeric formats, so parsing is a cascade of patterns tried in order of
//! reliability. A missing year means the current one.

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

static DAY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s+([a-zA-Zàèéìòù]+)\s*(\d{4})?\b").expect("valid regex"));
static MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Zàèéìòù]+)\s+(\d{1,2})[,\s]*(\d{4})?\b").expect("valid regex"));
static DMY_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})\b").expect("valid regex"));
static YMD_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})\b").expect("valid regex"));

/// Month number from an Italian or English name or abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    match name {
        "gen" | "gennaio" | "jan" | "january" => Some(1),
        "feb" | "febbraio" | "february" => Some(2),
        "mar" | "marzo" | "march" => Some(3),
        "apr" | "aprile" | "april" => Some(4),
        "mag" | "maggio" | "may" => Some(5),
        "giu" | "giugno" | "jun" | "june" => Some(6),
        "lug" | "luglio" | "jul" | "july" => Some(7),
        "ago" | "agosto" | "aug" | "august" => Some(8),
        "set" | "sett" | "settembre" | "sep" | "september" => Some(9),
        "ott" | "ottobre" | "oct" | "october" => Some(10),
        "nov" | "novembre" | "november" => Some(11),
        "dic" | "dicembre" | "dec" | "december" => Some(12),
        _ => None,
    }
}

/// Extract the first plausible date, defaulting a missing year to today's.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    extract_date_with_year(text, Utc::now().year())
}

/// Cascade: "12 gennaio 2026" → "Jan 12, 2026" → "12/01/2026" → "2026-01-12".
pub fn extract_date_with_year(text: &str, default_year: i32) -> Option<NaiveDate> {
    day_month_name(text, default_year)
        .or_else(|| month_name_day(text, default_year))
        .or_else(|| dmy_numeric(text))
        .or_else(|| ymd_numeric(text))
}

fn day_month_name(text: &str, default_year: i32) -> Option<NaiveDate> {
    let captures = DAY_MONTH_RE.captures(text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month = month_number(&captures[2].to_lowercase())?;
    let year = captures
        .get(3)
        .and_then(|y| y.as_str().parse().ok())
        .unwrap_or(default_year);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_name_day(text: &str, default_year: i32) -> Option<NaiveDate> {
    let captures = MONTH_DAY_RE.captures(text)?;
    let month = month_number(&captures[1].to_lowercase())?;
    let day: u32 = captures[2].parse().ok()?;
    let year = captures
        .get(3)
        .and_then(|y| y.as_str().parse().ok())
        .unwrap_or(default_year);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn dmy_numeric(text: &str) -> Option<NaiveDate> {
    let captures = DMY_NUMERIC_RE.captures(text)?;
    let day: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let mut year: i32 = captures[3].parse().ok()?;
    if captures[3].len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn ymd_numeric(text: &str) -> Option<NaiveDate> {
    let captures = YMD_NUMERIC_RE.captures(text)?;
    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
