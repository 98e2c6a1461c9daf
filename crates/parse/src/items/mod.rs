//! Per-platform line-item extraction strategies.
//!
//! Each storefront lays out its order page differently, so extraction is a
//! strategy per platform rather than one heuristic with branches. Adding a
//! platform means adding a module and one dispatch arm. Every strategy
//! guarantees at least one item: when nothing survives the filters it
//! returns a "(da completare)" placeholder so the user always gets a row to
//! correct by hand.

mod aliexpress;
mod amazon;
mod generic;
mod temu;

use crate::platform::Platform;

/// One extracted line item of a purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub seller: String,
}

impl LineItem {
    pub(crate) fn new(description: impl Into<String>, quantity: u32, seller: impl Into<String>) -> Self {
        Self { description: description.into(), quantity, seller: seller.into() }
    }
}

/// Run the platform's extraction strategy. Never returns an empty list.
pub fn extract_items(platform: Platform, text: &str, html: &str) -> Vec<LineItem> {
    match platform {
        Platform::Amazon => amazon::extract(text, html),
        Platform::Temu => temu::extract(text, html),
        Platform::AliExpress => aliexpress::extract(text, html),
        _ => generic::extract(text, html),
    }
}

/// Clamp a byte offset down to the nearest char boundary.
///
/// Offsets computed by adding fixed window sizes to match positions can land
/// mid-codepoint in non-ASCII markup.
pub(crate) fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
