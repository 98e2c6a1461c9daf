//! Markup stripping and whitespace normalization.
//!
//! Turns raw page source into a newline-separated line sequence the
//! extraction heuristics can run on. Block-level tags become line breaks so
//! the visual structure of the page survives into the plain text.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:div|p|br|tr|li|h[1-6]|header|footer)[^>]*>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// The only entities pages in the wild actually use for order data.
const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
    ("&euro;", "€"),
    ("&#x27;", "'"),
];

/// Strip markup and collapse whitespace into a structured line sequence.
///
/// Script and style blocks are removed outright; block-level open tags
/// become newlines; every other tag becomes a space; the fixed entity set is
/// decoded; runs of spaces collapse and blank lines are dropped.
///
/// Total function: malformed or unterminated tags are left in place rather
/// than failing.
pub fn normalize(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = SCRIPT_RE.replace_all(html, " ");
    let text = STYLE_RE.replace_all(&text, " ");
    let text = BLOCK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, " ");

    let mut text = text.into_owned();
    for (entity, ch) in ENTITIES {
        text = text.replace(entity, ch);
    }

    text.split('\n')
        .map(|line| SPACE_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_strips_script_and_style() {
        let html = "<p>Ordine</p><script>var x = 1;</script><style>.a { color: red }</style><p>Confermato</p>";
        let text = normalize(html);
        assert!(text.contains("Ordine"));
        assert!(text.contains("Confermato"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_block_tags_become_lines() {
        let html = "<div>Prima riga</div><div>Seconda riga</div>";
        assert_eq!(normalize(html), "Prima riga\nSeconda riga");
    }

    #[test]
    fn test_inline_tags_become_spaces() {
        let html = "<span>Cavo</span><b>USB</b>";
        assert_eq!(normalize(html), "Cavo USB");
    }

    #[test]
    fn test_entity_decoding() {
        let html = "<p>Tom &amp; Jerry &euro;19,99 &quot;nuovo&quot;&nbsp;&#39;ok&#x27;</p>";
        assert_eq!(normalize(html), "Tom & Jerry €19,99 \"nuovo\" 'ok'");
    }

    #[test]
    fn test_whitespace_collapse() {
        let html = "<p>troppi     spazi\t\tqui</p>";
        assert_eq!(normalize(html), "troppi spazi qui");
    }

    #[test]
    fn test_blank_lines_dropped() {
        let html = "<div>uno</div><div>   </div><div>due</div>";
        assert_eq!(normalize(html), "uno\ndue");
    }

    #[test]
    fn test_unterminated_script_keeps_text() {
        // No closing tag: the block regex cannot match, the tag itself is
        // still removed, the content survives.
        let html = "<script>orfano";
        let text = normalize(html);
        assert_eq!(text, "orfano");
    }

    #[test]
    fn test_malformed_tag_left_in_place() {
        let html = "testo <div class=\"aperto normale";
        let text = normalize(html);
        assert!(text.contains("testo"));
        // Never panics; the broken tag fragment is simply kept.
        assert!(text.contains("aperto"));
    }

    #[test]
    fn test_case_insensitive_tags() {
        let html = "<DIV>maiuscolo</DIV><SCRIPT>x</SCRIPT>";
        let text = normalize(html);
        assert_eq!(text, "maiuscolo");
    }
}
