//! Paragraph and heading fragments of a regulation document.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Content fragments must be longer than this many characters.
pub const MIN_CONTENT_CHARS: usize = 5;

/// Heading fragments must be longer than this many characters.
pub const MIN_HEADING_CHARS: usize = 3;

/// `<P>` or `<HEAD>` blocks in document order; group 1 is content, group 2 a heading.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<P(?:\s[^>]*)?>(.*?)</P>|<HEAD(?:\s[^>]*)?>(.*?)</HEAD>").expect("block regex")
});

/// Italic and emphasis tags, dropped without leaving a gap.
static INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?(?:I|E)(?:\s[^>]*)?>").expect("inline regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").expect("entity regex"));

/// Join the surviving fragments of `span` with single spaces.
pub fn collect_fragments(span: &str) -> String {
    let mut kept: Vec<String> = Vec::new();

    for caps in BLOCK_RE.captures_iter(span) {
        let (inner, min_chars) = match (caps.get(1), caps.get(2)) {
            (Some(content), _) => (content.as_str(), MIN_CONTENT_CHARS),
            (None, Some(heading)) => (heading.as_str(), MIN_HEADING_CHARS),
            (None, None) => continue,
        };

        let text = clean_fragment(inner);
        if text.chars().count() > min_chars {
            kept.push(text);
        }
    }

    kept.join(" ")
}

/// Strip markup from one fragment, decode entities and collapse whitespace.
pub fn clean_fragment(inner: &str) -> String {
    let without_inline = INLINE_RE.replace_all(inner, "");
    let without_tags = TAG_RE.replace_all(&without_inline, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the XML named entities and numeric character references in one pass.
///
/// Unknown names and invalid code points are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = match body {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => numeric_reference(body),
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn numeric_reference(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
