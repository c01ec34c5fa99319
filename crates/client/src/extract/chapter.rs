//! Chapter boundary matchers.
//!
//! Regulation titles mark chapters inconsistently, so chapter lookup tries a
//! list of [`ChapterMatcher`]s from most to least specific. Each one returns
//! the raw span of the document that belongs to the chapter, or `None`.

use std::sync::LazyLock;

use regex::Regex;

/// Start of any `<CHAPTER>` element.
static NEXT_CHAPTER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<CHAPTER").expect("chapter tag regex"));

/// Start of any chapter heading.
static NEXT_CHAPTER_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<HEAD[^>]*>\s*CHAPTER").expect("chapter heading regex"));

/// Largest number written in standard Roman notation.
const MAX_ROMAN: u32 = 3999;

/// Any numbered textual chapter marker.
static NEXT_CHAPTER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Chapter\s+\d+").expect("chapter marker regex"));

/// Locates the span of one chapter inside a raw document.
pub trait ChapterMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw, non-empty span for `chapter_id`, or `None` when this matcher does not apply.
    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str>;
}

/// Matchers in the order they are tried.
pub fn default_matchers() -> Vec<Box<dyn ChapterMatcher>> {
    vec![
        Box::new(ChapterTagMatcher),
        Box::new(ChapterHeadingMatcher),
        Box::new(RomanHeadingMatcher),
        Box::new(BareMarkerMatcher),
        Box::new(GenericMentionMatcher),
    ]
}

/// Id followed by anything but a letter or digit, so "1" never matches "10".
fn id_pattern(chapter_id: &str) -> String {
    format!(r"{}(?:[^<A-Za-z0-9][^<]*)?", regex::escape(chapter_id))
}

/// Text from `start` to the next `end_re` match (or end of document), if non-empty.
fn span_until<'a>(doc: &'a str, start: usize, end_re: &Regex) -> Option<&'a str> {
    let rest = &doc[start..];
    let span = match end_re.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    (!span.is_empty()).then_some(span)
}

fn heading_span<'a>(doc: &'a str, label: &str) -> Option<&'a str> {
    let pattern = format!(r"<HEAD[^>]*>\s*CHAPTER\s+{}</HEAD>", id_pattern(label));
    let head = Regex::new(&pattern).ok()?.find(doc)?;
    span_until(doc, head.end(), &NEXT_CHAPTER_HEAD_RE)
}

/// `<CHAPTER ...>{id}...</CHAPTER>`, running to the next `<CHAPTER`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterTagMatcher;

impl ChapterMatcher for ChapterTagMatcher {
    fn name(&self) -> &'static str {
        "chapter-tag"
    }

    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str> {
        let pattern = format!(r"<CHAPTER[^>]*>{}</CHAPTER>", id_pattern(chapter_id));
        let tag = Regex::new(&pattern).ok()?.find(doc)?;
        span_until(doc, tag.end(), &NEXT_CHAPTER_TAG_RE)
    }
}

/// `<HEAD>CHAPTER {id}...</HEAD>`, running to the next chapter heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterHeadingMatcher;

impl ChapterMatcher for ChapterHeadingMatcher {
    fn name(&self) -> &'static str {
        "chapter-heading"
    }

    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str> {
        heading_span(doc, chapter_id)
    }
}

/// Like [`ChapterHeadingMatcher`] with a numeric id written in Roman numerals.
#[derive(Debug, Clone, Copy, Default)]
pub struct RomanHeadingMatcher;

impl ChapterMatcher for RomanHeadingMatcher {
    fn name(&self) -> &'static str {
        "roman-heading"
    }

    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str> {
        let number: u32 = chapter_id.trim().parse().ok()?;
        if !(1..=MAX_ROMAN).contains(&number) {
            return None;
        }
        heading_span(doc, &to_roman(number))
    }
}

/// Bare `Chapter {id}` text, running to the next `Chapter {n}` marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareMarkerMatcher;

impl ChapterMatcher for BareMarkerMatcher {
    fn name(&self) -> &'static str {
        "bare-marker"
    }

    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str> {
        let pattern = format!(r"(?i)Chapter\s+{}\W", regex::escape(chapter_id));
        let marker = Regex::new(&pattern).ok()?.find(doc)?;
        span_until(doc, marker.end(), &NEXT_CHAPTER_MARKER_RE)
    }
}

/// Last resort: from the `Chapter {id}` mention to the mention of the next
/// chapter number, or to the end when the id is not numeric or has no successor.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMentionMatcher;

impl ChapterMatcher for GenericMentionMatcher {
    fn name(&self) -> &'static str {
        "generic-mention"
    }

    fn locate<'a>(&self, doc: &'a str, chapter_id: &str) -> Option<&'a str> {
        let pattern = format!(r"(?i)Chapter\s+{}", regex::escape(chapter_id));
        let mention = Regex::new(&pattern).ok()?.find(doc)?;
        let after = mention.end();

        let end = chapter_id
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .and_then(|next| Regex::new(&format!(r"(?i)Chapter\s+{}\b", next)).ok())
            .and_then(|next| next.find(&doc[after..]))
            .map_or(doc.len(), |m| after + m.start());

        let span = &doc[mention.start()..end];
        (!span.is_empty()).then_some(span)
    }
}

/// Roman numeral in standard subtractive notation; `0` yields an empty string.
pub fn to_roman(mut number: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while number >= value {
            out.push_str(numeral);
            number -= value;
        }
    }
    out
}
