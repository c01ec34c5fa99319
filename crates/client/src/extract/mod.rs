//! Regulation text extraction from raw title XML.
//!
//! ### Full text
//! - Collects `<P>` (content) and `<HEAD>` (heading) blocks in document order.
//! - Drops `<I>`/`<E>` tags, replaces other nested tags with a space.
//! - Decodes XML entities and numeric character references, collapses whitespace.
//! - Discards content fragments of 5 chars or fewer and headings of 3 or fewer.
//!
//! ### Chapters
//! - Tries the [`ChapterMatcher`] chain in order; the first non-empty span wins.
//! - The span goes through the same fragment rules as full text.
//! - No match is an empty string, never an error.

pub mod chapter;
pub mod fragments;

pub use chapter::{
    BareMarkerMatcher, ChapterHeadingMatcher, ChapterMatcher, ChapterTagMatcher, GenericMentionMatcher,
    RomanHeadingMatcher, default_matchers, to_roman,
};
pub use fragments::{clean_fragment, collect_fragments, decode_entities};

/// Text extractor with an ordered chapter matcher chain.
pub struct TextExtractor {
    matchers: Vec<Box<dyn ChapterMatcher>>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(default_matchers())
    }
}

impl TextExtractor {
    pub fn new(matchers: Vec<Box<dyn ChapterMatcher>>) -> Self {
        Self { matchers }
    }

    /// Names of the matchers in the order they are tried.
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Readable text of the whole document.
    pub fn extract_full_text(&self, doc: &str) -> String {
        let text = collect_fragments(doc);
        tracing::debug!(doc_bytes = doc.len(), text_chars = text.len(), "extracted full text");
        text
    }

    /// Readable text of one chapter, or an empty string when no matcher finds it.
    pub fn extract_chapter_text(&self, doc: &str, chapter_id: &str) -> String {
        for matcher in &self.matchers {
            if let Some(span) = matcher.locate(doc, chapter_id) {
                tracing::debug!(chapter = chapter_id, matcher = matcher.name(), span_bytes = span.len(), "located chapter");
                return collect_fragments(span);
            }
        }

        tracing::debug!(chapter = chapter_id, "chapter not found");
        String::new()
    }
}
