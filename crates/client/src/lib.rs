//! Client code for regcount.
//!
//! This crate provides the upstream fetch pipeline, regulation text
//! extraction, and the counting service shared by the server.

pub mod counter;
pub mod extract;
pub mod fetch;

pub use counter::WordCountService;
pub use extract::{ChapterMatcher, TextExtractor, to_roman};
pub use fetch::{DocumentFetcher, EcfrClient, FetchConfig};
