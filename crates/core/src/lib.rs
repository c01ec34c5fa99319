//! Core types and shared functionality for regcount.
//!
//! This crate provides:
//! - Persistent TTL cache backed by a JSON file
//! - Word counting and content fingerprinting
//! - Organization directory lookups
//! - Title listings and date timelines
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod text;

pub use cache::{CacheData, CacheKind, CacheStats, PersistentCache};
pub use catalog::{DateRange, TimelineField, TitleListing, TitleTimeline};
pub use config::AppConfig;
pub use directory::{JsonDirectory, OrganizationDirectory};
pub use error::Error;
pub use fingerprint::{ContentFingerprinter, RollingHashFingerprinter, Sha256Fingerprinter};
pub use models::{AggregateResult, ChangeReport, DocumentReference, ExtractionResult, Organization, TitleMetadata};
pub use text::count_words;
