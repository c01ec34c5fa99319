//! Response shape of the versioner titles listing.

use serde::Deserialize;

use regcount_core::TitleMetadata;

/// `GET /api/versioner/v1/titles`
#[derive(Debug, Deserialize)]
pub struct TitlesResponse {
    pub titles: Vec<TitleMetadata>,
}
