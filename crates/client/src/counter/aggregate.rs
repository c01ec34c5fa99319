//! Organization-wide word counts.

use chrono::Utc;

use regcount_core::cache::CacheKind;
use regcount_core::{AggregateResult, Error, ExtractionResult, Organization};

use super::WordCountService;

impl WordCountService {
    /// Count every title an organization references, serving from cache when possible.
    ///
    /// References are processed one after another with the configured delay
    /// between them. A failing title is recorded as an errored result and the
    /// loop continues; only successful titles contribute to the totals and the
    /// aggregate checksum.
    pub async fn process_organization(&self, org: &Organization) -> Result<AggregateResult, Error> {
        self.aggregate(org, false).await
    }

    /// Resolve `name` through the directory, then [`process_organization`](Self::process_organization).
    ///
    /// # Errors
    ///
    /// `NotFound` when the name does not resolve or the organization has no references.
    pub async fn process_organization_by_name(&self, name: &str) -> Result<AggregateResult, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("organization name must not be empty".into()));
        }

        let org = self
            .directory
            .find_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("organization {} not found", name)))?;

        if org.references.is_empty() {
            return Err(Error::NotFound(format!("organization {} has no title references", org.name)));
        }

        self.process_organization(&org).await
    }

    /// Aggregate pipeline. `force` skips cache reads for the organization and
    /// its titles; results are still written through the cache.
    pub(crate) async fn aggregate(&self, org: &Organization, force: bool) -> Result<AggregateResult, Error> {
        if !force
            && let Some(hit) = self.cache.lock().await.get(CacheKind::Organization, &org.name)
            && let Some(aggregate) = hit.into_aggregate()
        {
            tracing::debug!(organization = %org.name, "using cached aggregate");
            return Ok(aggregate);
        }

        let total = org.references.len();
        let mut per_title_results = Vec::with_capacity(total);

        for (i, reference) in org.references.iter().enumerate() {
            let result = match self.title_result(reference.title, force).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(organization = %org.name, title = reference.title, error = %e, "title failed");
                    ExtractionResult::failure(reference.title, None, e)
                }
            };
            per_title_results.push(result);

            if i + 1 < total && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        let successful = per_title_results.iter().filter(|r| r.is_success());
        let total_words = successful.clone().map(|r| r.word_count).sum();
        let concatenated: String = successful.filter_map(|r| r.checksum.as_deref()).collect();

        let aggregate = AggregateResult {
            organization: org.clone(),
            per_title_results,
            total_words,
            total_titles: total,
            aggregate_checksum: self.fingerprinter.fingerprint(&concatenated),
            processed_at: Utc::now(),
        };

        tracing::info!(
            organization = %org.name,
            titles = total,
            succeeded = aggregate.processed_titles(),
            words = total_words,
            checksum = %aggregate.aggregate_checksum,
            "processed organization"
        );

        self.cache.lock().await.set(CacheKind::Organization, &org.name, aggregate.clone()).await;
        Ok(aggregate)
    }
}
