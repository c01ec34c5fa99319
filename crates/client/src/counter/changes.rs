//! Change detection against previously cached results.

use regcount_core::cache::CacheKind;
use regcount_core::{ChangeReport, Error};

use super::WordCountService;

impl WordCountService {
    /// Recompute an organization's aggregate and compare it with the cached one.
    ///
    /// `identifier` is resolved through the directory first so abbreviations
    /// find the aggregate cached under the canonical name; an unresolved
    /// identifier is looked up verbatim. Recomputation bypasses cache reads and
    /// repopulates the cache through the normal write path.
    pub async fn check_changes(&self, identifier: &str) -> Result<ChangeReport, Error> {
        let org = self.directory.find_by_name(identifier).await?;
        let key = org.as_ref().map_or(identifier, |org| org.name.as_str());

        let cached = self.cache.lock().await.get(CacheKind::Organization, key);
        let Some(old) = cached else {
            tracing::info!(identifier, key, "no cached aggregate to compare against");
            return Ok(ChangeReport::unresolved(ChangeReport::NO_PREVIOUS_CACHE));
        };

        let Some(org) = org else {
            return Ok(ChangeReport::unresolved(ChangeReport::NOT_FOUND));
        };

        let fresh = self.aggregate(&org, true).await?;
        let report = ChangeReport::compare(
            old.checksum().unwrap_or_default().to_string(),
            old.word_count(),
            fresh.aggregate_checksum,
            fresh.total_words,
        );

        tracing::info!(identifier, changed = report.changed, reason = %report.reason, "checked organization");
        Ok(report)
    }

    /// Recompute one title and compare it with its cached result.
    pub async fn check_title_changes(&self, title: u32) -> Result<ChangeReport, Error> {
        let cached = self.cache.lock().await.get(CacheKind::Title, &title.to_string());
        let Some(old) = cached else {
            return Ok(ChangeReport::unresolved(ChangeReport::NO_PREVIOUS_CACHE));
        };

        let fresh = match self.title_result(title, true).await {
            Ok(fresh) => fresh,
            Err(Error::NotFound(_) | Error::ReservedTitle(_)) => {
                return Ok(ChangeReport::unresolved(ChangeReport::NOT_FOUND));
            }
            Err(e) => return Err(e),
        };

        let report = ChangeReport::compare(
            old.checksum().unwrap_or_default().to_string(),
            old.word_count(),
            fresh.checksum.unwrap_or_default(),
            fresh.word_count,
        );

        tracing::info!(title, changed = report.changed, reason = %report.reason, "checked title");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{StubFetcher, service_with};
    use super::*;
    use regcount_core::{DocumentReference, Organization};

    fn agency() -> Organization {
        Organization::new(
            "Test Agency",
            vec![
                DocumentReference { title: 1, chapter: None, subtitle: None },
                DocumentReference { title: 2, chapter: None, subtitle: None },
            ],
        )
    }

    fn fetcher() -> StubFetcher {
        StubFetcher::new()
            .with_title(1, "<P>Original first title text.</P>")
            .with_title(2, "<P>Second title stays put.</P>")
    }

    #[tokio::test]
    async fn test_no_previous_cache() {
        let (service, _tmp) = service_with(fetcher(), vec![agency()]).await;

        let report = service.check_changes("Test Agency").await.unwrap();
        assert!(report.changed);
        assert_eq!(report.reason, "no previous cache found");
        assert!(report.old_checksum.is_none());

        // Same answer for something that does not exist at all.
        let report = service.check_changes("Nonexistent").await.unwrap();
        assert_eq!(report.reason, "no previous cache found");
    }

    #[tokio::test]
    async fn test_cached_but_unresolvable() {
        let (service, _tmp) = service_with(fetcher(), vec![]).await;
        service.process_organization(&agency()).await.unwrap();

        let report = service.check_changes("Test Agency").await.unwrap();
        assert!(report.changed);
        assert_eq!(report.reason, "not found");
    }

    #[tokio::test]
    async fn test_unchanged_content() {
        let fetcher = fetcher();
        let (service, _tmp) = service_with(fetcher.clone(), vec![agency()]).await;
        let first = service.process_organization(&agency()).await.unwrap();

        let report = service.check_changes("Test Agency").await.unwrap();
        assert!(!report.changed);
        assert_eq!(report.reason, "no changes detected");
        assert_eq!(report.old_checksum.as_deref(), Some(first.aggregate_checksum.as_str()));
        assert_eq!(report.old_checksum, report.new_checksum);
        assert_eq!(fetcher.document_fetches(), 4, "recomputation refetches every title");
    }

    #[tokio::test]
    async fn test_changed_content_updates_cache() {
        let fetcher = fetcher();
        let (service, _tmp) = service_with(fetcher.clone(), vec![agency()]).await;
        service.process_organization(&agency()).await.unwrap();

        fetcher.set_document(1, "<P>Amended first title text with additions.</P>");
        let report = service.check_changes("Test Agency").await.unwrap();
        assert!(report.changed);
        assert_eq!(report.reason, "content has changed");
        assert_eq!(report.old_word_count, Some(4 + 4));
        assert_eq!(report.new_word_count, Some(6 + 4));

        // The recomputed aggregate replaced the cached one.
        let again = service.check_changes("Test Agency").await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.old_checksum, report.new_checksum);
    }

    #[tokio::test]
    async fn test_abbreviation_finds_canonical_cache_entry() {
        let agency = Organization { short_name: Some("TA".into()), ..agency() };
        let (service, _tmp) = service_with(fetcher(), vec![agency]).await;

        assert_eq!(service.check_changes("TA").await.unwrap().reason, "no previous cache found");

        service.process_organization_by_name("TA").await.unwrap();
        let report = service.check_changes("TA").await.unwrap();
        assert!(!report.changed);
        assert_eq!(report.reason, "no changes detected");
        assert_eq!(service.check_changes("Test Agency").await.unwrap().reason, "no changes detected");
    }

    #[tokio::test]
    async fn test_title_changes() {
        let fetcher = fetcher();
        let (service, _tmp) = service_with(fetcher.clone(), vec![]).await;

        assert_eq!(service.check_title_changes(1).await.unwrap().reason, "no previous cache found");

        service.process_title(1).await.unwrap();
        assert!(!service.check_title_changes(1).await.unwrap().changed);

        fetcher.set_document(1, "<P>Completely different wording now.</P>");
        let report = service.check_title_changes(1).await.unwrap();
        assert!(report.changed);
        assert_eq!(report.new_word_count, Some(4));
    }
}
