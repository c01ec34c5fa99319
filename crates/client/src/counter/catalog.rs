//! Title listing and date timelines.

use chrono::Utc;

use regcount_core::{DateRange, Error, TimelineField, TitleListing, TitleTimeline};

use super::WordCountService;

impl WordCountService {
    /// Every upstream title, most recently brought up to date first.
    ///
    /// With `range`, only titles whose `up_to_date_as_of` falls inside it are kept.
    pub async fn list_titles(&self, range: Option<DateRange>) -> Result<TitleListing, Error> {
        let titles = self.fetcher.fetch_titles().await?;
        let listing = TitleListing::build(titles, range);
        tracing::info!(titles = listing.total_titles, from = listing.filtered_from, "listed titles");
        Ok(listing)
    }

    /// Non-reserved titles grouped by their latest amendment date.
    pub async fn recent_amendments(&self) -> Result<TitleTimeline, Error> {
        self.timeline(TimelineField::LatestAmendedOn).await
    }

    /// Non-reserved titles grouped by their latest issue date.
    pub async fn up_to_date_titles(&self) -> Result<TitleTimeline, Error> {
        self.timeline(TimelineField::LatestIssueDate).await
    }

    async fn timeline(&self, field: TimelineField) -> Result<TitleTimeline, Error> {
        let titles = self.fetcher.fetch_titles().await?;
        let timeline = TitleTimeline::build(&titles, field, Utc::now().date_naive());
        tracing::info!(field = ?field, titles = timeline.total_titles, dates = timeline.groups.len(), "built timeline");
        Ok(timeline)
    }
}
