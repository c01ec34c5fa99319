//! Title listings and date timelines over upstream title metadata.
//!
//! Both views are computed from the versioner titles listing alone; no
//! documents are fetched.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, TitleMetadata};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), DATE_FORMAT).ok()
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidInput(format!("start date {} is after end date {}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, Error> {
        let parse = |field: &str, raw: &str| {
            parse_date(Some(raw))
                .ok_or_else(|| Error::InvalidInput(format!("{} must be a YYYY-MM-DD date, got {:?}", field, raw)))
        };
        Self::new(parse("start_date", start)?, parse("end_date", end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Titles ordered by how recently upstream brought them up to date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleListing {
    pub titles: Vec<TitleMetadata>,
    pub total_titles: usize,
    /// Size of the upstream listing before any date filter.
    pub filtered_from: usize,
    pub most_recent_update: Option<String>,
    pub oldest_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub fetched_at: DateTime<Utc>,
}

impl TitleListing {
    /// Sort by `up_to_date_as_of`, newest first, keeping only titles inside
    /// `range` when one is given.
    ///
    /// Titles without a readable date sort last by number, and never match a range.
    pub fn build(titles: Vec<TitleMetadata>, range: Option<DateRange>) -> Self {
        let filtered_from = titles.len();
        let currency = |t: &TitleMetadata| parse_date(t.up_to_date_as_of.as_deref());

        let mut titles: Vec<TitleMetadata> = titles
            .into_iter()
            .filter(|t| range.is_none_or(|r| currency(t).is_some_and(|d| r.contains(d))))
            .collect();
        titles.sort_by_key(|t| (Reverse(currency(t)), t.number));

        let mut dated = titles.iter().filter(|&t| currency(t).is_some()).filter_map(|t| t.up_to_date_as_of.clone());
        let most_recent_update = dated.next();
        let oldest_update = dated.last().or_else(|| most_recent_update.clone());

        Self {
            total_titles: titles.len(),
            titles,
            filtered_from,
            most_recent_update,
            oldest_update,
            date_range: range,
            fetched_at: Utc::now(),
        }
    }
}

/// Metadata date a [`TitleTimeline`] groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineField {
    LatestAmendedOn,
    LatestIssueDate,
}

impl TimelineField {
    fn of(self, title: &TitleMetadata) -> Option<&str> {
        match self {
            TimelineField::LatestAmendedOn => title.latest_amended_on.as_deref(),
            TimelineField::LatestIssueDate => title.latest_issue_date.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedTitle {
    pub number: u32,
    pub name: String,
    pub latest_issue_date: Option<String>,
    pub latest_amended_on: Option<String>,
    pub up_to_date_as_of: Option<String>,
    /// Whole days between the grouping date and the day the timeline was built.
    pub days_since: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub title_count: usize,
    pub titles: Vec<DatedTitle>,
}

/// Non-reserved titles grouped by one of their metadata dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleTimeline {
    pub grouped_by: TimelineField,
    pub total_titles: usize,
    /// Newest date first; titles ordered by number within a date.
    pub groups: Vec<DateGroup>,
    pub processed_at: DateTime<Utc>,
}

impl TitleTimeline {
    /// Titles that are reserved or lack a readable `field` date are left out.
    pub fn build(titles: &[TitleMetadata], field: TimelineField, today: NaiveDate) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<DatedTitle>> = BTreeMap::new();

        for title in titles.iter().filter(|t| !t.reserved) {
            let Some(date) = parse_date(field.of(title)) else {
                continue;
            };
            by_date.entry(date).or_default().push(DatedTitle {
                number: title.number,
                name: title.name.clone(),
                latest_issue_date: title.latest_issue_date.clone(),
                latest_amended_on: title.latest_amended_on.clone(),
                up_to_date_as_of: title.up_to_date_as_of.clone(),
                days_since: today.signed_duration_since(date).num_days(),
            });
        }

        let groups: Vec<DateGroup> = by_date
            .into_iter()
            .rev()
            .map(|(date, mut titles)| {
                titles.sort_by_key(|t| t.number);
                DateGroup { date, title_count: titles.len(), titles }
            })
            .collect();

        Self {
            grouped_by: field,
            total_titles: groups.iter().map(|g| g.title_count).sum(),
            groups,
            processed_at: Utc::now(),
        }
    }
}
