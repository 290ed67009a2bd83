//! The aggregator: run the requested adapters over a range and collect
//! per-source results. A failing source becomes an error marker in its
//! slot; it never takes down the other sources.

use chrono::NaiveDateTime;
use worklog_core::{Config, Source, WorkRecord};

/// Per-source result slot: `None` when the source wasn't requested,
/// otherwise the records or the failure message.
pub type SourceSlot = Option<Result<Vec<WorkRecord>, String>>;

/// Aggregated activity for a date range.
#[derive(Debug, Default)]
pub struct DayData {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub calendar: SourceSlot,
    pub browser: SourceSlot,
    pub commits: SourceSlot,
    pub chat: SourceSlot,
    pub issues: SourceSlot,
}

impl DayData {
    pub fn slot(&self, source: Source) -> &SourceSlot {
        match source {
            Source::Calendar => &self.calendar,
            Source::Browser => &self.browser,
            Source::Commits => &self.commits,
            Source::Chat => &self.chat,
            Source::Issues => &self.issues,
        }
    }

    fn slot_mut(&mut self, source: Source) -> &mut SourceSlot {
        match source {
            Source::Calendar => &mut self.calendar,
            Source::Browser => &mut self.browser,
            Source::Commits => &mut self.commits,
            Source::Chat => &mut self.chat,
            Source::Issues => &mut self.issues,
        }
    }

    /// Records for a source, empty when unrequested or failed.
    pub fn records(&self, source: Source) -> &[WorkRecord] {
        match self.slot(source) {
            Some(Ok(records)) => records,
            _ => &[],
        }
    }

    /// The failure message for a source, if it failed.
    pub fn error(&self, source: Source) -> Option<&str> {
        match self.slot(source) {
            Some(Err(message)) => Some(message),
            _ => None,
        }
    }

    /// Sources that were requested, in canonical order.
    pub fn requested(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| self.slot(*s).is_some())
            .collect()
    }

    /// Total record count across all successful slots.
    pub fn total_records(&self) -> usize {
        Source::ALL.iter().map(|s| self.records(*s).len()).sum()
    }
}

/// Fetch the requested sources for a range, serially. Each failure is
/// captured in that source's slot.
pub async fn fetch_range(
    config: &Config,
    sources: &[Source],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> DayData {
    let mut data = DayData {
        start: Some(start),
        end: Some(end),
        ..DayData::default()
    };

    for &source in sources {
        tracing::debug!("fetching {} for {} .. {}", source, start, end);
        let result = match source {
            Source::Calendar => crate::calendar::fetch(config, start, end).await,
            Source::Browser => crate::browser::fetch(config, start, end).await,
            Source::Commits => crate::github::fetch(config, start, end).await,
            Source::Chat => crate::slack::fetch(config, start, end).await,
            Source::Issues => crate::linear::fetch(config, start, end).await,
        };
        *data.slot_mut(source) = Some(match result {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("{} source failed: {}", source, e);
                Err(e.to_string())
            }
        });
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_partial_failure_keeps_other_sources() {
        let data = DayData {
            calendar: Some(Ok(vec![WorkRecord::at(ts(), "Standup", "15m")])),
            commits: Some(Err("API returned HTTP 401".into())),
            ..DayData::default()
        };

        assert_eq!(data.records(Source::Calendar).len(), 1);
        assert_eq!(data.error(Source::Commits), Some("API returned HTTP 401"));
        assert!(data.error(Source::Calendar).is_none());
        assert!(data.records(Source::Browser).is_empty());
        assert_eq!(data.total_records(), 1);
    }

    #[test]
    fn test_requested_reports_only_populated_slots() {
        let data = DayData {
            calendar: Some(Ok(vec![])),
            chat: Some(Err("boom".into())),
            ..DayData::default()
        };
        assert_eq!(data.requested(), vec![Source::Calendar, Source::Chat]);
    }

    #[tokio::test]
    async fn test_fetch_range_with_empty_config_completes() {
        let config = Config::default();
        let data = fetch_range(&config, &[Source::Calendar, Source::Commits], ts(), ts()).await;

        // Both sources fail on missing credentials, but slots are filled
        // and the call itself succeeds.
        assert!(data.error(Source::Calendar).is_some());
        assert!(data.error(Source::Commits).is_some());
        assert!(data.chat.is_none());
        assert_eq!(data.total_records(), 0);
    }
}
