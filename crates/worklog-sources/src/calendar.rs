//! Google Calendar adapter: lists events on the primary calendar for a
//! date range via the REST API.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use worklog_core::dates::format_duration;
use worklog_core::error::{Result, WorklogError};
use worklog_core::{Config, WorkRecord};

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    summary: Option<String>,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

/// Fetch calendar events between `start` and `end`.
pub async fn fetch(config: &Config, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<WorkRecord>> {
    let token = config
        .google_access_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(WorklogError::Credentials { source_name: "calendar" })?;

    let time_min = start.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let time_max = end.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let response = reqwest::Client::new()
        .get(EVENTS_URL)
        .bearer_auth(token)
        .query(&[
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("maxResults", "50"),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(WorklogError::Source {
            source_name: "calendar",
            message: format!("API returned HTTP {}", response.status()),
        });
    }

    let events: EventsResponse = response.json().await?;
    Ok(events.items.iter().map(event_to_record).collect())
}

fn event_to_record(event: &Event) -> WorkRecord {
    let summary = event.summary.clone().unwrap_or_else(|| "(No title)".into());

    let timed = event
        .start
        .date_time
        .as_deref()
        .zip(event.end.date_time.as_deref())
        .and_then(|(s, e)| {
            Some((
                DateTime::parse_from_rfc3339(s).ok()?,
                DateTime::parse_from_rfc3339(e).ok()?,
            ))
        });

    match timed {
        Some((start_dt, end_dt)) => {
            let duration = format_duration((end_dt - start_dt).num_seconds());
            let mut record = WorkRecord::at(start_dt.naive_local(), summary, duration);
            record.time = format!(
                "{} - {}",
                start_dt.format("%H:%M"),
                end_dt.format("%H:%M")
            );
            record
        }
        None => {
            // Date-only events carry no clock time.
            let mut record = WorkRecord::undated(summary, "All day");
            record.time = "All day".into();
            if let Some(date) = &event.start.date {
                record.date = date.clone();
                record.timestamp = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0));
            }
            record
        }
    }
}

/// Connection test for the setup wizard: a one-item list call.
pub async fn test_connection(config: &Config) -> bool {
    let Some(token) = config.google_access_token.as_deref().filter(|t| !t.is_empty()) else {
        return false;
    };
    let response = reqwest::Client::new()
        .get(EVENTS_URL)
        .bearer_auth(token)
        .query(&[("maxResults", "1")])
        .send()
        .await;
    matches!(response, Ok(r) if r.status().is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_event_formats_time_span_and_duration() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "summary": "Design review",
            "start": {"dateTime": "2026-03-14T09:00:00+00:00"},
            "end": {"dateTime": "2026-03-14T10:30:00+00:00"}
        }))
        .unwrap();

        let record = event_to_record(&event);
        assert_eq!(record.label, "Design review");
        assert_eq!(record.detail, "1h 30m");
        assert!(record.time.contains(" - "));
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_all_day_event() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "start": {"date": "2026-03-14"},
            "end": {"date": "2026-03-15"}
        }))
        .unwrap();

        let record = event_to_record(&event);
        assert_eq!(record.label, "(No title)");
        assert_eq!(record.time, "All day");
        assert_eq!(record.detail, "All day");
        assert_eq!(record.date, "2026-03-14");
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_credentials_error() {
        let config = Config::default();
        let now = chrono::Local::now().naive_local();
        let err = fetch(&config, now, now).await.unwrap_err();
        assert!(matches!(err, WorklogError::Credentials { source_name: "calendar" }));
    }
}
