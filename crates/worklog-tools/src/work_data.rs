use async_trait::async_trait;
use serde_json::{json, Value};
use worklog_core::dates::{day_range, parse_date};
use worklog_core::error::{Result, WorklogError};
use worklog_core::tool_registry::Tool;
use worklog_core::{Config, Source, WorkRecord};
use worklog_sources::browser::dedup_by_title;
use worklog_sources::{fetch_range, DayData};

const BROWSER_CAP: usize = 50;
const CHAT_CAP: usize = 50;
const CHAT_TEXT_CAP: usize = 200;
const ISSUES_CAP: usize = 30;

/// Fetches aggregated activity for a date range on the model's behalf.
pub struct WorkDataTool {
    config: Config,
}

impl WorkDataTool {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Tool for WorkDataTool {
    fn name(&self) -> &str {
        "get_work_data"
    }

    fn description(&self) -> &str {
        "Fetch work activity data from multiple sources for a specific date range. \
         Returns calendar events, browser history, commits, chat messages, and issue \
         tracker activity. Use this tool when you need to analyze the user's work \
         activities, generate reports, or answer questions about what they worked on."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format"
                },
                "sources": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": ["calendar", "browser", "commits", "chat", "issues"]
                    },
                    "description": "Which data sources to fetch. Defaults to all if not specified."
                }
            },
            "required": ["start_date", "end_date"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let start_date = required_str(&args, "start_date")?;
        let end_date = required_str(&args, "end_date")?;

        let start = day_range(parse_date(start_date)?).0;
        let end = day_range(parse_date(end_date)?).1;

        let sources = match args["sources"].as_array() {
            Some(list) => {
                let mut parsed = Vec::new();
                for entry in list {
                    let name = entry.as_str().unwrap_or_default();
                    let source: Source = name.parse().map_err(|e: String| {
                        WorklogError::ToolExecution {
                            tool_name: "get_work_data".into(),
                            message: e,
                        }
                    })?;
                    parsed.push(source);
                }
                parsed
            }
            None => Source::ALL.to_vec(),
        };

        let data = fetch_range(&self.config, &sources, start, end).await;
        let result = day_data_to_json(start_date, end_date, &data);
        Ok(result.to_string())
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WorklogError::ToolExecution {
            tool_name: "get_work_data".into(),
            message: format!("missing required argument '{key}'"),
        })
}

/// Shape the aggregate into JSON the model can digest: per-source arrays,
/// error markers for failed slots, and caps to keep token usage sane.
pub fn day_data_to_json(start_date: &str, end_date: &str, data: &DayData) -> Value {
    let mut payload = json!({
        "date_range": { "start": start_date, "end": end_date },
        "data": {}
    });
    let out = &mut payload["data"];

    for source in data.requested() {
        if let Some(error) = data.error(source) {
            out[slot_key(source)] = json!({ "error": error });
            continue;
        }
        let records = data.records(source);
        match source {
            Source::Calendar => {
                out["calendar_events"] = records
                    .iter()
                    .map(|r| json!({ "time": r.time, "summary": r.label, "duration": r.detail }))
                    .collect();
            }
            Source::Browser => {
                let unique = dedup_by_title(records, BROWSER_CAP);
                out["browser_history"] = unique
                    .iter()
                    .map(|r| json!({ "title": r.label, "url": r.detail, "time": r.time }))
                    .collect();
                out["browser_history_total"] = json!(records.len());
            }
            Source::Commits => {
                out["commits"] = records
                    .iter()
                    .map(|r| {
                        json!({
                            "repo": r.label,
                            "message": r.detail,
                            "sha": r.reference,
                            "time": r.time,
                            "changes": changes_label(r),
                        })
                    })
                    .collect();
            }
            Source::Chat => {
                out["chat_messages"] = records
                    .iter()
                    .take(CHAT_CAP)
                    .map(|r| {
                        json!({
                            "channel": r.label,
                            "text": truncate(&r.detail, CHAT_TEXT_CAP),
                            "time": r.time,
                        })
                    })
                    .collect();
                out["chat_messages_total"] = json!(records.len());
            }
            Source::Issues => {
                out["issues"] = records
                    .iter()
                    .take(ISSUES_CAP)
                    .map(|r| json!({ "issue": r.label, "state": r.detail, "time": r.time }))
                    .collect();
                out["issues_total"] = json!(records.len());
            }
        }
    }

    payload
}

fn slot_key(source: Source) -> &'static str {
    match source {
        Source::Calendar => "calendar_events",
        Source::Browser => "browser_history",
        Source::Commits => "commits",
        Source::Chat => "chat_messages",
        Source::Issues => "issues",
    }
}

fn changes_label(record: &WorkRecord) -> String {
    record
        .stats
        .map(|s| s.changes())
        .unwrap_or_else(|| "N/A".into())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_day_data_to_json_mixes_data_and_errors() {
        let data = DayData {
            calendar: Some(Ok(vec![WorkRecord::at(ts(9), "Standup", "15m")])),
            commits: Some(Err("missing token".into())),
            ..DayData::default()
        };

        let value = day_data_to_json("2026-03-14", "2026-03-14", &data);
        assert_eq!(value["date_range"]["start"], "2026-03-14");
        assert_eq!(value["data"]["calendar_events"][0]["summary"], "Standup");
        assert_eq!(value["data"]["commits"]["error"], "missing token");
        assert!(value["data"]["chat_messages"].is_null());
    }

    #[test]
    fn test_browser_slot_dedups_and_caps() {
        let mut records = vec![
            WorkRecord::at(ts(9), "Docs", "https://a.test"),
            WorkRecord::at(ts(8), "docs", "https://b.test"),
        ];
        for i in 0..60 {
            records.push(WorkRecord::at(ts(7), format!("Page {i}"), "https://x.test".to_string()));
        }
        let data = DayData {
            browser: Some(Ok(records)),
            ..DayData::default()
        };

        let value = day_data_to_json("2026-03-14", "2026-03-14", &data);
        let history = value["data"]["browser_history"].as_array().unwrap();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0]["url"], "https://a.test");
        assert_eq!(value["data"]["browser_history_total"], 62);
    }

    #[test]
    fn test_commit_slot_carries_sha_and_changes() {
        let data = DayData {
            commits: Some(Ok(vec![
                WorkRecord::at(ts(9), "acme/widgets", "Add cache")
                    .with_stats(5, 2)
                    .with_reference("abc123d"),
                WorkRecord::at(ts(8), "acme/widgets", "Push fix"),
            ])),
            ..DayData::default()
        };
        let value = day_data_to_json("2026-03-14", "2026-03-14", &data);
        assert_eq!(value["data"]["commits"][0]["sha"], "abc123d");
        assert_eq!(value["data"]["commits"][0]["changes"], "+5/-2");
        // Events-fallback commits have neither sha nor stats.
        assert_eq!(value["data"]["commits"][1]["sha"], Value::Null);
        assert_eq!(value["data"]["commits"][1]["changes"], "N/A");
    }

    #[test]
    fn test_chat_text_truncated() {
        let long_text = "x".repeat(500);
        let data = DayData {
            chat: Some(Ok(vec![WorkRecord::at(ts(9), "general", long_text)])),
            ..DayData::default()
        };
        let value = day_data_to_json("2026-03-14", "2026-03-14", &data);
        let text = value["data"]["chat_messages"][0]["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), 203); // 200 + ellipsis
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_arguments() {
        let tool = WorkDataTool::new(Config::default());
        let err = tool
            .execute(json!({ "start_date": "2026-03-14" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("end_date"));
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_source() {
        let tool = WorkDataTool::new(Config::default());
        let err = tool
            .execute(json!({
                "start_date": "2026-03-14",
                "end_date": "2026-03-14",
                "sources": ["emails"]
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown source"));
    }
}
