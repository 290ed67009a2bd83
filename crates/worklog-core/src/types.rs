use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// One row of activity from any data source, normalized for display.
///
/// `time` and `date` are pre-formatted for the report tables; `timestamp`
/// keeps the original moment for sorting and is `None` for records the
/// source could not date precisely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub time: String,
    pub date: String,
    pub label: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RecordStats>,
    /// Source-side identifier, e.g. a short commit sha.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl WorkRecord {
    /// Build a record at a known timestamp, deriving the display fields.
    pub fn at(timestamp: NaiveDateTime, label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp),
            time: timestamp.format("%H:%M").to_string(),
            date: timestamp.format("%Y-%m-%d").to_string(),
            label: label.into(),
            detail: detail.into(),
            stats: None,
            reference: None,
        }
    }

    /// Build a record without a precise timestamp.
    pub fn undated(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            time: String::new(),
            date: String::new(),
            label: label.into(),
            detail: detail.into(),
            stats: None,
            reference: None,
        }
    }

    pub fn with_stats(mut self, additions: u32, deletions: u32) -> Self {
        self.stats = Some(RecordStats {
            additions,
            deletions,
        });
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Line change counts attached to commit records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordStats {
    pub additions: u32,
    pub deletions: u32,
}

impl RecordStats {
    pub fn changes(&self) -> String {
        format!("+{}/-{}", self.additions, self.deletions)
    }
}

/// The data sources worklog can pull from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Calendar,
    Browser,
    Commits,
    Chat,
    Issues,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Calendar,
        Source::Browser,
        Source::Commits,
        Source::Chat,
        Source::Issues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Calendar => "calendar",
            Source::Browser => "browser",
            Source::Commits => "commits",
            Source::Chat => "chat",
            Source::Issues => "issues",
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calendar" => Ok(Source::Calendar),
            "browser" => Ok(Source::Browser),
            "commits" => Ok(Source::Commits),
            "chat" => Ok(Source::Chat),
            "issues" => Ok(Source::Issues),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Tool call ID this message is responding to (for tool results).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None, None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None, None)
    }

    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self::new(Role::Assistant, content, None, Some(tool_calls))
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, None, None)
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content, Some(tool_call_id.into()), None)
    }

    fn new(
        role: Role,
        content: impl Into<String>,
        tool_call_id: Option<String>,
        tool_calls: Option<Vec<ToolCall>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_call_id,
            tool_calls,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Schema definition for a tool's parameters, sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// Streaming event emitted while the assistant works on a turn.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A chunk of the assistant's response content.
    ContentChunk(String),
    /// The assistant is calling a tool.
    ToolCallStart { id: String, name: String },
    /// Tool execution completed.
    ToolResult(ToolOutput),
    /// The full assistant message is complete.
    Done(Message),
    /// An error occurred.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_record_at_derives_display_fields() {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        let record = WorkRecord::at(ts, "Standup", "15m");
        assert_eq!(record.time, "09:05");
        assert_eq!(record.date, "2026-03-14");
        assert!(record.stats.is_none());
    }

    #[test]
    fn test_record_stats_changes() {
        let record = WorkRecord::undated("repo", "fix bug").with_stats(12, 3);
        assert_eq!(record.stats.unwrap().changes(), "+12/-3");
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("Calendar".parse::<Source>().unwrap(), Source::Calendar);
        assert_eq!(" issues ".parse::<Source>().unwrap(), Source::Issues);
        assert!("emails".parse::<Source>().is_err());
        assert_eq!(Source::ALL.len(), 5);
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::tool_result("call_1", "{}");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));

        let with_calls = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_2".into(),
                name: "get_work_data".into(),
                arguments: "{}".into(),
            }],
        );
        assert_eq!(with_calls.tool_calls.as_ref().unwrap().len(), 1);
    }
}
