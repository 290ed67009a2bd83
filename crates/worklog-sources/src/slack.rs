//! Slack chat adapter.
//!
//! Combines two views of the user's sent messages: the search API (fast,
//! covers searchable content) and per-conversation history (catches DMs and
//! private channels search misses). Results are merged, deduped by
//! (timestamp, channel), and sorted newest first.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use worklog_core::error::{Result, WorklogError};
use worklog_core::{Config, WorkRecord};

const API_BASE: &str = "https://slack.com/api";
const MAX_SEARCH_PAGES: u32 = 10;

#[derive(Debug, Deserialize)]
struct AuthTest {
    ok: bool,
    user_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    ok: bool,
    error: Option<String>,
    messages: Option<SearchMessages>,
}

#[derive(Debug, Deserialize)]
struct SearchMessages {
    #[serde(default)]
    matches: Vec<SearchMatch>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default = "one")]
    page: u32,
    #[serde(default = "one")]
    pages: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    ts: Option<String>,
    #[serde(default)]
    text: String,
    channel: Option<SearchChannel>,
}

#[derive(Debug, Deserialize)]
struct SearchChannel {
    name: Option<String>,
    #[serde(default)]
    is_im: bool,
    #[serde(default)]
    is_mpim: bool,
}

#[derive(Debug, Deserialize)]
struct ConversationsList {
    ok: bool,
    #[serde(default)]
    channels: Vec<Conversation>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    id: String,
    name: Option<String>,
    user: Option<String>,
    #[serde(default)]
    is_im: bool,
    #[serde(default)]
    is_mpim: bool,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
struct HistoryMessage {
    ts: Option<String>,
    user: Option<String>,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    ok: bool,
    user: Option<UserInfoUser>,
}

#[derive(Debug, Deserialize)]
struct UserInfoUser {
    name: Option<String>,
    real_name: Option<String>,
}

/// Fetch messages the user sent between `start` and `end`.
pub async fn fetch(config: &Config, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<WorkRecord>> {
    let token = config
        .slack_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(WorklogError::Credentials { source_name: "chat" })?;

    let client = reqwest::Client::new();
    let user_id = auth_user_id(&client, token).await?;

    let mut records = search_messages(&client, token, start, end).await?;
    let from_conversations =
        conversation_messages(&client, token, &user_id, start, end).await;
    records.extend(from_conversations);

    Ok(merge_and_sort(records))
}

/// Dedup by (timestamp, channel) keeping the first occurrence, then sort
/// newest first.
fn merge_and_sort(records: Vec<WorkRecord>) -> Vec<WorkRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<WorkRecord> = records
        .into_iter()
        .filter(|r| seen.insert((r.timestamp, r.label.clone())))
        .collect();
    unique.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    unique
}

async fn auth_user_id(client: &reqwest::Client, token: &str) -> Result<String> {
    let auth: AuthTest = client
        .get(format!("{API_BASE}/auth.test"))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;

    if !auth.ok {
        return Err(WorklogError::Source {
            source_name: "chat",
            message: format!(
                "auth.test failed: {}",
                auth.error.unwrap_or_else(|| "unknown error".into())
            ),
        });
    }
    auth.user_id.ok_or(WorklogError::Source {
        source_name: "chat",
        message: "auth.test returned no user id".into(),
    })
}

async fn search_messages(
    client: &reqwest::Client,
    token: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<WorkRecord>> {
    let query = format!(
        "from:me after:{} before:{}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );

    let mut records = Vec::new();
    let mut page = 1u32;

    loop {
        let response: SearchResponse = client
            .get(format!("{API_BASE}/search.messages"))
            .bearer_auth(token)
            .query(&[
                ("query", query.as_str()),
                ("sort", "timestamp"),
                ("sort_dir", "desc"),
                ("count", "100"),
                ("page", &page.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(WorklogError::Source {
                source_name: "chat",
                message: format!(
                    "search.messages failed: {}",
                    response.error.unwrap_or_else(|| "unknown error".into())
                ),
            });
        }

        let Some(messages) = response.messages else {
            break;
        };

        for m in &messages.matches {
            let Some(ts) = m.ts.as_deref().and_then(ts_to_naive) else {
                continue;
            };
            if ts < start || ts > end {
                continue;
            }
            let channel = match &m.channel {
                Some(c) if c.is_im => "DM".to_string(),
                Some(c) if c.is_mpim => "Group DM".to_string(),
                Some(c) => c.name.clone().unwrap_or_else(|| "unknown".into()),
                None => "unknown".into(),
            };
            records.push(WorkRecord::at(ts, channel, m.text.clone()));
        }

        let (current, total) = messages
            .paging
            .as_ref()
            .map(|p| (p.page, p.pages))
            .unwrap_or((1, 1));
        if current >= total || page >= MAX_SEARCH_PAGES {
            break;
        }
        page += 1;
    }

    Ok(records)
}

/// Walk every conversation the user is in and keep their own messages.
/// Failures here only shrink coverage, so they are logged and skipped.
async fn conversation_messages(
    client: &reqwest::Client,
    token: &str,
    user_id: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<WorkRecord> {
    let conversations = match list_conversations(client, token).await {
        Ok(convs) => convs,
        Err(e) => {
            tracing::debug!("conversations.list failed: {}", e);
            return Vec::new();
        }
    };

    let mut dm_names: HashMap<String, String> = HashMap::new();
    let mut records = Vec::new();

    for conv in conversations {
        let name = if conv.is_im {
            match &conv.user {
                Some(uid) => match dm_names.get(uid) {
                    Some(name) => name.clone(),
                    None => {
                        let name = dm_user_name(client, token, uid)
                            .await
                            .unwrap_or_else(|| "DM".into());
                        dm_names.insert(uid.clone(), name.clone());
                        name
                    }
                },
                None => "DM".into(),
            }
        } else if conv.is_mpim {
            conv.name.clone().unwrap_or_else(|| "Group DM".into())
        } else {
            conv.name.clone().unwrap_or_else(|| "unknown".into())
        };

        let history: HistoryResponse = match client
            .get(format!("{API_BASE}/conversations.history"))
            .bearer_auth(token)
            .query(&[
                ("channel", conv.id.as_str()),
                ("oldest", &naive_to_unix(start).to_string()),
                ("latest", &naive_to_unix(end).to_string()),
                ("limit", "200"),
            ])
            .send()
            .await
        {
            Ok(r) => match r.json().await {
                Ok(h) => h,
                Err(_) => continue,
            },
            Err(_) => continue,
        };

        if !history.ok {
            continue;
        }

        for m in &history.messages {
            if m.user.as_deref() != Some(user_id) {
                continue;
            }
            let Some(ts) = m.ts.as_deref().and_then(ts_to_naive) else {
                continue;
            };
            if ts < start || ts > end {
                continue;
            }
            records.push(WorkRecord::at(ts, name.clone(), m.text.clone()));
        }
    }

    records
}

async fn list_conversations(client: &reqwest::Client, token: &str) -> Result<Vec<Conversation>> {
    let mut conversations = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut params = vec![
            ("types", "im,mpim,public_channel,private_channel".to_string()),
            ("limit", "200".to_string()),
            ("exclude_archived", "true".to_string()),
        ];
        if let Some(c) = &cursor {
            params.push(("cursor", c.clone()));
        }

        let response: ConversationsList = client
            .get(format!("{API_BASE}/conversations.list"))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            break;
        }
        conversations.extend(response.channels);

        cursor = response
            .response_metadata
            .and_then(|m| m.next_cursor)
            .filter(|c| !c.is_empty());
        if cursor.is_none() {
            break;
        }
    }

    Ok(conversations)
}

async fn dm_user_name(client: &reqwest::Client, token: &str, user_id: &str) -> Option<String> {
    let info: UserInfo = client
        .get(format!("{API_BASE}/users.info"))
        .bearer_auth(token)
        .query(&[("user", user_id)])
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;

    if !info.ok {
        return None;
    }
    let user = info.user?;
    user.real_name.or(user.name)
}

/// Slack timestamps are "seconds.fraction" strings, rendered in the user's
/// local wall-clock time like the other adapters.
fn ts_to_naive(ts: &str) -> Option<NaiveDateTime> {
    ts_to_naive_in(ts, &Local)
}

fn ts_to_naive_in<Tz: TimeZone>(ts: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let seconds: f64 = ts.parse().ok()?;
    if seconds <= 0.0 {
        return None;
    }
    DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.with_timezone(tz).naive_local())
}

/// Unix seconds for a local wall-clock datetime, for history range bounds.
fn naive_to_unix(dt: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&dt)
        .earliest()
        .map(|t| t.timestamp())
        .unwrap_or_else(|| dt.and_utc().timestamp())
}

/// Connection test for the setup wizard.
pub async fn test_connection(config: &Config) -> bool {
    let Some(token) = config.slack_token.as_deref().filter(|t| !t.is_empty()) else {
        return false;
    };
    let client = reqwest::Client::new();
    auth_user_id(&client, token).await.is_ok()
}
