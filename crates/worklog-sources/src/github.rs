//! GitHub commits adapter.
//!
//! Primary path is the commit Search API (author + author-date query); when
//! that comes back empty we fall back to walking the user's public events
//! for PushEvents, which only cover the last 90 days.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use worklog_core::error::{Result, WorklogError};
use worklog_core::{Config, WorkRecord};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("worklog/", env!("CARGO_PKG_VERSION"));

/// Commit search needs a preview media type.
const SEARCH_ACCEPT: &str = "application/vnd.github.cloak-preview+json";
const ACCEPT: &str = "application/vnd.github.v3+json";

const MAX_EVENT_PAGES: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    sha: Option<String>,
    commit: SearchCommit,
    url: Option<String>,
    repository: Option<RepoRef>,
}

#[derive(Debug, Deserialize)]
struct SearchCommit {
    author: Option<CommitAuthor>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoRef {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    stats: Option<CommitStats>,
}

#[derive(Debug, Deserialize, Default)]
struct CommitStats {
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type")]
    kind: String,
    created_at: String,
    repo: Option<EventRepo>,
    payload: Option<EventPayload>,
}

#[derive(Debug, Deserialize)]
struct EventRepo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    commits: Vec<EventCommit>,
}

#[derive(Debug, Deserialize)]
struct EventCommit {
    sha: Option<String>,
    #[serde(default)]
    message: String,
}

/// Fetch the user's commits between `start` and `end`.
pub async fn fetch(config: &Config, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<WorkRecord>> {
    let (token, username) = credentials(config)?;
    let client = build_client()?;

    let mut records = search_commits(&client, token, username, start, end).await?;

    // Search misses commits in some private repos; events cover those for
    // recent activity.
    if records.is_empty() {
        records = commits_from_events(&client, token, username, start, end).await?;
    }

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(records)
}

fn credentials(config: &Config) -> Result<(&str, &str)> {
    let token = config.github_token.as_deref().filter(|t| !t.is_empty());
    let username = config.github_username.as_deref().filter(|u| !u.is_empty());
    token
        .zip(username)
        .ok_or(WorklogError::Credentials { source_name: "commits" })
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(WorklogError::from)
}

async fn search_commits(
    client: &reqwest::Client,
    token: &str,
    username: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<WorkRecord>> {
    let query = format!(
        "author:{} author-date:{}..{}",
        username,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );

    let response = client
        .get(format!("{API_BASE}/search/commits"))
        .header("Authorization", format!("token {token}"))
        .header("Accept", SEARCH_ACCEPT)
        .query(&[
            ("q", query.as_str()),
            ("sort", "author-date"),
            ("order", "desc"),
            ("per_page", "100"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::debug!("commit search returned HTTP {}", response.status());
        return Ok(Vec::new());
    }

    let search: SearchResponse = response.json().await?;
    let mut records = Vec::new();

    for item in search.items {
        let Some(timestamp) = item
            .commit
            .author
            .as_ref()
            .and_then(|a| a.date.as_deref())
            .and_then(parse_github_date)
        else {
            continue;
        };

        let repo = item
            .repository
            .as_ref()
            .and_then(|r| r.full_name.clone())
            .unwrap_or_else(|| "unknown".into());

        let stats = match &item.url {
            Some(url) => fetch_commit_stats(client, token, url).await,
            None => CommitStats::default(),
        };

        let mut record = WorkRecord::at(timestamp, repo, first_line(&item.commit.message))
            .with_stats(stats.additions, stats.deletions);
        if let Some(sha) = item.sha.as_deref() {
            record = record.with_reference(short_sha(sha));
        }
        records.push(record);
    }

    Ok(records)
}

/// Additions/deletions require a per-commit detail fetch. A failure here
/// only costs us the stats, not the commit.
async fn fetch_commit_stats(client: &reqwest::Client, token: &str, url: &str) -> CommitStats {
    let response = client
        .get(url)
        .header("Authorization", format!("token {token}"))
        .header("Accept", ACCEPT)
        .send()
        .await;

    match response {
        Ok(r) if r.status().is_success() => r
            .json::<CommitDetail>()
            .await
            .ok()
            .and_then(|d| d.stats)
            .unwrap_or_default(),
        _ => CommitStats::default(),
    }
}

async fn commits_from_events(
    client: &reqwest::Client,
    token: &str,
    username: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<WorkRecord>> {
    let mut records = Vec::new();

    for page in 1..=MAX_EVENT_PAGES {
        let response = client
            .get(format!("{API_BASE}/users/{username}/events"))
            .header("Authorization", format!("token {token}"))
            .header("Accept", ACCEPT)
            .query(&[("page", page.to_string()), ("per_page", "100".into())])
            .send()
            .await?;

        if !response.status().is_success() {
            break;
        }

        let events: Vec<Event> = response.json().await?;
        if events.is_empty() {
            break;
        }

        for event in &events {
            if event.kind != "PushEvent" {
                continue;
            }
            let Some(created_at) = parse_github_date(&event.created_at) else {
                continue;
            };
            if created_at < start {
                // Events arrive newest first; everything after this is older.
                return Ok(records);
            }
            if created_at > end {
                continue;
            }

            let repo = event
                .repo
                .as_ref()
                .and_then(|r| r.name.clone())
                .unwrap_or_else(|| "unknown".into());

            for commit in event.payload.iter().flat_map(|p| &p.commits) {
                // No stats available from events.
                let mut record =
                    WorkRecord::at(created_at, repo.clone(), first_line(&commit.message));
                if let Some(sha) = commit.sha.as_deref() {
                    record = record.with_reference(short_sha(sha));
                }
                records.push(record);
            }
        }
    }

    Ok(records)
}

fn parse_github_date(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").to_string()
}

fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

/// Connection test for the setup wizard.
pub async fn test_connection(config: &Config) -> bool {
    let Some(token) = config.github_token.as_deref().filter(|t| !t.is_empty()) else {
        return false;
    };
    let Ok(client) = build_client() else {
        return false;
    };
    let response = client
        .get(format!("{API_BASE}/user"))
        .header("Authorization", format!("token {token}"))
        .header("Accept", ACCEPT)
        .send()
        .await;
    matches!(response, Ok(r) if r.status().is_success())
}
