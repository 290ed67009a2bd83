//! Linear issue tracker adapter: a thin GraphQL client plus the query
//! operations the CLI and the assistant tools need.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};
use worklog_core::error::{Result, WorklogError};
use worklog_core::{Config, WorkRecord};

const API_URL: &str = "https://api.linear.app/graphql";

/// GraphQL client for the Linear API.
pub struct LinearClient {
    http: reqwest::Client,
    api_key: String,
}

/// An issue from the viewer's recently-updated assigned issues.
#[derive(Debug, Clone)]
pub struct IssueActivity {
    pub identifier: String,
    pub title: String,
    pub state: String,
    pub team: String,
    pub updated_at: Option<NaiveDateTime>,
}

/// A project with the health/progress fields the projects view renders.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub state: String,
    pub progress: Option<f64>,
    pub target_date: Option<String>,
    pub lead: Option<String>,
    pub health: Option<String>,
    pub health_updated_at: Option<NaiveDateTime>,
    pub teams: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl LinearClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .linear_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(WorklogError::Credentials { source_name: "issues" })?;
        Ok(Self::new(api_key))
    }

    /// Execute a GraphQL query, surfacing HTTP and GraphQL-level errors
    /// distinctly.
    pub async fn query(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        let mut payload = json!({ "query": query });
        if let Some(vars) = variables {
            payload["variables"] = vars;
        }

        let response = self
            .http
            .post(API_URL)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorklogError::Source {
                source_name: "issues",
                message: format!("API returned HTTP {status}: {body}"),
            });
        }

        let parsed: GraphqlResponse = response.json().await?;
        if let Some(errors) = parsed.errors {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(WorklogError::Source {
                source_name: "issues",
                message: format!("GraphQL error: {}", messages.join("; ")),
            });
        }

        Ok(parsed.data.unwrap_or(Value::Null))
    }

    /// The authenticated user and their organization.
    pub async fn viewer(&self) -> Result<Value> {
        let data = self
            .query(
                "query { viewer { id name email admin organization { name urlKey } } }",
                None,
            )
            .await?;
        let viewer = &data["viewer"];
        Ok(json!({
            "id": viewer["id"],
            "name": viewer["name"],
            "email": viewer["email"],
            "is_admin": viewer["admin"],
            "organization": viewer["organization"]["name"],
            "org_url": viewer["organization"]["urlKey"],
        }))
    }

    /// Issues assigned to the viewer, optionally filtered by workflow state
    /// name.
    pub async fn my_issues(&self, state: Option<&str>, limit: u32) -> Result<Value> {
        let filter = match state {
            Some(s) => format!(r#"filter: {{state: {{name: {{eq: "{s}"}}}}}}, "#),
            None => String::new(),
        };
        let query = format!(
            r#"query {{
                viewer {{
                    assignedIssues({filter}first: {limit}) {{
                        nodes {{
                            identifier title description priority
                            createdAt updatedAt
                            state {{ name }}
                            project {{ name }}
                            team {{ name }}
                            labels {{ nodes {{ name }} }}
                        }}
                    }}
                }}
            }}"#
        );

        let data = self.query(&query, None).await?;
        let issues = nodes(&data["viewer"]["assignedIssues"])
            .iter()
            .map(|i| {
                json!({
                    "id": i["identifier"],
                    "title": i["title"],
                    "description": truncate_str(i["description"].as_str().unwrap_or(""), 200),
                    "priority": i["priority"],
                    "state": i["state"]["name"],
                    "project": i["project"]["name"],
                    "team": i["team"]["name"],
                    "labels": nodes(&i["labels"])
                        .iter()
                        .filter_map(|l| l["name"].as_str())
                        .collect::<Vec<_>>(),
                    "updated_at": i["updatedAt"],
                })
            })
            .collect();
        Ok(Value::Array(issues))
    }

    /// Assigned issues updated within the range, most recent first.
    pub async fn my_activity(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        limit: u32,
    ) -> Result<Vec<IssueActivity>> {
        let filter = build_filter(&[
            format!(r#"updatedAt: {{gte: "{}"}}"#, iso(start)),
            format!(r#"updatedAt: {{lte: "{}"}}"#, iso(end)),
        ]);
        let query = format!(
            r#"query {{
                viewer {{
                    assignedIssues({filter}first: {limit}, orderBy: updatedAt) {{
                        nodes {{
                            identifier title updatedAt
                            state {{ name }}
                            team {{ name }}
                        }}
                    }}
                }}
            }}"#
        );

        let data = self.query(&query, None).await?;
        Ok(nodes(&data["viewer"]["assignedIssues"])
            .iter()
            .map(|i| IssueActivity {
                identifier: str_field(i, "identifier"),
                title: str_field(i, "title"),
                state: i["state"]["name"].as_str().unwrap_or("unknown").to_string(),
                team: i["team"]["name"].as_str().unwrap_or("unknown").to_string(),
                updated_at: i["updatedAt"].as_str().and_then(parse_iso),
            })
            .collect())
    }

    /// Full-text issue search.
    pub async fn search_issues(&self, text: &str, limit: u32) -> Result<Value> {
        let query = r#"query($query: String!, $limit: Int!) {
            searchIssues(query: $query, first: $limit) {
                nodes {
                    identifier title description
                    state { name }
                    team { name }
                    assignee { name }
                }
            }
        }"#;

        let data = self
            .query(query, Some(json!({ "query": text, "limit": limit })))
            .await?;
        let issues = nodes(&data["searchIssues"])
            .iter()
            .map(|i| {
                json!({
                    "id": i["identifier"],
                    "title": i["title"],
                    "description": truncate_str(i["description"].as_str().unwrap_or(""), 150),
                    "state": i["state"]["name"],
                    "team": i["team"]["name"],
                    "assignee": i["assignee"]["name"],
                })
            })
            .collect();
        Ok(Value::Array(issues))
    }

    /// All teams in the workspace.
    pub async fn teams(&self) -> Result<Value> {
        let data = self
            .query(
                "query { teams { nodes { id name key description } } }",
                None,
            )
            .await?;
        let teams = nodes(&data["teams"])
            .iter()
            .map(|t| {
                json!({
                    "id": t["id"],
                    "name": t["name"],
                    "key": t["key"],
                    "description": t["description"],
                })
            })
            .collect();
        Ok(Value::Array(teams))
    }

    /// Projects, optionally scoped to a team. Completed and canceled
    /// projects are dropped unless requested.
    pub async fn projects(&self, team_key: Option<&str>, include_completed: bool) -> Result<Vec<Project>> {
        let filter = match team_key {
            Some(key) => format!(r#"filter: {{accessibleTeams: {{key: {{eq: "{key}"}}}}}}, "#),
            None => String::new(),
        };
        let query = format!(
            r#"query {{
                projects({filter}first: 50) {{
                    nodes {{
                        name state progress targetDate
                        health healthUpdatedAt updatedAt
                        lead {{ name }}
                        teams {{ nodes {{ name }} }}
                    }}
                }}
            }}"#
        );

        let data = self.query(&query, None).await?;
        let projects = nodes(&data["projects"])
            .iter()
            .map(|p| Project {
                name: str_field(p, "name"),
                state: p["state"].as_str().unwrap_or("backlog").to_lowercase(),
                progress: p["progress"].as_f64(),
                target_date: p["targetDate"].as_str().map(String::from),
                lead: p["lead"]["name"].as_str().map(String::from),
                health: p["health"].as_str().map(String::from),
                health_updated_at: p["healthUpdatedAt"]
                    .as_str()
                    .or(p["updatedAt"].as_str())
                    .and_then(parse_iso),
                teams: nodes(&p["teams"])
                    .iter()
                    .filter_map(|t| t["name"].as_str().map(String::from))
                    .collect(),
            })
            .filter(|p| include_completed || (p.state != "completed" && p.state != "canceled"))
            .collect();
        Ok(projects)
    }

    /// Workspace audit log entries. Audit logs need a paid plan and admin
    /// access; a schema error on `auditEntries` degrades to an empty list.
    pub async fn audit_logs(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        actor_email: Option<&str>,
        limit: u32,
    ) -> Result<Value> {
        let mut parts = vec![
            format!(r#"createdAt: {{gte: "{}"}}"#, iso(start)),
            format!(r#"createdAt: {{lte: "{}"}}"#, iso(end)),
        ];
        if let Some(email) = actor_email {
            parts.push(format!(r#"actor: {{email: {{eq: "{email}"}}}}"#));
        }
        let filter = build_filter(&parts);
        let query = format!(
            r#"query {{
                auditEntries({filter}first: {limit}) {{
                    nodes {{
                        id type createdAt ip countryCode
                        actor {{ name email }}
                        metadata
                    }}
                }}
            }}"#
        );

        let data = match self.query(&query, None).await {
            Ok(data) => data,
            Err(WorklogError::Source { message, .. }) if message.contains("auditEntries") => {
                return Ok(Value::Array(Vec::new()));
            }
            Err(e) => return Err(e),
        };

        let entries = nodes(&data["auditEntries"])
            .iter()
            .map(|e| {
                json!({
                    "id": e["id"],
                    "type": e["type"],
                    "timestamp": e["createdAt"],
                    "ip": e["ip"],
                    "country": e["countryCode"],
                    "actor": e["actor"]["name"],
                    "actor_email": e["actor"]["email"],
                    "metadata": e["metadata"],
                })
            })
            .collect();
        Ok(Value::Array(entries))
    }
}

/// Fetch issue activity between `start` and `end` as work records.
pub async fn fetch(config: &Config, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<WorkRecord>> {
    let client = LinearClient::from_config(config)?;
    let activity = client.my_activity(start, end, 50).await?;

    Ok(activity
        .into_iter()
        .map(|issue| {
            let label = format!("{} {}", issue.identifier, issue.title);
            let detail = format!("{} · {}", issue.state, issue.team);
            match issue.updated_at {
                Some(ts) => WorkRecord::at(ts, label, detail),
                None => WorkRecord::undated(label, detail),
            }
        })
        .collect())
}

/// Connection test for the setup wizard.
pub async fn test_connection(config: &Config) -> bool {
    match LinearClient::from_config(config) {
        Ok(client) => matches!(client.viewer().await, Ok(v) if !v["id"].is_null()),
        Err(_) => false,
    }
}

/// Compose GraphQL filter parts into `filter: {a, b}, ` or nothing.
fn build_filter(parts: &[String]) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!("filter: {{{}}}, ", parts.join(", "))
    }
}

fn nodes(value: &Value) -> Vec<Value> {
    value["nodes"].as_array().cloned().unwrap_or_default()
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or("").to_string()
}

fn iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
}

fn truncate_str(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_build_filter() {
        assert_eq!(build_filter(&[]), "");
        assert_eq!(
            build_filter(&["a: 1".to_string(), "b: 2".to_string()]),
            "filter: {a: 1, b: 2}, "
        );
    }

    #[test]
    fn test_audit_filter_includes_actor_email() {
        let parts = vec![
            r#"createdAt: {gte: "2026-03-01T00:00:00"}"#.to_string(),
            r#"actor: {email: {eq: "dev@example.com"}}"#.to_string(),
        ];
        let filter = build_filter(&parts);
        assert!(filter.starts_with("filter: {createdAt"));
        assert!(filter.contains("dev@example.com"));
    }

    #[test]
    fn test_parse_iso_and_truncate() {
        assert!(parse_iso("2026-03-14T09:00:00.000Z").is_some());
        assert!(parse_iso("n/a").is_none());
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hi", 5), "hi");
    }

    #[test]
    fn test_graphql_error_response_parses() {
        let parsed: GraphqlResponse = serde_json::from_str(
            r#"{"errors": [{"message": "Cannot query field \"auditEntries\""}]}"#,
        )
        .unwrap();
        let errors = parsed.errors.unwrap();
        assert!(errors[0].message.contains("auditEntries"));
    }

    #[tokio::test]
    async fn test_fetch_without_key() {
        let config = Config::default();
        let start = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = fetch(&config, start, start).await.unwrap_err();
        assert!(matches!(err, WorklogError::Credentials { source_name: "issues" }));
    }
}
