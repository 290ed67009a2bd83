use async_trait::async_trait;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use worklog_core::dates::{day_range, parse_date};
use worklog_core::error::{Result, WorklogError};
use worklog_core::tool_registry::Tool;
use worklog_core::Config;
use worklog_sources::LinearClient;

/// Queries the issue tracker for issues, projects, teams, or audit logs.
pub struct QueryIssuesTool {
    config: Config,
}

impl QueryIssuesTool {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn error(message: impl Into<String>) -> WorklogError {
        WorklogError::ToolExecution {
            tool_name: "query_issues".into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Tool for QueryIssuesTool {
    fn name(&self) -> &str {
        "query_issues"
    }

    fn description(&self) -> &str {
        "Query the issue tracker for issues, projects, teams, or audit logs. \
         Use this for questions about issue status, project health, team \
         structure, or workspace audit history."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query_type": {
                    "type": "string",
                    "enum": ["my_issues", "search_issues", "projects", "teams", "audit_logs"],
                    "description": "Type of query to run"
                },
                "search_text": {
                    "type": "string",
                    "description": "Search text (for search_issues query type)"
                },
                "team_key": {
                    "type": "string",
                    "description": "Team key to filter by (e.g., 'ENG')"
                },
                "state": {
                    "type": "string",
                    "description": "Issue state filter (e.g., 'started', 'completed')"
                },
                "start_date": {
                    "type": "string",
                    "description": "Start date for audit logs (YYYY-MM-DD)"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date for audit logs (YYYY-MM-DD)"
                }
            },
            "required": ["query_type"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let client = LinearClient::from_config(&self.config)?;
        let query_type = args["query_type"].as_str().unwrap_or_default();

        let result = match query_type {
            "my_issues" => {
                let issues = client.my_issues(args["state"].as_str(), 50).await?;
                json!({ "count": issues.as_array().map_or(0, Vec::len), "issues": issues })
            }
            "search_issues" => {
                let text = args["search_text"]
                    .as_str()
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        Self::error("search_text is required for search_issues query")
                    })?;
                let issues = client.search_issues(text, 20).await?;
                json!({ "count": issues.as_array().map_or(0, Vec::len), "issues": issues })
            }
            "projects" => {
                let projects = client.projects(args["team_key"].as_str(), false).await?;
                let listed: Vec<Value> = projects
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "state": p.state,
                            "progress": p.progress,
                            "target_date": p.target_date,
                            "lead": p.lead,
                            "health": p.health,
                            "teams": p.teams,
                        })
                    })
                    .collect();
                json!({ "count": listed.len(), "projects": listed })
            }
            "teams" => {
                let teams = client.teams().await?;
                json!({ "count": teams.as_array().map_or(0, Vec::len), "teams": teams })
            }
            "audit_logs" => {
                // Default to the last 30 days when no range is given.
                let start = match args["start_date"].as_str() {
                    Some(s) => day_range(parse_date(s)?).0,
                    None => Local::now().naive_local() - Duration::days(30),
                };
                let end = match args["end_date"].as_str() {
                    Some(s) => day_range(parse_date(s)?).1,
                    None => Local::now().naive_local(),
                };
                let logs = client.audit_logs(start, end, None, 100).await?;
                json!({ "count": logs.as_array().map_or(0, Vec::len), "audit_logs": logs })
            }
            other => return Err(Self::error(format!("Unknown query_type: {other}"))),
        };

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_is_credentials_error() {
        let tool = QueryIssuesTool::new(Config::default());
        let err = tool
            .execute(json!({ "query_type": "my_issues" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WorklogError::Credentials { source_name: "issues" }));
    }

    #[tokio::test]
    async fn test_unknown_query_type() {
        let mut config = Config::default();
        config.linear_api_key = Some("lin_api_test".into());
        let tool = QueryIssuesTool::new(config);
        let err = tool
            .execute(json!({ "query_type": "everything" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown query_type"));
    }

    #[tokio::test]
    async fn test_search_requires_text() {
        let mut config = Config::default();
        config.linear_api_key = Some("lin_api_test".into());
        let tool = QueryIssuesTool::new(config);
        let err = tool
            .execute(json!({ "query_type": "search_issues" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("search_text"));
    }

    #[test]
    fn test_schema_lists_query_types() {
        let schema = QueryIssuesTool::new(Config::default()).parameters_schema();
        let types = schema["properties"]["query_type"]["enum"].as_array().unwrap();
        assert_eq!(types.len(), 5);
    }
}
