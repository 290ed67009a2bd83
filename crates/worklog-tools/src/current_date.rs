use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde_json::{json, Value};
use worklog_core::error::Result;
use worklog_core::tool_registry::Tool;

/// Tells the model what "today" means so it can resolve temporal
/// references like "yesterday" or "this week".
pub struct CurrentDateTool;

#[async_trait]
impl Tool for CurrentDateTool {
    fn name(&self) -> &str {
        "get_current_date"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Use this to understand temporal references like 'today', 'yesterday', 'this week'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        let now = Local::now();
        let result = json!({
            "current_date": now.format("%Y-%m-%d").to_string(),
            "current_time": now.format("%H:%M:%S").to_string(),
            "day_of_week": now.format("%A").to_string(),
            "week_number": now.iso_week().week(),
        });
        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_all_fields() {
        let output = CurrentDateTool.execute(Value::Null).await.unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert!(parsed["current_date"].as_str().unwrap().contains('-'));
        assert!(parsed["week_number"].as_u64().unwrap() >= 1);
        assert!(!parsed["day_of_week"].as_str().unwrap().is_empty());
    }
}
