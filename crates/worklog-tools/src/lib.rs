//! Assistant tools: the bridge between the LLM and the data sources.

pub mod current_date;
pub mod issues;
pub mod work_data;

use std::sync::Arc;
use worklog_core::{Config, ToolRegistry};

pub use current_date::CurrentDateTool;
pub use issues::QueryIssuesTool;
pub use work_data::WorkDataTool;

/// Register every tool the chat assistant can call.
pub fn register_all(registry: &mut ToolRegistry, config: &Config) {
    registry.register(Arc::new(WorkDataTool::new(config.clone())));
    registry.register(Arc::new(CurrentDateTool));
    registry.register(Arc::new(QueryIssuesTool::new(config.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &Config::default());
        assert_eq!(registry.len(), 3);
        let mut names = registry.list_names();
        names.sort();
        assert_eq!(names, vec!["get_current_date", "get_work_data", "query_issues"]);
    }
}
