pub mod agent_loop;
pub mod config;
pub mod conversation;
pub mod dates;
pub mod error;
pub mod prompts;
pub mod tool_registry;
pub mod types;

pub use agent_loop::AgentLoop;
pub use config::Config;
pub use conversation::Conversation;
pub use error::WorklogError;
pub use tool_registry::ToolRegistry;
pub use types::{Source, WorkRecord};
