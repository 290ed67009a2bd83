use crate::error::{Result, WorklogError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from `~/.worklog/config.json`.
///
/// Holds one credential slot per integrated service. Tokens are provisioned
/// out of band (personal access tokens, OAuth tokens obtained elsewhere);
/// this tool only consumes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub personal access token (`repo` or `public_repo` scope).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// GitHub username the commit search is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    /// Google OAuth access token with calendar read scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,
    /// Chrome profile directory name (defaults to "Default").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_profile: Option<String>,
    /// Slack user OAuth token (`search:read` plus conversation scopes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_token: Option<String>,
    /// Linear API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_api_key: Option<String>,
    /// LLM provider settings for the chat assistant.
    pub provider: ProviderConfig,
}

/// LLM provider configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL for the OpenAI-compatible API.
    pub api_base: String,
    /// Model name.
    pub model: String,
    /// API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path with owner-only
    /// permissions.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Write current configuration to a specific path. The parent directory
    /// is created with mode 0o700 and the file set to 0o600 (unix).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            restrict_permissions(parent, 0o700)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        restrict_permissions(path, 0o600)?;
        Ok(())
    }

    /// Default config file path: `~/.worklog/config.json`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Configuration directory: `~/.worklog`.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".worklog")
    }

    /// Whether the data sources needed by the summary commands are set up.
    pub fn is_configured(&self) -> bool {
        self.github_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether the chat assistant can run.
    pub fn is_ai_configured(&self) -> bool {
        self.provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Require that the summary data sources are configured.
    pub fn require_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(WorklogError::Config(
                "worklog is not configured. Run 'worklog setup' first.".into(),
            ))
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(mode);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
