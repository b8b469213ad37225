use crate::config::GitHubSettings;
use std::time::Duration;

/// GitHub API client configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Optional GitHub personal access token for increased rate limits
    pub token: Option<String>,

    /// Base URL of the REST API, overridable for GitHub Enterprise and tests
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Entries requested per page when listing branches
    pub per_page: u32,
}

impl GitHubConfig {
    /// Create a new GitHubConfig from the loaded settings
    pub fn from_settings(settings: &GitHubSettings) -> Self {
        Self {
            token: settings.token.clone(),
            api_base_url: settings.api_url.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            ..Self::default()
        }
    }

    /// Get the base API URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(30),
            per_page: 100,
        }
    }
}
