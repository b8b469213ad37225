use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub github: GitHubSettings,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests allowed per client address per minute
    pub rate_limit_per_minute: u32,
    pub max_request_body_size: usize,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub api_url: String,
    pub clone_base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub git_binary: String,
    pub clone_timeout_seconds: u64,
    pub workspace_root: Option<PathBuf>,
    /// Upper bound accepted for a request's `max_files`
    pub max_files_limit: usize,
    pub max_file_bytes: u64,
    pub report_char_budget: Option<usize>,
    pub method_preview_chars: usize,
}

fn env_or<T: FromStr>(name: &str, default: &str) -> Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| Error::Config(format!("Invalid {name} value")))
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_or("PORT", "8000")?;
        let rate_limit_per_minute = env_or("RATE_LIMIT_PER_MINUTE", "10")?;
        let max_request_body_size = env_or("MAX_REQUEST_BODY_SIZE", "65536")?;
        let static_dir = std::env::var("STATIC_DIR")
            .unwrap_or_else(|_| "static".to_string())
            .into();

        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let api_url =
            std::env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string());
        let clone_base_url =
            std::env::var("GITHUB_CLONE_BASE").unwrap_or_else(|_| "https://github.com".to_string());
        let timeout_seconds = env_or("GITHUB_TIMEOUT", "30")?;

        let git_binary = std::env::var("GIT_BINARY").unwrap_or_else(|_| "git".to_string());
        let clone_timeout_seconds = env_or("CLONE_TIMEOUT", "120")?;
        let workspace_root = std::env::var("WORKSPACE_ROOT").ok().map(PathBuf::from);
        let max_files_limit = env_or("MAX_FILES_LIMIT", "5000")?;
        let max_file_bytes = env_or("MAX_FILE_BYTES", "262144")?;
        let report_char_budget = match std::env::var("REPORT_CHAR_BUDGET") {
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("none") => None,
            Ok(v) => Some(
                v.parse()
                    .map_err(|_| Error::Config("Invalid REPORT_CHAR_BUDGET value".to_string()))?,
            ),
            Err(_) => Some(100_000),
        };
        let method_preview_chars = env_or("METHOD_PREVIEW_CHARS", "300")?;

        Ok(Settings {
            server: ServerConfig {
                host,
                port,
                rate_limit_per_minute,
                max_request_body_size,
                static_dir,
            },
            github: GitHubSettings {
                token,
                api_url,
                clone_base_url,
                timeout_seconds,
            },
            analysis: AnalysisConfig {
                git_binary,
                clone_timeout_seconds,
                workspace_root,
                max_files_limit,
                max_file_bytes,
                report_char_budget,
                method_preview_chars,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.rate_limit_per_minute == 0 {
            return Err(Error::Config("Rate limit must be non-zero".to_string()));
        }

        for (name, value) in [
            ("GITHUB_API_URL", &self.github.api_url),
            ("GITHUB_CLONE_BASE", &self.github.clone_base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| Error::Config(format!("Invalid {name}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!("{name} must use http or https")));
            }
        }

        if self.analysis.clone_timeout_seconds == 0 {
            return Err(Error::Config("Clone timeout must be non-zero".to_string()));
        }

        if self.analysis.max_files_limit == 0 {
            return Err(Error::Config("MAX_FILES_LIMIT must be non-zero".to_string()));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                rate_limit_per_minute: 10,
                max_request_body_size: 65536,
                static_dir: "static".into(),
            },
            github: GitHubSettings {
                token: None,
                api_url: "https://api.github.com".to_string(),
                clone_base_url: "https://github.com".to_string(),
                timeout_seconds: 30,
            },
            analysis: AnalysisConfig {
                git_binary: "git".to_string(),
                clone_timeout_seconds: 120,
                workspace_root: None,
                max_files_limit: 5000,
                max_file_bytes: 262144,
                report_char_budget: Some(100_000),
                method_preview_chars: 300,
            },
        }
    }
}
