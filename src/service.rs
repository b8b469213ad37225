//! Analysis orchestration: checkout, analyze, format, release.

use crate::analysis::{source::build_globset, AnalyzeOptions, Analyzer, Language};
use crate::config::AnalysisConfig;
use crate::github::{parse_repository_url, RepoLocation};
use crate::report::{FormatOptions, Report, ReportFormatter};
use crate::workspace::{validate_branch, RepositorySource};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};

const MAX_IGNORE_PATTERNS: usize = 64;

fn default_max_files() -> usize {
    1000
}

fn default_ignore_tests() -> bool {
    true
}

/// User-supplied parameters of one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub repo_url: String,
    pub branch: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_ignore_tests")]
    pub ignore_tests: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Language names or extensions; empty means all supported
    #[serde(default)]
    pub languages: Vec<String>,
    /// Maximum directory depth to descend into
    #[serde(default)]
    pub depth: Option<usize>,
}

impl AnalysisRequest {
    pub fn new(repo_url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch: branch.into(),
            max_files: default_max_files(),
            ignore_tests: default_ignore_tests(),
            ignore_patterns: Vec::new(),
            languages: Vec::new(),
            depth: None,
        }
    }

    /// Check every field, returning the parsed repository location
    pub fn validate(&self, max_files_limit: usize) -> Result<RepoLocation> {
        let location = parse_repository_url(&self.repo_url)?;
        validate_branch(&self.branch)?;

        if self.max_files == 0 || self.max_files > max_files_limit {
            return Err(Error::Validation(format!(
                "max_files must be between 1 and {max_files_limit}"
            )));
        }

        if self.depth == Some(0) {
            return Err(Error::Validation("depth must be at least 1".to_string()));
        }

        if self.ignore_patterns.len() > MAX_IGNORE_PATTERNS {
            return Err(Error::Validation(format!(
                "At most {MAX_IGNORE_PATTERNS} ignore patterns are allowed"
            )));
        }
        build_globset(&self.ignore_patterns)?;

        self.parsed_languages()?;

        Ok(location)
    }

    fn parsed_languages(&self) -> Result<Vec<Language>> {
        self.languages
            .iter()
            .map(|name| {
                Language::parse(name)
                    .ok_or_else(|| Error::Validation(format!("Unsupported language: {name}")))
            })
            .collect()
    }

    fn analyze_options(&self, max_file_bytes: u64) -> Result<AnalyzeOptions> {
        Ok(AnalyzeOptions {
            max_files: self.max_files,
            ignore_tests: self.ignore_tests,
            ignore_patterns: self.ignore_patterns.clone(),
            languages: self.parsed_languages()?,
            max_depth: self.depth,
            max_file_bytes,
        })
    }
}

/// Composes a repository source, an analyzer and a formatter
#[derive(Clone)]
pub struct AnalysisService {
    source: Arc<dyn RepositorySource>,
    analyzer: Arc<dyn Analyzer>,
    formatter: Arc<dyn ReportFormatter>,
    config: AnalysisConfig,
}

impl AnalysisService {
    pub fn new(
        source: Arc<dyn RepositorySource>,
        analyzer: Arc<dyn Analyzer>,
        formatter: Arc<dyn ReportFormatter>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            source,
            analyzer,
            formatter,
            config,
        }
    }

    /// Produce a report for one request
    pub async fn run(&self, request: AnalysisRequest) -> Result<Report> {
        let location = request.validate(self.config.max_files_limit)?;
        let options = request.analyze_options(self.config.max_file_bytes)?;

        let span = tracing::info_span!(
            "analysis",
            request_id = %uuid::Uuid::new_v4(),
            repo = %location.full_name(),
            branch = %request.branch,
        );

        self.run_validated(location, request.branch, options)
            .instrument(span)
            .await
    }

    async fn run_validated(
        &self,
        location: RepoLocation,
        branch: String,
        options: AnalyzeOptions,
    ) -> Result<Report> {
        let start = Instant::now();

        let workspace = self
            .source
            .open(&location, &branch)
            .await
            .map_err(|e| match e {
                Error::Validation(_) => e,
                other => Error::Analysis(other.to_string()),
            })?;

        // The blocking task owns the workspace, so it is released once the
        // analyzer returns even if this future is dropped meanwhile.
        let analyzer = Arc::clone(&self.analyzer);
        let records = tokio::task::spawn_blocking(move || {
            let result = analyzer.analyze(workspace.path(), &options);
            if let Err(e) = workspace.close() {
                error!("{}", e.log_safe());
            }
            result
        })
        .await
        .map_err(|e| Error::Analysis(format!("analysis task failed: {e}")))?
        .map_err(|e| match e {
            Error::Analysis(_) => e,
            other => Error::Analysis(other.to_string()),
        })?;

        let format_options = FormatOptions {
            project_name: Some(location.name.clone()),
            char_budget: self.config.report_char_budget,
            method_preview_chars: Some(self.config.method_preview_chars),
        };
        let report = self.formatter.format(&records, &format_options);

        info!(
            "Report for {} ready: {} files in {:.2}s{}",
            location.full_name(),
            records.len(),
            start.elapsed().as_secs_f64(),
            if report.is_truncated() { " (truncated)" } else { "" }
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{"repo_url": "https://github.com/octocat/Hello-World", "branch": "master"}"#,
        )
        .unwrap();
        assert_eq!(request.max_files, 1000);
        assert!(request.ignore_tests);
        assert!(request.ignore_patterns.is_empty());
        assert!(request.languages.is_empty());
    }

    #[test]
    fn test_validate_returns_location() {
        let request = AnalysisRequest::new("https://github.com/octocat/Hello-World.git", "master");
        let location = request.validate(5000).unwrap();
        assert_eq!(location.full_name(), "octocat/Hello-World");
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let bad_url = AnalysisRequest::new("https://example.com/a/b", "main");
        assert!(matches!(bad_url.validate(10), Err(Error::InvalidUrl(_))));

        let mut request = AnalysisRequest::new("https://github.com/a/b", "main");
        request.max_files = 0;
        assert!(matches!(request.validate(10), Err(Error::Validation(_))));

        request.max_files = 11;
        assert!(matches!(request.validate(10), Err(Error::Validation(_))));

        request.max_files = 10;
        request.ignore_patterns = vec!["src/[".to_string()];
        assert!(matches!(request.validate(10), Err(Error::Validation(_))));

        request.ignore_patterns = vec!["docs/**".to_string()];
        request.languages = vec!["cobol".to_string()];
        assert!(matches!(request.validate(10), Err(Error::Validation(_))));

        request.languages = vec!["py".to_string(), "rust".to_string()];
        assert!(request.validate(10).is_ok());

        request.branch = "-x".to_string();
        assert!(matches!(request.validate(10), Err(Error::Validation(_))));
    }
}
