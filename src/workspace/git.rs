use super::{validate_branch, RepositorySource, Workspace};
use crate::config::{AnalysisConfig, GitHubSettings};
use crate::github::RepoLocation;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Shallow-clones a single branch with the `git` binary
#[derive(Debug, Clone)]
pub struct GitCloneSource {
    git_binary: String,
    clone_base_url: String,
    timeout: Duration,
    workspace_root: Option<PathBuf>,
}

impl GitCloneSource {
    pub fn new(github: &GitHubSettings, analysis: &AnalysisConfig) -> Self {
        Self {
            git_binary: analysis.git_binary.clone(),
            clone_base_url: github.clone_base_url.clone(),
            timeout: Duration::from_secs(analysis.clone_timeout_seconds),
            workspace_root: analysis.workspace_root.clone(),
        }
    }

    /// Last non-empty stderr line, which is where git puts the reason
    fn summarize_stderr(stderr: &[u8]) -> String {
        String::from_utf8_lossy(stderr)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or("no output")
            .to_string()
    }
}

#[async_trait]
impl RepositorySource for GitCloneSource {
    async fn open(&self, location: &RepoLocation, branch: &str) -> Result<Workspace> {
        validate_branch(branch)?;

        let workspace = Workspace::create(self.workspace_root.as_deref())
            .map_err(|e| Error::Checkout(format!("could not create workspace: {e}")))?
            .with_subdir(&location.name);
        let clone_url = location.clone_url(&self.clone_base_url);

        info!(
            "Cloning {} (branch {}) into {}",
            location.full_name(),
            branch,
            workspace.base().display()
        );
        let start = Instant::now();

        let child = Command::new(&self.git_binary)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--single-branch")
            .arg("--no-tags")
            .arg("--branch")
            .arg(branch)
            .arg("--")
            .arg(&clone_url)
            .arg(workspace.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Checkout(format!("failed to run {}: {e}", self.git_binary)))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| Error::Checkout(format!("git clone failed: {e}")))?
            }
            Err(_) => {
                warn!(
                    "Clone of {} timed out after {:?}",
                    location.full_name(),
                    self.timeout
                );
                return Err(Error::Checkout(format!(
                    "clone timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let reason = Self::summarize_stderr(&output.stderr);
            warn!(
                "git clone of {} (branch {}) exited with {}: {}",
                location.full_name(),
                branch,
                output.status,
                reason
            );
            return Err(Error::Checkout(format!(
                "could not check out branch {branch} of {}: {reason}",
                location.full_name()
            )));
        }

        debug!(
            "Cloned {} in {:.2}s",
            location.full_name(),
            start.elapsed().as_secs_f64()
        );

        Ok(workspace)
    }
}
