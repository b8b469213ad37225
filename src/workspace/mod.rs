//! Ephemeral repository checkouts.
//!
//! A [`Workspace`] owns a temporary directory for the lifetime of one
//! analysis. The directory is removed by [`Workspace::close`] or, on every
//! other exit path (error, panic, a dropped request future), when the guard
//! is dropped.

pub mod git;

use crate::github::RepoLocation;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

pub use git::GitCloneSource;

/// Scoped checkout of a repository branch
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl Workspace {
    /// Create an empty workspace under `parent`, or the system temp dir
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("repo-digest-");

        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        Ok(Self::from_temp_dir(dir))
    }

    /// Take ownership of an existing temporary directory
    pub fn from_temp_dir(dir: TempDir) -> Self {
        let root = dir.path().to_path_buf();
        Self {
            dir: Some(dir),
            root,
        }
    }

    /// Point the workspace at a subdirectory (the checkout itself)
    pub fn with_subdir(mut self, name: &str) -> Self {
        self.root = self.base().join(name);
        self
    }

    /// Directory holding the checked-out tree
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Temporary directory that is deleted on release
    pub fn base(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or(self.root.as_path())
    }

    /// Delete the workspace, reporting failures
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => {
                let path = dir.path().to_path_buf();
                dir.close().map_err(|e| {
                    Error::Internal(format!(
                        "Failed to remove workspace {}: {e}",
                        path.display()
                    ))
                })?;
                debug!("Removed workspace {}", path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to remove workspace {}: {}", path.display(), e);
            } else {
                debug!("Removed workspace {} on drop", path.display());
            }
        }
    }
}

/// Something that can produce a local checkout of a repository branch
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn open(&self, location: &RepoLocation, branch: &str) -> Result<Workspace>;
}

/// Validate a branch name before it reaches a git command line
pub fn validate_branch(branch: &str) -> Result<()> {
    if branch.trim().is_empty() {
        return Err(Error::Validation("Branch name cannot be empty".to_string()));
    }

    if branch.len() > 255 {
        return Err(Error::Validation("Branch name is too long".to_string()));
    }

    if branch.starts_with('-') || branch.starts_with('/') || branch.ends_with('/') {
        return Err(Error::Validation(format!("Invalid branch name: {branch}")));
    }

    if branch.contains("..")
        || branch
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '~' | '^' | ':' | '\\'))
    {
        return Err(Error::Validation(format!("Invalid branch name: {branch}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_removes_directory() {
        let workspace = Workspace::create(None).unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("file.txt"), "hello").unwrap();
        assert!(path.exists());

        workspace.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(Some(parent.path())).unwrap();
        let base = workspace.base().to_path_buf();
        assert!(base.starts_with(parent.path()));

        drop(workspace);
        assert!(!base.exists());
    }

    #[test]
    fn test_subdir_is_released_with_base() {
        let workspace = Workspace::create(None).unwrap().with_subdir("Hello-World");
        std::fs::create_dir_all(workspace.path()).unwrap();
        let base = workspace.base().to_path_buf();
        assert!(workspace.path().ends_with("Hello-World"));

        workspace.close().unwrap();
        assert!(!base.exists());
    }

    #[test]
    fn test_validate_branch() {
        assert!(validate_branch("main").is_ok());
        assert!(validate_branch("feature/login-form").is_ok());
        assert!(validate_branch("release-1.2").is_ok());

        assert!(validate_branch("").is_err());
        assert!(validate_branch("   ").is_err());
        assert!(validate_branch("--upload-pack=evil").is_err());
        assert!(validate_branch("a..b").is_err());
        assert!(validate_branch("has space").is_err());
        assert!(validate_branch("HEAD~1").is_err());
        assert!(validate_branch(&"x".repeat(256)).is_err());
    }
}
