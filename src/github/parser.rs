use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLocation {
    pub owner: String,
    pub name: String,
}

impl RepoLocation {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Clone URL rebuilt from the parsed parts, never from raw user input
    pub fn clone_url(&self, base: &str) -> String {
        format!(
            "{}/{}/{}.git",
            base.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("repository URL pattern is valid")
    })
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Parse a GitHub repository URL
/// Accepts formats:
/// - https://github.com/owner/repo
/// - https://github.com/owner/repo/
/// - https://github.com/owner/repo.git
/// - http://github.com/owner/repo.git/
pub fn parse_repository_url(url: &str) -> Result<RepoLocation> {
    let trimmed = url.trim();

    let captures = url_pattern()
        .captures(trimmed)
        .ok_or_else(|| Error::InvalidUrl(trimmed.to_string()))?;

    let owner = &captures[1];
    let name = &captures[2];

    if !is_valid_segment(owner) || !is_valid_segment(name) {
        return Err(Error::InvalidUrl(trimmed.to_string()));
    }

    Ok(RepoLocation {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
