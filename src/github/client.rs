use crate::github::{
    config::GitHubConfig,
    models::{Branch, BranchInfo, Repository},
    parser::RepoLocation,
    quota::ApiQuota,
};
use crate::{Error, Result};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, error, info};

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    quota: ApiQuota,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("repo-digest/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        // Add authentication if token is provided
        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {token}");
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("Invalid GitHub token: {e}")))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            quota: ApiQuota::new(),
        })
    }

    /// Make a GET request to GitHub API
    async fn get<T>(&self, path: &str, location: &RepoLocation) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.quota.ensure_available().await?;

        let url = format!("{}{}", self.config.api_base_url(), path);
        debug!("GitHub API request: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::UpstreamApi(format!("request failed: {e}")))?;

        self.quota.update_from_headers(response.headers()).await;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("GitHub API error: {} - {}", status, error_body);

            return Err(match status {
                StatusCode::NOT_FOUND => Error::RepositoryNotFound(format!(
                    "Repository {} not found",
                    location.full_name()
                )),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                    Error::UpstreamApi(format!("{status} (rate limit or access denied)"))
                }
                StatusCode::UNAUTHORIZED => {
                    Error::UpstreamApi("authentication failed".to_string())
                }
                _ => Error::UpstreamApi(status.to_string()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::UpstreamApi(format!("failed to parse response: {e}")))
    }

    /// Get repository information
    pub async fn get_repository(&self, location: &RepoLocation) -> Result<Repository> {
        let path = format!("/repos/{}/{}", location.owner, location.name);
        self.get(&path, location).await
    }

    /// List all branches and the default branch of a repository
    pub async fn list_branches(&self, location: &RepoLocation) -> Result<BranchInfo> {
        let repository = self.get_repository(location).await?;

        let per_page = self.config.per_page.max(1);
        let mut branches = Vec::new();
        let mut page = 1;

        loop {
            let path = format!(
                "/repos/{}/{}/branches?per_page={per_page}&page={page}",
                location.owner, location.name
            );
            let batch: Vec<Branch> = self.get(&path, location).await?;
            let fetched = batch.len();
            branches.extend(batch.into_iter().map(|b| b.name));

            if fetched < per_page as usize {
                break;
            }
            page += 1;
        }

        if !branches.contains(&repository.default_branch) {
            branches.push(repository.default_branch.clone());
        }

        info!(
            "Listed {} branches for {} (default: {})",
            branches.len(),
            location.full_name(),
            repository.default_branch
        );

        Ok(BranchInfo {
            branches,
            default_branch: repository.default_branch,
        })
    }
}
