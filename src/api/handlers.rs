use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::{
    analysis::SourceAnalyzer,
    api::{models::*, rate_limit::ClientRateLimiter},
    github::{parse_repository_url, BranchInfo, GitHubClient, GitHubConfig},
    report::TreeFormatter,
    service::{AnalysisRequest, AnalysisService},
    workspace::GitCloneSource,
    Error, Result, Settings,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub github: GitHubClient,
    pub analysis: Arc<AnalysisService>,
    pub limiter: ClientRateLimiter,
    pub settings: Settings,
}

impl AppState {
    /// Wire the production collaborators from settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let github = GitHubClient::new(GitHubConfig::from_settings(&settings.github))?;

        let analysis = AnalysisService::new(
            Arc::new(GitCloneSource::new(&settings.github, &settings.analysis)),
            Arc::new(SourceAnalyzer::new()),
            Arc::new(TreeFormatter::new()),
            settings.analysis.clone(),
        );

        let limiter = ClientRateLimiter::per_minute(settings.server.rate_limit_per_minute);

        Ok(Self {
            github,
            analysis: Arc::new(analysis),
            limiter,
            settings,
        })
    }
}

/// GET /api/branches - List branches of a repository
pub async fn list_branches(
    State(state): State<AppState>,
    query: std::result::Result<Query<BranchesParams>, QueryRejection>,
) -> Result<Json<BranchInfo>> {
    let Query(params) = query.map_err(|e| Error::Validation(e.body_text()))?;
    debug!("Branches request: {:?}", params);

    let location = parse_repository_url(&params.repo_url)?;
    let branches = state.github.list_branches(&location).await?;

    Ok(Json(branches))
}

fn wants_plain_text(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/plain") && !accept.contains("application/json"))
        .unwrap_or(false)
}

/// POST /api/process - Analyze a repository branch
pub async fn process_repository(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|e| Error::Validation(e.body_text()))?;
    debug!(
        "Process request: {} @ {} (max_files: {})",
        request.repo_url, request.branch, request.max_files
    );

    let report = state.analysis.run(request).await?;

    if wants_plain_text(&headers) {
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report.to_text(),
        )
            .into_response());
    }

    Ok(Json(ProcessResponse {
        status: 200,
        report,
    })
    .into_response())
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}
