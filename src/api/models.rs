use serde::{Deserialize, Serialize};

use crate::report::Report;

/// Query parameters of the branch listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BranchesParams {
    pub repo_url: String,
}

/// Successful analysis response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub status: u16,
    pub report: Report,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
