use crate::api::models::ProcessResponse;
use crate::github::BranchInfo;
use crate::service::AnalysisRequest;
use crate::{Error, Result};
use reqwest::{header, Client, Response};
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Turn a non-success response into an error carrying the server's message
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    Err(match status.as_u16() {
        400 => Error::Validation(message),
        404 => Error::RepositoryNotFound(message),
        _ => Error::Internal(format!("Server returned {status}: {message}")),
    })
}

/// List branches of a repository through a running server
pub async fn branches(server_url: &str, repo_url: &str) -> Result<()> {
    let client = Client::new();

    let url = format!(
        "{}/api/branches?repo_url={}",
        server_url.trim_end_matches('/'),
        urlencoding::encode(repo_url)
    );

    let response = check_response(client.get(&url).send().await?).await?;
    let info: BranchInfo = response.json().await?;

    print_branches(&info);

    Ok(())
}

/// Request a report through a running server
pub async fn analyze(server_url: &str, request: &AnalysisRequest, json: bool) -> Result<()> {
    let client = Client::new();
    let url = format!("{}/api/process", server_url.trim_end_matches('/'));

    let accept = if json { "application/json" } else { "text/plain" };
    let response = client
        .post(&url)
        .header(header::ACCEPT, accept)
        .json(request)
        .send()
        .await?;
    let response = check_response(response).await?;

    if json {
        let body: ProcessResponse = response.json().await?;
        let pretty = serde_json::to_string_pretty(&body)
            .map_err(|e| Error::Internal(format!("Failed to encode report: {e}")))?;
        println!("{pretty}");
    } else {
        println!("{}", response.text().await?);
    }

    Ok(())
}

fn print_branches(info: &BranchInfo) {
    if info.branches.is_empty() {
        println!("No branches found");
        return;
    }

    println!("Branches ({}):", info.branches.len());
    for branch in &info.branches {
        if branch == &info.default_branch {
            println!("  * {branch} (default)");
        } else {
            println!("    {branch}");
        }
    }
}
