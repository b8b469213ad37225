pub mod client;
pub mod config;
pub mod models;
pub mod parser;
pub mod quota;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use models::BranchInfo;
pub use parser::{parse_repository_url, RepoLocation};
pub use quota::ApiQuota;
