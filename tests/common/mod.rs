#![allow(dead_code)]

use async_trait::async_trait;
use repo_digest::analysis::{AnalyzeOptions, Analyzer, ParsedFileRecord, SourceAnalyzer};
use repo_digest::config::AnalysisConfig;
use repo_digest::github::RepoLocation;
use repo_digest::report::TreeFormatter;
use repo_digest::service::AnalysisService;
use repo_digest::workspace::{RepositorySource, Workspace};
use repo_digest::{Error, Result, Settings};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Writes a fixed set of files into a fresh workspace on every open
#[derive(Clone, Default)]
pub struct FixtureSource {
    files: Vec<(String, String)>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl FixtureSource {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            opened: Arc::default(),
        }
    }

    /// Temporary directories handed out so far
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositorySource for FixtureSource {
    async fn open(&self, location: &RepoLocation, _branch: &str) -> Result<Workspace> {
        let workspace = Workspace::create(None)?.with_subdir(&location.name);
        for (rel, content) in &self.files {
            let path = workspace.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap())?;
            std::fs::write(path, content)?;
        }
        self.opened.lock().unwrap().push(workspace.base().to_path_buf());
        Ok(workspace)
    }
}

/// Fails after confirming the workspace exists
pub struct FailingAnalyzer;

impl Analyzer for FailingAnalyzer {
    fn analyze(&self, workspace: &Path, _options: &AnalyzeOptions) -> Result<Vec<ParsedFileRecord>> {
        assert!(workspace.exists());
        Err(Error::Internal("parser crashed".to_string()))
    }
}

/// Panics mid-run
pub struct PanickingAnalyzer;

impl Analyzer for PanickingAnalyzer {
    fn analyze(&self, _workspace: &Path, _options: &AnalyzeOptions) -> Result<Vec<ParsedFileRecord>> {
        panic!("analyzer bug");
    }
}

pub fn analysis_config() -> AnalysisConfig {
    Settings::default().analysis
}

pub fn service_with(source: FixtureSource, analyzer: Arc<dyn Analyzer>) -> AnalysisService {
    AnalysisService::new(
        Arc::new(source),
        analyzer,
        Arc::new(TreeFormatter::new()),
        analysis_config(),
    )
}

pub fn hello_world_source() -> FixtureSource {
    FixtureSource::new(&[
        ("main.rs", "//! Program entry.\nfn main() {}\n"),
        ("hello.py", "\"\"\"Says hello.\"\"\"\n\ndef hello():\n    print('hi')\n"),
        ("lib/greet.py", "class Greeter:\n    def greet(self):\n        pass\n"),
    ])
}

pub fn default_service(source: FixtureSource) -> AnalysisService {
    service_with(source, Arc::new(SourceAnalyzer::new()))
}
