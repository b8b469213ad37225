//! Analyzer boundary.
//!
//! The orchestration layer only depends on the [`Analyzer`] trait; the
//! built-in [`SourceAnalyzer`] is one implementation and can be swapped for
//! another engine or a stub in tests.

pub mod extract;
pub mod source;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use source::SourceAnalyzer;

/// Languages recognised by the built-in analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    Java,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::Rust,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Java,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    /// Accepts names (`python`) and extensions (`py`)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" => Some(Language::Python),
            "rust" => Some(Language::Rust),
            "javascript" => Some(Language::JavaScript),
            "typescript" => Some(Language::TypeScript),
            "golang" => Some(Language::Go),
            "java" => Some(Language::Java),
            other => Self::from_extension(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Function,
    Method,
    Type,
}

/// A named declaration found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Declaration line as written, trimmed
    pub signature: String,
}

/// Per-file result of an analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFileRecord {
    /// Path relative to the workspace root, `/`-separated
    pub path: String,
    pub language: Option<Language>,
    pub doc: Option<String>,
    pub symbols: Vec<Symbol>,
    pub lines: usize,
}

/// Filters applied while analyzing a workspace
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub max_files: usize,
    pub ignore_tests: bool,
    pub ignore_patterns: Vec<String>,
    /// Empty means every supported language
    pub languages: Vec<Language>,
    pub max_depth: Option<usize>,
    pub max_file_bytes: u64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_files: 1000,
            ignore_tests: true,
            ignore_patterns: Vec::new(),
            languages: Vec::new(),
            max_depth: None,
            max_file_bytes: 262_144,
        }
    }
}

/// Produces per-file records for a checked-out tree
pub trait Analyzer: Send + Sync {
    fn analyze(&self, workspace: &Path, options: &AnalyzeOptions) -> Result<Vec<ParsedFileRecord>>;
}
