use super::{extract, AnalyzeOptions, Analyzer, Language, ParsedFileRecord};
use crate::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "testdata", "testing"];

/// Built-in analyzer: walks the tree and extracts docs and declarations
#[derive(Debug, Clone, Default)]
pub struct SourceAnalyzer;

impl SourceAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

/// Compile ignore patterns into one matcher
pub fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Validation(format!("Invalid ignore pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| Error::Validation(format!("Invalid ignore patterns: {e}")))
}

/// Whether a relative `/`-separated path looks like test code
pub fn is_test_path(path: &str) -> bool {
    let mut components: Vec<&str> = path.split('/').collect();
    let file_name = components.pop().unwrap_or_default();

    if components
        .iter()
        .any(|c| TEST_DIRS.contains(&c.to_ascii_lowercase().as_str()))
    {
        return true;
    }

    if let Some(stem) = file_name.strip_suffix(".java") {
        // JUnit naming is case-sensitive: `UserTest`, not `Latest`
        return stem.len() > 4
            && (stem.ends_with("Test") || stem.ends_with("Tests") || stem.ends_with("IT"));
    }

    let lower = file_name.to_ascii_lowercase();
    let (stem, _ext) = lower.rsplit_once('.').unwrap_or((lower.as_str(), ""));

    lower == "conftest.py"
        || stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem.ends_with("_tests")
        || stem.ends_with(".test")
        || stem.ends_with(".spec")
}

fn ignored_by_patterns(globs: Option<&GlobSet>, rel: &str) -> bool {
    let Some(globs) = globs else {
        return false;
    };
    if globs.is_match(rel) {
        return true;
    }
    // Bare names like `*.md` or `vendor` also match anywhere in the tree
    rel.split('/').any(|component| globs.is_match(component))
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl SourceAnalyzer {
    fn collect_files(
        &self,
        root: &Path,
        options: &AnalyzeOptions,
        globs: Option<&GlobSet>,
    ) -> Result<Vec<(String, PathBuf, Language)>> {
        let mut builder = WalkBuilder::new(root);
        builder.hidden(true);
        builder.git_ignore(true);
        builder.git_exclude(true);
        builder.git_global(false);
        builder.require_git(false);
        builder.follow_links(false);
        builder.max_depth(options.max_depth);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| Error::Analysis(format!("walk failed: {e}")))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            let Some(language) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension)
            else {
                continue;
            };

            if !options.languages.is_empty() && !options.languages.contains(&language) {
                continue;
            }

            let rel = relative_path(root, path);
            if options.ignore_tests && is_test_path(&rel) {
                continue;
            }
            if ignored_by_patterns(globs, &rel) {
                continue;
            }

            files.push((rel, path.to_path_buf(), language));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn parse_file(
        &self,
        rel: String,
        path: &Path,
        language: Language,
        max_file_bytes: u64,
    ) -> Result<ParsedFileRecord> {
        let size = std::fs::metadata(path)
            .map_err(|e| Error::Analysis(format!("failed to stat {rel}: {e}")))?
            .len();

        if size > max_file_bytes {
            debug!("Skipping contents of {} ({} bytes)", rel, size);
            return Ok(ParsedFileRecord {
                path: rel,
                language: Some(language),
                doc: None,
                symbols: Vec::new(),
                lines: 0,
            });
        }

        let bytes =
            std::fs::read(path).map_err(|e| Error::Analysis(format!("failed to read {rel}: {e}")))?;
        let content = String::from_utf8_lossy(&bytes);

        Ok(ParsedFileRecord {
            doc: extract::extract_doc(&content, language),
            symbols: extract::extract_symbols(&content, language),
            lines: content.lines().count(),
            language: Some(language),
            path: rel,
        })
    }
}

impl Analyzer for SourceAnalyzer {
    fn analyze(&self, workspace: &Path, options: &AnalyzeOptions) -> Result<Vec<ParsedFileRecord>> {
        if !workspace.is_dir() {
            return Err(Error::Analysis(format!(
                "workspace {} is not a directory",
                workspace.display()
            )));
        }

        let start = Instant::now();
        let globs = build_globset(&options.ignore_patterns)
            .map_err(|e| Error::Analysis(e.to_string()))?;

        let mut files = self.collect_files(workspace, options, globs.as_ref())?;
        let eligible = files.len();
        if files.len() > options.max_files {
            warn!(
                "Limiting analysis to {} of {} eligible files",
                options.max_files, eligible
            );
            files.truncate(options.max_files);
        }

        let records = files
            .into_iter()
            .map(|(rel, path, language)| self.parse_file(rel, &path, language, options.max_file_bytes))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Analyzed {} files ({} eligible) in {:.2}s",
            records.len(),
            eligible,
            start.elapsed().as_secs_f64()
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "app/main.py", "\"\"\"Entry point.\"\"\"\n\ndef main():\n    pass\n");
        write(root, "app/models.py", "class User:\n    def name(self):\n        return ''\n");
        write(root, "tests/test_main.py", "def test_main():\n    pass\n");
        write(root, "app/util_test.go", "package app\n");
        write(root, "web/index.ts", "export function start() {}\n");
        write(root, "vendor/lib.js", "function vendored() {}\n");
        write(root, "README.md", "# Readme\n");
        write(root, ".hidden/secret.py", "def hidden():\n    pass\n");
        dir
    }

    fn paths(records: &[ParsedFileRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_skips_tests_and_unsupported_files() {
        let dir = fixture();
        let records = SourceAnalyzer::new()
            .analyze(dir.path(), &AnalyzeOptions::default())
            .unwrap();

        assert_eq!(
            paths(&records),
            vec!["app/main.py", "app/models.py", "vendor/lib.js", "web/index.ts"]
        );
        assert_eq!(records[0].doc.as_deref(), Some("Entry point."));
        assert_eq!(records[1].symbols.len(), 2);
    }

    #[test]
    fn test_includes_tests_when_asked() {
        let dir = fixture();
        let options = AnalyzeOptions {
            ignore_tests: false,
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();

        assert!(paths(&records).contains(&"tests/test_main.py"));
        assert!(paths(&records).contains(&"app/util_test.go"));
    }

    #[test]
    fn test_ignore_patterns_and_languages() {
        let dir = fixture();
        let options = AnalyzeOptions {
            ignore_patterns: vec!["vendor".to_string(), "**/models.py".to_string()],
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();
        assert_eq!(paths(&records), vec!["app/main.py", "web/index.ts"]);

        let options = AnalyzeOptions {
            languages: vec![Language::TypeScript],
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();
        assert_eq!(paths(&records), vec!["web/index.ts"]);
    }

    #[test]
    fn test_max_files_keeps_first_paths() {
        let dir = fixture();
        let options = AnalyzeOptions {
            max_files: 2,
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();
        assert_eq!(paths(&records), vec!["app/main.py", "app/models.py"]);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.py", "x = 1\n");
        write(dir.path(), "pkg/nested.py", "x = 1\n");
        let options = AnalyzeOptions {
            max_depth: Some(1),
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();
        assert_eq!(paths(&records), vec!["top.py"]);
    }

    #[test]
    fn test_large_files_are_listed_without_contents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.py", &"def f():\n    pass\n".repeat(100));
        let options = AnalyzeOptions {
            max_file_bytes: 16,
            ..AnalyzeOptions::default()
        };
        let records = SourceAnalyzer::new().analyze(dir.path(), &options).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].symbols.is_empty());
    }

    #[test]
    fn test_gitignore_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "build/\n");
        write(dir.path(), "build/generated.py", "x = 1\n");
        write(dir.path(), "src/lib.rs", "pub fn f() {}\n");
        let records = SourceAnalyzer::new()
            .analyze(dir.path(), &AnalyzeOptions::default())
            .unwrap();
        assert_eq!(paths(&records), vec!["src/lib.rs"]);
    }

    #[test]
    fn test_missing_workspace_is_an_analysis_error() {
        let err = SourceAnalyzer::new()
            .analyze(Path::new("/nonexistent/workspace"), &AnalyzeOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Analysis(_)));
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("tests/unit.py"));
        assert!(is_test_path("pkg/test_models.py"));
        assert!(is_test_path("pkg/models_test.py"));
        assert!(is_test_path("cmd/server_test.go"));
        assert!(is_test_path("src/app.test.ts"));
        assert!(is_test_path("src/app.spec.js"));
        assert!(is_test_path("src/__tests__/app.js"));
        assert!(is_test_path("conftest.py"));
        assert!(is_test_path("src/main/java/UserServiceTest.java"));
        assert!(is_test_path("src/main/java/UserServiceTests.java"));
        assert!(is_test_path("src/main/java/CheckoutFlowIT.java"));

        assert!(!is_test_path("src/contest.py"));
        assert!(!is_test_path("src/attestation.rs"));
        assert!(!is_test_path("src/main.rs"));
        assert!(!is_test_path("src/Latest.java"));
        assert!(!is_test_path("src/Contest.java"));
        assert!(!is_test_path("src/Manifest.java"));
        assert!(!is_test_path("src/Attest.java"));
        assert!(!is_test_path("src/Test.java"));
    }

    #[test]
    fn test_invalid_glob_is_a_validation_error() {
        let err = build_globset(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
