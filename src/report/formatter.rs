use super::{tree::render_tree, FormatOptions, Report, ReportFormatter};
use crate::analysis::ParsedFileRecord;

const NO_DESCRIPTION: &str = "No description available.";

/// Markdown-flavoured report: heading, directory tree, per-file details
#[derive(Debug, Clone, Default)]
pub struct TreeFormatter;

impl TreeFormatter {
    pub fn new() -> Self {
        Self
    }

    fn project_name(records: &[&ParsedFileRecord], options: &FormatOptions) -> String {
        if let Some(name) = options
            .project_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }

        records
            .first()
            .and_then(|r| r.path.split_once('/'))
            .map(|(first, _)| first.to_string())
            .unwrap_or_else(|| "project".to_string())
    }

    fn heading(name: &str, records: &[&ParsedFileRecord]) -> String {
        let symbols: usize = records.iter().map(|r| r.symbols.len()).sum();
        format!(
            "# Project: {name}\n\nFiles analyzed: {} | Declarations found: {symbols}",
            records.len()
        )
    }

    fn preview(record: &ParsedFileRecord, budget: usize) -> Option<String> {
        if record.symbols.is_empty() {
            return None;
        }

        let listing = record
            .symbols
            .iter()
            .map(|s| format!("  - {}", s.signature))
            .collect::<Vec<_>>()
            .join("\n");

        if listing.chars().count() <= budget {
            Some(listing)
        } else {
            let mut cut: String = listing.chars().take(budget).collect();
            cut.push_str("...");
            Some(cut)
        }
    }

    fn file_section(record: &ParsedFileRecord, options: &FormatOptions) -> String {
        let language = record.language.map(|l| l.name()).unwrap_or("unknown");
        let mut section = format!(
            "### {}\nLanguage: {language} | Lines: {}\nSummary: {}",
            record.path,
            record.lines,
            record.doc.as_deref().unwrap_or(NO_DESCRIPTION)
        );

        if let Some(preview) = options
            .method_preview_chars
            .and_then(|budget| Self::preview(record, budget))
        {
            section.push_str("\nDeclarations:\n");
            section.push_str(&preview);
        }

        section
    }
}

impl ReportFormatter for TreeFormatter {
    fn format(&self, records: &[ParsedFileRecord], options: &FormatOptions) -> Report {
        let mut sorted: Vec<&ParsedFileRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));

        let name = Self::project_name(&sorted, options);
        let heading = Self::heading(&name, &sorted);
        let tree = render_tree(&name, sorted.iter().map(|r| r.path.as_str()));

        let details = if sorted.is_empty() {
            "No files were analyzed.".to_string()
        } else {
            sorted
                .iter()
                .map(|r| Self::file_section(r, options))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        Report::assemble(heading, tree, details, options.char_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Language, Symbol, SymbolKind};

    fn record(path: &str, doc: Option<&str>, symbols: &[&str]) -> ParsedFileRecord {
        ParsedFileRecord {
            path: path.to_string(),
            language: Some(Language::Python),
            doc: doc.map(str::to_string),
            symbols: symbols
                .iter()
                .map(|s| Symbol {
                    kind: SymbolKind::Function,
                    name: s.to_string(),
                    signature: format!("def {s}()"),
                })
                .collect(),
            lines: 10,
        }
    }

    #[test]
    fn test_project_name_from_options_or_first_path() {
        let records = vec![record("pkg/a.py", None, &[])];
        let report = TreeFormatter::new().format(&records, &FormatOptions::default());
        assert!(report.heading.starts_with("# Project: pkg"));

        let options = FormatOptions {
            project_name: Some("Hello-World".to_string()),
            ..FormatOptions::default()
        };
        let report = TreeFormatter::new().format(&records, &options);
        assert!(report.heading.starts_with("# Project: Hello-World"));
        assert!(report.tree.starts_with("Hello-World/"));

        let report = TreeFormatter::new().format(&[record("a.py", None, &[])], &FormatOptions::default());
        assert!(report.heading.starts_with("# Project: project"));
    }

    #[test]
    fn test_details_follow_path_order() {
        let records = vec![
            record("b.py", Some("Second."), &["two"]),
            record("a.py", None, &["one"]),
        ];
        let options = FormatOptions {
            method_preview_chars: Some(100),
            ..FormatOptions::default()
        };
        let report = TreeFormatter::new().format(&records, &options);

        let a = report.details.find("### a.py").unwrap();
        let b = report.details.find("### b.py").unwrap();
        assert!(a < b);
        assert!(report.details.contains("Summary: No description available."));
        assert!(report.details.contains("Summary: Second."));
        assert!(report.details.contains("  - def one()"));
    }

    #[test]
    fn test_preview_is_cut_to_budget() {
        let records = vec![record("a.py", None, &["alpha", "beta", "gamma"])];
        let options = FormatOptions {
            method_preview_chars: Some(12),
            ..FormatOptions::default()
        };
        let report = TreeFormatter::new().format(&records, &options);
        assert!(report.details.ends_with("Declarations:\n  - def alph..."));
    }

    #[test]
    fn test_preview_hidden_without_budget() {
        let records = vec![record("a.py", None, &["alpha"])];
        let report = TreeFormatter::new().format(&records, &FormatOptions::default());
        assert!(!report.details.contains("Declarations:"));
    }

    #[test]
    fn test_empty_records() {
        let report = TreeFormatter::new().format(&[], &FormatOptions::default());
        assert_eq!(report.tree, "project/");
        assert_eq!(report.details, "No files were analyzed.");
    }
}
