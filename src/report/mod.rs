pub mod formatter;
pub mod tree;

use crate::analysis::ParsedFileRecord;
use serde::{Deserialize, Serialize};

pub use formatter::TreeFormatter;

/// Appended to the flattened report when it was cut at the budget
pub const TRUNCATION_MARKER: &str = "\n\n... (truncated due to length)";

/// Formatted description of an analyzed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub heading: String,
    pub tree: String,
    pub details: String,
    /// Flattened report, present only when it had to be truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<String>,
}

impl Report {
    /// Build a report, truncating the flattened view to `char_budget` chars
    pub fn assemble(heading: String, tree: String, details: String, char_budget: Option<usize>) -> Self {
        let combined = combine(&heading, &tree, &details);
        let full = match char_budget {
            Some(budget) if combined.chars().count() > budget => {
                let mut truncated: String = combined.chars().take(budget).collect();
                truncated.push_str(TRUNCATION_MARKER);
                Some(truncated)
            }
            _ => None,
        };

        Self {
            heading,
            tree,
            details,
            full,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.full.is_some()
    }

    /// Flattened text for human display
    pub fn to_text(&self) -> String {
        match &self.full {
            Some(full) => full.clone(),
            None => combine(&self.heading, &self.tree, &self.details),
        }
    }
}

fn combine(heading: &str, tree: &str, details: &str) -> String {
    format!("{heading}\n\n## Tree Structure:\n{tree}\n\n## Detailed Description:\n{details}")
}

/// Rendering options for a single report
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Overrides the name inferred from the records
    pub project_name: Option<String>,
    /// Character budget of the flattened report
    pub char_budget: Option<usize>,
    /// Character budget of each file's declaration preview, `None` hides it
    pub method_preview_chars: Option<usize>,
}

/// Turns analysis records into a [`Report`]
pub trait ReportFormatter: Send + Sync {
    fn format(&self, records: &[ParsedFileRecord], options: &FormatOptions) -> Report;
}
