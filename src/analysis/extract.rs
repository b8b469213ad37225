//! Line-oriented extraction of doc summaries and declarations.

use super::{Language, Symbol, SymbolKind};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const MAX_SIGNATURE_CHARS: usize = 160;
const MAX_SUMMARY_CHARS: usize = 400;

#[derive(Clone, Copy)]
enum RuleKind {
    Fixed(SymbolKind),
    /// Function at top level, method when indented
    ByIndent,
    /// Method when a receiver group matched
    ByReceiver,
}

struct Rule {
    pattern: Regex,
    kind: RuleKind,
}

impl Rule {
    fn new(pattern: &str, kind: RuleKind) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("declaration pattern is valid"),
            kind,
        }
    }

    fn kind_for(&self, caps: &Captures) -> SymbolKind {
        match self.kind {
            RuleKind::Fixed(kind) => kind,
            RuleKind::ByIndent => {
                if caps.name("indent").map_or(true, |m| m.as_str().is_empty()) {
                    SymbolKind::Function
                } else {
                    SymbolKind::Method
                }
            }
            RuleKind::ByReceiver => {
                if caps.name("recv").is_some() {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                }
            }
        }
    }
}

fn rules(language: Language) -> &'static [Rule] {
    static PYTHON: OnceLock<Vec<Rule>> = OnceLock::new();
    static RUST: OnceLock<Vec<Rule>> = OnceLock::new();
    static SCRIPT: OnceLock<Vec<Rule>> = OnceLock::new();
    static GO: OnceLock<Vec<Rule>> = OnceLock::new();
    static JAVA: OnceLock<Vec<Rule>> = OnceLock::new();

    match language {
        Language::Python => PYTHON.get_or_init(|| {
            vec![
                Rule::new(
                    r"^(?P<indent>\s*)class\s+(?P<name>[A-Za-z_]\w*)",
                    RuleKind::Fixed(SymbolKind::Class),
                ),
                Rule::new(
                    r"^(?P<indent>\s*)(?:async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\(",
                    RuleKind::ByIndent,
                ),
            ]
        }),
        Language::Rust => RUST.get_or_init(|| {
            vec![
                Rule::new(
                    r"^(?P<indent>\s*)(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\x22[^\x22]*\x22\s+)?fn\s+(?P<name>\w+)",
                    RuleKind::ByIndent,
                ),
                Rule::new(
                    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union|type)\s+(?P<name>\w+)",
                    RuleKind::Fixed(SymbolKind::Type),
                ),
            ]
        }),
        Language::JavaScript | Language::TypeScript => SCRIPT.get_or_init(|| {
            vec![
                Rule::new(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)",
                    RuleKind::Fixed(SymbolKind::Class),
                ),
                Rule::new(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*[<(]",
                    RuleKind::Fixed(SymbolKind::Function),
                ),
                Rule::new(
                    r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=>",
                    RuleKind::Fixed(SymbolKind::Function),
                ),
                Rule::new(
                    r"^\s*(?:export\s+)?(?:declare\s+)?(?:interface|type|enum)\s+(?P<name>[A-Za-z_$][\w$]*)",
                    RuleKind::Fixed(SymbolKind::Type),
                ),
            ]
        }),
        Language::Go => GO.get_or_init(|| {
            vec![
                Rule::new(
                    r"^func\s+(?P<recv>\([^)]*\)\s*)?(?P<name>\w+)",
                    RuleKind::ByReceiver,
                ),
                Rule::new(r"^type\s+(?P<name>\w+)\s+", RuleKind::Fixed(SymbolKind::Type)),
            ]
        }),
        Language::Java => JAVA.get_or_init(|| {
            vec![
                Rule::new(
                    r"^\s*(?:(?:public|protected|private|static|final|abstract|sealed)\s+)*class\s+(?P<name>\w+)",
                    RuleKind::Fixed(SymbolKind::Class),
                ),
                Rule::new(
                    r"^\s*(?:(?:public|protected|private|static|final|abstract|sealed)\s+)*(?:interface|enum|record)\s+(?P<name>\w+)",
                    RuleKind::Fixed(SymbolKind::Type),
                ),
                Rule::new(
                    r"^\s+(?:(?:public|protected|private|static|final|abstract|synchronized|native|default)\s+)+[\w<>\[\],.?\s]+?\s+(?P<name>\w+)\s*\(",
                    RuleKind::Fixed(SymbolKind::Method),
                ),
            ]
        }),
    }
}

fn is_comment_line(line: &str, language: Language) -> bool {
    let trimmed = line.trim_start();
    match language {
        Language::Python => trimmed.starts_with('#'),
        _ => trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*'),
    }
}

fn clean_signature(line: &str) -> String {
    let trimmed = line
        .trim()
        .trim_end_matches(|c: char| c == '{' || c == ':' || c.is_whitespace());
    truncate_chars(trimmed, MAX_SIGNATURE_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

/// Declarations in source order
pub fn extract_symbols(content: &str, language: Language) -> Vec<Symbol> {
    let rules = rules(language);
    let mut symbols = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() || is_comment_line(line, language) {
            continue;
        }

        for rule in rules {
            if let Some(caps) = rule.pattern.captures(line) {
                if let Some(name) = caps.name("name") {
                    symbols.push(Symbol {
                        kind: rule.kind_for(&caps),
                        name: name.as_str().to_string(),
                        signature: clean_signature(line),
                    });
                }
                break;
            }
        }
    }

    symbols
}

/// First paragraph of the file-level documentation, whitespace collapsed
pub fn extract_doc(content: &str, language: Language) -> Option<String> {
    let raw = match language {
        Language::Python => python_docstring(content).or_else(|| leading_line_comments(content, "#")),
        Language::Rust => leading_line_comments(content, "//!")
            .or_else(|| leading_block_comment(content))
            .or_else(|| leading_line_comments(content, "///")),
        _ => leading_block_comment(content).or_else(|| leading_line_comments(content, "//")),
    }?;

    let paragraph = raw
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if paragraph.is_empty() {
        None
    } else {
        Some(truncate_chars(&paragraph, MAX_SUMMARY_CHARS))
    }
}

/// Lines before the first code line, skipping shebangs and blank lines
fn header_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .skip_while(|l| l.trim().is_empty() || l.starts_with("#!") || l.contains("-*- coding"))
}

fn python_docstring(content: &str) -> Option<String> {
    let mut lines = content
        .lines()
        .skip_while(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
    let first = lines.next()?.trim();

    let body = first
        .strip_prefix('r')
        .or_else(|| first.strip_prefix('R'))
        .unwrap_or(first);
    let quote = if body.starts_with("\"\"\"") {
        "\"\"\""
    } else if body.starts_with("'''") {
        "'''"
    } else {
        return None;
    };

    let rest = &body[quote.len()..];
    if let Some(end) = rest.find(quote) {
        return Some(rest[..end].to_string());
    }

    let mut text = vec![rest.to_string()];
    for line in lines {
        if let Some(end) = line.find(quote) {
            text.push(line[..end].to_string());
            return Some(text.join("\n"));
        }
        text.push(line.to_string());
    }
    // Unterminated docstring
    None
}

fn leading_line_comments(content: &str, marker: &str) -> Option<String> {
    let mut collected = Vec::new();
    for line in header_lines(content) {
        let trimmed = line.trim_start();
        match trimmed.strip_prefix(marker) {
            // `///` is not a `//!` block and `//!` is not a plain `//` block
            Some(rest) if marker == "//" && (rest.starts_with('/') || rest.starts_with('!')) => break,
            Some(rest) => collected.push(rest.trim().to_string()),
            None if trimmed.is_empty() && !collected.is_empty() => collected.push(String::new()),
            None => break,
        }
    }

    if collected.iter().all(|l| l.is_empty()) {
        None
    } else {
        Some(collected.join("\n"))
    }
}

fn leading_block_comment(content: &str) -> Option<String> {
    let start = header_lines(content).next()?.trim_start();
    if !start.starts_with("/*") {
        return None;
    }

    let offset = content.find(start)?;
    let block = &content[offset..];
    // The closer must follow the opener, so `/*/` does not close itself
    let end = block[2..].find("*/")? + 2;
    let inner = block[2..end].trim_start_matches(['*', '!']);

    let text = inner
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .collect::<Vec<_>>()
        .join("\n");

    // License banners are not descriptions
    if text.to_lowercase().contains("copyright") || text.contains("SPDX-License") {
        return None;
    }

    Some(text)
}
