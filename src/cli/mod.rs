pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "repo-digest")]
#[command(about = "Repository structure reports for GitHub projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// List the branches of a repository
    Branches {
        /// GitHub repository URL
        repo_url: String,

        /// Server to query
        #[arg(long, env = "REPO_DIGEST_SERVER", default_value = "http://127.0.0.1:8000")]
        server: String,
    },

    /// Produce a structure report for a repository branch
    Analyze {
        /// GitHub repository URL
        repo_url: String,

        /// Branch to analyze
        #[arg(short, long)]
        branch: String,

        /// Maximum number of files to analyze
        #[arg(long, default_value_t = 1000)]
        max_files: usize,

        /// Keep test files in the report
        #[arg(long)]
        include_tests: bool,

        /// Glob of paths to skip (repeatable)
        #[arg(long = "ignore")]
        ignore_patterns: Vec<String>,

        /// Restrict to a language (repeatable)
        #[arg(long = "language")]
        languages: Vec<String>,

        /// Maximum directory depth
        #[arg(long)]
        depth: Option<usize>,

        /// Print the JSON response instead of the text report
        #[arg(long)]
        json: bool,

        /// Server to query
        #[arg(long, env = "REPO_DIGEST_SERVER", default_value = "http://127.0.0.1:8000")]
        server: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_command() {
        let cli = Cli::try_parse_from([
            "repo-digest",
            "analyze",
            "https://github.com/octocat/Hello-World",
            "--branch",
            "master",
            "--ignore",
            "docs/**",
            "--ignore",
            "*.md",
            "--include-tests",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                branch,
                ignore_patterns,
                include_tests,
                max_files,
                ..
            } => {
                assert_eq!(branch, "master");
                assert_eq!(ignore_patterns, vec!["docs/**", "*.md"]);
                assert!(include_tests);
                assert_eq!(max_files, 1000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
