//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "regolden",
    version,
    about = "Regolden: rule-driven test expectation rewriter",
    long_about = "Regolden rewrites test files in place using a table of regex find/replace rules.\n\nConfiguration precedence: CLI > regolden.toml > defaults.",
    after_help = "Examples:\n  regolden run --dir packages/stdlib/tests/unit/actions --rules rules/no-item.toml\n  regolden run --dir tests --rules rules.toml --check\n  regolden rules --rules rules/no-item.toml",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Enable debug diagnostics")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current regolden version.")]
    Version,
    /// Apply rules to files
    #[command(
        about = "Apply rewrite rules",
        long_about = "Find files under --dir ending with --suffix and apply every in-scope rule in order. Changed files are rewritten atomically. When --diff or --check is set, nothing is written.",
        after_help = "Examples:\n  regolden run --dir tests/unit --rules rules.toml\n  regolden run --dir tests/unit --rules rules.toml --diff\n  regolden run --dir tests/unit --rules rules.toml --output json"
    )]
    Run {
        #[arg(long, help = "Project root used for config discovery (default: current dir)")]
        root: Option<String>,
        #[arg(long, help = "Directory to scan (required unless set in regolden.toml)")]
        dir: Option<String>,
        #[arg(long, help = "Rule definition file, TOML or YAML (required unless configured)")]
        rules: Option<String>,
        #[arg(long, help = "File name suffix to select (default: -golden.test.ts)")]
        suffix: Option<String>,
        #[arg(long, help = "Glob of file names or paths to skip (repeatable)")]
        ignore: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Process files in parallel")]
        parallel: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Show diffs for changed files (implies no write)")]
        diff: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if changes would occur (implies no write)")]
        check: bool,
    },
    /// Validate and list rules
    #[command(
        about = "Validate rule file",
        long_about = "Load a rule file, compile every pattern and scope glob, and list the rules. Exits non-zero on the first invalid rule."
    )]
    Rules {
        #[arg(long, help = "Project root used for config discovery (default: current dir)")]
        root: Option<String>,
        #[arg(long, help = "Rule definition file, TOML or YAML")]
        rules: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "regolden", "run", "--dir", "tests", "--rules", "r.toml", "--ignore", "index.ts",
            "--ignore", "*-events.ts", "--check",
        ]);
        match cli.cmd {
            Commands::Run {
                dir,
                rules,
                ignore,
                check,
                diff,
                ..
            } => {
                assert_eq!(dir.as_deref(), Some("tests"));
                assert_eq!(rules.as_deref(), Some("r.toml"));
                assert_eq!(ignore, vec!["index.ts", "*-events.ts"]);
                assert!(check);
                assert!(!diff);
            }
            _ => panic!("expected run"),
        }
    }
}
