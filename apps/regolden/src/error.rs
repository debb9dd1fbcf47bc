//! Error taxonomy for rule loading and rewriting.
//!
//! `Config`, `RuleFile`, `Pattern`, `Replacement` and `Scope` are fatal and raised before any
//! file is touched. `FileAccess` is recovered per file by the rewriter and
//! collected into the run report.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RewriteError {
    /// Root directory missing, unreadable, or not configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rule definition file missing or not parseable.
    #[error("rule file {}: {message}", path.display())]
    RuleFile { path: PathBuf, message: String },

    /// Invalid regular expression in a rule.
    #[error("invalid pattern in rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Replacement references a capture group the pattern does not define.
    #[error("replacement in rule '{rule}' references unknown group '{reference}' (write $$ for a literal $)")]
    Replacement { rule: String, reference: String },

    /// Invalid glob in a rule's file scope.
    #[error("invalid file scope '{pattern}' in rule '{rule}': {source}")]
    Scope {
        rule: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A single target file could not be read or written.
    #[error("{}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RewriteError {
    /// Fatal errors abort the run; per-file access errors do not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RewriteError::FileAccess { .. })
    }
}

pub type Result<T> = std::result::Result<T, RewriteError>;
