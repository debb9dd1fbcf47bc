//! Shared data models for the rule file and the run report.

pub mod rules;

use serde::Serialize;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Result of applying one rule to one file.
pub enum RuleStatus {
    Applied,
    SkippedNoMatch,
    SkippedNotFound,
}

#[derive(Serialize, Clone, Debug)]
/// Per-rule, per-file application record.
pub struct RuleOutcome {
    pub rule: String,
    pub file: String,
    pub status: RuleStatus,
    pub replacements: usize,
}

#[derive(Serialize, Clone, Debug)]
/// Outcome of processing a single target file.
pub struct FileOutcome {
    pub file: String,
    pub changed: bool,
    pub wrote: bool,
    pub rules_applied: Vec<String>,
    pub bytes_before: usize,
    pub bytes_after: usize,
    #[serde(skip)]
    pub original: Option<String>,
    #[serde(skip)]
    pub preview: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
/// A per-file failure that did not abort the run.
pub struct FileError {
    pub file: String,
    pub message: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
/// Aggregated totals used by printers.
pub struct Summary {
    pub scanned: usize,
    pub changed: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Serialize, Clone, Debug, Default)]
/// Everything a single invocation produced.
pub struct RunReport {
    pub results: Vec<FileOutcome>,
    pub rules: Vec<RuleOutcome>,
    pub errors: Vec<FileError>,
    pub summary: Summary,
}

impl RunReport {
    /// Rules whose literal scope named a file the walk never found.
    pub fn not_found(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rules
            .iter()
            .filter(|o| o.status == RuleStatus::SkippedNotFound)
    }
}
