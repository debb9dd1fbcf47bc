//! Rule-driven rewriting of discovered files.
//!
//! Each file is read once, every in-scope rule is applied in declaration
//! order (later rules see earlier output), and the file is written back only
//! when the final content differs. Per-file failures are collected into the
//! report; only an inaccessible root aborts a run.

use crate::discover::{discover, NameFilter};
use crate::error::{Result, RewriteError};
use crate::models::{FileError, FileOutcome, RuleOutcome, RuleStatus, RunReport, Summary};
use crate::rules::{apply_rule, Rule};
use crate::utils::{self, LockedFile};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Persist changed files; when false the run only reports.
    pub write: bool,
    /// Keep original and rewritten text on each outcome (for diffs).
    pub capture: bool,
    /// Process files on the rayon pool.
    pub parallel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            write: true,
            capture: false,
            parallel: false,
        }
    }
}

/// Everything `process_file` learned about one file.
pub struct Processed {
    pub outcome: FileOutcome,
    pub rules: Vec<RuleOutcome>,
}

/// Apply `rules` to the file at `path`, writing it back when changed.
///
/// `rel` is the root-relative path used for scope matching and reporting.
/// The file stays exclusively locked from the read until the write-back.
pub fn process_file(path: &Path, rel: &str, rules: &[Rule], opts: &RunOptions) -> Result<Processed> {
    let access = |source| RewriteError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let mut locked = LockedFile::open(path).map_err(access)?;
    let original = locked.read_to_string().map_err(access)?;

    let mut content = original.clone();
    let mut rules_applied = Vec::new();
    let mut rule_outcomes = Vec::new();
    for rule in rules {
        if !rule.in_scope(rel) {
            continue;
        }
        let applied = apply_rule(&content, rule);
        let status = if applied.changed {
            RuleStatus::Applied
        } else {
            RuleStatus::SkippedNoMatch
        };
        debug!(rule = %rule.name, file = rel, replacements = applied.replacements, ?status);
        rule_outcomes.push(RuleOutcome {
            rule: rule.name.clone(),
            file: rel.to_string(),
            status,
            replacements: applied.replacements,
        });
        if applied.changed {
            rules_applied.push(rule.name.clone());
            content = applied.content.into_owned();
        }
    }

    let changed = content != original;
    let mut wrote = false;
    if changed && opts.write {
        locked.replace(&content).map_err(access)?;
        debug!(file = rel, target = %locked.path().display(), "rewrote");
        wrote = true;
    }

    let bytes_before = original.len();
    let bytes_after = content.len();
    Ok(Processed {
        outcome: FileOutcome {
            file: rel.to_string(),
            changed,
            wrote,
            rules_applied,
            bytes_before,
            bytes_after,
            original: if opts.capture { Some(original) } else { None },
            preview: if opts.capture && changed { Some(content) } else { None },
        },
        rules: rule_outcomes,
    })
}

/// Discover files under `dir` and rewrite them with `rules`.
///
/// `on_file` is invoked with each root-relative path before it is processed
/// (sequential runs only; parallel runs report after the fact).
pub fn run(
    dir: &Path,
    filter: &NameFilter,
    rules: &[Rule],
    opts: &RunOptions,
    mut on_file: impl FnMut(&str),
) -> Result<RunReport> {
    let mut walk_errors: Vec<RewriteError> = Vec::new();
    let targets = discover(dir, filter)?.filter_map(|entry| match entry {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(error = %e, "skipping unreadable entry");
            walk_errors.push(e);
            None
        }
    });

    let rel_of = |p: &Path| utils::rel_to(dir, p);
    let processed: Vec<(String, Result<Processed>)> = if opts.parallel {
        let mut paths: Vec<PathBuf> = targets.collect();
        paths.sort();
        paths
            .par_iter()
            .map(|p| {
                let rel = rel_of(p);
                let res = process_file(p, &rel, rules, opts);
                (rel, res)
            })
            .collect()
    } else {
        targets
            .map(|p| {
                let rel = rel_of(&p);
                on_file(&rel);
                let res = process_file(&p, &rel, rules, opts);
                (rel, res)
            })
            .collect()
    };

    let mut report = RunReport::default();
    let mut seen: Vec<String> = Vec::new();
    for (rel, res) in processed {
        seen.push(rel.clone());
        match res {
            Ok(p) => {
                report.results.push(p.outcome);
                report.rules.extend(p.rules);
            }
            Err(e) => report.errors.push(FileError {
                file: rel,
                message: e.to_string(),
            }),
        }
    }
    for e in walk_errors {
        let file = match &e {
            RewriteError::FileAccess { path, .. } => rel_of(path),
            _ => dir.display().to_string(),
        };
        report.errors.push(FileError {
            file,
            message: e.to_string(),
        });
    }
    report.rules.extend(not_found_outcomes(rules, &seen));

    report.results.sort_by(|a, b| a.file.cmp(&b.file));
    report.errors.sort_by(|a, b| a.file.cmp(&b.file));
    report
        .rules
        .sort_by(|a, b| a.file.cmp(&b.file).then(a.rule.cmp(&b.rule)));

    report.summary = Summary {
        scanned: seen.len(),
        changed: report.results.iter().filter(|r| r.changed).count(),
        updated: report.results.iter().filter(|r| r.wrote).count(),
        errors: report.errors.len(),
    };
    Ok(report)
}

/// Explicitly named scope entries that matched no discovered file.
fn not_found_outcomes(rules: &[Rule], seen: &[String]) -> Vec<RuleOutcome> {
    let names: HashSet<&str> = seen
        .iter()
        .map(|s| s.rsplit('/').next().unwrap_or(s))
        .collect();
    let paths: HashSet<&str> = seen.iter().map(String::as_str).collect();
    let mut out = Vec::new();
    for rule in rules {
        for lit in rule.literal_scope() {
            if !names.contains(lit) && !paths.contains(lit) {
                out.push(RuleOutcome {
                    rule: rule.name.clone(),
                    file: lit.to_string(),
                    status: RuleStatus::SkippedNotFound,
                    replacements: 0,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::RuleDef;
    use crate::rules::compile_all;
    use std::fs;
    use tempfile::tempdir;

    fn def(name: &str, files: &[&str], pattern: &str, replacement: &str) -> RuleDef {
        RuleDef {
            name: name.to_string(),
            files: files.iter().map(|s| s.to_string()).collect(),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            literal: false,
        }
    }

    fn rules(defs: Vec<RuleDef>) -> Vec<Rule> {
        compile_all(&defs).unwrap()
    }

    fn golden_filter() -> NameFilter {
        NameFilter::new("-golden.test.ts", &[]).unwrap()
    }

    #[test]
    fn test_rules_apply_in_declared_order() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a-golden.test.ts");
        fs::write(&p, "alpha").unwrap();
        let rs = rules(vec![def("one", &[], "alpha", "beta"), def("two", &[], "beta", "gamma")]);
        let out = process_file(&p, "a-golden.test.ts", &rs, &RunOptions::default()).unwrap();
        assert_eq!(out.outcome.rules_applied, vec!["one", "two"]);
        assert_eq!(fs::read_to_string(&p).unwrap(), "gamma");
        assert_eq!(out.outcome.bytes_before, 5);
        assert_eq!(out.outcome.bytes_after, 5);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("a-golden.test.ts");
        fs::write(&p, "alpha").unwrap();
        let rs = rules(vec![def("one", &[], "alpha", "beta")]);
        let opts = RunOptions {
            write: false,
            capture: true,
            parallel: false,
        };
        let out = process_file(&p, "a-golden.test.ts", &rs, &opts).unwrap();
        assert!(out.outcome.changed);
        assert!(!out.outcome.wrote);
        assert_eq!(out.outcome.preview.as_deref(), Some("beta"));
        assert_eq!(fs::read_to_string(&p).unwrap(), "alpha");
    }

    #[test]
    fn test_scope_excludes_other_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("giving-golden.test.ts"), "'not_holding'").unwrap();
        fs::write(dir.path().join("taking-golden.test.ts"), "'not_holding'").unwrap();
        let rs = rules(vec![def(
            "giving",
            &["giving-golden.test.ts"],
            "'not_holding'",
            "'no_item'",
        )]);
        let report = run(dir.path(), &golden_filter(), &rs, &RunOptions::default(), |_| {}).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("taking-golden.test.ts")).unwrap(),
            "'not_holding'"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("giving-golden.test.ts")).unwrap(),
            "'no_item'"
        );
        assert_eq!(report.summary.updated, 1);
        assert_eq!(report.summary.scanned, 2);
    }

    #[test]
    fn test_missing_scoped_file_reported_not_found() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("giving-golden.test.ts"), "nothing").unwrap();
        let rs = rules(vec![
            def("giving", &["giving-golden.test.ts"], "x", "y"),
            def("ghost", &["ghost-golden.test.ts"], "x", "y"),
        ]);
        let report = run(dir.path(), &golden_filter(), &rs, &RunOptions::default(), |_| {}).unwrap();
        let giving: Vec<_> = report.rules.iter().filter(|o| o.rule == "giving").collect();
        assert_eq!(giving.len(), 1);
        assert_eq!(giving[0].status, RuleStatus::SkippedNoMatch);
        let ghost: Vec<_> = report.not_found().collect();
        assert_eq!(ghost.len(), 1);
        assert_eq!(ghost[0].rule, "ghost");
        assert_eq!(report.summary.updated, 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            let body = if i % 2 == 0 { "'not_holding'" } else { "'taken'" };
            fs::write(dir.path().join(format!("f{}-golden.test.ts", i)), body).unwrap();
        }
        let rs = rules(vec![def("r", &[], "'not_holding'", "'no_item'")]);
        let opts = RunOptions {
            write: false,
            capture: false,
            parallel: true,
        };
        let par = run(dir.path(), &golden_filter(), &rs, &opts, |_| {}).unwrap();
        let seq_opts = RunOptions {
            parallel: false,
            ..opts
        };
        let seq = run(dir.path(), &golden_filter(), &rs, &seq_opts, |_| {}).unwrap();
        assert_eq!(par.summary, seq.summary);
        assert_eq!(par.summary.changed, 4);
        let files = |r: &RunReport| r.results.iter().map(|o| o.file.clone()).collect::<Vec<_>>();
        assert_eq!(files(&par), files(&seq));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_recorded_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked-golden.test.ts");
        fs::write(&locked, "'not_holding'").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        fs::write(dir.path().join("open-golden.test.ts"), "'not_holding'").unwrap();
        // root ignores permission bits; nothing to assert there
        if fs::read_to_string(&locked).is_ok() {
            return;
        }
        let rs = rules(vec![def("r", &[], "'not_holding'", "'no_item'")]);
        let report = run(dir.path(), &golden_filter(), &rs, &RunOptions::default(), |_| {}).unwrap();
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.errors[0].file, "locked-golden.test.ts");
        assert_eq!(report.summary.updated, 1);
    }
}
