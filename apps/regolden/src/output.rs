//! Output rendering for `run` and `rules`.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-file results, per-rule outcomes, per-file errors and a summary.

use crate::models::RunReport;
use crate::rules::Rule;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Announce a file before it is processed (human mode, sequential runs).
pub fn print_processing(file: &str, output: &str) {
    if output == "json" {
        return;
    }
    if use_colors(output) {
        println!("{} {}...", "Processing".bright_black(), file);
    } else {
        println!("Processing {}...", file);
    }
}

/// Print the run report. `write` selects "Updated" vs "Would update" wording;
/// `diff` prints a naive before/after block for each changed file.
pub fn print_run(report: &RunReport, output: &str, write: bool, diff: bool) {
    match output {
        "json" => {
            let out = compose_run_json(report, write, diff);
            match serde_json::to_string_pretty(&out) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
            }
        }
        _ => {
            let color = use_colors(output);
            for r in &report.results {
                if r.changed {
                    let verb = if r.wrote { "Updated" } else { "Would update" };
                    let applied = r.rules_applied.join(", ");
                    if color {
                        println!("{} {} [{}]", verb.green().bold(), r.file.bold(), applied);
                    } else {
                        println!("{} {} [{}]", verb, r.file, applied);
                    }
                    if diff && !write {
                        if let Some(d) = build_naive_diff(r.original.as_deref(), r.preview.as_deref()) {
                            if color {
                                println!("{} {}\n{}", "---".cyan().bold(), r.file.bold(), d);
                            } else {
                                println!("--- {}\n{}", r.file, d);
                            }
                        }
                    }
                } else if color {
                    println!("{} {}", "No changes needed for".bright_black(), r.file);
                } else {
                    println!("No changes needed for {}", r.file);
                }
            }
            for o in report.not_found() {
                eprintln!(
                    "{} rule '{}' skipped: {} not found",
                    crate::utils::note_prefix(),
                    o.rule,
                    o.file
                );
            }
            for e in &report.errors {
                eprintln!("{} {}", crate::utils::error_prefix(), e.message);
            }
            let s = &report.summary;
            let summary = if write {
                format!(
                    "Updated {} of {} files ({} errors)",
                    s.updated, s.scanned, s.errors
                )
            } else {
                format!(
                    "{} of {} files would change ({} errors)",
                    s.changed, s.scanned, s.errors
                )
            };
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print the compiled rule table.
pub fn print_rules(rules: &[Rule], output: &str) {
    match output {
        "json" => {
            let items: Vec<_> = rules
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "files": r.scope.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                        "pattern": r.pattern(),
                        "replacement": r.replacement,
                    })
                })
                .collect();
            match serde_json::to_string_pretty(&json!({ "rules": items, "total": rules.len() })) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
            }
        }
        _ => {
            let color = use_colors(output);
            for r in rules {
                let scope = if r.scope.is_empty() {
                    "*".to_string()
                } else {
                    r.scope.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
                };
                if color {
                    println!("{} ❲{}❳ {} → {}", r.name.bold(), scope, r.pattern(), r.replacement);
                } else {
                    println!("{} ❲{}❳ {} → {}", r.name, scope, r.pattern(), r.replacement);
                }
            }
            println!("{} rules ok", rules.len());
        }
    }
}

fn build_naive_diff(old: Option<&str>, new: Option<&str>) -> Option<String> {
    let old = old?;
    let new = new?;
    let mut out = String::new();
    for (a, b) in old.lines().zip(new.lines()) {
        if a != b {
            out.push_str("- ");
            out.push_str(a);
            out.push('\n');
            out.push_str("+ ");
            out.push_str(b);
            out.push('\n');
        }
    }
    let (o, n) = (old.lines().count(), new.lines().count());
    for extra in old.lines().skip(n) {
        out.push_str("- ");
        out.push_str(extra);
        out.push('\n');
    }
    for extra in new.lines().skip(o) {
        out.push_str("+ ");
        out.push_str(extra);
        out.push('\n');
    }
    Some(out.trim_end().to_string())
}

/// Compose the run JSON object (pure) for testing/snapshot purposes.
pub fn compose_run_json(report: &RunReport, write: bool, diff: bool) -> JsonVal {
    let items: Vec<_> = report
        .results
        .iter()
        .map(|r| {
            json!({
                "file": r.file,
                "changed": r.changed,
                "wrote": r.wrote,
                "rules": r.rules_applied,
                "bytes_before": r.bytes_before,
                "bytes_after": r.bytes_after,
                "diff": if diff && !write { build_naive_diff(r.original.as_deref(), r.preview.as_deref()) } else { None },
            })
        })
        .collect();
    json!({
        "results": items,
        "rules": report.rules,
        "errors": report.errors,
        "summary": report.summary,
    })
}
