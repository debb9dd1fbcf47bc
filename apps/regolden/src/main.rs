//! Regolden CLI binary entry point.
//! Delegates to the library for rule loading and rewriting and prints results.

use clap::Parser;
use regolden::cli::{Cli, Commands};
use regolden::config::{self, CliOverrides};
use regolden::discover::NameFilter;
use regolden::{output, rewrite, rules, utils, RewriteError};
use std::path::PathBuf;
use tracing::info;

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), msg);
    std::process::exit(2);
}

/// Fatal errors exit 2; anything recoverable that still reaches here exits 1.
fn exit_with(err: RewriteError) -> ! {
    if err.is_fatal() {
        fail(err);
    }
    eprintln!("{} {}", utils::error_prefix(), err);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    regolden::init_tracing(cli.verbose);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Run {
            root,
            dir,
            rules: rules_path,
            suffix,
            ignore,
            output: out,
            parallel,
            diff,
            check,
        } => {
            let eff = config::resolve_effective(&CliOverrides {
                root,
                dir,
                rules: rules_path,
                suffix,
                ignore,
                output: out,
                parallel: if parallel { Some(true) } else { None },
                diff: if diff { Some(true) } else { None },
                check: if check { Some(true) } else { None },
            })
            .unwrap_or_else(|e| exit_with(e));
            if !eff.config_found && eff.output != "json" {
                eprintln!(
                    "{} No regolden.toml found; using defaults.",
                    utils::note_prefix()
                );
            }
            let dir: PathBuf = eff
                .dir
                .clone()
                .unwrap_or_else(|| fail("Directory is not configured. Pass --dir or add regolden.toml."));
            let rules_path: PathBuf = eff
                .rules
                .clone()
                .unwrap_or_else(|| fail("Rule file is not configured. Pass --rules or add regolden.toml."));

            // Validate every rule before any file is touched
            let rules = rules::load_rules(&rules_path).unwrap_or_else(|e| exit_with(e));
            let filter = NameFilter::new(&eff.suffix, &eff.ignore).unwrap_or_else(|e| exit_with(e));
            if eff.output != "json" {
                eprintln!(
                    "{} {} rules from {}, scanning {} for *{}",
                    utils::info_prefix(),
                    rules.len(),
                    rules_path.display(),
                    dir.display(),
                    eff.suffix
                );
            }
            info!(dir = %dir.display(), rules = rules.len(), parallel = eff.parallel, "starting run");

            let opts = rewrite::RunOptions {
                write: eff.write,
                capture: eff.diff,
                parallel: eff.parallel,
            };
            let report = rewrite::run(&dir, &filter, &rules, &opts, |f| {
                output::print_processing(f, &eff.output)
            })
            .unwrap_or_else(|e| exit_with(e));
            output::print_run(&report, &eff.output, eff.write, eff.diff);
            if eff.check && report.summary.changed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Rules {
            root,
            rules: rules_path,
            output: out,
        } => {
            let eff = config::resolve_effective(&CliOverrides {
                root,
                rules: rules_path,
                output: out,
                ..Default::default()
            })
            .unwrap_or_else(|e| exit_with(e));
            let rules_path = eff
                .rules
                .clone()
                .unwrap_or_else(|| fail("Rule file is not configured. Pass --rules or add regolden.toml."));
            let rules = rules::load_rules(&rules_path).unwrap_or_else(|e| exit_with(e));
            output::print_rules(&rules, &eff.output);
        }
    }
}
