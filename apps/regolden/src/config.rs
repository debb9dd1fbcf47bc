//! Configuration discovery and effective settings resolution.
//!
//! Regolden reads `regolden.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `dir`, `rules`: none (must be given on the CLI or in config)
//! - `suffix`: `-golden.test.ts`
//! - `ignore`: empty
//! - `output`: `human`
//! - `parallel`: false
//! - `run.write`: true, `run.diff|check`: false
//!
//! Overrides precedence: CLI > config file > defaults. Relative `dir` and
//! `rules` values from the config file resolve against the project root.

use crate::error::{Result, RewriteError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUFFIX: &str = "-golden.test.ts";

const CONFIG_NAMES: [&str; 3] = ["regolden.toml", "regolden.yaml", "regolden.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Run-related configuration section under `[run]`.
pub struct RunCfg {
    pub write: Option<bool>,
    pub diff: Option<bool>,
    pub check: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `regolden.toml|yaml`.
pub struct RegoldenConfig {
    pub dir: Option<String>,
    pub rules: Option<String>,
    pub suffix: Option<String>,
    #[serde(default)]
    pub ignore: Option<Vec<String>>,
    pub output: Option<String>,
    pub parallel: Option<bool>,
    #[serde(default)]
    pub run: Option<RunCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub dir: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub suffix: String,
    pub ignore: Vec<String>,
    pub output: String,
    pub parallel: bool,
    pub write: bool,
    pub diff: bool,
    pub check: bool,
    pub config_found: bool,
}

/// CLI-provided values; `None` defers to config and defaults.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub root: Option<String>,
    pub dir: Option<String>,
    pub rules: Option<String>,
    pub suffix: Option<String>,
    pub ignore: Vec<String>,
    pub output: Option<String>,
    pub parallel: Option<bool>,
    pub diff: Option<bool>,
    pub check: Option<bool>,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `regolden.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `RegoldenConfig` from `regolden.toml` or `regolden.yaml|yml`.
///
/// Returns `Ok(None)` when no config file exists; an unreadable or malformed
/// file is a configuration error.
pub fn load_config(root: &Path) -> Result<Option<RegoldenConfig>> {
    for name in CONFIG_NAMES {
        let p = root.join(name);
        if !p.exists() {
            continue;
        }
        let bad = |e: String| RewriteError::Config(format!("{}: {}", p.display(), e));
        let s = fs::read_to_string(&p).map_err(|e| bad(e.to_string()))?;
        let cfg = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| bad(e.to_string()))?
        } else {
            serde_yaml::from_str(&s).map_err(|e| bad(e.to_string()))?
        };
        return Ok(Some(cfg));
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective> {
    let start = PathBuf::from(cli.root.as_deref().unwrap_or("."));
    let root = detect_root(&start);
    let loaded = load_config(&root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let from_cfg = |s: String| root.join(s);
    let dir = cli
        .dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| cfg.dir.clone().map(from_cfg));
    let rules = cli
        .rules
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| cfg.rules.clone().map(from_cfg));

    let suffix = cli
        .suffix
        .clone()
        .or(cfg.suffix)
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string());

    let ignore = if cli.ignore.is_empty() {
        cfg.ignore.unwrap_or_default()
    } else {
        cli.ignore.clone()
    };

    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let parallel = cli.parallel.or(cfg.parallel).unwrap_or(false);
    let write = cfg.run.as_ref().and_then(|r| r.write).unwrap_or(true);
    let diff = cli
        .diff
        .or_else(|| cfg.run.as_ref().and_then(|r| r.diff))
        .unwrap_or(false);
    let check = cli
        .check
        .or_else(|| cfg.run.as_ref().and_then(|r| r.check))
        .unwrap_or(false);

    Ok(Effective {
        root,
        dir,
        rules,
        suffix,
        ignore,
        output,
        parallel,
        // diff and check never write
        write: write && !diff && !check,
        diff,
        check,
        config_found,
    })
}
