//! Target file enumeration.

use crate::error::{Result, RewriteError};
use glob::{GlobError, Pattern};
use std::path::{Path, PathBuf};

/// File name predicate: suffix match minus ignore globs.
#[derive(Debug, Clone)]
pub struct NameFilter {
    pub suffix: String,
    pub ignore: Vec<Pattern>,
}

impl NameFilter {
    pub fn new(suffix: &str, ignore: &[String]) -> Result<NameFilter> {
        let ignore = ignore
            .iter()
            .map(|g| {
                Pattern::new(g).map_err(|e| {
                    RewriteError::Config(format!("invalid ignore pattern '{}': {}", g, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(NameFilter {
            suffix: suffix.to_string(),
            ignore,
        })
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => return false,
        };
        if !name.ends_with(&self.suffix) {
            return false;
        }
        let full = path.to_string_lossy();
        !self
            .ignore
            .iter()
            .any(|p| p.matches(name) || p.matches(&full))
    }
}

/// Enumerate regular files under `dir` (recursively) accepted by `filter`.
///
/// The returned iterator is lazy and yields paths in directory walk order.
/// Entries the walk cannot read come through as `FileAccess` errors so the
/// caller can record them. Fails up front only when `dir` does not exist or
/// is not a directory.
pub fn discover<'a>(
    dir: &Path,
    filter: &'a NameFilter,
) -> Result<impl Iterator<Item = Result<PathBuf>> + 'a> {
    if !dir.is_dir() {
        return Err(RewriteError::Config(format!(
            "directory not found: {}",
            dir.display()
        )));
    }
    let base = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/**/*", base.trim_end_matches('/'));
    let paths = glob::glob(&pattern)
        .map_err(|e| RewriteError::Config(format!("cannot walk {}: {}", dir.display(), e)))?;
    Ok(paths.filter_map(move |entry| match entry {
        Ok(p) if p.is_file() && filter.accepts(&p) => Some(Ok(p)),
        Ok(_) => None,
        Err(e) => Some(Err(walk_error(e))),
    }))
}

fn walk_error(e: GlobError) -> RewriteError {
    RewriteError::FileAccess {
        path: e.path().to_path_buf(),
        source: e.into_error(),
    }
}
