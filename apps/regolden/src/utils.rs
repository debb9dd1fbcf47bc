//! Supporting helpers: colored message prefixes, display paths, and
//! locked whole-file rewrites.

use fs2::FileExt;
use owo_colors::OwoColorize;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if colors_enabled() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

/// Path of `p` relative to `base` for display, falling back to `p` itself.
pub fn rel_to(base: &Path, p: &Path) -> String {
    pathdiff::diff_paths(p, base)
        .filter(|r| !r.as_os_str().is_empty())
        .unwrap_or_else(|| p.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

/// A target file held under an exclusive `fs2` lock for a whole
/// read-modify-write cycle.
///
/// The path is canonicalized first, so a symlinked target is read and
/// replaced through the link. Replacement writes a sibling temp file and
/// renames it over the target; readers see either the old or the new bytes.
/// Since the rename swaps the inode, `open` re-checks after locking that the
/// path still names the locked inode and retries otherwise, so two runs on
/// the same file serialize.
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    pub fn open(path: &Path) -> io::Result<LockedFile> {
        let path = fs::canonicalize(path)?;
        loop {
            let file = File::open(&path)?;
            file.lock_exclusive()?;
            if same_inode(&file.metadata()?, &fs::metadata(&path)?) {
                return Ok(LockedFile { file, path });
            }
            let _ = FileExt::unlock(&file);
        }
    }

    /// Canonical path of the locked target.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_to_string(&mut self) -> io::Result<String> {
        let mut s = String::new();
        self.file.read_to_string(&mut s)?;
        Ok(s)
    }

    /// Replace the whole content of the target.
    pub fn replace(&self, content: &str) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        if let Ok(meta) = self.file.metadata() {
            let _ = tmp.as_file().set_permissions(meta.permissions());
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(unix)]
fn same_inode(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_inode(_: &fs::Metadata, _: &fs::Metadata) -> bool {
    true
}
