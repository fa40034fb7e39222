//! Path helpers shared by the indexer and the watcher.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;

/// Lexically resolves `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                // `..` at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }

    out
}

/// Makes `path` absolute against the current directory, then normalizes it.
pub(crate) fn absolutize(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }

    let cwd = std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_default();
    normalize(&cwd.join(path))
}

/// Resolves symlinks when the file exists; falls back to the lexical form.
pub(crate) fn canonical(path: &Utf8Path) -> Utf8PathBuf {
    fs::canonicalize(path)
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| normalize(path))
}
