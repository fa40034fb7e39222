//! The immutable result of one indexing pass.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Class names defined by a set of stylesheets, plus the files they came from.
///
/// An index is never mutated after an indexing pass produces it. Rebuilds
/// create a fresh index that replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    class_names: FxHashSet<SmolStr>,
    files: IndexSet<Utf8PathBuf>,
}

impl Index {
    /// Creates an index from its parts.
    pub fn new(class_names: FxHashSet<SmolStr>, files: IndexSet<Utf8PathBuf>) -> Self {
        Self { class_names, files }
    }

    /// Returns true if `class_name` is defined by any indexed stylesheet.
    #[inline]
    pub fn contains(&self, class_name: &str) -> bool {
        self.class_names.contains(class_name)
    }

    /// Returns true if `path` contributed to this index.
    #[inline]
    pub fn contains_file(&self, path: &Utf8Path) -> bool {
        self.files.contains(path)
    }

    /// All indexed class names, in no particular order.
    pub fn class_names(&self) -> &FxHashSet<SmolStr> {
        &self.class_names
    }

    /// Contributing stylesheet files, in discovery order.
    pub fn files(&self) -> &IndexSet<Utf8PathBuf> {
        &self.files
    }

    /// Class names sorted lexically, for stable output.
    pub fn sorted_class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.class_names.iter().map(SmolStr::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of distinct class names.
    pub fn len(&self) -> usize {
        self.class_names.len()
    }

    /// Returns true if no class names were indexed.
    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
    }
}
