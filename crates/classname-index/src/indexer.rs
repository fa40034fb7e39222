//! Breadth-first stylesheet indexing across `@import` edges.

use crate::extract::{extract_all, ImportTarget};
use crate::index::Index;
use crate::paths;
use crate::resolve::{ModuleResolver, NodeModulesResolver, ResolveError};
use crate::stylesheet::{LightningCssParser, StylesheetParser, StylesheetSyntaxError};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::collections::VecDeque;
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a stylesheet (or one of its imports) contributed nothing.
///
/// None of these abort an indexing pass.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The file is missing or unreadable.
    #[error("failed to read stylesheet: {0}")]
    FileRead(String),

    /// The parser rejected the file.
    #[error("stylesheet syntax error: {0}")]
    Syntax(StylesheetSyntaxError),

    /// A package import could not be resolved.
    #[error("unresolved import: {0}")]
    UnresolvedImport(#[from] ResolveError),
}

/// A file that was skipped (fully or partially) during indexing.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// The stylesheet the problem was found in.
    pub path: Utf8PathBuf,
    /// What went wrong.
    pub error: IndexError,
}

/// Everything that degraded during one indexing pass.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub skipped: Vec<SkippedFile>,
}

impl IndexReport {
    fn skip(&mut self, path: &Utf8Path, error: IndexError) {
        debug!(path = %path, error = %error, "skipping stylesheet input");
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            error,
        });
    }

    /// Returns true if nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Builds an [`Index`] from entry stylesheets.
#[derive(Clone)]
pub struct StylesheetIndexer {
    parser: Arc<dyn StylesheetParser>,
    resolver: Arc<dyn ModuleResolver>,
}

impl Default for StylesheetIndexer {
    fn default() -> Self {
        Self::new(
            Arc::new(LightningCssParser),
            Arc::new(NodeModulesResolver::new()),
        )
    }
}

impl std::fmt::Debug for StylesheetIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StylesheetIndexer").finish_non_exhaustive()
    }
}

impl StylesheetIndexer {
    /// Creates an indexer from a parser and a module resolver.
    pub fn new(parser: Arc<dyn StylesheetParser>, resolver: Arc<dyn ModuleResolver>) -> Self {
        Self { parser, resolver }
    }

    /// Uses the default parser with a custom resolver.
    pub fn with_resolver(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self::new(Arc::new(LightningCssParser), resolver)
    }

    /// Indexes `entries` and everything they import.
    pub fn index(&self, entries: &[Utf8PathBuf]) -> Index {
        self.index_with_report(entries).0
    }

    /// Like [`index`](Self::index), also returning what was skipped.
    pub fn index_with_report(&self, entries: &[Utf8PathBuf]) -> (Index, IndexReport) {
        let mut class_names: FxHashSet<SmolStr> = FxHashSet::default();
        let mut files: IndexSet<Utf8PathBuf> = IndexSet::new();
        let mut report = IndexReport::default();

        // `queued` guards import-following; a path enters the frontier once.
        let mut queued: FxHashSet<Utf8PathBuf> = FxHashSet::default();
        let mut frontier: VecDeque<Utf8PathBuf> = VecDeque::new();

        for entry in entries {
            let path = paths::absolutize(entry);
            if queued.insert(path.clone()) {
                frontier.push_back(path);
            }
        }

        while let Some(path) = frontier.pop_front() {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    report.skip(&path, IndexError::FileRead(e.to_string()));
                    continue;
                }
            };

            let file = paths::canonical(&path);
            queued.insert(file.clone());

            let parsed = self.parser.parse(&text, &path);
            // Malformed files are still watched so fixing them triggers a rebuild
            files.insert(file.clone());

            if let Some(error) = parsed.errors.into_iter().next() {
                report.skip(&path, IndexError::Syntax(error));
                continue;
            }

            let extracted = extract_all(&parsed.rules, &path);
            trace!(
                path = %file,
                classes = extracted.class_names.len(),
                imports = extracted.imports.len(),
                "indexed stylesheet"
            );
            class_names.extend(extracted.class_names);

            for import in extracted.imports {
                let target = match import {
                    ImportTarget::Relative(target) => target,
                    ImportTarget::Package(specifier) => {
                        let from_dir = path.parent().unwrap_or(Utf8Path::new(""));
                        match self.resolver.resolve(&specifier, from_dir) {
                            Ok(resolved) => paths::absolutize(&resolved),
                            Err(e) => {
                                report.skip(&path, e.into());
                                continue;
                            }
                        }
                    }
                };

                if queued.insert(target.clone()) {
                    frontier.push_back(target);
                }
            }
        }

        debug!(
            entries = entries.len(),
            files = files.len(),
            classes = class_names.len(),
            skipped = report.skipped.len(),
            "stylesheet index built"
        );

        (Index::new(class_names, files), report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stylesheet::{ParsedStylesheet, Rule};
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;
    use std::sync::Mutex;

    /// Parser that serves canned rules per file name and counts calls.
    #[derive(Default)]
    struct FakeParser {
        sheets: FxHashMap<String, ParsedStylesheet>,
        parsed: Mutex<Vec<String>>,
    }

    impl FakeParser {
        fn with(mut self, name: &str, rules: Vec<Rule>) -> Self {
            self.sheets
                .insert(name.to_string(), ParsedStylesheet::from_rules(rules));
            self
        }
    }

    impl StylesheetParser for FakeParser {
        fn parse(&self, _text: &str, path: &Utf8Path) -> ParsedStylesheet {
            let name = path.file_name().unwrap_or_default().to_string();
            self.parsed.lock().unwrap().push(name.clone());
            self.sheets.get(&name).cloned().unwrap_or_default()
        }
    }

    struct NoResolver;

    impl ModuleResolver for NoResolver {
        fn resolve(
            &self,
            specifier: &str,
            from_dir: &Utf8Path,
        ) -> Result<Utf8PathBuf, ResolveError> {
            Err(ResolveError::NotFound {
                specifier: specifier.to_string(),
                from: from_dir.to_path_buf(),
            })
        }
    }

    fn workspace(files: &[&str]) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().canonicalize().unwrap()).unwrap();
        for file in files {
            fs::write(root.join(file), "").unwrap();
        }
        (dir, root)
    }

    #[test]
    fn test_diamond_import_parsed_once() {
        let (_dir, root) = workspace(&["a.css", "b.css", "c.css", "d.css"]);
        let parser = Arc::new(
            FakeParser::default()
                .with("a.css", vec![Rule::import("b.css"), Rule::import("c.css")])
                .with("b.css", vec![Rule::import("d.css")])
                .with("c.css", vec![Rule::import("d.css")])
                .with("d.css", vec![Rule::style([".shared"])]),
        );
        let indexer = StylesheetIndexer::new(parser.clone(), Arc::new(NoResolver));

        let index = indexer.index(&[root.join("a.css")]);

        assert!(index.contains("shared"));
        assert_eq!(index.files().len(), 4);
        assert_eq!(
            *parser.parsed.lock().unwrap(),
            vec!["a.css", "b.css", "c.css", "d.css"]
        );
    }

    #[test]
    fn test_duplicate_entries_indexed_once() {
        let (_dir, root) = workspace(&["a.css"]);
        let parser = Arc::new(FakeParser::default().with("a.css", vec![Rule::style([".a"])]));
        let indexer = StylesheetIndexer::new(parser.clone(), Arc::new(NoResolver));

        let index = indexer.index(&[root.join("a.css"), root.join("./a.css")]);

        assert_eq!(index.files().len(), 1);
        assert_eq!(parser.parsed.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unresolved_package_import_dropped() {
        let (_dir, root) = workspace(&["a.css"]);
        let parser = Arc::new(FakeParser::default().with(
            "a.css",
            vec![Rule::import("~missing/kit.css"), Rule::style([".own"])],
        ));
        let indexer = StylesheetIndexer::new(parser, Arc::new(NoResolver));

        let (index, report) = indexer.index_with_report(&[root.join("a.css")]);

        assert!(index.contains("own"));
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].error,
            IndexError::UnresolvedImport(_)
        ));
    }

    #[test]
    fn test_missing_file_skipped() {
        let (_dir, root) = workspace(&["a.css"]);
        let parser = Arc::new(FakeParser::default().with(
            "a.css",
            vec![Rule::import("gone.css"), Rule::style([".a"])],
        ));
        let indexer = StylesheetIndexer::new(parser, Arc::new(NoResolver));

        let (index, report) = indexer.index_with_report(&[root.join("a.css")]);

        assert!(index.contains("a"));
        assert_eq!(index.files().len(), 1);
        assert!(matches!(report.skipped[0].error, IndexError::FileRead(_)));
        assert_eq!(report.skipped[0].path, root.join("gone.css"));
    }

    #[test]
    fn test_syntax_error_contributes_nothing_but_stays_watched() {
        let (_dir, root) = workspace(&["bad.css", "good.css"]);
        let mut parser = FakeParser::default().with("good.css", vec![Rule::style([".good"])]);
        parser.sheets.insert(
            "bad.css".to_string(),
            ParsedStylesheet {
                rules: vec![Rule::style([".ignored"])],
                errors: vec![StylesheetSyntaxError::new("unexpected token")],
            },
        );
        let indexer = StylesheetIndexer::new(Arc::new(parser), Arc::new(NoResolver));

        let (index, report) =
            indexer.index_with_report(&[root.join("bad.css"), root.join("good.css")]);

        assert!(index.contains("good"));
        assert!(!index.contains("ignored"));
        assert!(index.contains_file(&root.join("bad.css")));
        assert!(matches!(report.skipped[0].error, IndexError::Syntax(_)));
    }
}
