//! End-to-end indexing tests against real stylesheets on disk.
//!
//! These tests verify that:
//! - Imports are followed transitively, including through `@media`
//! - Import cycles terminate
//! - Invalid rules or missing files never abort a pass
//! - The cache picks up changes after a notification

use camino::Utf8PathBuf;
use classname_index::{IndexCache, IndexError, IndexWatcher, StylesheetIndexer};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

struct Project {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().canonicalize().unwrap()).unwrap();
        Self { _dir: dir, root }
    }

    fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }
}

#[test]
fn test_import_closure() {
    let project = Project::new();
    let a = project.write("a.css", "@import \"b.css\";\n.from-a { color: red; }");
    let b = project.write("b.css", "@import \"nested/c.css\";\n.from-b { color: red; }");
    let c = project.write("nested/c.css", ".from-c { color: red; }");

    let index = StylesheetIndexer::default().index(&[a.clone()]);

    assert_eq!(index.sorted_class_names(), vec!["from-a", "from-b", "from-c"]);
    let files: Vec<&Utf8PathBuf> = index.files().iter().collect();
    assert_eq!(files, vec![&a, &b, &c]);
}

#[test]
fn test_import_cycle_terminates() {
    let project = Project::new();
    let a = project.write("a.css", "@import \"b.css\";\n.alpha { color: red; }");
    project.write("b.css", "@import \"a.css\";\n.beta { color: red; }");

    let index = StylesheetIndexer::default().index(&[a]);

    assert_eq!(index.sorted_class_names(), vec!["alpha", "beta"]);
    assert_eq!(index.files().len(), 2);
}

#[test]
fn test_indexing_is_idempotent() {
    let project = Project::new();
    let a = project.write(
        "a.css",
        "@import \"b.css\";\n.one, .two:hover { color: red; }",
    );
    project.write("b.css", ".three::after { content: ''; }");
    let indexer = StylesheetIndexer::default();

    let first = indexer.index(&[a.clone()]);
    let second = indexer.index(&[a]);

    assert_eq!(first, second);
}

#[test]
fn test_pseudo_classes_and_media() {
    let project = Project::new();
    let a = project.write(
        "a.css",
        r#".btn:hover { color: red; }
@media (min-width: 640px) {
  .wide { color: red; }
  @supports (display: grid) {
    .grid-layout:focus-within { display: grid; }
  }
}"#,
    );

    let index = StylesheetIndexer::default().index(&[a]);

    assert_eq!(index.sorted_class_names(), vec!["btn", "grid-layout", "wide"]);
    assert!(!index.contains("btn:hover"));
}

#[test]
fn test_escaped_utility_classes() {
    let project = Project::new();
    let a = project.write(
        "a.css",
        r".sm\:flex { display: flex; } .w-1\/2 { width: 50%; }",
    );

    let index = StylesheetIndexer::default().index(&[a]);

    assert!(index.contains("sm:flex"));
    assert!(index.contains("w-1/2"));
}

#[test]
fn test_invalid_rules_are_dropped_not_the_file() {
    let project = Project::new();
    let legacy = project.write(
        "legacy.css",
        "..broken { color: red; }\n.clearfix { *zoom: 1; }\n.btn { color: red; }",
    );
    let late = project.write("late.css", ".early { color: red; }\n@import \"other.css\";");

    let (index, report) = StylesheetIndexer::default().index_with_report(&[legacy, late]);

    assert!(index.contains("btn"));
    assert!(index.contains("early"));
    assert!(!index.contains("broken"));
    assert!(!report
        .skipped
        .iter()
        .any(|s| matches!(s.error, IndexError::Syntax(_))));
}

#[test]
fn test_scope_and_starting_style_blocks_indexed() {
    let project = Project::new();
    let a = project.write(
        "a.css",
        "@scope (.card) { .title { color: red; } }\n\
         @starting-style { .fade { opacity: 0; } }",
    );

    let index = StylesheetIndexer::default().index(&[a]);

    assert!(index.contains("title"));
    assert!(index.contains("fade"));
}

#[test]
fn test_missing_entry_does_not_abort() {
    let project = Project::new();
    let good = project.write("good.css", ".kept { color: red; }");

    let (index, report) =
        StylesheetIndexer::default().index_with_report(&[project.root.join("missing.css"), good]);

    assert_eq!(index.sorted_class_names(), vec!["kept"]);
    assert!(matches!(report.skipped[0].error, IndexError::FileRead(_)));
}

#[test]
fn test_package_import_resolved_through_node_modules() {
    let project = Project::new();
    project.write(
        "node_modules/ui-kit/dist/kit.css",
        ".kit-button { color: red; }",
    );
    let main = project.write(
        "src/styles/main.css",
        "@import \"~ui-kit/dist/kit.css\";\n.app { color: red; }",
    );

    let index = StylesheetIndexer::default().index(&[main]);

    assert_eq!(index.sorted_class_names(), vec!["app", "kit-button"]);
}

#[test]
fn test_unresolved_package_import_reports_unknown() {
    let project = Project::new();
    let main = project.write(
        "main.css",
        "@import \"~not-installed/kit.css\";\n.app { color: red; }",
    );

    let (index, report) = StylesheetIndexer::default().index_with_report(&[main]);

    assert_eq!(index.sorted_class_names(), vec!["app"]);
    assert!(matches!(
        report.skipped[0].error,
        IndexError::UnresolvedImport(_)
    ));
}

#[test]
fn test_cache_invalidation_after_change() {
    let project = Project::new();
    let main = project.write("main.css", "@import \"parts.css\";");
    let parts = project.write("parts.css", ".old-class { color: red; }");
    let cache = IndexCache::default();
    let entries = vec![main];

    assert!(!cache.get_or_build(&entries).contains("new-class"));

    project.write(
        "parts.css",
        ".old-class { color: red; }\n.new-class { color: blue; }",
    );
    cache.notify_changed(&parts);

    assert!(cache.get_or_build(&entries).contains("new-class"));
}

#[test]
#[ignore = "relies on native filesystem events"]
fn test_watcher_rebuilds_on_write() {
    let project = Project::new();
    let main = project.write("main.css", ".before { color: red; }");
    let cache = Arc::new(IndexCache::default());
    let entries = vec![main];
    cache.get_or_build(&entries);

    let (tx, rx) = mpsc::channel();
    let _watcher = IndexWatcher::spawn(cache.clone(), move |changed| {
        let _ = tx.send(changed.to_vec());
    })
    .unwrap();

    project.write("main.css", ".after { color: red; }");
    let changed = rx.recv_timeout(Duration::from_secs(10)).unwrap();

    assert!(changed.contains(&project.root.join("main.css")));
    assert!(cache.get_or_build(&entries).contains("after"));
}
