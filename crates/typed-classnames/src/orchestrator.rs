//! Main orchestration logic.

use crate::cli::{Args, OutputFormat};
use crate::config::{CheckConfig, ConfigError};
use crate::output::{CheckSummary, FormattedDiagnostic, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use classname_index::{Index, IndexCache, IndexWatcher};
use classname_lint::{
    check_source, AttributeValidator, Diagnostic, DiagnosticCode, LintError, Severity,
    SourceSyntax,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directories never checked, whatever the configuration says.
const DEFAULT_IGNORES: [&str; 3] = ["**/node_modules/**", "**/dist/**", "**/build/**"];

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Watch error.
    #[error("watch error: {0}")]
    WatchFailed(String),
}

/// Decides which files under the workspace are checked.
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    workspace: Utf8PathBuf,
    include: GlobSet,
    ignore: GlobSet,
}

impl SourceMatcher {
    /// Builds the include and ignore sets for `config`.
    pub fn new(config: &CheckConfig) -> Result<Self, OrchestratorError> {
        let include = build_glob_set(config.include.iter().map(String::as_str))?;
        let ignore = build_glob_set(
            config
                .ignore
                .iter()
                .map(String::as_str)
                .chain(DEFAULT_IGNORES),
        )?;

        Ok(Self {
            workspace: config.workspace.clone(),
            include,
            ignore,
        })
    }

    /// Returns true if `path` should be checked.
    pub fn is_match(&self, path: &Path) -> bool {
        let Some(path) = Utf8Path::from_path(path) else {
            return false;
        };
        let relative = path.strip_prefix(&self.workspace).unwrap_or(path);
        self.include.is_match(relative.as_str()) && !self.ignore.is_match(relative.as_str())
    }

    /// Lists every matching file under the workspace, sorted.
    pub fn discover(&self) -> Vec<Utf8PathBuf> {
        let mut files: Vec<Utf8PathBuf> = WalkDir::new(&self.workspace)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.is_match(e.path()))
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .collect();
        files.sort();
        files
    }
}

fn build_glob_set<'a>(
    patterns: impl IntoIterator<Item = &'a str>,
) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Runs the check on all files.
pub async fn run(args: Args) -> Result<CheckSummary, OrchestratorError> {
    let config = CheckConfig::resolve(&args)?;
    if let Some(path) = &config.config_file {
        debug!(config = %path, "loaded configuration");
    }

    let matcher = SourceMatcher::new(&config)?;
    let cache = Arc::new(IndexCache::new(config.indexer()));

    if args.watch {
        run_watch_mode(&args, &config, &matcher, cache).await
    } else {
        Ok(run_single_check(&args, &config, &matcher, &cache))
    }
}

/// Everything one check pass shares across worker threads.
struct CheckContext<'a> {
    workspace: &'a Utf8Path,
    validator: AttributeValidator,
    index: Arc<Index>,
    severity: Severity,
    formatter: Formatter,
    output: OutputFormat,
}

struct FileOutput {
    errors: usize,
    warnings: usize,
    text: Option<String>,
    json: Vec<FormattedDiagnostic>,
}

/// Runs a single check pass.
fn run_single_check(
    args: &Args,
    config: &CheckConfig,
    matcher: &SourceMatcher,
    cache: &IndexCache,
) -> CheckSummary {
    for entry in &config.stylesheets {
        if !entry.is_file() {
            warn!(stylesheet = %entry, "entry stylesheet not found");
        }
    }

    let index = cache.get_or_build(&config.stylesheets);
    info!(
        classes = index.len(),
        stylesheets = index.files().len(),
        "stylesheet index ready"
    );

    let files = matcher.discover();
    let ctx = CheckContext {
        workspace: &config.workspace,
        validator: config.validator(),
        index,
        severity: config.severity,
        formatter: Formatter::new(args.output),
        output: args.output,
    };

    let outputs: Vec<FileOutput> = files
        .par_iter()
        .filter_map(|file_path| check_file(&ctx, file_path))
        .collect();

    let mut summary = CheckSummary {
        file_count: files.len(),
        fail_on_warnings: args.fail_on_warnings,
        ..Default::default()
    };
    let mut json_output = Vec::new();

    for output in outputs {
        summary.error_count += output.errors;
        summary.warning_count += output.warnings;
        if let Some(text) = output.text {
            print!("{}", text);
        }
        json_output.extend(output.json);
    }

    if args.output == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| "[]".to_string());
        println!("{}", json);
    } else {
        println!("{}", summary.format());
    }

    summary
}

/// Checks one file. Returns `None` when it has nothing to report.
fn check_file(ctx: &CheckContext<'_>, file_path: &Utf8Path) -> Option<FileOutput> {
    let source = match fs::read_to_string(file_path) {
        Ok(s) => s,
        Err(e) => {
            warn!(file = %file_path, error = %e, "failed to read source file");
            return None;
        }
    };

    let diagnostics = diagnose(ctx, file_path, &source);
    if diagnostics.is_empty() {
        return None;
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let relative_path = file_path.strip_prefix(ctx.workspace).unwrap_or(file_path);
    let json_output = ctx.output == OutputFormat::Json;

    Some(FileOutput {
        errors,
        warnings: diagnostics.len() - errors,
        text: (!json_output).then(|| ctx.formatter.format(&diagnostics, relative_path, &source)),
        json: if json_output {
            Formatter::format_json_diagnostics(&diagnostics, relative_path, &source)
        } else {
            Vec::new()
        },
    })
}

fn diagnose(ctx: &CheckContext<'_>, file_path: &Utf8Path, source: &str) -> Vec<Diagnostic> {
    let syntax = SourceSyntax::from_file_name(file_path.as_str()).unwrap_or(SourceSyntax::Tsx);

    match check_source(source, syntax, &ctx.validator, ctx.index.as_ref()) {
        Ok(findings) => findings
            .into_iter()
            .map(|f| Diagnostic::from_finding(f).with_severity(ctx.severity))
            .collect(),
        Err(LintError::Parse { offset, message }) => {
            debug!(file = %file_path, offset, "source failed to parse");
            vec![Diagnostic::new(DiagnosticCode::ParseError, message, offset, 0)]
        }
    }
}

/// What woke the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchEvent {
    Sources,
    Stylesheets,
}

/// Runs in watch mode.
async fn run_watch_mode(
    args: &Args,
    config: &CheckConfig,
    matcher: &SourceMatcher,
    cache: Arc<IndexCache>,
) -> Result<CheckSummary, OrchestratorError> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    println!("Starting watch mode...\n");

    // The first pass builds the index, so the stylesheet watcher starts with
    // its files known.
    run_single_check(args, config, matcher, &cache);

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let stylesheet_tx = tx.clone();
    let _index_watcher = IndexWatcher::spawn(Arc::clone(&cache), move |changed| {
        debug!(count = changed.len(), "stylesheet index rebuilt");
        let _ = stylesheet_tx.blocking_send(WatchEvent::Stylesheets);
    })
    .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    let source_matcher = matcher.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if event.kind.is_access() {
                return;
            }
            if event.paths.iter().any(|p| source_matcher.is_match(p)) {
                let _ = tx.blocking_send(WatchEvent::Sources);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )
    .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    watcher
        .watch(config.workspace.as_std_path(), RecursiveMode::Recursive)
        .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    println!("Watching for changes... (Ctrl+C to stop)\n");

    while let Some(event) = rx.recv().await {
        // Fold in whatever else arrived while we were busy.
        let mut stylesheets_changed = event == WatchEvent::Stylesheets;
        while let Ok(next) = rx.try_recv() {
            stylesheets_changed |= next == WatchEvent::Stylesheets;
        }

        if !args.preserve_watch_output {
            // Clear screen
            print!("\x1B[2J\x1B[1;1H");
        }

        if stylesheets_changed {
            println!("Stylesheets changed, re-checking...\n");
        } else {
            println!("File changed, re-checking...\n");
        }

        run_single_check(args, config, matcher, &cache);
    }

    Err(OrchestratorError::WatchFailed(
        "watch channel closed unexpectedly".to_string(),
    ))
}
