//! Output formatting.

use crate::cli::OutputFormat;
use crate::line_index::{LineCol, LineIndex};
use camino::Utf8Path;
use classname_lint::{Diagnostic, Severity};
use serde::Serialize;

/// The `source` field of every JSON diagnostic.
const DIAGNOSTIC_SOURCE: &str = "typed-classnames";

/// A formatted diagnostic for output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// The diagnostic type (Error, Warning).
    #[serde(rename = "type")]
    pub diagnostic_type: String,
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: Position,
    /// The end position.
    pub end: Position,
    /// The message.
    pub message: String,
    /// The diagnostic code.
    pub code: String,
    /// The tool that produced the diagnostic.
    pub source: String,
}

/// A position in the source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

impl Position {
    fn new(line_index: &LineIndex, offset: u32) -> Self {
        let lc = line_index.line_col(offset).unwrap_or_default();
        Self {
            line: lc.line + 1,
            column: lc.col + 1,
            offset,
        }
    }
}

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats one file's diagnostics as text.
    ///
    /// JSON output is assembled across files by the caller; see
    /// [`Formatter::format_json_diagnostics`].
    pub fn format(&self, diagnostics: &[Diagnostic], file_path: &Utf8Path, source: &str) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(diagnostics, file_path, source),
            OutputFormat::HumanVerbose => self.format_human_verbose(diagnostics, file_path, source),
            OutputFormat::Json => self.format_json(diagnostics, file_path, source),
            OutputFormat::Machine => self.format_machine(diagnostics, file_path, source),
        }
    }

    fn format_human(
        &self,
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        let line_index = LineIndex::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index.line_col(diag.offset).unwrap_or_default();
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n\n",
                file_path,
                start.line + 1,
                start.col + 1,
                diag.severity.as_str(),
                diag.message,
                diag.code
            ));
        }

        output
    }

    fn format_human_verbose(
        &self,
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        let line_index = LineIndex::new(source);
        let lines: Vec<&str> = source.lines().collect();
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index.line_col(diag.offset).unwrap_or_default();

            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n",
                file_path,
                start.line + 1,
                start.col + 1,
                diag.severity.as_str(),
                diag.message,
                diag.code
            ));

            if let Some(line) = lines.get(start.line as usize) {
                output.push_str(&snippet(line, start, diag.length));
            }

            output.push('\n');
        }

        output
    }

    fn format_json(
        &self,
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        let formatted = Self::format_json_diagnostics(diagnostics, file_path, source);
        serde_json::to_string_pretty(&formatted).unwrap_or_default()
    }

    /// Formats diagnostics into JSON-ready structs.
    pub fn format_json_diagnostics(
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> Vec<FormattedDiagnostic> {
        let line_index = LineIndex::new(source);
        diagnostics
            .iter()
            .map(|diag| FormattedDiagnostic {
                diagnostic_type: diag.severity.as_str().to_string(),
                filename: file_path.to_string(),
                start: Position::new(&line_index, diag.offset),
                end: Position::new(&line_index, diag.end()),
                message: diag.message.clone(),
                code: diag.code.to_string(),
                source: DIAGNOSTIC_SOURCE.to_string(),
            })
            .collect()
    }

    fn format_machine(
        &self,
        diagnostics: &[Diagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        let line_index = LineIndex::new(source);
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index.line_col(diag.offset).unwrap_or_default();
            let end = line_index.line_col(diag.end()).unwrap_or_default();

            let severity = match diag.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING",
            };

            output.push_str(&format!(
                "{} {}:{}:{}:{}:{} {} ({})\n",
                severity,
                file_path,
                start.line + 1,
                start.col + 1,
                end.line + 1,
                end.col + 1,
                diag.message,
                diag.code
            ));
        }

        output
    }
}

/// Renders a source line with a caret underline below the flagged bytes.
fn snippet(line: &str, start: LineCol, length: u32) -> String {
    let line_no = (start.line + 1).to_string();
    let col = start.col as usize;
    let width = (length as usize).clamp(1, line.len().saturating_sub(col).max(1));

    format!(
        "  {} | {}\n  {} | {}{}\n",
        line_no,
        line,
        " ".repeat(line_no.len()),
        " ".repeat(col),
        "^".repeat(width)
    )
}

/// Summary of a check run.
#[derive(Debug, Default)]
pub struct CheckSummary {
    /// Number of files checked.
    pub file_count: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Whether to fail on warnings.
    pub fail_on_warnings: bool,
}

impl CheckSummary {
    /// Returns true if the run should exit with a failure code.
    pub fn failed(&self) -> bool {
        self.error_count > 0 || (self.fail_on_warnings && self.warning_count > 0)
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        format!(
            "====================================\ntyped-classnames found {} {} and {} {} in {} {}",
            self.error_count,
            plural(self.error_count, "error", "errors"),
            self.warning_count,
            plural(self.warning_count, "warning", "warnings"),
            self.file_count,
            plural(self.file_count, "file", "files"),
        )
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}
