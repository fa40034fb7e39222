//! Class name attribute validation for typed-classnames.
//!
//! This crate scans JSX/TSX source for class name attributes with a literal
//! string value, splits the value into tokens and reports every token that
//! no indexed stylesheet defines.
//!
//! # Example
//!
//! ```
//! use classname_lint::{check_source, AttributeValidator, SourceSyntax};
//! use rustc_hash::FxHashSet;
//! use smol_str::SmolStr;
//!
//! let known: FxHashSet<SmolStr> = ["btn"].into_iter().map(SmolStr::new).collect();
//! let source = r#"const a = <button className="btn btn-ghost" />;"#;
//! let validator = AttributeValidator::default();
//! let findings = check_source(source, SourceSyntax::Tsx, &validator, &known).unwrap();
//!
//! for finding in findings {
//!     println!("{}: {}", finding.offset, finding.message);
//! }
//! ```

mod diagnostic;
pub mod source;
pub mod tokens;
mod validator;

pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticSink, Finding, Severity};
pub use source::{parse_source, ParsedSource, SourceSyntax};
pub use tokens::{class_tokens, Token};
pub use validator::{AttributeValidator, KnownClasses, DEFAULT_CLASS_ATTRIBUTE};

use thiserror::Error;

/// Errors from checking a source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintError {
    /// The source could not be parsed; nothing was checked.
    #[error("failed to parse source at offset {offset}: {message}")]
    Parse {
        /// Byte offset of the error.
        offset: u32,
        /// The parser's message.
        message: String,
    },
}

/// Parses `source` and returns its findings, sorted by offset.
pub fn check_source<K>(
    source: &str,
    syntax: SourceSyntax,
    validator: &AttributeValidator,
    classes: &K,
) -> Result<Vec<Finding>, LintError>
where
    K: KnownClasses + ?Sized,
{
    let parsed = parse_source(source, syntax)?;
    let mut findings: Vec<Finding> = Vec::new();
    validator.validate(&parsed, classes, &mut findings);
    findings.sort_by_key(|f| f.offset);
    tracing::trace!(findings = findings.len(), "checked source");
    Ok(findings)
}
