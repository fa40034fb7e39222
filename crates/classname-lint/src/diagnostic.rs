//! Findings, diagnostics and the sink the validator reports into.

use smol_str::SmolStr;

/// An unknown class name found in an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Byte offset of the token in the source text.
    pub offset: u32,
    /// Token length in bytes.
    pub length: u32,
    /// The flagged token, exactly as written in the source.
    pub class_name: SmolStr,
    /// The message shown to the user.
    pub message: String,
}

impl Finding {
    /// A finding for an unknown class token at `offset`.
    pub fn unknown_class(offset: u32, class_name: &str) -> Self {
        Self {
            offset,
            length: class_name.len() as u32,
            class_name: SmolStr::new(class_name),
            message: unknown_class_message(class_name),
        }
    }
}

/// Receives findings as the validator produces them.
pub trait DiagnosticSink {
    /// Reports one finding.
    fn report(&mut self, finding: Finding);
}

impl DiagnosticSink for Vec<Finding> {
    fn report(&mut self, finding: Finding) {
        self.push(finding);
    }
}

/// Builds the message for an unknown class token.
pub(crate) fn unknown_class_message(class_name: &str) -> String {
    format!("Unknown class \"{}\"", class_name)
}

/// A diagnostic message, ready for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
    /// Byte offset of the start.
    pub offset: u32,
    /// Length in bytes.
    pub length: u32,
}

impl Diagnostic {
    /// Creates a new diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, offset: u32, length: u32) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            offset,
            length,
        }
    }

    /// Wraps a validator finding.
    pub fn from_finding(finding: Finding) -> Self {
        Self::new(
            DiagnosticCode::UnknownClassName,
            finding.message,
            finding.offset,
            finding.length,
        )
    }

    /// Overrides the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Byte offset one past the end.
    pub fn end(&self) -> u32 {
        self.offset + self.length
    }
}

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// A warning that doesn't fail the run by default.
    Warning,
    /// An error that should be fixed.
    Error,
}

impl Severity {
    /// Returns the severity as a display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// `unknown-class-name`: a class token not defined by any indexed stylesheet
    UnknownClassName,
    /// `parse-error`: the source file could not be parsed
    ParseError,
}

impl DiagnosticCode {
    /// Returns the default severity for this diagnostic code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnknownClassName => Severity::Warning,
            DiagnosticCode::ParseError => Severity::Error,
        }
    }

    /// Returns the diagnostic code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnknownClassName => "unknown-class-name",
            DiagnosticCode::ParseError => "parse-error",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
