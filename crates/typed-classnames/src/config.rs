//! Configuration loading.
//!
//! Settings come from `typed-classnames.json` in the workspace root, with
//! command-line flags layered on top.

use crate::cli::Args;
use camino::{Utf8Path, Utf8PathBuf};
use classname_index::{NodeModulesResolver, StylesheetIndexer};
use classname_lint::{AttributeValidator, Severity, DEFAULT_CLASS_ATTRIBUTE};
use serde::Deserialize;
use std::fs;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// The config file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "typed-classnames.json";

/// Source files checked when no `include` patterns are configured.
pub const DEFAULT_INCLUDE: &str = "**/*.{jsx,tsx}";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The workspace directory does not exist or is not valid UTF-8.
    #[error("invalid workspace: {0}")]
    Workspace(String),

    /// Nothing to index.
    #[error("no stylesheets configured; pass --stylesheet or add \"stylesheets\" to typed-classnames.json")]
    NoStylesheets,
}

/// The severity an unknown class is reported with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    Warning,
    Error,
}

impl From<SeverityLevel> for Severity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Warning => Severity::Warning,
            SeverityLevel::Error => Severity::Error,
        }
    }
}

/// Contents of `typed-classnames.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Entry stylesheets, relative to the workspace.
    #[serde(default)]
    pub stylesheets: Vec<Utf8PathBuf>,

    /// Attributes holding class names.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Source file patterns to check.
    #[serde(default)]
    pub include: Vec<String>,

    /// Source file patterns to skip.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Extra directories searched for `~package` imports.
    #[serde(default)]
    pub module_paths: Vec<Utf8PathBuf>,

    /// Severity for unknown classes.
    #[serde(default)]
    pub severity: SeverityLevel,
}

impl FileConfig {
    /// Loads configuration from a JSON file; comments and trailing commas are allowed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let content = jsonc_to_json(&content);

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Finds and loads `typed-classnames.json` from a workspace root.
    pub fn find(workspace: &Utf8Path) -> Result<Option<(Utf8PathBuf, Self)>, ConfigError> {
        let path = workspace.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(|config| Some((path, config)))
        } else {
            Ok(None)
        }
    }
}

/// Fully resolved settings for a run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Absolute workspace root.
    pub workspace: Utf8PathBuf,
    /// The config file in use, if any.
    pub config_file: Option<Utf8PathBuf>,
    /// Absolute entry stylesheet paths.
    pub stylesheets: Vec<Utf8PathBuf>,
    /// Attributes holding class names.
    pub attributes: Vec<String>,
    /// Source file patterns to check.
    pub include: Vec<String>,
    /// Source file patterns to skip.
    pub ignore: Vec<String>,
    /// Absolute extra package search directories.
    pub module_paths: Vec<Utf8PathBuf>,
    /// Severity for unknown classes.
    pub severity: Severity,
}

impl CheckConfig {
    /// Merges the config file with command-line flags.
    ///
    /// Flags that name stylesheets or attributes replace the file's lists;
    /// `--ignore` patterns are added to the file's.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let workspace = absolute_workspace(&args.workspace)?;

        let found = match &args.config {
            Some(path) => {
                let path = workspace.join(path);
                let config = FileConfig::load(&path)?;
                Some((path, config))
            }
            None => FileConfig::find(&workspace)?,
        };
        let (config_file, file) = match found {
            Some((path, config)) => (Some(path), config),
            None => (None, FileConfig::default()),
        };

        let stylesheets = if args.stylesheets.is_empty() {
            file.stylesheets
        } else {
            args.stylesheets.clone()
        };
        if stylesheets.is_empty() {
            return Err(ConfigError::NoStylesheets);
        }

        let attributes = if !args.attributes.is_empty() {
            args.attributes.clone()
        } else if !file.attributes.is_empty() {
            file.attributes
        } else {
            vec![DEFAULT_CLASS_ATTRIBUTE.to_string()]
        };

        let include = if file.include.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            file.include
        };

        let mut ignore = file.ignore;
        ignore.extend(args.ignore.iter().cloned());

        Ok(Self {
            stylesheets: stylesheets.iter().map(|p| workspace.join(p)).collect(),
            module_paths: file.module_paths.iter().map(|p| workspace.join(p)).collect(),
            severity: file.severity.into(),
            workspace,
            config_file,
            attributes,
            include,
            ignore,
        })
    }

    /// Builds the stylesheet indexer for this configuration.
    pub fn indexer(&self) -> StylesheetIndexer {
        let resolver =
            NodeModulesResolver::new().with_search_paths(self.module_paths.iter().cloned());
        StylesheetIndexer::with_resolver(Arc::new(resolver))
    }

    /// Builds the attribute validator for this configuration.
    pub fn validator(&self) -> AttributeValidator {
        AttributeValidator::new(&self.attributes)
    }
}

fn absolute_workspace(workspace: &Utf8Path) -> Result<Utf8PathBuf, ConfigError> {
    workspace
        .canonicalize_utf8()
        .map_err(|e| ConfigError::Workspace(format!("{}: {}", workspace, e)))
}

/// Turns JSONC (comments, trailing commas) into plain JSON.
fn jsonc_to_json(text: &str) -> String {
    strip_trailing_commas(&strip_comments(text))
}

/// Drops `//` and `/* */` comments outside string literals.
///
/// Newlines inside comments are kept so serde_json error positions still
/// point at the right line.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_string => {
                out.push(c);
                out.extend(chars.next());
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '/' if !in_string && chars.peek() == Some(&'/') => {
                while chars.next_if(|&next| next != '\n').is_some() {}
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push(next);
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Drops a comma followed only by whitespace before `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' && text[i + 1..].trim_start().starts_with(&['}', ']'][..]) {
            continue;
        }
        out.push(c);
    }

    out
}
