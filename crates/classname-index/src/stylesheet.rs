//! Stylesheet parsing.
//!
//! The indexer only needs a thin view of a stylesheet: which rules carry
//! selectors, which ones import other files, and which ones nest child
//! rules. [`Rule`] is that view. Any [`StylesheetParser`] can produce it; the
//! default one is backed by lightningcss.

use camino::Utf8Path;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::{CssRule as LCssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// A single stylesheet rule, reduced to what class indexing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// A qualified (style) rule.
    Style {
        /// Each selector of the selector list, serialized.
        selectors: Vec<String>,
        /// Nested child rules (CSS nesting).
        rules: Vec<Rule>,
    },
    /// An `@import` rule.
    Import {
        /// The import URL as written, quotes included or not.
        url: String,
    },
    /// An `@media` rule.
    Media { rules: Vec<Rule> },
    /// Any other at-rule that carries child rules (`@supports`, `@layer`,
    /// `@container`, `@scope`, `@starting-style`, `@-moz-document`).
    Group { rules: Vec<Rule> },
    /// Anything irrelevant to class indexing.
    Other,
}

impl Rule {
    /// Shorthand for a style rule without nested children.
    pub fn style<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Style {
            selectors: selectors.into_iter().map(Into::into).collect(),
            rules: Vec::new(),
        }
    }

    /// Shorthand for an import rule.
    pub fn import(url: impl Into<String>) -> Self {
        Rule::Import { url: url.into() }
    }

    /// Child rules to scan in a nested pass, if this rule nests any.
    pub fn children(&self) -> Option<&[Rule]> {
        match self {
            Rule::Style { rules, .. } | Rule::Media { rules } | Rule::Group { rules } => {
                (!rules.is_empty()).then_some(rules.as_slice())
            }
            Rule::Import { .. } | Rule::Other => None,
        }
    }
}

/// A syntax error reported while parsing a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StylesheetSyntaxError {
    /// Human-readable description from the parser.
    pub message: String,
    /// 0-indexed line, when the parser reports one.
    pub line: Option<u32>,
    /// 1-indexed column, when the parser reports one.
    pub column: Option<u32>,
}

impl StylesheetSyntaxError {
    /// Creates an error without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

/// The outcome of parsing one stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStylesheet {
    /// Top-level rules, in source order.
    pub rules: Vec<Rule>,
    /// Syntax errors. A non-empty list means the rules must not be trusted.
    pub errors: Vec<StylesheetSyntaxError>,
}

impl ParsedStylesheet {
    /// Creates a successfully parsed stylesheet.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            errors: Vec::new(),
        }
    }

    /// Creates a failed parse.
    pub fn from_error(error: StylesheetSyntaxError) -> Self {
        Self {
            rules: Vec::new(),
            errors: vec![error],
        }
    }

    /// Returns true if the parser reported no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Turns stylesheet text into rules.
pub trait StylesheetParser: Send + Sync {
    /// Parses `text`. `path` is only used for error messages.
    fn parse(&self, text: &str, path: &Utf8Path) -> ParsedStylesheet;
}

/// [`StylesheetParser`] backed by lightningcss.
///
/// Parsing recovers from invalid rules and declarations the way browsers do:
/// the offending rule is dropped, the rest of the file is kept, and the
/// dropped part is logged at debug level. Only a failure that leaves nothing
/// to recover is reported as a [`StylesheetSyntaxError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCssParser;

impl StylesheetParser for LightningCssParser {
    fn parse(&self, text: &str, path: &Utf8Path) -> ParsedStylesheet {
        let warnings = Arc::new(RwLock::new(Vec::new()));
        let parser_options = ParserOptions {
            filename: path.to_string(),
            error_recovery: true,
            warnings: Some(Arc::clone(&warnings)),
            ..Default::default()
        };

        let result = StyleSheet::parse(text, parser_options);

        if let Ok(recovered) = warnings.read() {
            for warning in recovered.iter() {
                debug!(path = %path, warning = %warning, "skipped invalid stylesheet content");
            }
        }

        match result {
            Ok(stylesheet) => ParsedStylesheet::from_rules(convert_rules(&stylesheet.rules)),
            Err(e) => ParsedStylesheet::from_error(StylesheetSyntaxError {
                message: e.kind.to_string(),
                line: e.loc.as_ref().map(|loc| loc.line),
                column: e.loc.as_ref().map(|loc| loc.column),
            }),
        }
    }
}

fn convert_rules(rules: &CssRuleList<'_>) -> Vec<Rule> {
    rules.0.iter().map(convert_rule).collect()
}

fn convert_style(style_rule: &StyleRule<'_>) -> Rule {
    Rule::Style {
        selectors: style_rule
            .selectors
            .0
            .iter()
            .filter_map(|selector| selector.to_css_string(PrinterOptions::default()).ok())
            .collect(),
        rules: convert_rules(&style_rule.rules),
    }
}

fn convert_rule(rule: &LCssRule<'_>) -> Rule {
    match rule {
        LCssRule::Style(style_rule) => convert_style(style_rule),
        LCssRule::Nesting(nesting) => convert_style(&nesting.style),
        LCssRule::Import(import) => Rule::Import {
            url: import.url.to_string(),
        },
        LCssRule::Media(media) => Rule::Media {
            rules: convert_rules(&media.rules),
        },
        LCssRule::Supports(supports) => Rule::Group {
            rules: convert_rules(&supports.rules),
        },
        LCssRule::LayerBlock(layer) => Rule::Group {
            rules: convert_rules(&layer.rules),
        },
        LCssRule::Container(container) => Rule::Group {
            rules: convert_rules(&container.rules),
        },
        LCssRule::Scope(scope) => Rule::Group {
            rules: convert_rules(&scope.rules),
        },
        LCssRule::StartingStyle(starting) => Rule::Group {
            rules: convert_rules(&starting.rules),
        },
        LCssRule::MozDocument(document) => Rule::Group {
            rules: convert_rules(&document.rules),
        },
        _ => Rule::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(css: &str) -> ParsedStylesheet {
        LightningCssParser.parse(css, Utf8Path::new("test.css"))
    }

    #[test]
    fn test_parse_style_rules() {
        let parsed = parse(".btn, .card { color: red; }");
        assert!(parsed.is_valid());
        assert_eq!(parsed.rules, vec![Rule::style([".btn", ".card"])]);
    }

    #[test]
    fn test_parse_import() {
        let parsed = parse("@import \"theme.css\";\n.a { color: red; }");
        assert!(parsed.is_valid());
        assert_eq!(parsed.rules[0], Rule::import("theme.css"));
    }

    #[test]
    fn test_parse_media_children() {
        let parsed = parse("@media (min-width: 640px) { .wide { color: red; } }");
        assert!(parsed.is_valid());
        assert_eq!(
            parsed.rules,
            vec![Rule::Media {
                rules: vec![Rule::style([".wide"])],
            }]
        );
    }

    #[test]
    fn test_parse_supports_as_group() {
        let parsed = parse("@supports (display: grid) { .grid { display: grid; } }");
        assert!(parsed.is_valid());
        assert!(matches!(&parsed.rules[0], Rule::Group { rules } if rules.len() == 1));
    }

    fn group_selectors(rule: &Rule) -> Vec<String> {
        let Rule::Group { rules } = rule else {
            panic!("expected a group, got {rule:?}");
        };
        rules
            .iter()
            .flat_map(|child| match child {
                Rule::Style { selectors, .. } => selectors.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_parse_scope_as_group() {
        let parsed = parse("@scope (.card) { .title { color: red; } }");
        assert!(parsed.is_valid());
        assert!(group_selectors(&parsed.rules[0])
            .iter()
            .any(|s| s.contains(".title")));
    }

    #[test]
    fn test_parse_starting_style_as_group() {
        let parsed = parse("@starting-style { .fade { opacity: 0; } }");
        assert!(parsed.is_valid());
        assert!(group_selectors(&parsed.rules[0])
            .iter()
            .any(|s| s.contains(".fade")));
    }

    #[test]
    fn test_invalid_rule_is_dropped_not_the_file() {
        let parsed = parse("..btn { color: red; }\n.card { color: blue; }");
        assert!(parsed.is_valid());
        assert_eq!(parsed.rules, vec![Rule::style([".card"])]);
    }

    #[test]
    fn test_legacy_property_hack_keeps_file() {
        let parsed = parse(".clearfix { *zoom: 1; }\n.btn { color: red; }");
        assert!(parsed.is_valid());
        assert!(parsed.rules.contains(&Rule::style([".btn"])));
    }

    #[test]
    fn test_late_import_keeps_earlier_rules() {
        let parsed = parse(".a { color: red; }\n@import \"b.css\";");
        assert!(parsed.is_valid());
        assert_eq!(parsed.rules[0], Rule::style([".a"]));
    }

    #[test]
    fn test_rule_children() {
        let media = Rule::Media {
            rules: vec![Rule::style([".a"])],
        };
        assert_eq!(media.children().map(<[Rule]>::len), Some(1));
        assert_eq!(Rule::style([".a"]).children(), None);
        assert_eq!(Rule::import("a.css").children(), None);
    }
}
