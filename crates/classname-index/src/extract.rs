//! Class name and import extraction from parsed stylesheet rules.

use crate::paths;
use crate::stylesheet::Rule;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::sync::OnceLock;

/// Marks an import specifier that goes through module resolution.
pub const PACKAGE_IMPORT_MARKER: char = '~';

/// A stylesheet referenced by an `@import` rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportTarget {
    /// A file path, already resolved against the importing file's directory.
    Relative(Utf8PathBuf),
    /// A package specifier (marker stripped), for a [`ModuleResolver`](crate::ModuleResolver).
    Package(String),
}

/// What a single extraction pass over a rule list found.
#[derive(Debug, Default)]
pub struct Extraction<'a> {
    /// Bare class names from every selector.
    pub class_names: FxHashSet<SmolStr>,
    /// Import targets, in source order.
    pub imports: Vec<ImportTarget>,
    /// Child rule lists that still need a pass against the same file.
    pub nested: Vec<&'a [Rule]>,
}

/// Class names and imports of a whole stylesheet, nested groups included.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StylesheetClasses {
    pub class_names: FxHashSet<SmolStr>,
    pub imports: Vec<ImportTarget>,
}

/// Runs one pass over `rules`, without descending into nested groups.
pub fn extract<'a>(rules: &'a [Rule], current_file: &Utf8Path) -> Extraction<'a> {
    let mut extraction = Extraction::default();

    for rule in rules {
        match rule {
            Rule::Style { selectors, .. } => {
                for selector in selectors {
                    extraction.class_names.extend(selector_class_names(selector));
                }
            }
            Rule::Import { url } => {
                if let Some(target) = classify_import(url, current_file) {
                    extraction.imports.push(target);
                }
            }
            Rule::Media { .. } | Rule::Group { .. } | Rule::Other => {}
        }

        if let Some(children) = rule.children() {
            extraction.nested.push(children);
        }
    }

    extraction
}

/// Extracts from `rules` and every nested group until none remain.
pub fn extract_all(rules: &[Rule], current_file: &Utf8Path) -> StylesheetClasses {
    let mut result = StylesheetClasses::default();
    let mut pending = vec![rules];

    while let Some(group) = pending.pop() {
        let extraction = extract(group, current_file);
        result.class_names.extend(extraction.class_names);
        result.imports.extend(extraction.imports);
        // Reverse so groups are visited in source order
        pending.extend(extraction.nested.into_iter().rev());
    }

    result
}

fn class_component_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\.([/\\:\w-]+)").expect("class component pattern is a valid regex")
    })
}

/// Yields the bare class names of every class component in `selector`.
pub fn selector_class_names(selector: &str) -> impl Iterator<Item = SmolStr> + '_ {
    class_component_regex()
        .captures_iter(selector)
        .filter_map(|caps| caps.get(1))
        .filter_map(|raw| clean_class_name(raw.as_str()))
}

/// Strips a trailing pseudo-class or pseudo-element and escape markers.
///
/// The pseudo suffix starts at the first `:` that is not escaped and is
/// followed by at least one character, so `sm\:flex:hover` becomes `sm:flex`.
pub fn clean_class_name(raw: &str) -> Option<SmolStr> {
    let bytes = raw.as_bytes();
    let cut = (1..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b':' && bytes[i - 1] != b'\\')
        .unwrap_or(raw.len());

    let name: String = raw[..cut].chars().filter(|&c| c != '\\').collect();
    if name.is_empty() {
        None
    } else {
        Some(SmolStr::new(name))
    }
}

/// Classifies the URL of an `@import` rule.
///
/// Quotes and `url(...)` wrappers are removed. Remote URLs are ignored.
pub fn classify_import(url: &str, current_file: &Utf8Path) -> Option<ImportTarget> {
    let mut url = url.trim();
    if let Some(inner) = url.strip_prefix("url(").and_then(|u| u.strip_suffix(')')) {
        url = inner.trim();
    }
    for quote in ['"', '\''] {
        if let Some(inner) = url.strip_prefix(quote).and_then(|u| u.strip_suffix(quote)) {
            url = inner.trim();
            break;
        }
    }

    if url.is_empty() || url.starts_with("//") || url.contains("://") {
        return None;
    }

    if let Some(specifier) = url.strip_prefix(PACKAGE_IMPORT_MARKER) {
        return Some(ImportTarget::Package(specifier.to_string()));
    }

    let dir = current_file.parent().unwrap_or(Utf8Path::new(""));
    Some(ImportTarget::Relative(paths::normalize(&dir.join(url))))
}
