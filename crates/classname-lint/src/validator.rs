//! Class name attribute validation.

use crate::diagnostic::{DiagnosticSink, Finding};
use crate::source::ParsedSource;
use crate::tokens::class_tokens;
use classname_index::Index;
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};
use swc_common::Spanned;
use swc_ecma_ast::{JSXAttr, JSXAttrName, JSXAttrValue};
use swc_ecma_visit::{Visit, VisitWith};

/// The attribute checked when none is configured.
pub const DEFAULT_CLASS_ATTRIBUTE: &str = "className";

/// A set of class names that attribute tokens are checked against.
pub trait KnownClasses {
    /// Returns true if `class_name` is defined.
    fn is_known(&self, class_name: &str) -> bool;
}

impl KnownClasses for Index {
    fn is_known(&self, class_name: &str) -> bool {
        self.contains(class_name)
    }
}

impl<T, S> KnownClasses for HashSet<T, S>
where
    T: Borrow<str> + Hash + Eq,
    S: BuildHasher,
{
    fn is_known(&self, class_name: &str) -> bool {
        self.contains(class_name)
    }
}

/// Checks class name attributes against a set of known classes.
#[derive(Debug, Clone)]
pub struct AttributeValidator {
    attributes: Vec<SmolStr>,
}

impl Default for AttributeValidator {
    fn default() -> Self {
        Self::new([DEFAULT_CLASS_ATTRIBUTE])
    }
}

impl AttributeValidator {
    /// Creates a validator for the given attribute names.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|name| SmolStr::new(name.as_ref()))
                .collect(),
        }
    }

    /// The attribute names being checked.
    pub fn attributes(&self) -> &[SmolStr] {
        &self.attributes
    }

    /// Returns true if `name` is one of the checked attributes.
    pub fn is_class_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr == name)
    }

    /// Checks one literal attribute value starting at byte `start`.
    ///
    /// Every non-empty token missing from `classes` is reported at its exact
    /// offset and length.
    pub fn validate_value<K>(
        &self,
        value: &str,
        start: u32,
        classes: &K,
        sink: &mut dyn DiagnosticSink,
    ) where
        K: KnownClasses + ?Sized,
    {
        for token in class_tokens(value) {
            if !classes.is_known(token.text) {
                sink.report(Finding::unknown_class(start + token.offset, token.text));
            }
        }
    }

    /// Walks `source` depth-first and checks every matching attribute.
    pub fn validate<K>(&self, source: &ParsedSource<'_>, classes: &K, sink: &mut dyn DiagnosticSink)
    where
        K: KnownClasses + ?Sized,
    {
        let mut visitor = ClassAttributeVisitor {
            validator: self,
            source,
            classes,
            sink,
        };
        source.module.visit_with(&mut visitor);
    }
}

struct ClassAttributeVisitor<'a, 's, K: ?Sized> {
    validator: &'a AttributeValidator,
    source: &'a ParsedSource<'s>,
    classes: &'a K,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'s, K: KnownClasses + ?Sized> ClassAttributeVisitor<'_, 's, K> {
    fn check_attribute(&mut self, attr: &JSXAttr) {
        let JSXAttrName::Ident(name) = &attr.name else {
            return;
        };
        if !self.validator.is_class_attribute(&name.sym) {
            return;
        }

        // A bare attribute (`<div className />`) has nothing to check
        let Some(value) = &attr.value else {
            return;
        };
        if let Some((text, start)) = self.literal_value(value) {
            self.validator
                .validate_value(text, start, self.classes, &mut *self.sink);
        }
    }

    /// Returns the raw text between the quotes of a string literal value,
    /// with the offset of its first byte.
    fn literal_value(&self, value: &JSXAttrValue) -> Option<(&'s str, u32)> {
        if matches!(
            value,
            JSXAttrValue::JSXExprContainer(_)
                | JSXAttrValue::JSXElement(_)
                | JSXAttrValue::JSXFragment(_)
        ) {
            return None;
        }

        let span = value.span();
        let lo = self.source.offset_of(span.lo);
        let hi = self.source.offset_of(span.hi);
        let raw = self.source.text.get(lo as usize..hi as usize)?;

        let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = raw.strip_prefix(quote)?.strip_suffix(quote)?;
        Some((inner, lo + 1))
    }
}

impl<K: KnownClasses + ?Sized> Visit for ClassAttributeVisitor<'_, '_, K> {
    fn visit_jsx_attr(&mut self, attr: &JSXAttr) {
        self.check_attribute(attr);
        attr.visit_children_with(self);
    }
}
