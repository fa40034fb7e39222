//! Parsing JSX/TSX source files with SWC.

use crate::LintError;
use std::sync::Arc;
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// The dialect a source file is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSyntax {
    /// TypeScript with JSX (`.tsx`).
    Tsx,
    /// TypeScript without JSX (`.ts`, `.mts`, `.cts`).
    TypeScript,
    /// JavaScript with JSX (`.js`, `.jsx`, `.mjs`, `.cjs`).
    Jsx,
}

impl SourceSyntax {
    /// Picks the syntax from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension {
            "tsx" => Some(SourceSyntax::Tsx),
            "ts" | "mts" | "cts" => Some(SourceSyntax::TypeScript),
            "jsx" | "js" | "mjs" | "cjs" => Some(SourceSyntax::Jsx),
            _ => None,
        }
    }

    fn to_swc(self) -> Syntax {
        match self {
            SourceSyntax::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
            SourceSyntax::TypeScript => Syntax::Typescript(TsSyntax {
                tsx: false,
                ..Default::default()
            }),
            SourceSyntax::Jsx => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
        }
    }
}

/// A parsed source file, kept together with its text.
pub struct ParsedSource<'s> {
    /// The original source text.
    pub text: &'s str,
    /// The parsed module.
    pub module: Module,
    /// SWC position of the first byte after any byte-order mark.
    pub file_start: BytePos,
    /// Length of the byte-order mark SWC never sees.
    pub bom_len: u32,
}

impl ParsedSource<'_> {
    /// Converts an SWC position into a byte offset within `text`.
    pub fn offset_of(&self, pos: BytePos) -> u32 {
        pos.0.saturating_sub(self.file_start.0) + self.bom_len
    }
}

/// Parses `text` as a module.
pub fn parse_source(text: &str, syntax: SourceSyntax) -> Result<ParsedSource<'_>, LintError> {
    let (body, bom_len) = match text.strip_prefix('\u{FEFF}') {
        Some(rest) => (rest, '\u{FEFF}'.len_utf8() as u32),
        None => (text, 0),
    };

    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("typed-classnames-source".into()).into(),
        body.to_string(),
    );
    let file_start = fm.start_pos;

    let mut parser = Parser::new(syntax.to_swc(), StringInput::from(&*fm), None);
    match parser.parse_module() {
        Ok(module) => Ok(ParsedSource {
            text,
            module,
            file_start,
            bom_len,
        }),
        Err(e) => Err(LintError::Parse {
            offset: e.span().lo.0.saturating_sub(file_start.0) + bom_len,
            message: e.kind().msg().into_owned(),
        }),
    }
}
