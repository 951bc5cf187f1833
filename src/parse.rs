//! Parser facade (§2 stage 3, §6 parser/AST contract).
//!
//! Wraps `ruff_python_parser` so the rest of the pipeline depends on one
//! narrow surface: parse source text into a byte-ranged AST once per module,
//! cache it, and hand out source text slices for the emitter's slice-and-patch
//! strategy (§9). Unparsing is *not* done through a pretty-printer; the
//! emitter instead splices byte ranges of the original source (see `emit`).

use crate::error::ParseError;
use ruff_python_ast::ModModule;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A parsed first-party module: its source text plus the AST, kept together
/// since the emitter slices ranges back out of the source.
#[derive(Clone)]
pub struct ParsedModule {
    pub path: PathBuf,
    pub source: Arc<str>,
    pub ast: Arc<ModModule>,
}

impl ParsedModule {
    /// The exact source text spanned by `range`, used by the emitter to copy
    /// statements/expressions verbatim or as the basis for a patched copy.
    pub fn text(&self, range: ruff_text_size::TextRange) -> &str {
        &self.source[range.start().to_usize()..range.end().to_usize()]
    }
}

/// Reads and parses a single Python source file.
pub fn parse_file(path: &Path) -> Result<ParsedModule, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;
    parse_source(path, source)
}

/// Parses already-read source text (used by tests and by the idempotence
/// check, which re-bundles the just-emitted bundle text directly).
pub fn parse_source(path: &Path, source: String) -> Result<ParsedModule, ParseError> {
    let parsed = ruff_python_parser::parse_module(&source).map_err(|err| {
        let location = err.location();
        ParseError::Syntax {
            path: path.to_path_buf(),
            line: location.start().to_u32(),
            column: 0,
            reason: err.error.to_string(),
        }
    })?;

    Ok(ParsedModule {
        path: path.to_path_buf(),
        source: Arc::from(source),
        ast: Arc::new(parsed.into_syntax()),
    })
}
