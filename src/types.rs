//! Shared identifiers and small value types used across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

/// Canonical dotted module path, e.g. `pkg.sub.mod` (see GLOSSARY: Module identity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(CompactString);

impl ModuleId {
    pub fn new(dotted: impl Into<CompactString>) -> Self {
        Self(dotted.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `pkg.sub.mod` -> `pkg.sub` (the owning package), or `None` for a top-level module.
    pub fn parent_package(&self) -> Option<ModuleId> {
        self.0.rfind('.').map(|idx| ModuleId::new(&self.0[..idx]))
    }

    /// First dotted component, used for classification (top-level package name).
    pub fn top_level(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Last dotted component.
    pub fn last_component(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a first-party module's source was found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    /// `<root>/<path>.py`
    Submodule,
    /// `<root>/<path>/__init__.py`
    Package,
}

/// Classification of an import target (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportClass {
    Stdlib,
    FirstParty,
    ThirdParty,
    Native,
}

/// Byte offsets into a module's source text, used by the emitter's slice-and-patch
/// strategy instead of a full pretty-printer (see §6 round-trip contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u32,
    pub end: u32,
}

impl ByteRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<ruff_text_size::TextRange> for ByteRange {
    fn from(range: ruff_text_size::TextRange) -> Self {
        Self {
            start: range.start().to_u32(),
            end: range.end().to_u32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_parent_and_top_level() {
        let m = ModuleId::new("pkg.sub.mod");
        assert_eq!(m.parent_package(), Some(ModuleId::new("pkg.sub")));
        assert_eq!(m.top_level(), "pkg");
        assert_eq!(m.last_component(), "mod");
    }

    #[test]
    fn module_id_top_level_has_no_parent() {
        let m = ModuleId::new("pkg");
        assert_eq!(m.parent_package(), None);
    }

    #[test]
    fn byte_range_len() {
        let r = ByteRange::new(10, 25);
        assert_eq!(r.len(), 15);
        assert!(!r.is_empty());
    }
}
