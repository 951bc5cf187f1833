//! Slice-and-patch text rewriting (§6, §9): the emitter never re-serializes
//! an AST. It instead records byte-range replacements against the original
//! source and splices them in, so everything outside a patched range —
//! comments, exact whitespace, string quoting — survives untouched.

use crate::ast_util::{
    def_name_ranges, import_bindings, is_self_reference_assign, module_scope_builtin_ns_calls,
    nested_import_stmts, nested_self_reference_assigns, scoped_rename_occurrences, ImportBinding,
};
use crate::parse::ParsedModule;
use crate::types::ByteRange;
use ruff_python_ast::Stmt;
use ruff_text_size::Ranged;
use std::collections::HashMap;

/// A single replacement: the original text spanned by `range` is dropped and
/// `replacement` is inserted in its place.
pub struct Patch {
    pub range: ByteRange,
    pub replacement: String,
}

/// Applies non-overlapping `patches` to `source`, returning the patched
/// text. Patches need not arrive in order; overlapping patches are a bug in
/// the caller and panic rather than silently producing corrupt output.
pub fn apply_patches(source: &str, mut patches: Vec<Patch>) -> String {
    patches.sort_by_key(|p| p.range.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0u32;
    for patch in patches {
        assert!(
            patch.range.start >= cursor,
            "overlapping patches at byte {}",
            patch.range.start
        );
        out.push_str(&source[cursor as usize..patch.range.start as usize]);
        out.push_str(&patch.replacement);
        cursor = patch.range.end;
    }
    out.push_str(&source[cursor as usize..]);
    out
}

/// Applies `patches` (whose ranges must fall within `range`) against just
/// the `range` slice of `source`, leaving the rest of `source` untouched by
/// this call. Used to patch one kept top-level statement at a time, since
/// tree-shaking can drop the statements in between two kept ones and a
/// single contiguous splice over the whole file would pull those back in.
pub fn apply_patches_in_range(source: &str, range: ByteRange, patches: Vec<Patch>) -> String {
    let slice = &source[range.start as usize..range.end as usize];
    let local_patches = patches
        .into_iter()
        .map(|p| Patch {
            range: ByteRange::new(p.range.start - range.start, p.range.end - range.start),
            replacement: p.replacement,
        })
        .collect();
    apply_patches(slice, local_patches)
}

/// Renders a single import binding back into source form, used when one
/// `import`/`from import` statement mixes bindings that need rewriting with
/// bindings that don't (rare, but legal Python: `import os, pkg.util`).
pub fn render_import_binding(binding: &ImportBinding) -> String {
    let alias = |local: &str, default: &str| {
        if local == default {
            String::new()
        } else {
            format!(" as {local}")
        }
    };
    if binding.level == 0 && binding.imported_name.is_none() {
        let default = binding.module.split('.').next().unwrap_or(&binding.module);
        format!("import {}{}", binding.module, alias(&binding.local_name, default))
    } else {
        let dots = ".".repeat(binding.level as usize);
        let imported = binding.imported_name.as_deref().unwrap_or("*");
        let suffix = if imported == "*" {
            String::new()
        } else {
            alias(&binding.local_name, imported)
        };
        format!("from {dots}{} import {imported}{suffix}", binding.module)
    }
}

/// Rewrites one statement's source text. `import_line(binding)` returns
/// `Some(replacement source line)` for a binding that must change (a
/// first-party import becoming a registry lookup or a dropped binding);
/// `None` leaves that particular binding exactly as written. `own_rename`
/// renames this module's own top-level definitions where a bundle-wide
/// collision required it (§4.5), patched at every in-module reference, not
/// just the definition token. `builtin_ns_literal`, when `Some`, is the
/// dict-literal text substituted for a bare module-scope `locals()`/
/// `globals()` call (§4.4 special builtins guard); `None` leaves such calls
/// untouched (wrapper/entry modules, or past a shadowing point).
pub fn rewrite_stmt(
    parsed: &ParsedModule,
    stmt: &Stmt,
    own_rename: &HashMap<String, String>,
    builtin_ns_literal: Option<&str>,
    mut import_line: impl FnMut(&ImportBinding) -> Option<String>,
) -> String {
    // `x = x` contributes nothing and is dropped outright rather than
    // rewritten to an equivalent no-op (§4.4).
    if is_self_reference_assign(stmt) {
        return String::new();
    }

    let range: ByteRange = stmt.range().into();

    if matches!(stmt, Stmt::Import(_) | Stmt::ImportFrom(_)) {
        let bindings = import_bindings(stmt);
        let mut rewrote_any = false;
        let lines: Vec<String> = bindings
            .iter()
            .map(|b| match import_line(b) {
                Some(line) => {
                    rewrote_any = true;
                    line
                }
                None => render_import_binding(b),
            })
            .collect();
        if rewrote_any {
            return lines.join("\n");
        }
        return parsed.text(stmt.range()).to_string();
    }

    let mut patches: Vec<Patch> = def_name_ranges(stmt)
        .into_iter()
        .filter_map(|(name, ident_range)| {
            let renamed = own_rename.get(name)?;
            (renamed != name).then(|| Patch {
                range: ident_range.into(),
                replacement: renamed.clone(),
            })
        })
        .collect();

    // Every other in-module reference to a renamed name — load or store,
    // at any unshadowed scope — needs the same patch (§4.5 totality).
    // `def_name_ranges` above only covers the `def`/`class` identifier
    // token itself, which is a distinct AST node from `Expr::Name`, so the
    // two never overlap.
    for (occurrence_range, replacement) in scoped_rename_occurrences(stmt, own_rename) {
        patches.push(Patch {
            range: occurrence_range.into(),
            replacement,
        });
    }

    for nested in nested_self_reference_assigns(stmt) {
        patches.push(Patch {
            range: nested.range().into(),
            replacement: "pass".to_string(),
        });
    }

    if let Some(literal) = builtin_ns_literal {
        for call_range in module_scope_builtin_ns_calls(stmt) {
            patches.push(Patch {
                range: call_range.into(),
                replacement: literal.to_string(),
            });
        }
    }

    // A first-party import written inside a nested function/class body is
    // still a first-party import: the module it names no longer exists as
    // an importable file once bundled, so it needs the same rewrite a
    // top-level import would get.
    for nested in nested_import_stmts(stmt) {
        let bindings = import_bindings(nested);
        let mut rewrote_any = false;
        let lines: Vec<String> = bindings
            .iter()
            .map(|b| match import_line(b) {
                Some(line) => {
                    rewrote_any = true;
                    line
                }
                None => render_import_binding(b),
            })
            .collect();
        if rewrote_any {
            let non_empty: Vec<&String> = lines.iter().filter(|l| !l.is_empty()).collect();
            let replacement = if non_empty.is_empty() {
                // Every binding in this statement already reads the right
                // name; the statement itself still needs a token here since
                // it may be the only statement in its suite.
                "pass".to_string()
            } else {
                non_empty
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            patches.push(Patch {
                range: nested.range().into(),
                replacement,
            });
        }
    }

    if patches.is_empty() {
        parsed.text(stmt.range()).to_string()
    } else {
        apply_patches_in_range(&parsed.source, range, patches)
    }
}
