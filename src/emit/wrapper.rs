//! Wrapper-module emission (§4.6): modules that are side-effectful, part of
//! an import cycle, or contain unsupported top-level dynamism can't be
//! safely hoisted to bundle scope, since doing so would run their side
//! effects at the wrong time (or never, for code reachable only through a
//! cycle). Instead each becomes a lazily-called `_cribo_init_*` function
//! that builds and returns a real module object, matching the way CPython
//! itself defers a module's body to first-import time.
//!
//! The body is executed with `exec(..., module.__dict__)` rather than
//! pasted inline as a nested function: that gives the body's own
//! `globals()` and top-level assignments the module's `__dict__` as their
//! namespace for free, so a `from x import *` inside a wrapper module
//! populates the module object instead of the bundle's real global scope.

use super::{rewrite_first_party_import, WildcardSource};
use crate::parse::ParsedModule;
use crate::rename::RenamePlan;
use crate::semantic::ModuleSemantics;
use crate::types::{ImportClass, ModuleId};
use std::collections::{HashMap, HashSet};

pub fn init_fn_name(module: &ModuleId) -> String {
    format!("_cribo_init_{}", module.as_str().replace('.', "_"))
}

/// Returns the `def _cribo_init_*(): ...` source for `semantics`'s module.
/// `wildcards` carries the resolved export names for every first-party
/// `from T import *` this module writes (§4.6); the body runs through a
/// real `exec(..., module.__dict__)`, so — unlike an inlined module — its
/// own `locals()`/`globals()` calls already resolve correctly and need no
/// rewriting.
pub fn emit_wrapper_module(
    parsed: &ParsedModule,
    semantics: &ModuleSemantics,
    wrapper_targets: &HashSet<ModuleId>,
    rename: &RenamePlan,
    wildcards: &HashMap<ModuleId, WildcardSource>,
) -> String {
    let fn_name = init_fn_name(&semantics.module);
    let identity = semantics.module.as_str();

    let import_targets: HashMap<&str, &crate::semantic::alias::ResolvedImport> = semantics
        .imports
        .iter()
        .map(|import| (import.local_name.as_str(), import))
        .collect();

    let mut body = String::new();
    for stmt in &parsed.ast.body {
        let text = super::rewrite::rewrite_stmt(parsed, stmt, &HashMap::new(), None, |binding| {
            let resolved = if binding.is_star {
                semantics
                    .imports
                    .iter()
                    .find(|i| i.is_star && i.range == binding.range.into())?
            } else {
                import_targets.get(binding.local_name.as_str())?
            };
            if resolved.class != ImportClass::FirstParty {
                return None;
            }
            let is_wrapper = wrapper_targets.contains(&resolved.target_module);
            rewrite_first_party_import(
                binding,
                is_wrapper,
                &resolved.target_module,
                rename,
                &semantics.module,
                wildcards.get(&resolved.target_module),
            )
        });
        if !text.trim().is_empty() {
            body.push_str(&text);
            if !text.ends_with('\n') {
                body.push('\n');
            }
        }
    }

    let quoted_body = python_triple_quoted_string(&body);
    format!(
        "def {fn_name}():\n    \
         module = _cribo_types.ModuleType({identity:?})\n    \
         module.__dict__[\"__name__\"] = {identity:?}\n    \
         _cribo_modules[{identity:?}] = module\n    \
         exec({quoted_body}, module.__dict__)\n    \
         return module\n"
    )
}

/// Embeds `source` as a Python triple-quoted string literal, escaping the
/// handful of characters that would otherwise break out of it.
fn python_triple_quoted_string(source: &str) -> String {
    let escaped = source
        .replace('\\', "\\\\")
        .replace("\"\"\"", "\\\"\\\"\\\"");
    format!("\"\"\"{escaped}\"\"\"")
}
