//! Inlined-module emission (§4.6): modules that are pure (side-effect-free)
//! and acyclic are spliced directly into the bundle's top-level scope rather
//! than wrapped. Their kept top-level names become bundle globals, renamed
//! per the rename plan wherever a bundle-wide collision demanded it.

use super::{rewrite_first_party_import, WildcardSource};
use crate::ast_util::shadows_locals_or_globals;
use crate::parse::ParsedModule;
use crate::rename::RenamePlan;
use crate::semantic::ModuleSemantics;
use crate::types::ModuleId;
use std::collections::{HashMap, HashSet};

/// `alive` is this module's own top-level names that survived tree-shaking
/// (§4.4); everything else is dropped. `wrapper_targets` is the set of
/// modules in the bundle that are emitted as wrappers rather than inlined.
/// `wildcards` carries, for each first-party `from T import *` this module
/// writes, the resolved names `T` exports — those names become new
/// top-level bindings in this module's own scope (§4.6), so they're folded
/// into `own_rename` exactly like any other locally-defined symbol.
pub fn emit_inlined_module(
    parsed: &ParsedModule,
    semantics: &ModuleSemantics,
    alive: &HashSet<String>,
    rename: &RenamePlan,
    wrapper_targets: &HashSet<ModuleId>,
    wildcards: &HashMap<ModuleId, WildcardSource>,
) -> String {
    let mut own_rename: HashMap<String, String> = semantics
        .defs
        .keys()
        .filter_map(|name| {
            let renamed = rename.resolved_name(&semantics.module, name);
            (renamed != name).then(|| (name.clone(), renamed.to_string()))
        })
        .collect();
    for import in &semantics.imports {
        if !import.is_star || import.class != crate::types::ImportClass::FirstParty {
            continue;
        }
        let Some(source) = wildcards.get(&import.target_module) else {
            continue;
        };
        for name in &source.names {
            let renamed = rename.resolved_name(&semantics.module, name);
            if renamed != name {
                own_rename.insert(name.clone(), renamed.to_string());
            }
        }
    }

    let import_targets: HashMap<&str, &crate::semantic::alias::ResolvedImport> = semantics
        .imports
        .iter()
        .map(|import| (import.local_name.as_str(), import))
        .collect();

    // Module-scope `locals()`/`globals()` calls need the real (unrenamed)
    // top-level names this module defines, approximated as a dict literal,
    // until a statement rebinds one of those two names (§4.4 special
    // builtins guard). Entry/wrapper modules skip this entirely: they run
    // inside a real `exec`/`__main__` namespace where the builtins already
    // resolve correctly.
    let namespace_literal = module_namespace_literal(semantics, alive, &own_rename);
    let mut builtin_ns_active = true;

    let mut pieces = Vec::new();
    for stmt in &parsed.ast.body {
        if should_drop(stmt, semantics, alive) {
            continue;
        }
        let ns_literal = builtin_ns_active.then_some(namespace_literal.as_str());
        if shadows_locals_or_globals(stmt) {
            builtin_ns_active = false;
        }
        let text = super::rewrite::rewrite_stmt(parsed, stmt, &own_rename, ns_literal, |binding| {
            let resolved = if binding.is_star {
                semantics
                    .imports
                    .iter()
                    .find(|i| i.is_star && i.range == binding.range.into())?
            } else {
                import_targets.get(binding.local_name.as_str())?
            };
            if resolved.class != crate::types::ImportClass::FirstParty {
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
            pieces.push(text);
        }
    }
    pieces.join("\n")
}

/// Builds the `{"name": name, ...}` literal approximating this module's own
/// namespace, restricted to alive top-level def names (the only top-level
/// bindings whose identity is stable enough to snapshot meaningfully here).
fn module_namespace_literal(
    semantics: &ModuleSemantics,
    alive: &HashSet<String>,
    own_rename: &HashMap<String, String>,
) -> String {
    let mut names: Vec<&str> = semantics
        .defs
        .keys()
        .map(String::as_str)
        .filter(|name| alive.contains(*name))
        .collect();
    names.sort();
    let entries: Vec<String> = names
        .iter()
        .map(|name| {
            let resolved = own_rename
                .get(*name)
                .map(String::as_str)
                .unwrap_or(name);
            format!("{name:?}: {resolved}")
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn should_drop(stmt: &ruff_python_ast::Stmt, semantics: &ModuleSemantics, alive: &HashSet<String>) -> bool {
    use crate::ast_util::{is_main_guard, simple_assign_targets};
    use ruff_python_ast::Stmt;

    if is_main_guard(stmt) {
        return true; // the entry module handles its own guard separately; a
                      // non-entry inlined module's guard never runs anyway.
    }
    match stmt {
        Stmt::FunctionDef(f) => !alive.contains(f.name.as_str()) && semantics.defs.contains_key(f.name.as_str()),
        Stmt::ClassDef(c) => !alive.contains(c.name.as_str()) && semantics.defs.contains_key(c.name.as_str()),
        Stmt::Assign(_) => {
            let names = simple_assign_targets(stmt);
            !names.is_empty() && names.iter().all(|n| !alive.contains(*n))
        }
        _ => false,
    }
}

/// The module's publicly exported kept names, used to build its registry
/// namespace accessor (§4.6) for `import pkg.mod` / `from pkg.mod import *`
/// references from elsewhere in the bundle.
pub fn exported_alive_names<'a>(
    semantics: &'a ModuleSemantics,
    alive: &'a HashSet<String>,
) -> Vec<&'a str> {
    semantics
        .defs
        .keys()
        .map(String::as_str)
        .filter(|name| alive.contains(*name) && semantics.exports.is_exported(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;
    use crate::resolve::Resolver;
    use crate::semantic::analyze_module;
    use crate::types::ModuleKind;
    use std::path::Path;

    #[test]
    fn drops_unreachable_definitions() {
        let src = "def used():\n    pass\ndef unused():\n    pass\n";
        let parsed = parse_source(Path::new("<test>"), src.to_string()).unwrap();
        let resolver = Resolver::new(vec![]);
        let module = ModuleId::new("pkg.mod");
        let semantics = analyze_module(&module, ModuleKind::Submodule, &parsed.ast.body, &resolver, false);

        let mut alive = HashSet::new();
        alive.insert("used".to_string());

        let rename = crate::rename::plan_renames(&[]).unwrap();
        let text = emit_inlined_module(
            &parsed,
            &semantics,
            &alive,
            &rename,
            &HashSet::new(),
            &HashMap::new(),
        );
        assert!(text.contains("def used"));
        assert!(!text.contains("def unused"));
    }

    #[test]
    fn rewrites_first_party_from_import_of_inline_target() {
        let src = "from .util import helper\n";
        let parsed = parse_source(Path::new("<test>"), src.to_string()).unwrap();
        let resolver = Resolver::new(vec![]);
        let module = ModuleId::new("pkg.mod");
        let semantics = analyze_module(&module, ModuleKind::Submodule, &parsed.ast.body, &resolver, false);
        let rename = crate::rename::plan_renames(&[(ModuleId::new("pkg.util"), "helper".to_string())]).unwrap();

        let text = emit_inlined_module(
            &parsed,
            &semantics,
            &HashSet::new(),
            &rename,
            &HashSet::new(),
            &HashMap::new(),
        );
        assert!(text.is_empty(), "unique name needs no rebinding, got: {text}");
    }

    #[test]
    fn rewrites_bare_locals_call_before_shadowing_point() {
        let src = "def f():\n    pass\nprint(locals())\nlocals = lambda: \"custom\"\nprint(locals())\n";
        let parsed = parse_source(Path::new("<test>"), src.to_string()).unwrap();
        let resolver = Resolver::new(vec![]);
        let module = ModuleId::new("pkg.mod");
        let semantics = analyze_module(&module, ModuleKind::Submodule, &parsed.ast.body, &resolver, false);
        let rename = crate::rename::plan_renames(&[]).unwrap();

        let mut alive = HashSet::new();
        alive.insert("f".to_string());

        let text = emit_inlined_module(
            &parsed,
            &semantics,
            &alive,
            &rename,
            &HashSet::new(),
            &HashMap::new(),
        );
        assert!(text.contains("print({\"f\": f})"));
        assert!(text.contains("locals = lambda"));
        assert!(text.contains("print(locals())"));
    }
}
