//! Bundle emitter (§4.6, §6, §9): turns classified, analyzed modules into
//! one self-contained Python file.
//!
//! Two module treatments feed a single output, in dependency order (deps
//! before dependents) so a reader sees each name defined before it's used:
//! inlined modules ([`inline`]) are hoisted straight to bundle scope and
//! tree-shaken; wrapper modules ([`wrapper`]) become lazily-called
//! `_cribo_init_*` functions registered with the [`registry`] so any module
//! — inlined or wrapped — can be reached uniformly through
//! `_cribo_import(identity)`. The entry module is always appended last,
//! verbatim apart from import rewriting, since nothing in the bundle ever
//! imports it.

pub mod header;
pub mod inline;
pub mod registry;
pub mod rewrite;
pub mod wrapper;

use crate::ast_util::ImportBinding;
use crate::error::EmitError;
use crate::parse::ParsedModule;
use crate::rename::{self, RenamePlan};
use crate::semantic::{self, reachability, ModuleSemantics};
use crate::types::{ImportClass, ModuleId};
use std::collections::{HashMap, HashSet};

/// One first-party module's parsed source plus its semantic analysis.
pub struct ModuleUnit {
    pub parsed: ParsedModule,
    pub semantics: ModuleSemantics,
}

/// The exported names a `from T import *` pulls in, resolved per importer
/// (§4.6): which names, and under what already-renamed source expression
/// each one reads, depends on whether `T` ended up inlined or wrapped.
pub struct WildcardSource {
    pub names: Vec<String>,
}

/// Rewrites a single first-party import binding into source that reaches
/// the right value regardless of whether its target ended up inlined or
/// wrapped. Shared by [`inline::emit_inlined_module`] and
/// [`wrapper::emit_wrapper_module`] so the two treatments never disagree on
/// how a cross-module reference resolves. Returns `None` only when `rename`
/// shows the binding already reads the correct name with no statement
/// needed (a unique, already-hoisted inline symbol).
///
/// `importer` is the module the import statement lives in; `wildcard`
/// carries the target's resolved export names when `binding.is_star`
/// (§4.6's wildcard expansion table — each exported name gets its own
/// binding rather than one generic namespace dump).
pub fn rewrite_first_party_import(
    binding: &ImportBinding,
    is_wrapper_target: bool,
    target: &ModuleId,
    rename: &RenamePlan,
    importer: &ModuleId,
    wildcard: Option<&WildcardSource>,
) -> Option<String> {
    let local = &binding.local_name;
    let identity = target.as_str();

    if binding.is_star {
        let Some(wildcard) = wildcard else {
            // No export information available (target never analyzed, e.g.
            // an empty package); nothing to bind.
            return Some(String::new());
        };
        let lines: Vec<String> = wildcard
            .names
            .iter()
            .filter_map(|name| {
                let lhs = rename.resolved_name(importer, name);
                let rhs = if is_wrapper_target {
                    format!("_cribo_import({identity:?}).{name}")
                } else {
                    rename.resolved_name(target, name).to_string()
                };
                (lhs != rhs).then(|| format!("{lhs} = {rhs}"))
            })
            .collect();
        return Some(lines.join("; "));
    }

    match (&binding.imported_name, is_wrapper_target) {
        (Some(name), true) => Some(format!("{local} = _cribo_import({identity:?}).{name}")),
        (Some(name), false) => {
            let emitted = rename.resolved_name(target, name);
            if emitted == local.as_str() {
                Some(String::new())
            } else {
                Some(format!("{local} = {emitted}"))
            }
        }
        (None, _) => Some(format!("{local} = _cribo_import({identity:?})")),
    }
}

/// Everything needed to assemble the final bundle text.
pub struct BundlePlan<'a> {
    pub entry: &'a ModuleId,
    pub entry_path: &'a str,
    /// Non-entry modules in dependency order, dependencies before
    /// dependents (the order a reader should see them defined in).
    pub order: &'a [ModuleId],
    pub units: &'a HashMap<ModuleId, ModuleUnit>,
    pub wrapper_modules: &'a HashSet<ModuleId>,
    /// §4.4: drop definitions unreachable from the entry module. Disabling
    /// this (`--no-tree-shake`) keeps every top-level def/class/assign alive
    /// regardless of use, which is occasionally needed when a module is
    /// reached only through dynamism the analyzer can't see (`getattr`,
    /// `exec`) and tree-shaking would otherwise remove something live.
    pub tree_shake: bool,
}

/// A wildcard target's resolved export names, keyed by the module that
/// imports it — one map per importing module, looked up by target identity.
type WildcardExports = HashMap<ModuleId, HashMap<ModuleId, WildcardSource>>;

/// Computes, for every module that writes `from T import *` against a
/// first-party `T`, the list of names that wildcard pulls in: `T`'s
/// surviving exported names, in the same order tree-shaking and wrapper
/// emission already compute them in (§4.6's "each exported name rewritten in
/// place" / "expanded into explicit `n = registry.get(\"T\").n`").
fn compute_wildcard_exports(
    plan: &BundlePlan<'_>,
    alive_by_module: &HashMap<ModuleId, HashSet<String>>,
) -> WildcardExports {
    let mut out: WildcardExports = HashMap::new();
    let all_modules = plan.order.iter().chain(std::iter::once(plan.entry));
    for importer in all_modules {
        let unit = &plan.units[importer];
        for import in &unit.semantics.imports {
            if !import.is_star || import.class != ImportClass::FirstParty {
                continue;
            }
            let target = &import.target_module;
            let Some(target_unit) = plan.units.get(target) else {
                continue;
            };
            let mut names: Vec<String> = if plan.wrapper_modules.contains(target) {
                target_unit
                    .semantics
                    .defs
                    .keys()
                    .filter(|name| target_unit.semantics.exports.is_exported(name))
                    .cloned()
                    .collect()
            } else {
                let alive = alive_by_module.get(target).cloned().unwrap_or_default();
                inline::exported_alive_names(&target_unit.semantics, &alive)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            };
            names.sort();
            out.entry(importer.clone())
                .or_default()
                .insert(target.clone(), WildcardSource { names });
        }
    }
    out
}

/// Builds the full bundle source text. Fails only on an internal invariant
/// violation (§7 "internal invariant": fatal) — a genuine bundle-wide rename
/// collision the planner couldn't resolve.
pub fn emit_bundle(plan: &BundlePlan<'_>) -> Result<String, EmitError> {
    let facts: HashMap<ModuleId, reachability::ModuleFacts> = plan
        .units
        .iter()
        .map(|(id, unit)| (id.clone(), semantic::to_facts(&unit.semantics)))
        .collect();

    let alive_by_module: HashMap<ModuleId, HashSet<String>> = if plan.tree_shake {
        let reachable = reachability::compute_reachable(plan.entry, &facts);
        plan.order
            .iter()
            .map(|id| {
                let alive = reachable
                    .iter()
                    .filter(|(module, _)| module == id)
                    .map(|(_, name)| name.clone())
                    .collect();
                (id.clone(), alive)
            })
            .collect()
    } else {
        plan.order
            .iter()
            .map(|id| {
                let alive = plan.units[id].semantics.defs.keys().cloned().collect();
                (id.clone(), alive)
            })
            .collect()
    };

    let wildcard_exports = compute_wildcard_exports(plan, &alive_by_module);

    // Wildcard-pulled names become new top-level bindings in an inlined
    // importer's own scope, so they share its collision domain exactly like
    // any other top-level symbol (§4.5's totality requirement) — a wrapper
    // module's wildcard pulls stay inside its own `exec()` namespace and
    // never touch bundle-global scope, so they're excluded here.
    let mut rename_symbols: HashSet<(ModuleId, String)> = plan
        .order
        .iter()
        .filter(|id| !plan.wrapper_modules.contains(*id))
        .flat_map(|id| {
            alive_by_module[id]
                .iter()
                .map(move |name| (id.clone(), name.clone()))
        })
        .collect();
    for id in plan.order.iter().filter(|id| !plan.wrapper_modules.contains(*id)) {
        if let Some(targets) = wildcard_exports.get(id) {
            for source in targets.values() {
                for name in &source.names {
                    rename_symbols.insert((id.clone(), name.clone()));
                }
            }
        }
    }
    let mut rename_symbols: Vec<(ModuleId, String)> = rename_symbols.into_iter().collect();
    rename_symbols.sort();
    let rename_plan = rename::plan_renames(&rename_symbols)?;

    let mut wrapper_sources = Vec::new();
    let mut registration_lines = Vec::new();
    let mut inline_bodies = Vec::new();
    let mut accessor_lines = Vec::new();

    for id in plan.order {
        let unit = &plan.units[id];
        let empty_wildcards = HashMap::new();
        let this_wildcards = wildcard_exports.get(id).unwrap_or(&empty_wildcards);
        if plan.wrapper_modules.contains(id) {
            let source = wrapper::emit_wrapper_module(
                &unit.parsed,
                &unit.semantics,
                plan.wrapper_modules,
                &rename_plan,
                this_wildcards,
            );
            registration_lines.push(registry::registration_line(
                id.as_str(),
                &wrapper::init_fn_name(id),
            ));
            wrapper_sources.push(source);
        } else {
            let alive = &alive_by_module[id];
            let body = inline::emit_inlined_module(
                &unit.parsed,
                &unit.semantics,
                alive,
                &rename_plan,
                plan.wrapper_modules,
                this_wildcards,
            );
            if !body.trim().is_empty() {
                inline_bodies.push(body);
            }
            accessor_lines.push(inline_accessor_line(id, &unit.semantics, alive, &rename_plan));
        }
    }

    let needs_registry = !plan.wrapper_modules.is_empty();

    let mut out = header::render(plan.entry_path);
    if needs_registry {
        out.push_str(registry::REGISTRY_PREAMBLE);
        out.push('\n');
    }
    for source in &wrapper_sources {
        out.push_str(source);
        out.push('\n');
    }
    for body in &inline_bodies {
        out.push_str(body);
        out.push('\n');
    }
    if needs_registry {
        for line in &registration_lines {
            out.push_str(line);
        }
        for line in &accessor_lines {
            out.push_str(line);
        }
        out.push('\n');
    }

    let entry_unit = &plan.units[plan.entry];
    let empty_wildcards = HashMap::new();
    let entry_wildcards = wildcard_exports.get(plan.entry).unwrap_or(&empty_wildcards);
    out.push_str(&emit_entry_module(
        entry_unit,
        plan.wrapper_modules,
        &rename_plan,
        entry_wildcards,
    ));
    Ok(out)
}

/// The entry module is always emitted directly, since it is executed rather
/// than imported: nothing in the bundle ever needs to reach it through the
/// registry, so it skips tree-shaking and rename planning, keeping only
/// first-party import rewriting (its imported submodules no longer exist as
/// importable files once bundled).
fn emit_entry_module(
    unit: &ModuleUnit,
    wrapper_modules: &HashSet<ModuleId>,
    rename: &RenamePlan,
    wildcards: &HashMap<ModuleId, WildcardSource>,
) -> String {
    let import_targets: HashMap<&str, &crate::semantic::alias::ResolvedImport> = unit
        .semantics
        .imports
        .iter()
        .map(|import| (import.local_name.as_str(), import))
        .collect();

    let mut pieces = Vec::new();
    for stmt in &unit.parsed.ast.body {
        let text = rewrite::rewrite_stmt(&unit.parsed, stmt, &HashMap::new(), None, |binding| {
            let resolved = if binding.is_star {
                unit.semantics
                    .imports
                    .iter()
                    .find(|i| i.is_star && i.range == binding.range.into())?
            } else {
                import_targets.get(binding.local_name.as_str())?
            };
            if resolved.class != crate::types::ImportClass::FirstParty {
                return None;
            }
            let is_wrapper = wrapper_modules.contains(&resolved.target_module);
            rewrite_first_party_import(
                binding,
                is_wrapper,
                &resolved.target_module,
                rename,
                &unit.semantics.module,
                wildcards.get(&resolved.target_module),
            )
        });
        if !text.trim().is_empty() {
            pieces.push(text);
        }
    }
    pieces.join("\n")
}

/// Registers a lazy `SimpleNamespace` view of an inlined module's surviving
/// exported names, so wrapper-module code can reach it uniformly through
/// `_cribo_import` exactly like a wrapped target.
fn inline_accessor_line(
    module: &ModuleId,
    semantics: &ModuleSemantics,
    alive: &HashSet<String>,
    rename: &RenamePlan,
) -> String {
    let attrs: Vec<String> = inline::exported_alive_names(semantics, alive)
        .into_iter()
        .map(|name| format!("{name}={}", rename.resolved_name(module, name)))
        .collect();
    format!(
        "_cribo_init_fns[{identity:?}] = lambda: _cribo_types.SimpleNamespace({args})\n",
        identity = module.as_str(),
        args = attrs.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use crate::semantic::analyze_module;
    use crate::types::ModuleKind;
    use std::path::Path;

    fn unit(source: &str, module: &ModuleId, kind: ModuleKind, is_entry: bool) -> ModuleUnit {
        let parsed = crate::parse::parse_source(Path::new("<test>"), source.to_string()).unwrap();
        let resolver = Resolver::new(vec![]);
        let semantics = analyze_module(module, kind, &parsed.ast.body, &resolver, is_entry);
        ModuleUnit { parsed, semantics }
    }

    #[test]
    fn bundles_an_inlined_helper_and_entry_module() {
        let helper_id = ModuleId::new("pkg.helper");
        let entry_id = ModuleId::new("pkg.app");

        let mut units = HashMap::new();
        units.insert(
            helper_id.clone(),
            unit("def greet():\n    return 'hi'\n", &helper_id, ModuleKind::Submodule, false),
        );
        units.insert(
            entry_id.clone(),
            unit(
                "from .helper import greet\nprint(greet())\n",
                &entry_id,
                ModuleKind::Submodule,
                true,
            ),
        );

        let plan = BundlePlan {
            entry: &entry_id,
            entry_path: "pkg/app.py",
            order: &[helper_id.clone()],
            units: &units,
            wrapper_modules: &HashSet::new(),
            tree_shake: true,
        };

        let bundle = emit_bundle(&plan).unwrap();
        assert!(bundle.contains("def greet"));
        assert!(bundle.contains("print("));
        assert!(bundle.starts_with("#!/usr/bin/env python3"));
    }

    #[test]
    fn rename_collision_propagates_as_an_error_instead_of_panicking() {
        let a_id = ModuleId::new("pkg.a");
        let b_id = ModuleId::new("pkg.b");
        let entry_id = ModuleId::new("pkg.app");

        let mut units = HashMap::new();
        units.insert(
            a_id.clone(),
            unit(
                "def helper():\n    return 1\n_pkg_b__helper = 2\n",
                &a_id,
                ModuleKind::Submodule,
                false,
            ),
        );
        units.insert(
            b_id.clone(),
            unit("def helper():\n    return 2\n", &b_id, ModuleKind::Submodule, false),
        );
        units.insert(
            entry_id.clone(),
            unit(
                "from .a import helper as ha\nfrom .b import helper as hb\nprint(ha(), hb())\n",
                &entry_id,
                ModuleKind::Submodule,
                true,
            ),
        );

        let plan = BundlePlan {
            entry: &entry_id,
            entry_path: "pkg/app.py",
            order: &[a_id.clone(), b_id.clone()],
            units: &units,
            wrapper_modules: &HashSet::new(),
            tree_shake: false,
        };

        let err = emit_bundle(&plan).unwrap_err();
        assert!(matches!(err, EmitError::RenameCollision { .. }));
    }
}
