//! Pipeline orchestrator (§2, §5): the sequential run from an entry file to
//! bundle text, stage by stage. Only stage 3 (parsing) runs in parallel,
//! across a frontier of newly-discovered modules; the batch is always
//! joined before the next round of import-driven discovery begins, so the
//! dependency graph walk in stage 4 sees a consistent, complete picture.

use crate::ast_util::nested_import_stmts;
use crate::classify;
use crate::diagnostics::DiagnosticSink;
use crate::emit::{self, BundlePlan, ModuleUnit};
use crate::error::{ConfigError, CriboError, CriboResult, Diagnostic, ParseError, ResolutionError};
use crate::graph::DependencyGraph;
use crate::parse::{self, ParsedModule};
use crate::resolve::Resolver;
use crate::semantic;
use crate::types::{ImportClass, ModuleId, ModuleKind};
use rayon::prelude::*;
use ruff_python_ast::Stmt;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub struct BundleRequest<'a> {
    pub entry: &'a Path,
    pub source_roots: Vec<PathBuf>,
    pub strict: bool,
    pub tree_shake: bool,
}

pub struct BundleOutcome {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// §6 requirements-file contract: every distinct third-party top-level
    /// package referenced, sorted; empty when nothing third-party was found.
    pub third_party_packages: Vec<String>,
}

/// The product of stages 1-5: a fully classified, parsed, and analyzed
/// module graph, before rename planning or emission. Shared by [`run`] and
/// [`check`] so the cheaper `check` path never pays for emission.
struct AnalyzedProgram {
    entry_id: ModuleId,
    order: Vec<ModuleId>,
    units: HashMap<ModuleId, ModuleUnit>,
    wrapper_modules: HashSet<ModuleId>,
    diagnostics: DiagnosticSink,
}

fn analyze(request: &BundleRequest<'_>) -> CriboResult<AnalyzedProgram> {
    let source_roots = if request.source_roots.is_empty() {
        vec![request
            .entry
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))]
    } else {
        request.source_roots.clone()
    };
    let resolver = Resolver::new(source_roots);

    let entry_id = resolver.identity_for_path(request.entry).unwrap_or_else(|| {
        ModuleId::new(
            request
                .entry
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "entry".to_string()),
        )
    });

    tracing::info!(entry = %entry_id, "stage 1-2: classify & resolve entry");

    let (graph, parsed, kinds) = discover_modules(&entry_id, request.entry, &resolver)?;

    tracing::info!(modules = parsed.len(), "stage 3-4: parsed and graphed first-party modules");

    let cyclic: HashSet<ModuleId> = graph.cyclic_modules().into_iter().collect();

    let mut diagnostics = DiagnosticSink::default();
    let mut units: HashMap<ModuleId, ModuleUnit> = HashMap::new();
    let mut wrapper_modules: HashSet<ModuleId> = HashSet::new();

    for (id, module) in parsed {
        let kind = kinds[&id];
        let is_entry = id == entry_id;
        let semantics = semantic::analyze_module(&id, kind, &module.ast.body, &resolver, is_entry);
        diagnostics.extend(semantics.diagnostics.clone());
        if semantics.needs_wrapper || cyclic.contains(&id) {
            wrapper_modules.insert(id.clone());
        }
        units.insert(id, ModuleUnit { parsed: module, semantics });
    }
    // The entry module is always appended directly (§4.6): nothing in the
    // bundle ever imports it, so it never needs registry indirection
    // regardless of its own side-effect profile.
    wrapper_modules.remove(&entry_id);

    tracing::info!(
        wrapped = wrapper_modules.len(),
        total = units.len(),
        "stage 5: side-effect & cycle analysis complete"
    );

    // A `from T import *` against a module with no `__all__` that also
    // needs wrapper treatment pulls in whatever names happen to be
    // default-visible at the moment its body finishes running — a set this
    // analyzer can't pin down any more precisely than "every non-underscore
    // top-level name" (§7).
    let wildcard_targets: HashSet<ModuleId> = units
        .values()
        .flat_map(|unit| unit.semantics.imports.iter())
        .filter(|import| import.is_star && import.class == ImportClass::FirstParty)
        .map(|import| import.target_module.clone())
        .collect();
    for target in wildcard_targets {
        let Some(target_unit) = units.get(&target) else {
            continue;
        };
        let is_convention_exports = matches!(
            target_unit.semantics.exports,
            semantic::exports::ExportSet::Convention
        );
        if target_unit.semantics.needs_wrapper && is_convention_exports {
            diagnostics.push(Diagnostic::WildcardFromSideEffectfulModule { module: target });
        }
    }

    if request.strict && !diagnostics.is_empty() {
        return Err(CriboError::StrictModePromoted {
            count: diagnostics.len(),
        });
    }

    let mut order: Vec<ModuleId> = Vec::new();
    for scc in graph.condensation_order() {
        for id in scc {
            if id != entry_id {
                order.push(id);
            }
        }
    }

    Ok(AnalyzedProgram {
        entry_id,
        order,
        units,
        wrapper_modules,
        diagnostics,
    })
}

pub fn run(request: &BundleRequest<'_>) -> CriboResult<BundleOutcome> {
    let program = analyze(request)?;

    let entry_path_display = request.entry.display().to_string();
    let plan = BundlePlan {
        entry: &program.entry_id,
        entry_path: &entry_path_display,
        order: &program.order,
        units: &program.units,
        wrapper_modules: &program.wrapper_modules,
        tree_shake: request.tree_shake,
    };
    let bundle_source = emit::emit_bundle(&plan)?;
    let third_party_packages = collect_third_party_packages(&program.units);

    tracing::info!(bytes = bundle_source.len(), "stage 6-7: rename planned and bundle emitted");

    Ok(BundleOutcome {
        source: bundle_source,
        diagnostics: program.diagnostics.into_vec(),
        third_party_packages,
    })
}

/// Stages 3 and 4 interleaved: breadth-first discovery of the first-party
/// module graph, parsing each newly-found frontier in parallel and joining
/// before its imports are resolved and queued (§5).
fn discover_modules(
    entry_id: &ModuleId,
    entry_path: &Path,
    resolver: &Resolver,
) -> CriboResult<(DependencyGraph, HashMap<ModuleId, ParsedModule>, HashMap<ModuleId, ModuleKind>)> {
    let mut graph = DependencyGraph::default();
    let mut parsed: HashMap<ModuleId, ParsedModule> = HashMap::new();
    let mut kinds: HashMap<ModuleId, ModuleKind> = HashMap::new();
    let mut paths: HashMap<ModuleId, PathBuf> = HashMap::new();

    let entry_kind = if entry_path.file_name().and_then(|n| n.to_str()) == Some("__init__.py") {
        ModuleKind::Package
    } else {
        ModuleKind::Submodule
    };
    paths.insert(entry_id.clone(), entry_path.to_path_buf());
    kinds.insert(entry_id.clone(), entry_kind);
    graph.add_module(entry_id.clone());

    let mut frontier = vec![entry_id.clone()];
    while !frontier.is_empty() {
        let batch: Vec<(ModuleId, PathBuf)> = frontier
            .drain(..)
            .filter(|id| !parsed.contains_key(id))
            .map(|id| {
                let path = paths[&id].clone();
                (id, path)
            })
            .collect();

        let batch_results: Vec<(ModuleId, Result<ParsedModule, ParseError>)> = batch
            .par_iter()
            .map(|(id, path)| (id.clone(), parse::parse_file(path)))
            .collect();

        for (id, result) in batch_results {
            let module = result.map_err(CriboError::Parse)?;
            let kind = kinds[&id];

            // A top-level self-import (`import pkg.mod` written inside
            // `pkg/mod.py` itself) can never terminate, since resolving it
            // would require the module to already be fully initialized
            // (§4.3) — distinct from an ordinary import cycle between two
            // modules, which wrapper-mode handles fine. The same import
            // written inside a function body is permitted: it only runs on
            // a later call, by which point the module has finished loading.
            for top_stmt in &module.ast.body {
                let is_top_level = matches!(top_stmt, Stmt::Import(_) | Stmt::ImportFrom(_));
                let mut occurrences: Vec<(&Stmt, bool)> = Vec::new();
                if is_top_level {
                    occurrences.push((top_stmt, true));
                }
                occurrences.extend(nested_import_stmts(top_stmt).into_iter().map(|s| (s, false)));

                for (stmt, is_top_level) in occurrences {
                    for binding in crate::ast_util::import_bindings(stmt) {
                        let absolute = if binding.level > 0 {
                            Some(
                                resolver
                                    .relative_identity(&id, kind, binding.level, &binding.module)
                                    .map_err(CriboError::Resolution)?,
                            )
                        } else {
                            None
                        };

                        let classification = classify::classify(&binding, absolute.as_ref(), resolver);
                        if classification.class != ImportClass::FirstParty {
                            continue;
                        }
                        let target = classification.identity;

                        if is_top_level && target == id {
                            return Err(CriboError::Config(ConfigError::SelfImport { module: id }));
                        }

                        graph.add_module(target.clone());
                        if is_top_level {
                            graph.add_dependency(id.clone(), target.clone());
                        }

                        if !paths.contains_key(&target) {
                            let (target_path, target_kind) =
                                resolver.resolve(&target).map_err(CriboError::Resolution)?;
                            paths.insert(target.clone(), target_path);
                            kinds.insert(target.clone(), target_kind);
                            frontier.push(target);
                        }
                    }
                }
            }

            parsed.insert(id, module);
        }
    }

    Ok((graph, parsed, kinds))
}

fn collect_third_party_packages(units: &HashMap<ModuleId, ModuleUnit>) -> Vec<String> {
    let mut packages: HashSet<String> = HashSet::new();
    for unit in units.values() {
        for import in &unit.semantics.imports {
            if matches!(import.class, ImportClass::ThirdParty | ImportClass::Native) {
                packages.insert(import.target_module.top_level().to_string());
            }
        }
    }
    let mut sorted: Vec<String> = packages.into_iter().collect();
    sorted.sort();
    sorted
}

/// Runs only the classify-through-semantic-analysis stages (§10.2 `check`),
/// reporting diagnostics without emitting a bundle.
pub fn check(request: &BundleRequest<'_>) -> CriboResult<Vec<Diagnostic>> {
    let program = analyze(request)?;
    Ok(program.diagnostics.into_vec())
}
