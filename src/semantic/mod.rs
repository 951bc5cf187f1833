//! Per-module semantic analysis (§4.4): side effects, exports, alias
//! resolution, and the symbol table feeding cross-module reachability.

pub mod alias;
pub mod exports;
pub mod reachability;
pub mod side_effects;
pub mod symbol_table;

use crate::error::Diagnostic;
use crate::resolve::Resolver;
use crate::types::{ModuleId, ModuleKind};
use alias::ResolvedImport;
use exports::ExportSet;
use ruff_python_ast::Stmt;
use symbol_table::TopLevelDef;

use std::collections::HashMap;

pub struct ModuleSemantics {
    pub module: ModuleId,
    pub kind: ModuleKind,
    pub imports: Vec<ResolvedImport>,
    pub exports: ExportSet,
    pub defs: HashMap<String, TopLevelDef>,
    pub always_live: std::collections::HashSet<String>,
    /// Side-effectful or forced into wrapper mode by unsupported top-level
    /// dynamism (§3 invariant (b)); either way, not eligible for inlining.
    pub needs_wrapper: bool,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn analyze_module(
    module: &ModuleId,
    kind: ModuleKind,
    stmts: &[Stmt],
    resolver: &Resolver,
    is_entry: bool,
) -> ModuleSemantics {
    let (imports, mut diagnostics) = alias::resolve_module_imports(module, kind, stmts, resolver);
    let (exports, export_diag) = exports::compute_exports(module, stmts);
    diagnostics.extend(export_diag);

    let dynamism = side_effects::scan(module, stmts);
    diagnostics.extend(dynamism.diagnostics);

    let defs = symbol_table::top_level_defs(stmts);
    let always_live = symbol_table::always_live_names(stmts, is_entry);

    ModuleSemantics {
        module: module.clone(),
        kind,
        imports,
        exports,
        defs,
        always_live,
        needs_wrapper: dynamism.side_effectful || dynamism.forces_wrapper,
        diagnostics,
    }
}

/// Builds the [`reachability::ModuleFacts`] view of a module's semantics,
/// used by the global mark-sweep.
pub fn to_facts(semantics: &ModuleSemantics) -> reachability::ModuleFacts {
    reachability::ModuleFacts {
        defs: semantics
            .defs
            .iter()
            .map(|(name, def)| (name.clone(), def.references.clone()))
            .collect(),
        always_live: semantics.always_live.clone(),
        imports: semantics
            .imports
            .iter()
            .map(|import| {
                (
                    import.local_name.clone(),
                    reachability::ImportTarget {
                        module: import.target_module.clone(),
                        imported_name: import.imported_name.clone(),
                        is_star: import.is_star,
                    },
                )
            })
            .collect(),
        exports: semantics.exports.clone(),
    }
}
