//! Side-effect and top-level dynamism detection (§4.4).
//!
//! A module is side-effectful if it runs code at import time beyond
//! defining functions/classes and binding literal constants. Side-effectful
//! modules, and any module participating in an import cycle, are emitted
//! behind the wrapper registry instead of being inlined (§3 invariant (b)).

use crate::ast_util::{call_target_path, is_main_guard, is_pure_toplevel_stmt, single_string_literal_arg};
use crate::error::Diagnostic;
use crate::types::ModuleId;
use ruff_python_ast::{Expr, Stmt};

pub struct DynamismScan {
    pub side_effectful: bool,
    /// Forces wrapper mode and disables tree-shaking for the module even if
    /// it would otherwise look side-effect-free (exec/eval at top level).
    pub forces_wrapper: bool,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn scan(module: &ModuleId, stmts: &[Stmt]) -> DynamismScan {
    let mut side_effectful = false;
    let mut forces_wrapper = false;
    let mut diagnostics = Vec::new();

    for stmt in stmts {
        if is_main_guard(stmt) {
            // Never runs on import; irrelevant to bundling side effects.
            continue;
        }
        if !is_pure_toplevel_stmt(stmt) {
            side_effectful = true;
        }
        scan_stmt_for_dynamism(module, stmt, &mut forces_wrapper, &mut diagnostics);
    }

    DynamismScan {
        side_effectful,
        forces_wrapper,
        diagnostics,
    }
}

fn scan_stmt_for_dynamism(
    module: &ModuleId,
    stmt: &Stmt,
    forces_wrapper: &mut bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match stmt {
        Stmt::Expr(s) => scan_expr_for_dynamism(module, &s.value, forces_wrapper, diagnostics),
        Stmt::Assign(s) => {
            if targets_sys_modules(&s.targets) {
                diagnostics.push(Diagnostic::SysModulesMonkeyPatch {
                    module: module.clone(),
                });
            }
            scan_expr_for_dynamism(module, &s.value, forces_wrapper, diagnostics)
        }
        _ => {}
    }
}

fn scan_expr_for_dynamism(
    module: &ModuleId,
    expr: &Expr,
    forces_wrapper: &mut bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some((path, args)) = call_target_path(expr) else {
        return;
    };
    match path.as_str() {
        "exec" | "eval" => {
            *forces_wrapper = true;
            diagnostics.push(Diagnostic::UnsupportedTopLevelDynamism {
                module: module.clone(),
            });
        }
        "importlib.import_module" => {
            if single_string_literal_arg(args).is_none() {
                diagnostics.push(Diagnostic::DynamicImportNotBundled {
                    module: module.clone(),
                    offset: 0,
                });
            }
        }
        _ => {}
    }
}

fn targets_sys_modules(targets: &[Expr]) -> bool {
    targets.iter().any(|t| match t {
        Expr::Subscript(sub) => crate::ast_util::dotted_name(&sub.value).as_deref() == Some("sys.modules"),
        _ => false,
    })
}
