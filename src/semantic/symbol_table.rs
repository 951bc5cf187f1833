//! Top-level symbol table construction (§4.4): maps each name a module binds
//! at module scope to the set of names its definition references, the raw
//! material [`super::reachability`] walks.

use crate::ast_util::{
    collect_referenced_names, collect_referenced_names_in_expr, is_main_guard,
    is_pure_toplevel_stmt, simple_assign_targets,
};
use ruff_python_ast::Stmt;
use ruff_text_size::{Ranged, TextRange};
use std::collections::{HashMap, HashSet};

pub struct TopLevelDef {
    pub references: HashSet<String>,
    pub range: TextRange,
}

/// Every name bound directly at module scope: function/class definitions
/// and simple (`x = ...`) assignments. Subscript/attribute assignment
/// targets and control-flow-conditional bindings are not tracked as
/// independently removable symbols.
pub fn top_level_defs(stmts: &[Stmt]) -> HashMap<String, TopLevelDef> {
    let mut defs = HashMap::new();
    for stmt in stmts {
        match stmt {
            Stmt::FunctionDef(f) => {
                defs.insert(
                    f.name.as_str().to_string(),
                    TopLevelDef {
                        references: collect_referenced_names(&f.body),
                        range: f.range(),
                    },
                );
            }
            Stmt::ClassDef(c) => {
                defs.insert(
                    c.name.as_str().to_string(),
                    TopLevelDef {
                        references: collect_referenced_names(&c.body),
                        range: c.range(),
                    },
                );
            }
            Stmt::Assign(s) => {
                for name in simple_assign_targets(stmt) {
                    defs.insert(
                        name.to_string(),
                        TopLevelDef {
                            references: collect_referenced_names_in_expr(&s.value),
                            range: s.range(),
                        },
                    );
                }
            }
            _ => {}
        }
    }
    defs
}

/// Names referenced by code that executes unconditionally at import time:
/// every non-pure top-level statement other than the `__main__` guard, plus
/// (when `include_main_guard` is set, i.e. this is the entry module) the
/// guard's own body.
pub fn always_live_names(stmts: &[Stmt], include_main_guard: bool) -> HashSet<String> {
    let mut roots = Vec::new();
    for stmt in stmts {
        if is_main_guard(stmt) {
            if include_main_guard {
                if let Stmt::If(s) = stmt {
                    roots.extend(s.body.iter().cloned());
                }
            }
            continue;
        }
        if !is_pure_toplevel_stmt(stmt) {
            roots.push(stmt.clone());
        }
    }
    collect_referenced_names(&roots)
}
