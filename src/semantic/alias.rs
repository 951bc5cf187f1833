//! Alias resolution (§4.4, §4.5): turns the raw import bindings a module's
//! source contains into fully classified, fully resolved imports, with
//! relative specifiers already absolutized against the importing module.

use crate::ast_util::{import_bindings, ImportBinding};
use crate::classify::{self, Classification};
use crate::error::Diagnostic;
use crate::resolve::Resolver;
use crate::types::{ByteRange, ImportClass, ModuleId, ModuleKind};
use ruff_python_ast::Stmt;

#[derive(Debug, Clone)]
pub struct ResolvedImport {
    /// Name this import binds in the importing module's namespace.
    pub local_name: String,
    pub class: ImportClass,
    /// Canonical identity of the module the binding ultimately refers to.
    pub target_module: ModuleId,
    /// `Some(name)` for `from target_module import name`; `None` for a plain
    /// `import target_module` (the whole module is the binding).
    pub imported_name: Option<String>,
    pub is_star: bool,
    pub range: ByteRange,
}

pub fn resolve_module_imports(
    module: &ModuleId,
    kind: ModuleKind,
    stmts: &[Stmt],
    resolver: &Resolver,
) -> (Vec<ResolvedImport>, Vec<Diagnostic>) {
    let mut resolved = Vec::new();
    let mut diagnostics = Vec::new();

    for stmt in stmts {
        for binding in import_bindings(stmt) {
            let absolute = if binding.level > 0 {
                match resolver.relative_identity(
                    module,
                    kind,
                    binding.level,
                    &binding.module,
                ) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        // Unresolvable relative imports are reported as a
                        // fatal ResolutionError by the graph-building stage,
                        // which has the full picture needed for a good
                        // message; here we just skip the binding.
                        continue;
                    }
                }
            } else {
                None
            };

            let Classification {
                class,
                identity,
                diagnostic,
            } = classify::classify(&binding, absolute.as_ref(), resolver);

            if let Some(d) = diagnostic {
                diagnostics.push(d);
            }

            resolved.push(to_resolved(&binding, class, identity));
        }
    }

    (resolved, diagnostics)
}

fn to_resolved(binding: &ImportBinding, class: ImportClass, target: ModuleId) -> ResolvedImport {
    ResolvedImport {
        local_name: binding.local_name.clone(),
        class,
        target_module: target,
        imported_name: binding.imported_name.clone(),
        is_star: binding.is_star,
        range: binding.range.into(),
    }
}
