//! Export-set computation (§4.4): what `from module import *` pulls in, and
//! what counts as "public" when tree-shaking decides what an importer can
//! reach by name.

use crate::ast_util::is_literal_expr;
use crate::error::Diagnostic;
use crate::types::ModuleId;
use ruff_python_ast::{Expr, Stmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSet {
    /// An explicit `__all__ = [...]` with string-literal elements.
    Explicit(Vec<String>),
    /// No usable `__all__`; every top-level name not starting with `_` is
    /// public, per the Python wildcard-import convention.
    Convention,
}

impl ExportSet {
    pub fn is_exported(&self, name: &str) -> bool {
        match self {
            Self::Explicit(names) => names.iter().any(|n| n == name),
            Self::Convention => !name.starts_with('_'),
        }
    }
}

/// Scans a module's top-level statements for `__all__`.
pub fn compute_exports(module: &ModuleId, stmts: &[Stmt]) -> (ExportSet, Option<Diagnostic>) {
    for stmt in stmts {
        let value = match stmt {
            Stmt::Assign(s) if is_dunder_all_target(&s.targets) => Some(s.value.as_ref()),
            Stmt::AnnAssign(s) if is_dunder_all_name(&s.target) => s.value.as_deref(),
            _ => None,
        };
        let Some(value) = value else { continue };

        return match string_list_literal(value) {
            Some(names) => (ExportSet::Explicit(names), None),
            None => (
                ExportSet::Convention,
                Some(Diagnostic::NonLiteralAll {
                    module: module.clone(),
                }),
            ),
        };
    }
    (ExportSet::Convention, None)
}

fn is_dunder_all_target(targets: &[Expr]) -> bool {
    targets.iter().any(is_dunder_all_name)
}

fn is_dunder_all_name(expr: &Expr) -> bool {
    matches!(expr, Expr::Name(n) if n.id.as_str() == "__all__")
}

fn string_list_literal(expr: &Expr) -> Option<Vec<String>> {
    let elements: &[Expr] = match expr {
        Expr::List(l) => &l.elts,
        Expr::Tuple(t) => &t.elts,
        _ => return None,
    };
    if !elements.iter().all(is_literal_expr) {
        return None;
    }
    elements
        .iter()
        .map(|e| match e {
            Expr::StringLiteral(s) => Some(s.value.to_str().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;
    use std::path::Path;

    fn stmts(src: &str) -> Vec<Stmt> {
        parse_source(Path::new("<test>"), src.to_string())
            .unwrap()
            .ast
            .body
            .clone()
    }

    #[test]
    fn explicit_all_is_read() {
        let m = ModuleId::new("pkg.mod");
        let (exports, diag) =
            compute_exports(&m, &stmts("__all__ = [\"a\", \"b\"]\n"));
        assert_eq!(exports, ExportSet::Explicit(vec!["a".into(), "b".into()]));
        assert!(diag.is_none());
    }

    #[test]
    fn non_literal_all_falls_back_with_diagnostic() {
        let m = ModuleId::new("pkg.mod");
        let (exports, diag) = compute_exports(&m, &stmts("__all__ = compute_names()\n"));
        assert_eq!(exports, ExportSet::Convention);
        assert!(matches!(diag, Some(Diagnostic::NonLiteralAll { .. })));
    }

    #[test]
    fn convention_hides_underscore_names() {
        assert!(ExportSet::Convention.is_exported("public"));
        assert!(!ExportSet::Convention.is_exported("_private"));
    }
}
