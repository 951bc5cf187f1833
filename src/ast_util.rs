//! Small helpers over `ruff_python_ast` shared by classification, semantic
//! analysis, and emission. Centralizing the pattern-matching here means a
//! change in how we decide "is this statement pure" only has one home.

use ruff_python_ast::visitor::{Visitor, walk_expr, walk_stmt};
use ruff_python_ast::{ExceptHandler, Expr, Parameters, Stmt};
use ruff_text_size::Ranged;
use std::collections::{HashMap, HashSet};

/// A single `import`/`from import` binding extracted from a statement,
/// independent of whether it came from `Stmt::Import` or `Stmt::ImportFrom`.
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// Dotted specifier as written (target module for `import`, or
    /// `<module>.<name>` conceptually for `from module import name`).
    pub module: String,
    /// Leading-dot count; 0 for absolute imports.
    pub level: u32,
    /// For `from module import name [as alias]`, the imported name; `None`
    /// for a plain `import module [as alias]`.
    pub imported_name: Option<String>,
    /// Local binding name introduced into the importing module's scope.
    pub local_name: String,
    /// True for `from module import *`.
    pub is_star: bool,
    pub range: ruff_text_size::TextRange,
}

/// Extracts every import binding a statement introduces, if it is an import
/// statement at all.
pub fn import_bindings(stmt: &Stmt) -> Vec<ImportBinding> {
    match stmt {
        Stmt::Import(s) => s
            .names
            .iter()
            .map(|alias| {
                let module = alias.name.as_str().to_string();
                let local_name = alias
                    .asname
                    .as_ref()
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|| {
                        module.split('.').next().unwrap_or(&module).to_string()
                    });
                ImportBinding {
                    module,
                    level: 0,
                    imported_name: None,
                    local_name,
                    is_star: false,
                    range: s.range(),
                }
            })
            .collect(),
        Stmt::ImportFrom(s) => {
            let module = s
                .module
                .as_ref()
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            s.names
                .iter()
                .map(|alias| {
                    let is_star = alias.name.as_str() == "*";
                    let local_name = alias
                        .asname
                        .as_ref()
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_else(|| alias.name.as_str().to_string());
                    ImportBinding {
                        module: module.clone(),
                        level: s.level,
                        imported_name: if is_star {
                            None
                        } else {
                            Some(alias.name.as_str().to_string())
                        },
                        local_name,
                        is_star,
                        range: s.range(),
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

/// True if `stmt` is itself incapable of producing a runtime side effect:
/// function/class definitions, plain imports, docstrings, and literal
/// assignments (§4.4 side-effect detection).
pub fn is_pure_toplevel_stmt(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::FunctionDef(_) | Stmt::ClassDef(_) | Stmt::Import(_) | Stmt::ImportFrom(_) => true,
        Stmt::Expr(s) => is_docstring_literal(&s.value),
        Stmt::Assign(s) => is_literal_expr(&s.value),
        Stmt::AnnAssign(s) => s.value.as_deref().is_none_or(is_literal_expr),
        Stmt::Pass(_) => true,
        _ => false,
    }
}

fn is_docstring_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::StringLiteral(_))
}

/// Literal/constant-ish right-hand sides: string/number/bool/none literals,
/// and list/tuple literals of such (covers `__all__ = [...]`, `__version__ = "..."`).
pub fn is_literal_expr(expr: &Expr) -> bool {
    match expr {
        Expr::StringLiteral(_)
        | Expr::BytesLiteral(_)
        | Expr::NumberLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::NoneLiteral(_)
        | Expr::EllipsisLiteral(_) => true,
        Expr::List(l) => l.elts.iter().all(is_literal_expr),
        Expr::Tuple(t) => t.elts.iter().all(is_literal_expr),
        Expr::Name(_) => false,
        _ => false,
    }
}

/// Top-level simple-name assignment targets (`x = ...`, not `x.y = ...` or
/// `x[0] = ...`), used for self-reference elimination and exports.
pub fn simple_assign_targets<'a>(stmt: &'a Stmt) -> Vec<&'a str> {
    match stmt {
        Stmt::Assign(s) => s
            .targets
            .iter()
            .filter_map(|t| match t {
                Expr::Name(n) => Some(n.id.as_str()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The name bound by a top-level `def`/`class`, together with the exact byte
/// range of just its identifier token (not the whole statement) — the unit
/// the rename planner patches (§4.5, §9 slice-and-patch). Assignment targets
/// are *not* covered here: [`scoped_rename_occurrences`] patches every
/// `Expr::Name` occurrence uniformly, assignment targets included, so
/// letting this function double as an assignment-target patch source would
/// produce two overlapping patches at the same byte range.
pub fn def_name_ranges(stmt: &Stmt) -> Vec<(&str, ruff_text_size::TextRange)> {
    match stmt {
        Stmt::FunctionDef(f) => vec![(f.name.as_str(), f.name.range())],
        Stmt::ClassDef(c) => vec![(c.name.as_str(), c.name.range())],
        _ => Vec::new(),
    }
}

/// If `expr` is a call whose callee is a plain name or dotted attribute
/// chain, return that dotted path (e.g. `importlib.import_module`).
pub fn call_target_path(expr: &Expr) -> Option<(String, &[Expr])> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let path = dotted_name(&call.func)?;
    Some((path, call.arguments.args.as_ref()))
}

/// Renders a `Name`/`Attribute` chain like `a.b.c` back into a dotted string.
pub fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(n) => Some(n.id.to_string()),
        Expr::Attribute(a) => {
            let base = dotted_name(&a.value)?;
            Some(format!("{base}.{}", a.attr.as_str()))
        }
        _ => None,
    }
}

/// If `expr` is a single string-literal argument, its value.
pub fn single_string_literal_arg(args: &[Expr]) -> Option<&str> {
    match args {
        [Expr::StringLiteral(s)] => Some(s.value.to_str()),
        _ => None,
    }
}

/// Every bare name mentioned anywhere within `stmts` (loads and stores
/// alike). Used as a conservative over-approximation of "names this code
/// might reference" for reachability analysis (§4.4): including a store
/// target that isn't really a free-variable reference only keeps something
/// alive that could have been dropped, never the reverse.
pub fn collect_referenced_names(stmts: &[Stmt]) -> HashSet<String> {
    struct NameCollector(HashSet<String>);
    impl Visitor<'_> for NameCollector {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Expr::Name(n) = expr {
                self.0.insert(n.id.to_string());
            }
            walk_expr(self, expr);
        }
        fn visit_stmt(&mut self, stmt: &Stmt) {
            walk_stmt(self, stmt);
        }
    }
    let mut collector = NameCollector(HashSet::new());
    for stmt in stmts {
        collector.visit_stmt(stmt);
    }
    collector.0
}

/// Like [`collect_referenced_names`], but over a single expression.
pub fn collect_referenced_names_in_expr(expr: &Expr) -> HashSet<String> {
    struct NameCollector(HashSet<String>);
    impl Visitor<'_> for NameCollector {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Expr::Name(n) = expr {
                self.0.insert(n.id.to_string());
            }
            walk_expr(self, expr);
        }
    }
    let mut collector = NameCollector(HashSet::new());
    collector.visit_expr(expr);
    collector.0
}

/// True if `stmt` is `if __name__ == "__main__": ...` — it never runs when
/// the module is imported rather than executed directly.
pub fn is_main_guard(stmt: &Stmt) -> bool {
    let Stmt::If(s) = stmt else { return false };
    let Expr::Compare(cmp) = s.test.as_ref() else {
        return false;
    };
    let is_name_main = matches!(cmp.left.as_ref(), Expr::Name(n) if n.id.as_str() == "__name__");
    let is_dunder_main = cmp
        .comparators
        .first()
        .is_some_and(|c| matches!(c, Expr::StringLiteral(s) if s.value.to_str() == "__main__"));
    is_name_main && is_dunder_main
}

/// True if `stmt` is a no-op self-assignment (`x = x`) that must be dropped
/// entirely (§4.4): a single `Name` target assigned from a `Name` of the
/// same identifier. Attribute self-assignments (`self.x = self.x`) are
/// retained since they have defined semantics on descriptors.
pub fn is_self_reference_assign(stmt: &Stmt) -> bool {
    let Stmt::Assign(s) = stmt else { return false };
    let [Expr::Name(target)] = s.targets.as_slice() else {
        return false;
    };
    matches!(s.value.as_ref(), Expr::Name(value) if value.id == target.id)
}

/// Every `x = x` self-assignment nested anywhere inside `stmt`'s children
/// (never matching `stmt` itself — a top-level occurrence is handled by the
/// caller directly, the same split [`nested_import_stmts`] uses).
pub fn nested_self_reference_assigns<'a>(stmt: &'a Stmt) -> Vec<&'a Stmt> {
    struct Collector<'a>(Vec<&'a Stmt>);
    impl<'a> Visitor<'a> for Collector<'a> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if is_self_reference_assign(stmt) {
                self.0.push(stmt);
            }
            walk_stmt(self, stmt);
        }
    }
    let mut collector = Collector(Vec::new());
    walk_stmt(&mut collector, stmt);
    collector.0
}

/// True if `stmt` rebinds the `locals`/`globals` builtin name at module
/// scope (§4.4 special builtins guard): a plain assignment, `def`, or
/// `class` naming one of them.
pub fn shadows_locals_or_globals(stmt: &Stmt) -> bool {
    const GUARDED: [&str; 2] = ["locals", "globals"];
    match stmt {
        Stmt::Assign(_) => simple_assign_targets(stmt).iter().any(|n| GUARDED.contains(n)),
        Stmt::FunctionDef(f) => GUARDED.contains(&f.name.as_str()),
        Stmt::ClassDef(c) => GUARDED.contains(&c.name.as_str()),
        _ => false,
    }
}

/// Every bare, zero-argument `locals()`/`globals()` call in `stmt` that
/// needs the module-namespace rewrite once this module is inlined (§4.4
/// special builtins guard). `locals()` only needs rewriting at module
/// scope: inside a function it already refers to that function's own real
/// frame regardless of inlining. `globals()` needs rewriting everywhere,
/// including inside nested functions — once inlined, a function's
/// `globals()` would otherwise resolve to the whole bundle's namespace
/// instead of just this module's.
pub fn module_scope_builtin_ns_calls(stmt: &Stmt) -> Vec<ruff_text_size::TextRange> {
    struct Collector {
        function_depth: u32,
        out: Vec<ruff_text_size::TextRange>,
    }
    impl Visitor<'_> for Collector {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Expr::Call(call) = expr {
                let is_bare = call.arguments.args.is_empty() && call.arguments.keywords.is_empty();
                let callee = match call.func.as_ref() {
                    Expr::Name(n) => Some(n.id.as_str()),
                    _ => None,
                };
                let matches = is_bare
                    && match callee {
                        Some("locals") => self.function_depth == 0,
                        Some("globals") => true,
                        _ => false,
                    };
                if matches {
                    self.out.push(call.range());
                }
            }
            walk_expr(self, expr);
        }
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let Stmt::FunctionDef(f) = stmt {
                self.function_depth += 1;
                for inner in &f.body {
                    self.visit_stmt(inner);
                }
                self.function_depth -= 1;
                return;
            }
            walk_stmt(self, stmt);
        }
    }
    let mut collector = Collector {
        function_depth: 0,
        out: Vec::new(),
    };
    collector.visit_stmt(stmt);
    collector.out
}

fn collect_target_names(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Name(n) => {
            names.insert(n.id.to_string());
        }
        Expr::Tuple(t) => {
            for elt in &t.elts {
                collect_target_names(elt, names);
            }
        }
        Expr::List(l) => {
            for elt in &l.elts {
                collect_target_names(elt, names);
            }
        }
        Expr::Starred(s) => collect_target_names(&s.value, names),
        _ => {}
    }
}

/// Every name a function's parameter list binds: positional-only, regular,
/// keyword-only, `*args`, and `**kwargs`.
fn parameters_bind(parameters: &Parameters, names: &mut HashSet<String>) {
    for p in parameters
        .posonlyargs
        .iter()
        .chain(parameters.args.iter())
        .chain(parameters.kwonlyargs.iter())
    {
        names.insert(p.parameter.name.as_str().to_string());
    }
    if let Some(vararg) = &parameters.vararg {
        names.insert(vararg.name.as_str().to_string());
    }
    if let Some(kwarg) = &parameters.kwarg {
        names.insert(kwarg.name.as_str().to_string());
    }
}

/// Visits a function's default-value and annotation expressions, which
/// evaluate in the *enclosing* scope rather than the function's own — a
/// parameter default referencing a name the function itself shadows still
/// means the enclosing binding.
fn visit_parameter_enclosing_exprs<'a, V: Visitor<'a>>(visitor: &mut V, parameters: &'a Parameters) {
    for p in parameters
        .posonlyargs
        .iter()
        .chain(parameters.args.iter())
        .chain(parameters.kwonlyargs.iter())
    {
        if let Some(default) = &p.default {
            visitor.visit_expr(default);
        }
        if let Some(annotation) = &p.parameter.annotation {
            visitor.visit_expr(annotation);
        }
    }
    if let Some(vararg) = &parameters.vararg {
        if let Some(annotation) = &vararg.annotation {
            visitor.visit_expr(annotation);
        }
    }
    if let Some(kwarg) = &parameters.kwarg {
        if let Some(annotation) = &kwarg.annotation {
            visitor.visit_expr(annotation);
        }
    }
}

/// Names bound directly within `stmts`: assignment/`for`/`with`/`except`
/// targets, imports, and nested `def`/`class` names, recursing into
/// `if`/`while`/`for`/`with`/`try` bodies (they share the enclosing scope in
/// Python) but stopping at a nested `def`/`class` boundary (only its own
/// name is recorded, not its inner bindings). Names declared `global`/
/// `nonlocal` are excluded — they resolve to an outer scope, not this one.
pub fn scope_direct_bindings(stmts: &[Stmt]) -> HashSet<String> {
    let mut names = HashSet::new();
    let mut escapes = HashSet::new();
    collect_scope_bindings(stmts, &mut names, &mut escapes);
    for name in &escapes {
        names.remove(name);
    }
    names
}

fn collect_scope_bindings(stmts: &[Stmt], names: &mut HashSet<String>, escapes: &mut HashSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Global(s) => {
                for name in &s.names {
                    escapes.insert(name.to_string());
                }
            }
            Stmt::Nonlocal(s) => {
                for name in &s.names {
                    escapes.insert(name.to_string());
                }
            }
            Stmt::FunctionDef(f) => {
                names.insert(f.name.to_string());
            }
            Stmt::ClassDef(c) => {
                names.insert(c.name.to_string());
            }
            Stmt::Assign(a) => {
                for target in &a.targets {
                    collect_target_names(target, names);
                }
            }
            Stmt::AugAssign(a) => collect_target_names(&a.target, names),
            Stmt::AnnAssign(a) => collect_target_names(&a.target, names),
            Stmt::Import(s) => {
                for alias in &s.names {
                    let local = alias
                        .asname
                        .as_ref()
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| {
                            alias.name.split('.').next().unwrap_or(&alias.name).to_string()
                        });
                    names.insert(local);
                }
            }
            Stmt::ImportFrom(s) => {
                for alias in &s.names {
                    if alias.name.as_str() == "*" {
                        continue;
                    }
                    let local = alias
                        .asname
                        .as_ref()
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| alias.name.to_string());
                    names.insert(local);
                }
            }
            Stmt::For(f) => {
                collect_target_names(&f.target, names);
                collect_scope_bindings(&f.body, names, escapes);
                collect_scope_bindings(&f.orelse, names, escapes);
            }
            Stmt::While(w) => {
                collect_scope_bindings(&w.body, names, escapes);
                collect_scope_bindings(&w.orelse, names, escapes);
            }
            Stmt::If(i) => {
                collect_scope_bindings(&i.body, names, escapes);
                for clause in &i.elif_else_clauses {
                    collect_scope_bindings(&clause.body, names, escapes);
                }
            }
            Stmt::With(w) => {
                for item in &w.items {
                    if let Some(vars) = &item.optional_vars {
                        collect_target_names(vars, names);
                    }
                }
                collect_scope_bindings(&w.body, names, escapes);
            }
            Stmt::Try(t) => {
                collect_scope_bindings(&t.body, names, escapes);
                for handler in &t.handlers {
                    let ExceptHandler::ExceptHandler(h) = handler;
                    if let Some(name) = &h.name {
                        names.insert(name.to_string());
                    }
                    collect_scope_bindings(&h.body, names, escapes);
                }
                collect_scope_bindings(&t.orelse, names, escapes);
                collect_scope_bindings(&t.finalbody, names, escapes);
            }
            _ => {}
        }
    }
}

/// Everything a function's body binds directly in its own scope: its
/// parameters plus [`scope_direct_bindings`] of its body.
fn function_scope_bindings(f: &ruff_python_ast::StmtFunctionDef) -> HashSet<String> {
    let mut names = HashSet::new();
    parameters_bind(&f.parameters, &mut names);
    names.extend(scope_direct_bindings(&f.body));
    names
}

struct RenameScanner<'a> {
    own_rename: &'a HashMap<String, String>,
    shadowed: Vec<HashSet<String>>,
    patches: Vec<(ruff_text_size::TextRange, String)>,
}

impl RenameScanner<'_> {
    fn is_shadowed(&self, name: &str) -> bool {
        self.shadowed.iter().any(|scope| scope.contains(name))
    }

    fn maybe_patch(&mut self, name: &str, range: ruff_text_size::TextRange) {
        if self.is_shadowed(name) {
            return;
        }
        if let Some(renamed) = self.own_rename.get(name) {
            if renamed != name {
                self.patches.push((range, renamed.clone()));
            }
        }
    }
}

impl Visitor<'_> for RenameScanner<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name(n) => self.maybe_patch(n.id.as_str(), n.range()),
            Expr::Lambda(lambda) => {
                if let Some(parameters) = &lambda.parameters {
                    visit_parameter_enclosing_exprs(self, parameters);
                }
                let mut scope = HashSet::new();
                if let Some(parameters) = &lambda.parameters {
                    parameters_bind(parameters, &mut scope);
                }
                self.shadowed.push(scope);
                self.visit_expr(&lambda.body);
                self.shadowed.pop();
                return;
            }
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(f) => {
                for decorator in &f.decorator_list {
                    self.visit_expr(&decorator.expression);
                }
                visit_parameter_enclosing_exprs(self, &f.parameters);
                if let Some(returns) = &f.returns {
                    self.visit_expr(returns);
                }
                self.shadowed.push(function_scope_bindings(f));
                for inner in &f.body {
                    self.visit_stmt(inner);
                }
                self.shadowed.pop();
                return;
            }
            Stmt::ClassDef(c) => {
                for decorator in &c.decorator_list {
                    self.visit_expr(&decorator.expression);
                }
                if let Some(arguments) = &c.arguments {
                    for arg in &arguments.args {
                        self.visit_expr(arg);
                    }
                    for kw in &arguments.keywords {
                        self.visit_expr(&kw.value);
                    }
                }
                self.shadowed.push(scope_direct_bindings(&c.body));
                for inner in &c.body {
                    self.visit_stmt(inner);
                }
                self.shadowed.pop();
                return;
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }
}

/// Every `Expr::Name` occurrence within `stmt` — load or store, including
/// assignment targets — that resolves to module scope (not shadowed by an
/// enclosing nested `def`/`class`/`lambda`) and is covered by `own_rename`.
/// This is the single source of in-module reference patches (§4.5
/// totality): a renamed top-level symbol must have every reference to it
/// patched, not just its own definition token.
pub fn scoped_rename_occurrences(
    stmt: &Stmt,
    own_rename: &HashMap<String, String>,
) -> Vec<(ruff_text_size::TextRange, String)> {
    let mut scanner = RenameScanner {
        own_rename,
        shadowed: Vec::new(),
        patches: Vec::new(),
    };
    scanner.visit_stmt(stmt);
    scanner.patches
}

/// Every `import`/`from import` statement anywhere within `stmts`, at any
/// nesting depth (module body, or inside `def`/`class`/`if`/`for`/`while`/
/// `with`/`try` blocks). The dependency graph walk needs these too: a
/// first-party import written inside a function body is still an edge the
/// graph must know about (§3 import edge "scope" field).
pub fn all_import_stmts<'a>(stmts: &'a [Stmt]) -> Vec<&'a Stmt> {
    struct Collector<'a>(Vec<&'a Stmt>);
    impl<'a> Visitor<'a> for Collector<'a> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if matches!(stmt, Stmt::Import(_) | Stmt::ImportFrom(_)) {
                self.0.push(stmt);
            }
            walk_stmt(self, stmt);
        }
    }
    let mut collector = Collector(Vec::new());
    for stmt in stmts {
        collector.visit_stmt(stmt);
    }
    collector.0
}

/// Like [`all_import_stmts`], but only descends into `stmt`'s own children —
/// never matching `stmt` itself. Used to find and patch function/class-
/// scoped imports nested inside an otherwise-untouched top-level statement
/// (§9 slice-and-patch).
pub fn nested_import_stmts<'a>(stmt: &'a Stmt) -> Vec<&'a Stmt> {
    struct Collector<'a>(Vec<&'a Stmt>);
    impl<'a> Visitor<'a> for Collector<'a> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            if matches!(stmt, Stmt::Import(_) | Stmt::ImportFrom(_)) {
                self.0.push(stmt);
            }
            walk_stmt(self, stmt);
        }
    }
    let mut collector = Collector(Vec::new());
    walk_stmt(&mut collector, stmt);
    collector.0
}

/// True if `stmts` contains an `if __name__ == "__main__":` guard at the top
/// level; its body always executes when the module is the entry point.
pub fn find_main_guard_body(stmts: &[Stmt]) -> Option<&[Stmt]> {
    stmts
        .iter()
        .find(|stmt| is_main_guard(stmt))
        .map(|stmt| match stmt {
            Stmt::If(s) => s.body.as_slice(),
            _ => unreachable!(),
        })
}
