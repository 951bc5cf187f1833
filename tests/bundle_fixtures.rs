//! Fixture-driven integration tests (SPEC_FULL.md §10.6): each scenario
//! writes a small multi-module program to a temp directory, bundles it, and
//! asserts on the emitted source text. No Python interpreter is available in
//! this environment, so assertions are string/structural rather than
//! behavioral.

use cribo::pipeline::{self, BundleRequest};
use cribo::CriboError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn bundle(dir: &Path, entry_relative: &str) -> cribo::BundleOutcome {
    let entry = dir.join(entry_relative);
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.to_path_buf()],
        strict: false,
        tree_shake: true,
    };
    pipeline::run(&request).expect("bundling should succeed")
}

/// `simple_treeshaking_inlining`: an unused helper function must not survive
/// into the bundle, while the one actually called does.
#[test]
fn simple_treeshaking_inlining() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/helper.py",
        "def used():\n    return 1\n\n\ndef unused():\n    return 2\n",
    );
    write(dir.path(), "pkg/app.py", "from .helper import used\nprint(used())\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("def used"));
    assert!(!outcome.source.contains("def unused"));
}

/// `relative_import_inlined_module`: a relative from-import of an inlined
/// sibling module becomes a direct name binding, and the original import
/// statement disappears.
#[test]
fn relative_import_inlined_module() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/errors.py",
        "class ConfigError(Exception):\n    pass\n",
    );
    write(
        dir.path(),
        "pkg/app.py",
        "from .errors import ConfigError\n\ndef load():\n    raise ConfigError(\"bad\")\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("class ConfigError"));
    assert!(!outcome.source.contains("from .errors import"));
    assert!(outcome.source.contains("raise ConfigError"));
}

/// `wrapper_stdlib_imports`: a module with a top-level side effect (a bare
/// call) is emitted behind the `_cribo_init_*` registry instead of inlined,
/// and its own stdlib imports pass through untouched inside the wrapper body.
#[test]
fn wrapper_stdlib_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/logging_setup.py",
        "import logging\n\nlogging.basicConfig()\n\n\ndef get_logger():\n    return logging.getLogger(__name__)\n",
    );
    write(
        dir.path(),
        "pkg/app.py",
        "from .logging_setup import get_logger\nprint(get_logger())\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("_cribo_init_pkg_logging_setup"));
    assert!(outcome.source.contains("import logging"));
    assert!(outcome.source.contains("logging.basicConfig()"));
    assert!(outcome.source.contains("_cribo_init_fns["));
}

/// `pyfail_function_scoped_wrapper_init`: an import buried inside a function
/// body, of a name defined in a module that needs wrapper treatment, must
/// still be rewritten to go through the registry.
#[test]
fn pyfail_function_scoped_wrapper_init() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/submodule.py",
        "print(\"side effect\")\n\n\ndef some_function():\n    return 42\n",
    );
    write(
        dir.path(),
        "pkg/app.py",
        "def run():\n    from .submodule import some_function\n    return some_function()\n\nrun()\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("_cribo_import(\"pkg.submodule\").some_function"));
    assert!(!outcome.source.contains("from .submodule import"));
}

/// `stdlib_hoisting_aliases`: an aliased stdlib import must survive
/// verbatim, alias and all.
#[test]
fn stdlib_hoisting_aliases() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/app.py",
        "import os.path as p\nprint(p.join(\"a\", \"b\"))\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("import os.path as p"));
}

/// `stdlib_module_name_collision`: a first-party module sharing a stdlib
/// module's name still wins per §4.1 — the bundle resolves the import to
/// the first-party definition, not the stdlib module.
#[test]
fn stdlib_module_name_collision() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/json.py",
        "def dumps(value):\n    return str(value)\n",
    );
    write(
        dir.path(),
        "pkg/app.py",
        "from .json import dumps\nprint(dumps(1))\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("def dumps"));
}

/// `xfail_importlib_deduplication`: repeated dynamic `importlib.import_module`
/// calls with non-literal arguments are each left exactly as written and
/// each produce their own diagnostic rather than being deduplicated.
#[test]
fn xfail_importlib_deduplication() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/app.py",
        "import importlib\n\nname = \"pkg.json\"\nimportlib.import_module(name)\nimportlib.import_module(name)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: true,
    };
    let diagnostics = pipeline::check(&request).unwrap();
    let dynamic_count = diagnostics
        .iter()
        .filter(|d| matches!(d, cribo::Diagnostic::DynamicImportNotBundled { .. }))
        .count();
    assert_eq!(dynamic_count, 2);
}

/// `wildcard_metaclass_ordering`: a module wildcard-imports helpers and
/// defines a metaclass plus a class using it; the metaclass must still
/// appear before the class that names it in the emitted bundle.
#[test]
fn wildcard_metaclass_ordering() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/helpers.py", "def make_helper():\n    return 1\n");
    write(
        dir.path(),
        "pkg/yaml_module.py",
        "from .helpers import *\n\n\nclass YAMLMeta(type):\n    pass\n\n\nclass YAMLObject(metaclass=YAMLMeta):\n    pass\n",
    );
    write(
        dir.path(),
        "pkg/app.py",
        "from .yaml_module import YAMLObject\nprint(YAMLObject)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: false,
    };
    let outcome = pipeline::run(&request).expect("bundling should succeed");

    let meta_pos = outcome.source.find("class YAMLMeta").expect("metaclass present");
    let user_pos = outcome.source.find("class YAMLObject").expect("class present");
    assert!(meta_pos < user_pos, "metaclass must be defined before its user");
}

/// `locals_globals_shadowing`: a module assigns `locals = some_custom_function`
/// after calling `locals()`. Because calling `locals()` at module scope is
/// itself a side effect, such a module is always wrapped rather than
/// inlined, and a wrapper module's `exec(..., module.__dict__)` already
/// gives `locals()`/`globals()` the right namespace natively — so the
/// wrapper body is left untouched, pre- and post-shadow alike.
#[test]
fn locals_globals_shadowing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/mod_a.py",
        "def some_custom_function():\n    return \"result\"\n\n\nprint(locals())\nlocals = some_custom_function\nprint(locals())\n",
    );
    write(dir.path(), "pkg/app.py", "from . import mod_a\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("_cribo_init_pkg_mod_a"));
    assert!(outcome.source.contains("print(locals())"));
    assert!(outcome.source.contains("locals = some_custom_function"));
}

/// `collections_abc_modules`: `from collections import abc` and
/// `from collections.abc import Mapping` are both stdlib, not first-party,
/// and must pass through verbatim (§4.1 submodule-vs-symbol disambiguation).
#[test]
fn collections_abc_modules() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/app.py",
        "from collections import abc\nfrom collections.abc import Mapping\nprint(abc.OrderedDict, Mapping)\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("from collections import abc"));
    assert!(outcome.source.contains("from collections.abc import Mapping"));
}

/// `collections_mixed_imports`: a single `from` statement mixing a
/// submodule name and a plain symbol name from the same stdlib package must
/// survive as one untouched statement.
#[test]
fn collections_mixed_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/app.py",
        "from collections import abc, OrderedDict\nprint(abc, OrderedDict)\n",
    );

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("from collections import abc, OrderedDict"));
}

/// `no_ops_multimodule_self_refs`: self-reference elimination (§4.4) applies
/// independently in each module, at both module scope and nested inside a
/// function body, spread across more than one file.
#[test]
fn no_ops_multimodule_self_refs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/mod_a.py",
        "x = 1\nx = x\n\n\ndef f():\n    y = 2\n    y = y\n    return y\n",
    );
    write(dir.path(), "pkg/mod_b.py", "z = 3\nz = z\n");
    write(
        dir.path(),
        "pkg/app.py",
        "from . import mod_a, mod_b\nprint(mod_a.f(), mod_b.z)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: false,
    };
    let outcome = pipeline::run(&request).expect("bundling should succeed");
    assert!(!outcome.source.contains("x = x"));
    assert!(!outcome.source.contains("z = z"));
    assert!(!outcome.source.contains("y = y"));
    assert!(outcome.source.contains("def f"));
}

/// `multiline_strings`: a triple-quoted module docstring and a multi-line
/// string literal assigned to a constant must not be mistaken for a side
/// effect — the module stays inlined rather than wrapped.
#[test]
fn multiline_strings() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/helper.py",
        "\"\"\"\nHelper module docstring.\n\"\"\"\n\nGREETING = \"\"\"\nHello\nWorld\n\"\"\"\n\n\ndef greet():\n    return GREETING\n",
    );
    write(dir.path(), "pkg/app.py", "from .helper import greet\nprint(greet())\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("Hello"));
    assert!(outcome.source.contains("World"));
    assert!(!outcome.source.contains("_cribo_init_pkg_helper"));
}

/// `stdlib_decorator`: a decorator imported from stdlib (`functools.wraps`)
/// applied to a first-party function must resolve through the stdlib header
/// import rather than being mistaken for a first-party symbol.
#[test]
fn stdlib_decorator() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/helper.py",
        "import functools\n\n\ndef logged(fn):\n    @functools.wraps(fn)\n    def wrapper(*args, **kwargs):\n        return fn(*args, **kwargs)\n    return wrapper\n\n\n@logged\ndef greet():\n    return \"hi\"\n",
    );
    write(dir.path(), "pkg/app.py", "from .helper import greet\nprint(greet())\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("import functools"));
    assert!(outcome.source.contains("@functools.wraps(fn)"));
    assert!(outcome.source.contains("@logged"));
    assert!(outcome.source.contains("def greet"));
}

/// `importlib_static_renaming`: `importlib.import_module` called with a
/// literal argument assigned through an intermediate constant still counts
/// as non-literal per §10.1 — only a direct string literal argument is
/// "static"; this stays dynamic and produces a diagnostic.
#[test]
fn importlib_static_renaming() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/helper.py", "VALUE = 1\n");
    write(
        dir.path(),
        "pkg/app.py",
        "import importlib\n\nMODULE_NAME = \"pkg.helper\"\nimportlib.import_module(MODULE_NAME)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: true,
    };
    let diagnostics = pipeline::check(&request).unwrap();
    let dynamic_count = diagnostics
        .iter()
        .filter(|d| matches!(d, cribo::Diagnostic::DynamicImportNotBundled { .. }))
        .count();
    assert_eq!(dynamic_count, 1);
}

/// `xfail_cross_package_mixed_import`: a single plain `import` statement
/// naming two distinct first-party packages (`import pkg_a.sub, pkg_b.other`)
/// is a known limitation — [`cribo::emit::rewrite_first_party_import`]
/// always rewrites a bare dotted import through `_cribo_import`, even when
/// every target ends up inlined and no wrapper registry is emitted at all,
/// leaving a reference to a helper that was never defined. Carried over as
/// a regression test documenting the gap rather than silently dropped.
#[test]
fn xfail_cross_package_mixed_import() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg_a/__init__.py", "");
    write(dir.path(), "pkg_a/sub.py", "VALUE_A = 1\n");
    write(dir.path(), "pkg_b/__init__.py", "");
    write(dir.path(), "pkg_b/other.py", "VALUE_B = 2\n");
    write(
        dir.path(),
        "app.py",
        "import pkg_a.sub, pkg_b.other\nprint(pkg_a.sub.VALUE_A, pkg_b.other.VALUE_B)\n",
    );

    let outcome = bundle(dir.path(), "app.py");
    assert!(outcome.source.contains("_cribo_import(\"pkg_a.sub\")"));
    assert!(outcome.source.contains("_cribo_import(\"pkg_b.other\")"));
    // The known gap: no wrapper module exists, so the registry preamble
    // (and `_cribo_import` itself) is never emitted.
    assert!(!outcome.source.contains("_cribo_modules = {}"));
}

/// `xfail_no_ops_multimodule_self_refs`: self-reference elimination only
/// recognizes a plain `Stmt::Assign` (`x = x`); an annotated self-reference
/// (`x: int = x`) is a known limitation and survives verbatim, in every
/// module that writes one.
#[test]
fn xfail_no_ops_multimodule_self_refs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/mod_a.py", "x: int = 1\nx: int = x\n");
    write(dir.path(), "pkg/mod_b.py", "y: int = 2\ny: int = y\n");
    write(
        dir.path(),
        "pkg/app.py",
        "from . import mod_a, mod_b\nprint(mod_a.x, mod_b.y)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: false,
    };
    let outcome = pipeline::run(&request).expect("bundling should succeed");
    assert!(outcome.source.contains("x: int = x"));
    assert!(outcome.source.contains("y: int = y"));
}

/// `--strict` promotes any accumulated diagnostic to a fatal error.
#[test]
fn strict_mode_promotes_warnings_to_errors() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/app.py",
        "import importlib\n\nname = \"pkg\"\nimportlib.import_module(name)\n",
    );

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: true,
        tree_shake: true,
    };
    let err = pipeline::run(&request).unwrap_err();
    assert!(matches!(err, CriboError::StrictModePromoted { .. }));
}

/// Two modules importing each other at top level form an ordinary cycle
/// (not a self-import) and are both wrapped; each wrapper registers its
/// module object into `_cribo_modules` before running its body, so a
/// re-entrant `_cribo_import` call made from inside one body while the
/// other is still initializing finds a partial namespace instead of
/// raising (§9, §4.6 step 3, §8 "Cycle safety").
#[test]
fn cyclic_modules_register_before_exec() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/a.py",
        "from .b import B\n\n\nclass A:\n    pass\n",
    );
    write(
        dir.path(),
        "pkg/b.py",
        "from .a import A\n\n\nclass B:\n    pass\n",
    );
    write(dir.path(), "pkg/app.py", "from .a import A\nprint(A)\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    for identity in ["pkg.a", "pkg.b"] {
        let register = format!("_cribo_modules[{identity:?}] = module");
        let register_pos = outcome
            .source
            .find(&register)
            .unwrap_or_else(|| panic!("{identity} should register before exec"));
        let exec_pos = outcome.source[register_pos..]
            .find("exec(")
            .unwrap_or_else(|| panic!("{identity} should exec its body"));
        assert!(exec_pos > 0);
    }
}

/// A top-level self-import can never terminate and is a fatal configuration
/// error distinct from an ordinary cycle (§4.3); the same import written
/// inside a function body is permitted, since it only runs on a later call.
#[test]
fn top_level_self_import_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(dir.path(), "pkg/mod.py", "import pkg.mod\n");
    write(dir.path(), "pkg/app.py", "import pkg.mod\n");

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: true,
    };
    let err = pipeline::run(&request).unwrap_err();
    assert!(matches!(err, CriboError::Config(_)));
}

#[test]
fn function_scoped_self_import_is_permitted() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/mod.py",
        "def lazy_reload():\n    import pkg.mod\n    return pkg.mod\n",
    );
    write(dir.path(), "pkg/app.py", "from . import mod\nprint(mod.lazy_reload)\n");

    let outcome = bundle(dir.path(), "pkg/app.py");
    assert!(outcome.source.contains("def lazy_reload"));
}

/// A wildcard import from a side-effectful module with no `__all__` can
/// silently miss or include names depending on execution order; this is
/// flagged rather than silently accepted (§7).
#[test]
fn wildcard_from_side_effectful_module_is_flagged() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/__init__.py", "");
    write(
        dir.path(),
        "pkg/dynamic.py",
        "print(\"loading\")\n\nVALUE = 1\n",
    );
    write(dir.path(), "pkg/app.py", "from .dynamic import *\nprint(VALUE)\n");

    let entry = dir.path().join("pkg/app.py");
    let request = BundleRequest {
        entry: &entry,
        source_roots: vec![dir.path().to_path_buf()],
        strict: false,
        tree_shake: true,
    };
    let diagnostics = pipeline::check(&request).unwrap();
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d, cribo::Diagnostic::WildcardFromSideEffectfulModule { .. })));
}
