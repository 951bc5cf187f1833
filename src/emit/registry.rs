//! Module registry scaffold (§4.6): the runtime support wrapper modules
//! need to reproduce Python's import-once, partial-initialization-on-cycle
//! semantics inside a single emitted file.
//!
//! Only emitted when at least one module needs wrapper treatment (is
//! side-effectful, participates in a cycle, or contains unsupported
//! top-level dynamism).

/// Preamble shared by every bundle that contains wrapper modules: a cache of
/// already-initialized (or initializing) module objects, and the
/// lookup/initialize entrypoint wrapper-module imports are rewritten to
/// call. An initializer registers its module object into `_cribo_modules`
/// *before* running the module's body (see [`super::wrapper`]), so a
/// re-entrant call made while that body is still executing — the only way a
/// genuine import cycle can reach `_cribo_import` again — finds the
/// partially-populated object already cached and returns it, exactly like
/// CPython's own `sys.modules` partial-init behavior (§9).
pub const REGISTRY_PREAMBLE: &str = r#"import types as _cribo_types

_cribo_modules = {}
_cribo_init_fns = {}


def _cribo_import(name):
    module = _cribo_modules.get(name)
    if module is None:
        module = _cribo_init_fns[name]()
    return module
"#;

/// One registration line per wrapper module, appended after all
/// `_cribo_init_*` functions have been emitted.
pub fn registration_line(identity: &str, init_fn_name: &str) -> String {
    format!("_cribo_init_fns[{identity:?}] = {init_fn_name}\n")
}
