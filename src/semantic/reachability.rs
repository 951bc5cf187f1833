//! Cross-module reachability (§4.4 tree-shaking).
//!
//! A mark-and-sweep over top-level definitions: start from the names each
//! module's unconditionally-executing code references, then follow every
//! reference transitively, crossing module boundaries through resolved
//! imports. A name that is never reached is dropped from the bundle. This is
//! deliberately conservative — it over-approximates "might be referenced"
//! (e.g. by treating every bare name mention as a use, not just true free
//! variables) so it never drops something that is actually needed.

use super::exports::ExportSet;
use crate::types::ModuleId;
use std::collections::{HashMap, HashSet, VecDeque};

/// A marker meaning "the whole module's exported surface", used when a local
/// name binds an entire module object (`import pkg.mod`) rather than one
/// symbol pulled out of it — attribute access on it can reach anything the
/// module exports.
pub const WHOLE_MODULE: &str = "*";

pub struct ImportTarget {
    pub module: ModuleId,
    /// `None` for `import module` (binds the whole module); `Some(name)` for
    /// `from module import name`.
    pub imported_name: Option<String>,
    pub is_star: bool,
}

pub struct ModuleFacts {
    /// Top-level function/class/assignment names mapped to the set of bare
    /// names their bodies reference.
    pub defs: HashMap<String, HashSet<String>>,
    /// Names referenced by code that always runs at import time (side effect
    /// statements), plus, for the entry module, its `__main__` guard body.
    pub always_live: HashSet<String>,
    /// Local import bindings, keyed by the name they introduce.
    pub imports: HashMap<String, ImportTarget>,
    pub exports: ExportSet,
}

/// Computes the set of `(module, name)` pairs reachable from `entry`'s
/// always-live roots. `name` is `WHOLE_MODULE` when the whole module's
/// surface, not one symbol, was reached.
pub fn compute_reachable(
    entry: &ModuleId,
    modules: &HashMap<ModuleId, ModuleFacts>,
) -> HashSet<(ModuleId, String)> {
    let mut alive = HashSet::new();
    let mut queue = VecDeque::new();

    for (module, facts) in modules {
        for name in &facts.always_live {
            queue.push_back((module.clone(), name.clone()));
        }
    }

    while let Some((module, name)) = queue.pop_front() {
        if !alive.insert((module.clone(), name.clone())) {
            continue;
        }
        let Some(facts) = modules.get(&module) else {
            continue;
        };

        if name == WHOLE_MODULE {
            for def_name in facts.defs.keys() {
                queue.push_back((module.clone(), def_name.clone()));
            }
            continue;
        }

        if let Some(refs) = facts.defs.get(&name) {
            for referenced in refs {
                if facts.imports.contains_key(referenced) || facts.defs.contains_key(referenced) {
                    queue.push_back((module.clone(), referenced.clone()));
                }
            }
        }

        if let Some(target) = facts.imports.get(&name) {
            match &target.imported_name {
                Some(imported) => queue.push_back((target.module.clone(), imported.clone())),
                None => queue.push_back((target.module.clone(), WHOLE_MODULE.to_string())),
            }
        }

        // A reference that resolves to nothing local and nothing imported
        // might still be satisfied by a `from mod import *`; in that case
        // we can't know which export it is, so conservatively keep all of
        // the wildcard source's exports.
        if !facts.defs.contains_key(&name) && !facts.imports.contains_key(&name) {
            for target in facts.imports.values().filter(|t| t.is_star) {
                if let Some(source) = modules.get(&target.module) {
                    if source.exports.is_exported(&name) {
                        queue.push_back((target.module.clone(), name.clone()));
                    }
                }
            }
        }
    }

    alive
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(defs: &[(&str, &[&str])], always_live: &[&str]) -> ModuleFacts {
        ModuleFacts {
            defs: defs
                .iter()
                .map(|(name, refs)| {
                    (
                        name.to_string(),
                        refs.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
            always_live: always_live.iter().map(|s| s.to_string()).collect(),
            imports: HashMap::new(),
            exports: ExportSet::Convention,
        }
    }

    #[test]
    fn keeps_only_transitively_referenced_defs() {
        let entry = ModuleId::new("main");
        let mut modules = HashMap::new();
        modules.insert(
            entry.clone(),
            facts(
                &[
                    ("main_fn", &["used"]),
                    ("used", &[]),
                    ("unused", &[]),
                ],
                &["main_fn"],
            ),
        );

        let alive = compute_reachable(&entry, &modules);
        assert!(alive.contains(&(entry.clone(), "used".to_string())));
        assert!(!alive.contains(&(entry, "unused".to_string())));
    }

    #[test]
    fn follows_imports_across_modules() {
        let main = ModuleId::new("main");
        let lib = ModuleId::new("lib");
        let mut modules = HashMap::new();

        let mut main_facts = facts(&[], &["helper"]);
        main_facts.imports.insert(
            "helper".to_string(),
            ImportTarget {
                module: lib.clone(),
                imported_name: Some("helper".to_string()),
                is_star: false,
            },
        );
        modules.insert(main.clone(), main_facts);
        modules.insert(lib.clone(), facts(&[("helper", &[]), ("unused", &[])], &[]));

        let alive = compute_reachable(&main, &modules);
        assert!(alive.contains(&(lib.clone(), "helper".to_string())));
        assert!(!alive.contains(&(lib, "unused".to_string())));
    }
}
