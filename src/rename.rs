//! Rename planner (§4.5).
//!
//! Inlined modules' top-level symbols are hoisted straight into the
//! bundle's global scope, so any name bound by more than one inlined module
//! needs a collision-free rewrite. A name unique across the whole bundle
//! keeps its original spelling — most symbols do, and unnecessary renaming
//! only hurts readability of the emitted file.

use crate::error::EmitError;
use crate::types::ModuleId;
use std::collections::HashMap;

#[derive(Default)]
pub struct RenamePlan {
    map: HashMap<(ModuleId, String), String>,
}

impl RenamePlan {
    /// The identifier `(module, name)` should be emitted under. Falls back
    /// to the original name for anything not covered by the plan (e.g.
    /// symbols belonging to wrapper modules, which are never hoisted).
    pub fn resolved_name<'a>(&'a self, module: &ModuleId, name: &'a str) -> &'a str {
        self.map
            .get(&(module.clone(), name.to_string()))
            .map(String::as_str)
            .unwrap_or(name)
    }
}

/// Builds a rename plan for the given `(module, name)` symbols, all of which
/// belong to inlined (non-wrapper) modules and are about to share one global
/// scope.
pub fn plan_renames(symbols: &[(ModuleId, String)]) -> Result<RenamePlan, EmitError> {
    let mut occurrences: HashMap<&str, Vec<&ModuleId>> = HashMap::new();
    for (module, name) in symbols {
        occurrences.entry(name.as_str()).or_default().push(module);
    }

    let mut map = HashMap::new();
    let mut reserved: HashMap<String, (ModuleId, String)> = HashMap::new();

    for (module, name) in symbols {
        let emitted = if occurrences[name.as_str()].len() == 1 {
            name.clone()
        } else {
            format!("_{}__{}", sanitize(module), name)
        };

        if let Some((prior_module, prior_name)) = reserved.get(&emitted) {
            if prior_module != module || prior_name != name {
                return Err(EmitError::RenameCollision {
                    name: emitted,
                    first: prior_module.clone(),
                    second: module.clone(),
                });
            }
        }
        reserved.insert(emitted.clone(), (module.clone(), name.clone()));
        map.insert((module.clone(), name.clone()), emitted);
    }

    Ok(RenamePlan { map })
}

fn sanitize(module: &ModuleId) -> String {
    module.as_str().replace('.', "_")
}
