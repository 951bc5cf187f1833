//! Import classifier (§4.1): sorts every import specifier into stdlib,
//! first-party, third-party, or native, and raises the one classification-time
//! diagnostic (stdlib/first-party name collisions, §10.1a).

use crate::ast_util::ImportBinding;
use crate::error::Diagnostic;
use crate::resolve::Resolver;
use crate::stdlib_data;
use crate::types::{ImportClass, ModuleId};

pub struct Classification {
    pub class: ImportClass,
    /// The identity to resolve against the dependency graph, for
    /// `ImportClass::FirstParty` bindings. Absolute specifiers resolve to
    /// themselves; relative ones are already absolutized by the caller.
    pub identity: ModuleId,
    pub diagnostic: Option<Diagnostic>,
}

/// Classifies a single import binding. `from_module` is the importing
/// module, used only to attribute diagnostics; relative-import resolution
/// into an absolute identity must already have happened (see
/// [`crate::resolve::Resolver::relative_identity`]) and is passed in as
/// `absolute_identity` when `binding.level > 0`.
pub fn classify(
    binding: &ImportBinding,
    absolute_identity: Option<&ModuleId>,
    resolver: &Resolver,
) -> Classification {
    if binding.level > 0 {
        let identity = absolute_identity
            .cloned()
            .unwrap_or_else(|| ModuleId::new(binding.module.as_str()));
        return Classification {
            class: ImportClass::FirstParty,
            identity,
            diagnostic: None,
        };
    }

    let identity = ModuleId::new(binding.module.as_str());
    let top_level = identity.top_level();
    let is_first_party = resolver.has_first_party_top_level(top_level);
    let is_stdlib = stdlib_data::is_stdlib(top_level);

    if is_first_party {
        // The top-level package is first-party, but this particular
        // submodule might not have a `.py` source of its own — a compiled
        // extension living inside an otherwise first-party package (§4.1
        // rule iii) classifies as native rather than failing resolution
        // later as though it were a missing first-party file.
        if resolver.resolve(&identity).is_err() && resolver.resolve_native(&identity).is_some() {
            return Classification {
                class: ImportClass::Native,
                identity,
                diagnostic: None,
            };
        }
        let diagnostic = is_stdlib.then(|| Diagnostic::StdlibShadowedByFirstParty {
            stdlib_module: top_level.to_string(),
        });
        return Classification {
            class: ImportClass::FirstParty,
            identity,
            diagnostic,
        };
    }

    if is_stdlib {
        return Classification {
            class: ImportClass::Stdlib,
            identity,
            diagnostic: None,
        };
    }

    Classification {
        class: ImportClass::ThirdParty,
        identity,
        diagnostic: None,
    }
}
