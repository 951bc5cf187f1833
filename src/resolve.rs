//! Module resolver (§4.2): turns an import specifier, written from a given
//! first-party module, into a canonical [`ModuleId`] and, for first-party
//! targets, the file on disk that backs it.
//!
//! Grounded on the dot-counting relative-import algorithm and convention-based
//! path-to-module-name mapping used for first-party resolution in production
//! Python tooling: `from . import x` inside a submodule resolves relative to
//! its *enclosing* package, while inside an `__init__.py` it resolves
//! relative to the package itself, since `__package__` differs between the
//! two (§4.2 edge case).

use crate::error::ResolutionError;
use crate::types::{ModuleId, ModuleKind};
use std::path::{Path, PathBuf};

pub struct Resolver {
    source_roots: Vec<PathBuf>,
}

impl Resolver {
    pub fn new(source_roots: Vec<PathBuf>) -> Self {
        Self { source_roots }
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    /// Computes the absolute identity `from_module` would refer to for a
    /// relative import with `level` leading dots and the given (possibly
    /// empty, for `from . import x`) specifier.
    pub fn relative_identity(
        &self,
        from_module: &ModuleId,
        from_kind: ModuleKind,
        level: u32,
        specifier: &str,
    ) -> Result<ModuleId, ResolutionError> {
        let mut base: Vec<&str> = from_module.components().collect();
        if from_kind == ModuleKind::Submodule {
            base.pop();
        }
        for _ in 0..level.saturating_sub(1) {
            if base.pop().is_none() {
                return Err(ResolutionError::RelativeImportEscapesRoot {
                    specifier: specifier.to_string(),
                    from_module: from_module.clone(),
                });
            }
        }
        if !specifier.is_empty() {
            base.extend(specifier.split('.'));
        }
        if base.is_empty() {
            return Err(ResolutionError::RelativeImportEscapesRoot {
                specifier: specifier.to_string(),
                from_module: from_module.clone(),
            });
        }
        Ok(ModuleId::new(base.join(".")))
    }

    /// True if `top_level_name` matches a first-party module or package
    /// findable under any configured source root (§4.1 classification rule).
    pub fn has_first_party_top_level(&self, top_level_name: &str) -> bool {
        self.find_under_roots(&ModuleId::new(top_level_name)).is_some()
    }

    /// Locates the file backing `identity` on disk, searching source roots in
    /// configuration order. A package directory (`__init__.py`) wins over a
    /// same-named submodule file within the same root; a match in more than
    /// one root is ambiguous.
    pub fn resolve(&self, identity: &ModuleId) -> Result<(PathBuf, ModuleKind), ResolutionError> {
        let mut hits = Vec::new();
        for root in &self.source_roots {
            if let Some(found) = resolve_in_root(root, identity) {
                hits.push(found);
            }
        }
        match hits.len() {
            0 => Err(ResolutionError::Unresolvable {
                specifier: identity.as_str().to_string(),
                from_module: identity.clone(),
            }),
            1 => Ok(hits.into_iter().next().unwrap()),
            _ => Err(ResolutionError::Ambiguous {
                specifier: identity.as_str().to_string(),
                from_module: identity.clone(),
                roots: self.source_roots.clone(),
            }),
        }
    }

    fn find_under_roots(&self, identity: &ModuleId) -> Option<(PathBuf, ModuleKind)> {
        self.source_roots
            .iter()
            .find_map(|root| resolve_in_root(root, identity))
    }

    /// Locates a compiled-extension file (`.so`/`.pyd`, including
    /// cpython's ABI-tagged names like `name.cpython-311-x86_64-linux-gnu.so`)
    /// backing `identity`, for a submodule that lives inside an otherwise
    /// first-party package but has no corresponding `.py` source (§4.1 rule
    /// iii).
    pub fn resolve_native(&self, identity: &ModuleId) -> Option<PathBuf> {
        self.source_roots
            .iter()
            .find_map(|root| resolve_native_in_root(root, identity))
    }

    /// Maps a source file back to its dotted module identity, using the
    /// first source root that contains it. `None` for the root `__init__.py`
    /// of a source root (it has no dotted name of its own).
    pub fn identity_for_path(&self, path: &Path) -> Option<ModuleId> {
        for root in &self.source_roots {
            if let Ok(relative) = path.strip_prefix(root) {
                return identity_from_relative(relative);
            }
        }
        None
    }
}

fn resolve_in_root(root: &Path, identity: &ModuleId) -> Option<(PathBuf, ModuleKind)> {
    let parts: Vec<&str> = identity.components().collect();
    let mut package_path = root.to_path_buf();
    for part in &parts {
        package_path.push(part);
    }
    let init_py = package_path.join("__init__.py");
    if init_py.is_file() {
        return Some((init_py, ModuleKind::Package));
    }

    let mut submodule_path = root.to_path_buf();
    for part in &parts[..parts.len().saturating_sub(1)] {
        submodule_path.push(part);
    }
    if let Some(last) = parts.last() {
        submodule_path.push(format!("{last}.py"));
        if submodule_path.is_file() {
            return Some((submodule_path, ModuleKind::Submodule));
        }
    }
    None
}

fn resolve_native_in_root(root: &Path, identity: &ModuleId) -> Option<PathBuf> {
    let parts: Vec<&str> = identity.components().collect();
    let last = *parts.last()?;
    let mut dir = root.to_path_buf();
    for part in &parts[..parts.len() - 1] {
        dir.push(part);
    }
    let entries = std::fs::read_dir(&dir).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let is_native = file_name.ends_with(".so") || file_name.ends_with(".pyd");
            // Matches both a bare `name.so` and an ABI-tagged
            // `name.cpython-311-x86_64-linux-gnu.so`.
            is_native && (file_name == format!("{last}.so") || file_name == format!("{last}.pyd") || file_name.starts_with(&format!("{last}.")))
        })
}

fn identity_from_relative(relative: &Path) -> Option<ModuleId> {
    let without_ext = relative.with_extension("");
    let components: Vec<String> = without_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if components.is_empty() {
        return None;
    }
    if components.last().map(String::as_str) == Some("__init__") {
        let package = &components[..components.len() - 1];
        if package.is_empty() {
            return None;
        }
        return Some(ModuleId::new(package.join(".")));
    }
    Some(ModuleId::new(components.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn relative_import_from_submodule_targets_enclosing_package() {
        let resolver = Resolver::new(vec![]);
        let from = ModuleId::new("pkg.sub.mod");
        let id = resolver
            .relative_identity(&from, ModuleKind::Submodule, 1, "errors")
            .unwrap();
        assert_eq!(id.as_str(), "pkg.sub.errors");
    }

    #[test]
    fn relative_import_from_init_targets_own_package() {
        let resolver = Resolver::new(vec![]);
        let from = ModuleId::new("pkg.sub");
        let id = resolver
            .relative_identity(&from, ModuleKind::Package, 1, "errors")
            .unwrap();
        assert_eq!(id.as_str(), "pkg.sub.errors");
    }

    #[test]
    fn double_dot_climbs_an_extra_level() {
        let resolver = Resolver::new(vec![]);
        let from = ModuleId::new("pkg.sub.mod");
        let id = resolver
            .relative_identity(&from, ModuleKind::Submodule, 2, "util")
            .unwrap();
        assert_eq!(id.as_str(), "pkg.util");
    }

    #[test]
    fn escaping_the_root_is_an_error() {
        let resolver = Resolver::new(vec![]);
        let from = ModuleId::new("mod");
        let err = resolver
            .relative_identity(&from, ModuleKind::Submodule, 2, "x")
            .unwrap_err();
        assert!(matches!(err, ResolutionError::RelativeImportEscapesRoot { .. }));
    }

    #[test]
    fn resolves_submodule_and_package_from_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/__init__.py", "");
        write(dir.path(), "pkg/mod.py", "x = 1\n");
        let resolver = Resolver::new(vec![dir.path().to_path_buf()]);

        let (path, kind) = resolver.resolve(&ModuleId::new("pkg")).unwrap();
        assert_eq!(kind, ModuleKind::Package);
        assert!(path.ends_with("pkg/__init__.py"));

        let (path, kind) = resolver.resolve(&ModuleId::new("pkg.mod")).unwrap();
        assert_eq!(kind, ModuleKind::Submodule);
        assert!(path.ends_with("pkg/mod.py"));
    }

    #[test]
    fn package_wins_over_submodule_with_same_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/thing/__init__.py", "");
        write(dir.path(), "pkg/thing.py", "");
        let resolver = Resolver::new(vec![dir.path().to_path_buf()]);
        let (_, kind) = resolver.resolve(&ModuleId::new("pkg.thing")).unwrap();
        assert_eq!(kind, ModuleKind::Package);
    }

    #[test]
    fn ambiguous_across_two_roots_is_an_error() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "pkg.py", "");
        write(b.path(), "pkg.py", "");
        let resolver = Resolver::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let err = resolver.resolve(&ModuleId::new("pkg")).unwrap_err();
        assert!(matches!(err, ResolutionError::Ambiguous { .. }));
    }

    #[test]
    fn resolves_abi_tagged_native_extension() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/__init__.py", "");
        fs::write(
            dir.path().join("pkg/_fast.cpython-311-x86_64-linux-gnu.so"),
            [],
        )
        .unwrap();
        let resolver = Resolver::new(vec![dir.path().to_path_buf()]);

        let path = resolver.resolve_native(&ModuleId::new("pkg._fast")).unwrap();
        assert!(path.ends_with("pkg/_fast.cpython-311-x86_64-linux-gnu.so"));
    }

    #[test]
    fn identity_for_path_strips_init() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pkg/sub/__init__.py", "");
        let resolver = Resolver::new(vec![dir.path().to_path_buf()]);
        let id = resolver
            .identity_for_path(&dir.path().join("pkg/sub/__init__.py"))
            .unwrap();
        assert_eq!(id.as_str(), "pkg.sub");
    }
}
