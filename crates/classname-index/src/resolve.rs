//! Resolution of package-style (`~package/file.css`) import specifiers.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Resolves a package specifier into a stylesheet path.
pub trait ModuleResolver: Send + Sync {
    /// Resolves `specifier` as seen from a file in `from_dir`.
    fn resolve(&self, specifier: &str, from_dir: &Utf8Path) -> Result<Utf8PathBuf, ResolveError>;
}

/// Module resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No candidate file exists for the specifier.
    #[error("cannot resolve `{specifier}` from {from}")]
    NotFound {
        /// The specifier, without the package marker.
        specifier: String,
        /// The directory resolution started from.
        from: Utf8PathBuf,
    },
}

/// Resolves specifiers against `node_modules` directories.
///
/// Every ancestor of the importing directory is searched, so dependencies
/// hoisted to a monorepo root are found. Extra search roots are searched last.
#[derive(Debug, Clone, Default)]
pub struct NodeModulesResolver {
    search_paths: Vec<Utf8PathBuf>,
}

/// The fields of `package.json` that point at a stylesheet.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    style: Option<String>,
    main: Option<String>,
}

impl NodeModulesResolver {
    /// Creates a resolver that only walks ancestor `node_modules`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds directories searched after the ancestor walk.
    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
        self.search_paths.extend(paths);
        self
    }

    /// Checks one candidate location for the specifier.
    fn check_candidate(candidate: &Utf8Path) -> Option<Utf8PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        let with_extension = Utf8PathBuf::from(format!("{candidate}.css"));
        if with_extension.is_file() {
            return Some(with_extension);
        }

        if candidate.is_dir() {
            return Self::package_entry(candidate);
        }

        None
    }

    /// Looks for the stylesheet entry of a package directory.
    fn package_entry(package_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let manifest = fs::read_to_string(package_dir.join("package.json"))
            .ok()
            .and_then(|content| serde_json::from_str::<PackageManifest>(&content).ok())
            .unwrap_or_default();

        let entry = manifest
            .style
            .or_else(|| manifest.main.filter(|main| main.ends_with(".css")));

        if let Some(entry) = entry {
            let path = package_dir.join(entry);
            if path.is_file() {
                return Some(path);
            }
        }

        let index = package_dir.join("index.css");
        index.is_file().then_some(index)
    }
}

impl ModuleResolver for NodeModulesResolver {
    fn resolve(&self, specifier: &str, from_dir: &Utf8Path) -> Result<Utf8PathBuf, ResolveError> {
        let mut current = Some(from_dir);

        while let Some(dir) = current {
            if let Some(found) = Self::check_candidate(&dir.join("node_modules").join(specifier)) {
                return Ok(found);
            }
            current = dir.parent();
        }

        for root in &self.search_paths {
            if let Some(found) = Self::check_candidate(&root.join(specifier)) {
                return Ok(found);
            }
        }

        Err(ResolveError::NotFound {
            specifier: specifier.to_string(),
            from: from_dir.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_resolves_exact_file() {
        let (_dir, root) = temp_root();
        let target = root.join("node_modules/ui-kit/dist/ui.css");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, ".ui {}").unwrap();

        let resolved = NodeModulesResolver::new()
            .resolve("ui-kit/dist/ui.css", &root.join("src/styles"))
            .unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_resolves_without_extension() {
        let (_dir, root) = temp_root();
        let target = root.join("node_modules/ui-kit/base.css");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, ".base {}").unwrap();

        let resolved = NodeModulesResolver::new()
            .resolve("ui-kit/base", &root)
            .unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_resolves_package_style_field() {
        let (_dir, root) = temp_root();
        let package = root.join("node_modules/ui-kit");
        fs::create_dir_all(package.join("css")).unwrap();
        fs::write(package.join("package.json"), r#"{"style": "css/kit.css"}"#).unwrap();
        fs::write(package.join("css/kit.css"), ".kit {}").unwrap();

        let resolved = NodeModulesResolver::new().resolve("ui-kit", &root).unwrap();
        assert_eq!(resolved, package.join("css/kit.css"));
    }

    #[test]
    fn test_resolves_from_search_paths() {
        let (_dir, root) = temp_root();
        let vendor = root.join("vendor");
        fs::create_dir_all(&vendor).unwrap();
        fs::write(vendor.join("grid.css"), ".grid {}").unwrap();

        let resolver = NodeModulesResolver::new().with_search_paths([vendor.clone()]);
        let resolved = resolver.resolve("grid.css", &root.join("src")).unwrap();
        assert_eq!(resolved, vendor.join("grid.css"));
    }

    #[test]
    fn test_not_found() {
        let (_dir, root) = temp_root();
        let err = NodeModulesResolver::new()
            .resolve("missing-package/x.css", &root)
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound { ref specifier, .. } if specifier == "missing-package/x.css"
        ));
    }
}
