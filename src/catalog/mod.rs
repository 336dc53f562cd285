//! Built-in demonstration packages.
//!
//! The catalog is a registration table: each entry knows its versions and
//! how to build fresh units for its modules. It implements [`PackageLoader`]
//! so the CLI and the tests can drive [`analyze_package`](crate::analyze_package)
//! without a real package manager.

mod async_sample;
mod hostile;
mod opaque;
mod sample;

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

use crate::package::{PackageLoader, PackageSpec, UnitLoad};

pub use opaque::OpaqueUnit;

/// One package known to the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// Installable versions; the first one is the default.
    pub versions: &'static [&'static str],
    #[serde(skip)]
    build: fn() -> Vec<UnitLoad>,
}

impl CatalogEntry {
    pub fn default_version(&self) -> &'static str {
        self.versions.first().copied().unwrap_or("0.0.0")
    }

    /// Import every module of the package.
    pub fn load(&self) -> Vec<UnitLoad> {
        (self.build)()
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                CatalogEntry {
                    name: "sample",
                    description: "Well-behaved functions, a counter type and lazy results",
                    versions: &["1.2.0", "1.1.0"],
                    build: sample::units,
                },
                CatalogEntry {
                    name: "hostile",
                    description: "Members that raise, exit, hang, panic and print",
                    versions: &["0.3.1"],
                    build: hostile::units,
                },
                CatalogEntry {
                    name: "async-sample",
                    description: "Deferred results and asynchronous streams",
                    versions: &["2.0.0"],
                    build: async_sample::units,
                },
                CatalogEntry {
                    name: "opaque",
                    description: "A module whose members cannot be listed",
                    versions: &["0.1.0"],
                    build: opaque::units,
                },
            ],
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn resolve(&self, name: &str) -> Result<&CatalogEntry> {
        self.get(name).ok_or_else(|| {
            let known: Vec<_> = self.entries.iter().map(|e| e.name).collect();
            anyhow!(
                "No matching distribution found for {} (available: {})",
                name,
                known.join(", ")
            )
        })
    }
}

impl PackageLoader for Catalog {
    fn install(&self, spec: &PackageSpec) -> Result<()> {
        let entry = self.resolve(&spec.name)?;
        if let Some(path) = &spec.local_path {
            if !path.exists() {
                bail!("local package path does not exist: {}", path.display());
            }
        }
        if let Some(version) = &spec.version {
            if !entry.versions.contains(&version.as_str()) {
                bail!(
                    "No matching distribution found for {}=={} (versions: {})",
                    spec.name,
                    version,
                    entry.versions.join(", ")
                );
            }
        }
        tracing::debug!(
            "installing {} {}",
            entry.name,
            spec.version.as_deref().unwrap_or(entry.default_version())
        );
        Ok(())
    }

    fn load(&self, spec: &PackageSpec) -> Result<Vec<UnitLoad>> {
        Ok(self.resolve(&spec.name)?.load())
    }

    /// A module file is matched to a catalog module by its file stem.
    fn load_module(&self, path: &Path) -> Result<UnitLoad> {
        if !path.is_file() {
            bail!("module file does not exist: {}", path.display());
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            bail!("not a module file name: {}", path.display());
        };
        let found = self
            .entries
            .iter()
            .flat_map(CatalogEntry::load)
            .find(|load| load.module() == name);
        Ok(found.unwrap_or_else(|| UnitLoad::failed(name, format!("No module named '{name}'"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let catalog = Catalog::builtin();
        let names: Vec<_> = catalog.entries().iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["sample", "hostile", "async-sample", "opaque"]);
        assert_eq!(catalog.get("sample").unwrap().default_version(), "1.2.0");
    }

    #[test]
    fn test_install_checks_version_and_path() {
        let catalog = Catalog::builtin();
        assert!(catalog.install(&PackageSpec::new("sample")).is_ok());
        assert!(catalog
            .install(&PackageSpec::new("sample").with_version("1.1.0"))
            .is_ok());

        let err = catalog
            .install(&PackageSpec::new("sample").with_version("9.9.9"))
            .unwrap_err();
        assert!(err.to_string().contains("sample==9.9.9"));

        assert!(catalog
            .install(&PackageSpec::new("sample").with_local_path("/definitely/not/here"))
            .is_err());
        assert!(catalog.install(&PackageSpec::new("left-pad")).is_err());
    }

    #[test]
    fn test_load_module_matches_file_stem() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::builtin();

        let path = dir.path().join("async_sample.src");
        std::fs::write(&path, "").unwrap();
        let load = catalog.load_module(&path).unwrap();
        assert!(matches!(load, UnitLoad::Loaded(_)));
        assert_eq!(load.module(), "async_sample");

        let path = dir.path().join("left_pad.src");
        std::fs::write(&path, "").unwrap();
        match catalog.load_module(&path).unwrap() {
            UnitLoad::Failed { module, message } => {
                assert_eq!(module, "left_pad");
                assert_eq!(message, "No module named 'left_pad'");
            }
            other => panic!("expected import failure, got {other:?}"),
        }

        assert!(catalog.load_module(&dir.path().join("sample.src")).is_err());
    }

    #[test]
    fn test_load_builds_fresh_units() {
        let catalog = Catalog::builtin();
        let first = catalog.load(&PackageSpec::new("hostile")).unwrap();
        let second = catalog.load(&PackageSpec::new("hostile")).unwrap();
        let modules: Vec<_> = first.iter().map(UnitLoad::module).collect();
        assert_eq!(modules, vec!["hostile", "hostile.native"]);
        assert_eq!(first.len(), second.len());
    }
}
