//! Package Prober
//!
//! Behavioral triage for untrusted packages: install a package, import its
//! modules and exercise every invocable member with synthetic arguments,
//! logging what each call did.
//!
//! - [`package`]: install/import/execute phases over a [`PackageLoader`]
//! - [`catalog`]: built-in demonstration packages
//!
//! The exploration engine itself lives in `prober-core`; the data model in
//! `prober-types`. Both are re-exported here.

pub mod catalog;
pub mod package;

pub use catalog::{Catalog, CatalogEntry, OpaqueUnit};
pub use package::{
    analyze_package, import_single_module, EnumerationFailure, ImportFailure, PackageLoader,
    PackageReport, PackageSpec, Phase, Step, UnitLoad,
};

pub use prober_core as engine;
pub use prober_types as types;
