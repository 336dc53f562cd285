//! Package-level orchestration.
//!
//! A package goes through up to three phases: install it, import its
//! modules, and execute (explore) every module that imported. Installing and
//! resolving files into units is the job of a [`PackageLoader`]; this module
//! only sequences the phases and collects what happened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use prober_core::{ExecutionLogSink, ExploreConfig, Explorer, SessionSummary};
use prober_types::MemberSource;

/// A package to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            local_path: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// What the installer is asked for: the local path, else `name==version`,
    /// else the bare name.
    pub fn install_arg(&self) -> String {
        if let Some(path) = &self.local_path {
            path.display().to_string()
        } else if let Some(version) = &self.version {
            format!("{}=={}", self.name, version)
        } else {
            self.name.clone()
        }
    }
}

/// Analysis phase requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Install, import and execute.
    #[default]
    All,
    Install,
    Import,
    /// Import and execute an already installed package.
    Execute,
}

/// One step of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Install,
    Import,
    Execute,
}

impl Phase {
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Phase::All => &[Step::Install, Step::Import, Step::Execute],
            Phase::Install => &[Step::Install],
            Phase::Import => &[Step::Import],
            Phase::Execute => &[Step::Import, Step::Execute],
        }
    }

    fn includes(&self, step: Step) -> bool {
        self.steps().contains(&step)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::All => write!(f, "all"),
            Phase::Install => write!(f, "install"),
            Phase::Import => write!(f, "import"),
            Phase::Execute => write!(f, "execute"),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Phase::All),
            "install" => Ok(Phase::Install),
            "import" => Ok(Phase::Import),
            "execute" => Ok(Phase::Execute),
            other => Err(format!("Unknown phase {other} specified.")),
        }
    }
}

/// Result of importing one module of a package.
pub enum UnitLoad {
    Loaded(Box<dyn MemberSource + Send>),
    Failed { module: String, message: String },
}

impl UnitLoad {
    pub fn loaded(source: impl MemberSource + Send + 'static) -> Self {
        UnitLoad::Loaded(Box::new(source))
    }

    pub fn failed(module: impl Into<String>, message: impl Into<String>) -> Self {
        UnitLoad::Failed {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn module(&self) -> &str {
        match self {
            UnitLoad::Loaded(source) => source.unit_name(),
            UnitLoad::Failed { module, .. } => module,
        }
    }
}

impl fmt::Debug for UnitLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitLoad::Loaded(source) => write!(f, "Loaded({})", source.unit_name()),
            UnitLoad::Failed { module, message } => write!(f, "Failed({module}: {message})"),
        }
    }
}

/// Installs packages and resolves them into loadable units.
pub trait PackageLoader {
    fn install(&self, spec: &PackageSpec) -> Result<()>;

    /// Import every module of an installed package, in a stable order.
    fn load(&self, spec: &PackageSpec) -> Result<Vec<UnitLoad>>;

    /// Import one module file that belongs to no installed package.
    fn load_module(&self, path: &Path) -> Result<UnitLoad> {
        bail!("single module import is not supported: {}", path.display())
    }
}

/// A module that failed to import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFailure {
    pub module: String,
    pub message: String,
}

/// A module whose members could not be enumerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumerationFailure {
    pub module: String,
    pub message: String,
}

/// What happened to one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageReport {
    pub package: String,
    pub install_arg: String,
    pub phase: Phase,
    pub installed: bool,
    pub imported: Vec<String>,
    pub import_failures: Vec<ImportFailure>,
    pub sessions: Vec<SessionSummary>,
    pub enumeration_failures: Vec<EnumerationFailure>,
}

impl PackageReport {
    pub fn invocations(&self) -> u64 {
        self.sessions.iter().map(|s| s.invocations).sum()
    }
}

/// Run `phase` for `spec`, exploring every imported module into `sink`.
///
/// Install and load errors are returned. Modules that fail to import or to
/// enumerate are recorded in the report and do not stop the others.
pub fn analyze_package(
    loader: &dyn PackageLoader,
    spec: &PackageSpec,
    phase: Phase,
    config: ExploreConfig,
    sink: &mut ExecutionLogSink,
) -> Result<PackageReport> {
    let mut report = PackageReport {
        package: spec.name.clone(),
        install_arg: spec.install_arg(),
        phase,
        installed: false,
        imported: Vec::new(),
        import_failures: Vec::new(),
        sessions: Vec::new(),
        enumeration_failures: Vec::new(),
    };

    if phase.includes(Step::Install) {
        loader
            .install(spec)
            .with_context(|| format!("Failed to install {}", spec.install_arg()))?;
        tracing::info!("Install succeeded: {}", spec.install_arg());
        report.installed = true;
    }

    if !phase.includes(Step::Import) {
        return Ok(report);
    }

    let loads = loader
        .load(spec)
        .with_context(|| format!("Failed to load package {}", spec.name))?;

    let mut units = Vec::new();
    for load in loads {
        match load {
            UnitLoad::Loaded(source) => {
                tracing::info!("Imported {}", source.unit_name());
                report.imported.push(source.unit_name().to_string());
                units.push(source);
            }
            UnitLoad::Failed { module, message } => {
                tracing::warn!("Failed to import {}: {}", module, message);
                report.import_failures.push(ImportFailure { module, message });
            }
        }
    }

    if !phase.includes(Step::Execute) {
        return Ok(report);
    }

    let explorer = Explorer::new(config);
    for unit in &units {
        sink.trace(format!("[module] {}", unit.unit_name()));
        match explorer.explore(unit.as_ref(), sink) {
            Ok(summary) => report.sessions.push(summary),
            Err(e) => report.enumeration_failures.push(EnumerationFailure {
                module: e.unit,
                message: e.message,
            }),
        }
    }

    Ok(report)
}

/// Import the module at `path` on its own, without installing or executing
/// anything. The report is named after the module.
pub fn import_single_module(loader: &dyn PackageLoader, path: &Path) -> Result<PackageReport> {
    tracing::info!("Import single module at {}", path.display());
    let load = loader
        .load_module(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    let mut report = PackageReport {
        package: load.module().to_string(),
        install_arg: path.display().to_string(),
        phase: Phase::Import,
        installed: false,
        imported: Vec::new(),
        import_failures: Vec::new(),
        sessions: Vec::new(),
        enumeration_failures: Vec::new(),
    };
    match load {
        UnitLoad::Loaded(source) => report.imported.push(source.unit_name().to_string()),
        UnitLoad::Failed { module, message } => {
            tracing::warn!("Failed to import {}: {}", module, message);
            report.import_failures.push(ImportFailure { module, message });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prober_types::{Signature, Unit, Value};

    #[test]
    fn test_install_arg() {
        assert_eq!(PackageSpec::new("requests").install_arg(), "requests");
        assert_eq!(
            PackageSpec::new("requests")
                .with_version("2.31.0")
                .install_arg(),
            "requests==2.31.0"
        );
        assert_eq!(
            PackageSpec::new("requests")
                .with_version("2.31.0")
                .with_local_path("/tmp/requests.tar.gz")
                .install_arg(),
            "/tmp/requests.tar.gz"
        );
    }

    #[test]
    fn test_phase_table() {
        assert_eq!(
            Phase::All.steps(),
            &[Step::Install, Step::Import, Step::Execute]
        );
        assert_eq!(Phase::Execute.steps(), &[Step::Import, Step::Execute]);
        assert_eq!("import".parse::<Phase>().unwrap(), Phase::Import);
        assert!("deploy".parse::<Phase>().is_err());
    }

    struct OneUnit;

    impl PackageLoader for OneUnit {
        fn install(&self, _spec: &PackageSpec) -> Result<()> {
            Ok(())
        }

        fn load(&self, _spec: &PackageSpec) -> Result<Vec<UnitLoad>> {
            Ok(vec![
                UnitLoad::loaded(
                    Unit::builder("one")
                        .function("f", Signature::empty(), |_, _| Ok(Value::Int(1)))
                        .build(),
                ),
                UnitLoad::failed("one.native", "shared library missing"),
            ])
        }
    }

    #[test]
    fn test_single_module_needs_loader_support() {
        let err = import_single_module(&OneUnit, Path::new("one.src")).unwrap_err();
        assert!(format!("{err:#}").contains("not supported"));
    }

    #[test]
    fn test_import_phase_does_not_execute() {
        let mut sink = ExecutionLogSink::in_memory();
        let report = analyze_package(
            &OneUnit,
            &PackageSpec::new("one"),
            Phase::Import,
            ExploreConfig::default(),
            &mut sink,
        )
        .unwrap();
        assert!(!report.installed);
        assert_eq!(report.imported, vec!["one"]);
        assert_eq!(report.import_failures.len(), 1);
        assert!(report.sessions.is_empty());
        assert!(sink.log().is_empty());
    }

    #[test]
    fn test_all_phase_writes_module_header() {
        let mut sink = ExecutionLogSink::in_memory();
        let report = analyze_package(
            &OneUnit,
            &PackageSpec::new("one"),
            Phase::All,
            ExploreConfig::default(),
            &mut sink,
        )
        .unwrap();
        assert!(report.installed);
        assert_eq!(report.invocations(), 1);
        assert_eq!(sink.log().traces().next(), Some("[module] one"));
    }
}
