//! Explore command - run the install/import/execute phases on a package

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;

use package_prober::engine::{
    ExecutionLogSink, ExploreConfig, LogEntry, LogFormat, OutputMode, Traversal,
};
use package_prober::{
    analyze_package, import_single_module, Catalog, PackageReport, PackageSpec, Phase,
};

use super::output::print_report;

#[derive(Parser, Debug)]
pub struct ExploreCmd {
    /// Package name (see `list`). Omit it with `--phase import --local FILE`
    /// to import a single module file.
    pub package: Option<String>,

    /// Package version to install
    #[arg(long)]
    pub version: Option<String>,

    /// Install from a local path instead of the index
    #[arg(long)]
    pub local: Option<PathBuf>,

    /// Which phases to run
    #[arg(long, value_enum, default_value_t = Phase::All)]
    pub phase: Phase,

    /// Per-call budget in seconds (default 10, or PROBER_TIMEOUT_SECS)
    #[arg(long, conflicts_with = "timeout_ms")]
    pub timeout: Option<u64>,

    /// Per-call budget in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Frontier order: dfs or bfs
    #[arg(long)]
    pub traversal: Option<Traversal>,

    /// What to do with the target's own output: log, inherit or discard
    #[arg(long)]
    pub output: Option<OutputMode>,

    /// Append the execution log to this file (default: stdout)
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Execution log format: text or jsonl
    #[arg(long, default_value = "text")]
    pub format: LogFormat,
}

#[derive(Serialize)]
struct ExploreOutput<'a> {
    #[serde(flatten)]
    report: &'a PackageReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a [LogEntry]>,
}

impl ExploreCmd {
    fn config(&self) -> ExploreConfig {
        let mut config = ExploreConfig::from_env();
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(traversal) = self.traversal {
            config = config.with_traversal(traversal);
        }
        if let Some(output) = self.output {
            config = config.with_output(output);
        }
        config
    }

    fn spec(&self, package: &str) -> PackageSpec {
        let mut spec = PackageSpec::new(package);
        if let Some(version) = &self.version {
            spec = spec.with_version(version);
        }
        if let Some(path) = &self.local {
            spec = spec.with_local_path(path);
        }
        spec
    }

    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let catalog = Catalog::builtin();
        let Some(package) = &self.package else {
            let report = match (self.phase, &self.local) {
                (Phase::Import, Some(path)) => import_single_module(&catalog, path)?,
                _ => bail!(
                    "no package name given; a single module can only be imported with \
                     --phase import --local FILE"
                ),
            };
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, None, verbose);
            }
            return Ok(());
        };

        let config = self.config();
        if json_output && config.output == OutputMode::Inherit {
            bail!("--output inherit cannot be combined with --json: both write to stdout");
        }
        let spec = self.spec(package);
        if verbose {
            eprintln!(
                "Exploring {} (phase {}, {} ms per call, {} traversal, output {})",
                spec.install_arg(),
                self.phase,
                config.timeout.as_millis(),
                config.traversal,
                config.output
            );
        }

        // Without --log the text log streams to stdout, unless stdout carries JSON.
        let mut sink = match (&self.log, json_output) {
            (Some(path), _) => ExecutionLogSink::open(path, self.format)?,
            (None, false) => ExecutionLogSink::with_writer(std::io::stdout(), self.format),
            (None, true) => ExecutionLogSink::in_memory(),
        };

        let report = analyze_package(&catalog, &spec, self.phase, config, &mut sink)?;
        let log = sink.close();

        if json_output {
            let output = ExploreOutput {
                report: &report,
                log_path: self.log.as_ref(),
                log: self.log.is_none().then(|| log.entries()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_report(&report, self.log.as_deref(), verbose);
        }

        if !report.enumeration_failures.is_empty() {
            let modules: Vec<_> = report
                .enumeration_failures
                .iter()
                .map(|f| f.module.as_str())
                .collect();
            bail!("Failed to enumerate members of {}", modules.join(", "));
        }
        Ok(())
    }
}
