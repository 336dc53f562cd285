//! Package phases over the built-in catalog.

mod common;

use std::time::Duration;

use common::*;
use package_prober::engine::{ExecutionLogSink, ExploreConfig, LogFormat, Outcome, ProbeErrorKind};
use package_prober::{analyze_package, Catalog, PackageSpec, Phase};
use tempfile::TempDir;

fn fast() -> ExploreConfig {
    ExploreConfig::default().with_timeout(Duration::from_millis(300))
}

#[test]
fn test_sample_package_explores_everything() {
    let mut sink = ExecutionLogSink::in_memory();
    let report = analyze_package(
        &Catalog::builtin(),
        &PackageSpec::new("sample"),
        Phase::All,
        fast(),
        &mut sink,
    )
    .unwrap();

    assert!(report.installed);
    assert_eq!(report.imported, vec!["sample"]);
    assert!(report.enumeration_failures.is_empty());
    let session = &report.sessions[0];
    assert_eq!(session.timeouts, 0);
    assert_eq!(session.faults, 0);
    assert_eq!(session.skipped, vec!["VERSION", "util"]);
    assert_eq!(
        session.explored_types,
        vec!["sample::Counter", "sample::Session"]
    );

    assert_eq!(
        outcome_of(&sink, "add"),
        Outcome::Success {
            value: "6".to_string()
        }
    );
    // make_counter returns an already explored type.
    let increments = records_named(&sink, "increment");
    assert_eq!(increments.len(), 1);
    assert!(sink
        .log()
        .traces()
        .any(|line| line == "[investigate type] sample::Session"));
}

#[test]
fn test_hostile_package_is_contained() {
    let mut sink = ExecutionLogSink::in_memory();
    let report = analyze_package(
        &Catalog::builtin(),
        &PackageSpec::new("hostile"),
        Phase::All,
        fast(),
        &mut sink,
    )
    .unwrap();

    assert_eq!(report.import_failures.len(), 1);
    assert_eq!(report.import_failures[0].module, "hostile.native");

    let kind_of = |member: &str| match outcome_of(&sink, member) {
        Outcome::Fault { kind, .. } => kind,
        other => panic!("{member}: expected fault, got {other:?}"),
    };
    assert_eq!(kind_of("fail"), "ValueError");
    assert_eq!(kind_of("quit"), "SystemExit");
    assert_eq!(kind_of("crash"), "panic");
    assert_eq!(kind_of("broken"), "BindingFault");
    assert_eq!(kind_of("Guard"), "PermissionError");

    assert_eq!(
        outcome_of(&sink, "hang").error(),
        Some(ProbeErrorKind::InvocationTimeout)
    );
    assert_eq!(
        outcome_of(&sink, "forever").error(),
        Some(ProbeErrorKind::MaterializationTimeout)
    );
    assert_eq!(
        outcome_of(&sink, "never").error(),
        Some(ProbeErrorKind::MaterializationTimeout)
    );
    assert_eq!(
        outcome_of(&sink, "serve").error(),
        Some(ProbeErrorKind::InvocationTimeout)
    );
    assert_eq!(kind_of("stop"), "SystemExit");

    // Program output is captured into the log in call order.
    let lines = text_lines(&sink);
    let beacon = lines.iter().position(|l| l == "[function] beacon").unwrap();
    assert_eq!(lines[beacon + 1], "connecting to <synthetic host>");
}

#[test]
fn test_async_package_resolves_deferred_instances() {
    let mut sink = ExecutionLogSink::in_memory();
    let report = analyze_package(
        &Catalog::builtin(),
        &PackageSpec::new("async-sample"),
        Phase::Execute,
        ExploreConfig::default().with_timeout(Duration::from_secs(2)),
        &mut sink,
    )
    .unwrap();

    assert!(!report.installed);
    assert_eq!(report.sessions[0].explored_types, vec!["async_sample::Client"]);
    assert_eq!(
        outcome_of(&sink, "ticker"),
        Outcome::Success {
            value: "[1, 2, 3]".to_string()
        }
    );
    assert_eq!(
        outcome_of(&sink, "events"),
        Outcome::Success {
            value: "[\"connected\", \"ready\"]".to_string()
        }
    );
    match outcome_of(&sink, "refuse") {
        Outcome::Fault { kind, .. } => assert_eq!(kind, "ConnectionRefusedError"),
        other => panic!("expected fault, got {other:?}"),
    }
    assert_eq!(records_named(&sink, "send").len(), 1);
}

#[test]
fn test_enumeration_failure_is_reported() {
    let mut sink = ExecutionLogSink::in_memory();
    let report = analyze_package(
        &Catalog::builtin(),
        &PackageSpec::new("opaque"),
        Phase::All,
        fast(),
        &mut sink,
    )
    .unwrap();

    assert_eq!(report.enumeration_failures.len(), 1);
    assert!(report.sessions.is_empty());
    let lines = text_lines(&sink);
    assert_eq!(lines[0], "[module] opaque");
    assert!(lines[1].starts_with("Failed to enumerate members of opaque"));
}

#[test]
fn test_install_failure_is_an_error() {
    let mut sink = ExecutionLogSink::in_memory();
    let err = analyze_package(
        &Catalog::builtin(),
        &PackageSpec::new("sample").with_version("0.0.1"),
        Phase::All,
        fast(),
        &mut sink,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("sample==0.0.1"));
    assert!(sink.log().is_empty());
}

#[test]
fn test_log_file_is_appended() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs").join("run.log");

    for _ in 0..2 {
        let mut sink = ExecutionLogSink::open(&path, LogFormat::Text).unwrap();
        analyze_package(
            &Catalog::builtin(),
            &PackageSpec::new("sample"),
            Phase::Execute,
            fast(),
            &mut sink,
        )
        .unwrap();
        sink.close();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("[module] sample").count(), 2);
    assert!(content.contains("[return value] \"hello world\""));
}
