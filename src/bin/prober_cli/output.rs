//! Output formatting for package-prober CLI

use std::path::Path;

use package_prober::engine::SessionSummary;
use package_prober::PackageReport;

/// Format one session summary line block
pub fn format_session(session: &SessionSummary, verbose: bool) -> String {
    let mut out = format!(
        "  \x1b[36m{}\x1b[0m: {} calls, \x1b[32m{} ok\x1b[0m, \x1b[31m{} faults\x1b[0m, {} binding faults, \x1b[33m{} timeouts\x1b[0m ({} ms)\n",
        session.unit,
        session.invocations,
        session.successes,
        session.faults,
        session.binding_faults,
        session.timeouts,
        session.elapsed_ms
    );
    if !session.explored_types.is_empty() {
        out.push_str(&format!(
            "    types explored: {}\n",
            session.explored_types.join(", ")
        ));
    }
    if verbose && !session.skipped.is_empty() {
        out.push_str(&format!("    skipped: {}\n", session.skipped.join(" ")));
    }
    if verbose {
        out.push_str(&format!(
            "    session {} ({} traversal, started {})\n",
            session.session_id,
            session.traversal,
            session.started_at.to_rfc3339()
        ));
    }
    out
}

/// Print a package report in human-readable form
pub fn print_report(report: &PackageReport, log_path: Option<&Path>, verbose: bool) {
    println!();
    println!(
        "\x1b[1mPackage:\x1b[0m {} (phase: {})",
        report.install_arg, report.phase
    );
    if report.installed {
        println!("\x1b[32m✓ Installed\x1b[0m");
    }
    if !report.imported.is_empty() {
        println!("Imported: {}", report.imported.join(", "));
    }
    for failure in &report.import_failures {
        println!(
            "\x1b[31m✗ Failed to import {}:\x1b[0m {}",
            failure.module, failure.message
        );
    }
    for failure in &report.enumeration_failures {
        println!(
            "\x1b[31m✗ Failed to enumerate {}:\x1b[0m {}",
            failure.module, failure.message
        );
    }

    if !report.sessions.is_empty() {
        println!("\x1b[1mSessions:\x1b[0m");
        for session in &report.sessions {
            print!("{}", format_session(session, verbose));
        }
        println!("Total invocations: {}", report.invocations());
    }

    if let Some(path) = log_path {
        println!("Execution log: {}", path.display());
    }
}
