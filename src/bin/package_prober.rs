//! package-prober: behavioral triage for untrusted packages
//!
//! Installs a package, imports its modules and calls every function, type
//! and discovered instance method with synthetic arguments, each under a
//! wall-clock budget. Every call and its outcome lands in an execution log.
//!
//! ## Example Usage
//!
//! ```bash
//! # Show the built-in packages
//! package-prober list
//!
//! # Dry run: what would be called
//! package-prober members sample
//!
//! # Explore with a 2 second budget per call, logging to a file
//! package-prober explore hostile --timeout 2 --log /tmp/hostile.log
//!
//! # Breadth-first, JSONL log, JSON summary
//! package-prober --json explore sample --traversal bfs --format jsonl --log out.jsonl
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod prober_cli;

use prober_cli::{explore::ExploreCmd, list::ListCmd, members::MembersCmd};

#[derive(Parser)]
#[command(
    name = "package-prober",
    author,
    version,
    about = "Exploratory execution of untrusted packages",
    long_about = "Loads a package and calls every invocable member with synthetic arguments,\n\
                  each under a timeout, following freshly produced instances of the package's\n\
                  own types. Every call is recorded in an execution log."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug diagnostics on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the packages in the built-in catalog
    List(ListCmd),

    /// Show a package's modules, members and signatures without calling anything
    Members(MembersCmd),

    /// Install, import and explore a package
    Explore(ExploreCmd),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();

    init_tracing(verbose);

    match command {
        Commands::List(cmd) => cmd.execute(json),
        Commands::Members(cmd) => cmd.execute(json),
        Commands::Explore(cmd) => cmd.execute(json, verbose),
    }
}
