//! CLI subcommand implementations for package-prober

pub mod explore;
pub mod list;
pub mod members;
pub mod output;
