//! List command - show the built-in catalog

use anyhow::Result;
use clap::Parser;
use package_prober::Catalog;

#[derive(Parser, Debug)]
pub struct ListCmd {}

impl ListCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let catalog = Catalog::builtin();
        if json_output {
            println!("{}", serde_json::to_string_pretty(catalog.entries())?);
            return Ok(());
        }

        println!("\x1b[1mAvailable packages:\x1b[0m");
        for entry in catalog.entries() {
            println!(
                "  \x1b[36m{:<14}\x1b[0m {:<8} {}",
                entry.name,
                entry.default_version(),
                entry.description
            );
        }
        Ok(())
    }
}
